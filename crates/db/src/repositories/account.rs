//! Account repository for ledger account administration.
//!
//! Balances are never written here; only the ledger engine moves them.

use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, QuerySelect, Set, TransactionTrait,
};
use serde::{Deserialize, Serialize};
use tillbook_core::ledger::{AccountKind, LedgerAccount, LedgerError};
use tillbook_shared::types::{AccountId, PageRequest, PageResponse};
use tillbook_shared::{Amount, TenantContext};
use tracing::info;
use uuid::Uuid;

use super::ledger::find_account;
use super::store::{is_unique_violation, minor, store_error};
use crate::entities::sea_orm_active_enums::AccountKind as DbAccountKind;
use crate::entities::{ledger_accounts, movements, payment_method_accounts};

/// Input for creating an account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateAccountInput {
    /// Customer, supplier or cash.
    pub kind: AccountKind,
    /// Display name.
    pub name: String,
    /// Customer or supplier id; required for those kinds, absent for cash.
    #[serde(default)]
    pub owner_id: Option<Uuid>,
    /// Customer credit limit; zero means unlimited.
    #[serde(default)]
    pub credit_limit: Amount,
}

/// Filter options for listing accounts.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct AccountFilter {
    /// Only accounts of this kind.
    pub kind: Option<AccountKind>,
    /// Only active or inactive accounts.
    pub is_active: Option<bool>,
}

/// Repository for ledger account administration.
#[derive(Debug, Clone)]
pub struct AccountRepository {
    db: DatabaseConnection,
}

impl AccountRepository {
    /// Creates a new account repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Creates a customer, supplier or cash account with a zero balance.
    ///
    /// # Errors
    ///
    /// `InvalidAccount` for register kinds, blank names, missing or unexpected
    /// owners, negative limits or limits on non-customers;
    /// `AccountAlreadyExists` when the owner already has one.
    pub async fn create(
        &self,
        ctx: &TenantContext,
        input: CreateAccountInput,
    ) -> Result<LedgerAccount, LedgerError> {
        validate_new_account(&input)?;
        let name = input.name.trim().to_string();
        let now = Utc::now();

        let model = ledger_accounts::ActiveModel {
            id: Set(AccountId::new().into_inner()),
            tenant_id: Set(ctx.tenant_id.into_inner()),
            kind: Set(input.kind.into()),
            owner_id: Set(input.owner_id),
            name: Set(name),
            balance_minor: Set(0),
            opening_balance_minor: Set(0),
            credit_limit_minor: Set(minor(input.credit_limit)?),
            is_active: Set(true),
            version: Set(0),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(&self.db)
        .await
        .map_err(|err| match input.owner_id {
            Some(owner_id) if is_unique_violation(&err) => LedgerError::AccountAlreadyExists {
                kind: input.kind,
                owner_id,
            },
            _ => store_error(err),
        })?;

        info!(tenant_id = %ctx.tenant_id, account_id = %model.id, kind = %input.kind, "account created");
        Ok(model.into())
    }

    /// Finds an account by id in the caller's tenant.
    ///
    /// # Errors
    ///
    /// `AccountNotFound` if it does not exist there.
    pub async fn get(
        &self,
        ctx: &TenantContext,
        account_id: AccountId,
    ) -> Result<LedgerAccount, LedgerError> {
        find_account(&self.db, ctx.tenant_id.into_inner(), account_id.into_inner())
            .await
            .map(Into::into)
    }

    /// Finds the current account of a customer or supplier.
    pub async fn find_by_owner(
        &self,
        ctx: &TenantContext,
        kind: AccountKind,
        owner_id: Uuid,
    ) -> Result<Option<LedgerAccount>, LedgerError> {
        let row = ledger_accounts::Entity::find()
            .filter(ledger_accounts::Column::TenantId.eq(ctx.tenant_id.into_inner()))
            .filter(ledger_accounts::Column::Kind.eq(DbAccountKind::from(kind)))
            .filter(ledger_accounts::Column::OwnerId.eq(owner_id))
            .one(&self.db)
            .await
            .map_err(store_error)?;
        Ok(row.map(Into::into))
    }

    /// Lists accounts of the caller's tenant.
    pub async fn list(
        &self,
        ctx: &TenantContext,
        filter: AccountFilter,
        page: PageRequest,
    ) -> Result<PageResponse<LedgerAccount>, LedgerError> {
        let page = page.normalized();
        let mut query = ledger_accounts::Entity::find()
            .filter(ledger_accounts::Column::TenantId.eq(ctx.tenant_id.into_inner()));
        if let Some(kind) = filter.kind {
            query = query.filter(ledger_accounts::Column::Kind.eq(DbAccountKind::from(kind)));
        }
        if let Some(is_active) = filter.is_active {
            query = query.filter(ledger_accounts::Column::IsActive.eq(is_active));
        }

        let total = query.clone().count(&self.db).await.map_err(store_error)?;
        let rows = query
            .order_by_asc(ledger_accounts::Column::Name)
            .order_by_asc(ledger_accounts::Column::Id)
            .offset(page.offset())
            .limit(page.limit())
            .all(&self.db)
            .await
            .map_err(store_error)?;

        Ok(PageResponse::new(
            rows.into_iter().map(Into::into).collect(),
            page,
            total,
        ))
    }

    /// Activates or deactivates an account.
    ///
    /// # Errors
    ///
    /// `InvalidAccount` for register accounts, which follow their session.
    pub async fn set_active(
        &self,
        ctx: &TenantContext,
        account_id: AccountId,
        is_active: bool,
    ) -> Result<LedgerAccount, LedgerError> {
        let row = find_account(&self.db, ctx.tenant_id.into_inner(), account_id.into_inner()).await?;
        if row.kind == DbAccountKind::CashRegister {
            return Err(LedgerError::InvalidAccount(
                "register accounts are activated by their session".to_string(),
            ));
        }

        let mut active: ledger_accounts::ActiveModel = row.into();
        active.is_active = Set(is_active);
        active.updated_at = Set(Utc::now());
        let updated = active.update(&self.db).await.map_err(store_error)?;

        info!(tenant_id = %ctx.tenant_id, account_id = %account_id, is_active, "account active flag changed");
        Ok(updated.into())
    }

    /// Sets a customer's credit limit. Zero means unlimited.
    ///
    /// # Errors
    ///
    /// `InvalidAccount` for non-customers or negative limits.
    pub async fn set_credit_limit(
        &self,
        ctx: &TenantContext,
        account_id: AccountId,
        credit_limit: Amount,
    ) -> Result<LedgerAccount, LedgerError> {
        if credit_limit.is_negative() {
            return Err(LedgerError::InvalidAccount(format!(
                "credit limit {credit_limit} cannot be negative"
            )));
        }
        let row = find_account(&self.db, ctx.tenant_id.into_inner(), account_id.into_inner()).await?;
        if row.kind != DbAccountKind::Customer {
            return Err(LedgerError::InvalidAccount(
                "credit limits apply to customer accounts only".to_string(),
            ));
        }

        let mut active: ledger_accounts::ActiveModel = row.into();
        active.credit_limit_minor = Set(minor(credit_limit)?);
        active.updated_at = Set(Utc::now());
        let updated = active.update(&self.db).await.map_err(store_error)?;

        info!(tenant_id = %ctx.tenant_id, account_id = %account_id, %credit_limit, "credit limit changed");
        Ok(updated.into())
    }

    /// Deletes an account that never had a movement.
    ///
    /// # Errors
    ///
    /// `AccountHasMovements` if any movement references it, `InvalidAccount`
    /// for register accounts.
    pub async fn delete(&self, ctx: &TenantContext, account_id: AccountId) -> Result<(), LedgerError> {
        let tenant = ctx.tenant_id.into_inner();
        let id = account_id.into_inner();
        let txn = self.db.begin().await.map_err(store_error)?;

        let row = find_account(&txn, tenant, id).await?;
        if row.kind == DbAccountKind::CashRegister {
            return Err(LedgerError::InvalidAccount(
                "register accounts cannot be deleted".to_string(),
            ));
        }

        let movement_count = movements::Entity::find()
            .filter(movements::Column::AccountId.eq(id))
            .count(&txn)
            .await
            .map_err(store_error)?;
        if movement_count > 0 || row.version > 0 {
            return Err(LedgerError::AccountHasMovements(id));
        }

        payment_method_accounts::Entity::delete_many()
            .filter(payment_method_accounts::Column::TenantId.eq(tenant))
            .filter(payment_method_accounts::Column::AccountId.eq(id))
            .exec(&txn)
            .await
            .map_err(store_error)?;
        ledger_accounts::Entity::delete_by_id(id)
            .exec(&txn)
            .await
            .map_err(store_error)?;

        txn.commit().await.map_err(store_error)?;
        info!(tenant_id = %ctx.tenant_id, account_id = %account_id, "account deleted");
        Ok(())
    }
}

fn validate_new_account(input: &CreateAccountInput) -> Result<(), LedgerError> {
    if !input.kind.is_user_creatable() {
        return Err(LedgerError::InvalidAccount(format!(
            "{} accounts are created by opening a register session",
            input.kind
        )));
    }
    if input.name.trim().is_empty() {
        return Err(LedgerError::InvalidAccount("name is required".to_string()));
    }
    match (input.kind, input.owner_id) {
        (AccountKind::Customer | AccountKind::Supplier, None) => {
            return Err(LedgerError::InvalidAccount(format!(
                "{} accounts need an owner id",
                input.kind
            )));
        }
        (AccountKind::Cash, Some(_)) => {
            return Err(LedgerError::InvalidAccount(
                "cash accounts have no owner".to_string(),
            ));
        }
        _ => {}
    }
    if input.credit_limit.is_negative() {
        return Err(LedgerError::InvalidAccount(format!(
            "credit limit {} cannot be negative",
            input.credit_limit
        )));
    }
    if !input.credit_limit.is_zero() && input.kind != AccountKind::Customer {
        return Err(LedgerError::InvalidAccount(
            "credit limits apply to customer accounts only".to_string(),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn input(kind: AccountKind, owner_id: Option<Uuid>, credit_limit: Amount) -> CreateAccountInput {
        CreateAccountInput {
            kind,
            name: "Account".into(),
            owner_id,
            credit_limit,
        }
    }

    #[test]
    fn test_validate_new_account() {
        let owner = Some(Uuid::now_v7());
        assert!(validate_new_account(&input(AccountKind::Customer, owner, Amount::from(500))).is_ok());
        assert!(validate_new_account(&input(AccountKind::Cash, None, Amount::ZERO)).is_ok());

        for bad in [
            input(AccountKind::CashRegister, None, Amount::ZERO),
            input(AccountKind::Customer, None, Amount::ZERO),
            input(AccountKind::Cash, owner, Amount::ZERO),
            input(AccountKind::Supplier, owner, Amount::from(1)),
            input(AccountKind::Customer, owner, Amount::from(-1)),
        ] {
            assert!(matches!(
                validate_new_account(&bad),
                Err(LedgerError::InvalidAccount(_))
            ));
        }
    }
}
