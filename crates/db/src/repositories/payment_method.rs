//! Payment method to cash account mappings.

use async_trait::async_trait;
use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set,
    TransactionTrait,
};
use serde::{Deserialize, Serialize};
use tillbook_core::ledger::{AccountKind, LedgerError};
use tillbook_core::payment::PaymentMethod;
use tillbook_shared::TenantContext;
use tillbook_shared::types::{AccountId, TenantId};
use tracing::info;
use uuid::Uuid;

use super::ledger::find_account;
use super::store::store_error;
use crate::entities::payment_method_accounts;
use crate::entities::sea_orm_active_enums::{
    AccountKind as DbAccountKind, PaymentMethod as DbPaymentMethod,
};

/// Resolves which cash account receives a payment method's money.
#[async_trait]
pub trait PaymentMethodResolver: Send + Sync {
    /// Returns the mapped account, or `None` if the tenant has not configured
    /// one for `method`.
    async fn resolve(
        &self,
        tenant_id: TenantId,
        method: PaymentMethod,
    ) -> Result<Option<AccountId>, LedgerError>;
}

/// One configured mapping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentMethodMapping {
    /// Payment method.
    pub method: PaymentMethod,
    /// Cash account receiving it.
    pub account_id: AccountId,
}

impl From<payment_method_accounts::Model> for PaymentMethodMapping {
    fn from(m: payment_method_accounts::Model) -> Self {
        Self {
            method: m.method.into(),
            account_id: m.account_id.into(),
        }
    }
}

/// Table-backed mapping store.
#[derive(Debug, Clone)]
pub struct PaymentMethodRepository {
    db: DatabaseConnection,
}

impl PaymentMethodRepository {
    /// Creates a new repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Maps `method` to a cash account, replacing any previous mapping.
    ///
    /// # Errors
    ///
    /// `InvalidAccount` for the ACCOUNT method or a non-cash target,
    /// `AccountNotFound` if the target is not in the caller's tenant.
    pub async fn set(
        &self,
        ctx: &TenantContext,
        method: PaymentMethod,
        account_id: AccountId,
    ) -> Result<PaymentMethodMapping, LedgerError> {
        if method == PaymentMethod::Account {
            return Err(LedgerError::InvalidAccount(
                "ACCOUNT payments always settle against the customer account".to_string(),
            ));
        }
        let tenant = ctx.tenant_id.into_inner();
        let txn = self.db.begin().await.map_err(store_error)?;

        let account = find_account(&txn, tenant, account_id.into_inner()).await?;
        if account.kind != DbAccountKind::Cash {
            return Err(LedgerError::InvalidAccount(format!(
                "payment methods map to {} accounts only",
                AccountKind::Cash
            )));
        }

        payment_method_accounts::Entity::delete_many()
            .filter(payment_method_accounts::Column::TenantId.eq(tenant))
            .filter(payment_method_accounts::Column::Method.eq(DbPaymentMethod::from(method)))
            .exec(&txn)
            .await
            .map_err(store_error)?;
        let row = payment_method_accounts::ActiveModel {
            id: Set(Uuid::now_v7()),
            tenant_id: Set(tenant),
            method: Set(method.into()),
            account_id: Set(account_id.into_inner()),
            created_at: Set(Utc::now()),
        }
        .insert(&txn)
        .await
        .map_err(store_error)?;

        txn.commit().await.map_err(store_error)?;
        info!(tenant_id = %ctx.tenant_id, %method, account_id = %account_id, "payment method mapped");
        Ok(row.into())
    }

    /// Removes a mapping. Returns whether one existed.
    pub async fn remove(
        &self,
        ctx: &TenantContext,
        method: PaymentMethod,
    ) -> Result<bool, LedgerError> {
        let result = payment_method_accounts::Entity::delete_many()
            .filter(payment_method_accounts::Column::TenantId.eq(ctx.tenant_id.into_inner()))
            .filter(payment_method_accounts::Column::Method.eq(DbPaymentMethod::from(method)))
            .exec(&self.db)
            .await
            .map_err(store_error)?;
        Ok(result.rows_affected > 0)
    }

    /// Lists the tenant's mappings.
    pub async fn list(&self, ctx: &TenantContext) -> Result<Vec<PaymentMethodMapping>, LedgerError> {
        let rows = payment_method_accounts::Entity::find()
            .filter(payment_method_accounts::Column::TenantId.eq(ctx.tenant_id.into_inner()))
            .order_by_asc(payment_method_accounts::Column::Method)
            .all(&self.db)
            .await
            .map_err(store_error)?;
        Ok(rows.into_iter().map(Into::into).collect())
    }
}

#[async_trait]
impl PaymentMethodResolver for PaymentMethodRepository {
    async fn resolve(
        &self,
        tenant_id: TenantId,
        method: PaymentMethod,
    ) -> Result<Option<AccountId>, LedgerError> {
        let row = payment_method_accounts::Entity::find()
            .filter(payment_method_accounts::Column::TenantId.eq(tenant_id.into_inner()))
            .filter(payment_method_accounts::Column::Method.eq(DbPaymentMethod::from(method)))
            .one(&self.db)
            .await
            .map_err(store_error)?;
        Ok(row.map(|m| m.account_id.into()))
    }
}
