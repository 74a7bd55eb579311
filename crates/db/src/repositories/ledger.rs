//! Ledger engine: the only code path that changes a balance.
//!
//! Every operation runs in one store transaction. The account row is re-read
//! (and row-locked where the backend supports it) inside the transaction, the
//! movement is appended, and the account moves forward under a version guard.
//! Lost races are retried from a fresh read up to `ledger.max_retries` times.

use std::sync::Arc;

use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait,
    PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Set, TransactionTrait,
};
use serde::{Deserialize, Serialize};
use tillbook_core::ledger::{
    verify_chain, AccountKind, AccountRef, BalanceView, ChainLink, ChainReport, CreditLimitPolicy,
    CreditPolicy, LedgerAccount, LedgerError, LedgerService, Movement, MovementType, PostMovement,
};
use tillbook_shared::types::{AccountId, PageRequest, PageResponse, SupplierId, TransferGroupId};
use tillbook_shared::{Amount, LedgerConfig, TenantContext};
use tracing::{error, info};
use uuid::Uuid;

use super::store::{
    apply_movement, lock_account, lock_owner_account, store_error, with_retry, MovementDraft,
};
use crate::entities::sea_orm_active_enums::AccountKind as DbAccountKind;
use crate::entities::{ledger_accounts, movements};

/// Request to move cash between two envelopes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferRequest {
    /// Source cash account.
    pub from_account_id: AccountId,
    /// Destination cash account.
    pub to_account_id: AccountId,
    /// Positive amount.
    pub amount: Amount,
    /// Description written on both legs.
    pub concept: String,
    /// Optional external reference.
    #[serde(default)]
    pub reference: Option<String>,
}

/// Both legs of a committed transfer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferResult {
    /// Shared by both movements.
    pub transfer_group_id: TransferGroupId,
    /// TRANSFER_OUT on the source.
    pub outgoing: Movement,
    /// TRANSFER_IN on the destination.
    pub incoming: Movement,
}

/// Ledger engine over a `SeaORM` connection.
#[derive(Clone)]
pub struct LedgerEngine {
    db: DatabaseConnection,
    policy: Arc<dyn CreditPolicy>,
    max_retries: u32,
}

impl LedgerEngine {
    /// Creates an engine with the default [`CreditLimitPolicy`].
    #[must_use]
    pub fn new(db: DatabaseConnection, config: &LedgerConfig) -> Self {
        Self {
            db,
            policy: Arc::new(CreditLimitPolicy),
            max_retries: config.max_retries,
        }
    }

    /// Replaces the credit policy.
    #[must_use]
    pub fn with_policy(mut self, policy: Arc<dyn CreditPolicy>) -> Self {
        self.policy = policy;
        self
    }

    /// Posts one movement.
    ///
    /// # Errors
    ///
    /// `InvalidAmount`, `MissingConcept`, `AccountNotFound`, `AccountInactive`,
    /// `MovementTypeNotAllowed`, `InsufficientCredit`, `InsufficientFunds`, or
    /// `ConcurrencyConflict` once retries are exhausted. Nothing is written
    /// on any error.
    pub async fn post(
        &self,
        ctx: &TenantContext,
        request: &PostMovement,
    ) -> Result<Movement, LedgerError> {
        let concept = LedgerService::validate_concept(&request.concept)?;
        if request.amount.is_zero() {
            return Err(LedgerError::InvalidAmount(
                "movement amount must be non-zero".to_string(),
            ));
        }

        let movement = with_retry("post", self.max_retries, || {
            self.post_once(ctx, request, &concept)
        })
        .await?;

        info!(
            tenant_id = %ctx.tenant_id,
            account_id = %movement.account_id,
            movement_type = %movement.movement_type,
            amount = %movement.amount,
            sequence = movement.sequence,
            balance_after = %movement.balance_after,
            "movement posted"
        );
        Ok(movement)
    }

    async fn post_once(
        &self,
        ctx: &TenantContext,
        request: &PostMovement,
        concept: &str,
    ) -> Result<Movement, LedgerError> {
        let txn = self.db.begin().await.map_err(store_error)?;

        let account = resolve_account(&txn, ctx, request.account).await?;
        let draft = MovementDraft {
            reference: request.reference.as_deref(),
            document: request.document.as_ref(),
            ..MovementDraft::new(request.movement_type, request.amount, concept)
        };
        let movement = apply_movement(&txn, ctx, self.policy.as_ref(), account, &draft).await?;

        txn.commit().await.map_err(store_error)?;
        Ok(movement)
    }

    /// Moves cash between two envelopes atomically.
    ///
    /// Both accounts are locked in id order so two opposite transfers cannot
    /// deadlock.
    ///
    /// # Errors
    ///
    /// `InvalidAmount` for non-positive amounts or identical accounts,
    /// `MovementTypeNotAllowed` when either side is not a cash envelope,
    /// `InsufficientFunds` when the source cannot cover it.
    pub async fn transfer(
        &self,
        ctx: &TenantContext,
        request: &TransferRequest,
    ) -> Result<TransferResult, LedgerError> {
        let concept = LedgerService::validate_concept(&request.concept)?;
        if !request.amount.is_positive() {
            return Err(LedgerError::InvalidAmount(format!(
                "transfer amount must be positive, got {}",
                request.amount
            )));
        }
        if request.from_account_id == request.to_account_id {
            return Err(LedgerError::InvalidAmount(
                "transfer source and destination must differ".to_string(),
            ));
        }

        let result = with_retry("transfer", self.max_retries, || {
            self.transfer_once(ctx, request, &concept)
        })
        .await?;

        info!(
            tenant_id = %ctx.tenant_id,
            transfer_group_id = %result.transfer_group_id,
            from = %request.from_account_id,
            to = %request.to_account_id,
            amount = %request.amount,
            "transfer posted"
        );
        Ok(result)
    }

    async fn transfer_once(
        &self,
        ctx: &TenantContext,
        request: &TransferRequest,
        concept: &str,
    ) -> Result<TransferResult, LedgerError> {
        let tenant = ctx.tenant_id.into_inner();
        let from_id = request.from_account_id.into_inner();
        let to_id = request.to_account_id.into_inner();

        let txn = self.db.begin().await.map_err(store_error)?;

        let (first, second) = if from_id < to_id {
            (from_id, to_id)
        } else {
            (to_id, from_id)
        };
        let first_row = lock_account(&txn, tenant, first).await?;
        let second_row = lock_account(&txn, tenant, second).await?;
        let (from_row, to_row) = if first == from_id {
            (first_row, second_row)
        } else {
            (second_row, first_row)
        };

        let group = TransferGroupId::new();
        let out_draft = MovementDraft {
            reference: request.reference.as_deref(),
            transfer_group_id: Some(group),
            ..MovementDraft::new(MovementType::TransferOut, -request.amount, concept)
        };
        let in_draft = MovementDraft {
            reference: request.reference.as_deref(),
            transfer_group_id: Some(group),
            ..MovementDraft::new(MovementType::TransferIn, request.amount, concept)
        };

        let outgoing = apply_movement(&txn, ctx, self.policy.as_ref(), from_row, &out_draft).await?;
        let incoming = apply_movement(&txn, ctx, self.policy.as_ref(), to_row, &in_draft).await?;

        txn.commit().await.map_err(store_error)?;
        Ok(TransferResult {
            transfer_group_id: group,
            outgoing,
            incoming,
        })
    }

    /// Returns the current balance and credit position of an account.
    ///
    /// # Errors
    ///
    /// `AccountNotFound` outside the caller's tenant.
    pub async fn get_balance(
        &self,
        ctx: &TenantContext,
        account_id: AccountId,
    ) -> Result<BalanceView, LedgerError> {
        let account = self.load(ctx, account_id).await?;
        Ok(account.balance_view())
    }

    /// Lists an account's movements in chain order.
    ///
    /// # Errors
    ///
    /// `AccountNotFound` outside the caller's tenant.
    pub async fn list_movements(
        &self,
        ctx: &TenantContext,
        account_id: AccountId,
        page: PageRequest,
    ) -> Result<PageResponse<Movement>, LedgerError> {
        self.load(ctx, account_id).await?;
        let page = page.normalized();

        let query = movements::Entity::find()
            .filter(movements::Column::TenantId.eq(ctx.tenant_id.into_inner()))
            .filter(movements::Column::AccountId.eq(account_id.into_inner()));

        let total = query.clone().count(&self.db).await.map_err(store_error)?;
        let rows = query
            .order_by_asc(movements::Column::Sequence)
            .offset(page.offset())
            .limit(page.limit())
            .all(&self.db)
            .await
            .map_err(store_error)?;

        Ok(PageResponse::new(
            rows.into_iter().map(Movement::from).collect(),
            page,
            total,
        ))
    }

    /// Replays the account's chain from its opening balance.
    ///
    /// Account and movements are read in one transaction so the snapshot is
    /// consistent.
    ///
    /// # Errors
    ///
    /// `AccountNotFound` outside the caller's tenant.
    pub async fn verify_chain(
        &self,
        ctx: &TenantContext,
        account_id: AccountId,
    ) -> Result<ChainReport, LedgerError> {
        let txn = self.db.begin().await.map_err(store_error)?;
        let account = LedgerAccount::from(
            find_account(&txn, ctx.tenant_id.into_inner(), account_id.into_inner()).await?,
        );
        let rows = movements::Entity::find()
            .filter(movements::Column::AccountId.eq(account_id.into_inner()))
            .order_by_asc(movements::Column::Sequence)
            .all(&txn)
            .await
            .map_err(store_error)?;
        txn.commit().await.map_err(store_error)?;

        let links = rows.iter().map(|m| ChainLink {
            sequence: m.sequence,
            amount: Amount::from_minor_units(m.amount_minor),
            balance_before: Amount::from_minor_units(m.balance_before_minor),
            balance_after: Amount::from_minor_units(m.balance_after_minor),
        });
        let report = verify_chain(
            account.opening_balance,
            account.balance,
            account.version,
            links,
        );

        if let Some(first_break) = &report.first_break {
            error!(account_id = %account_id, ?first_break, "movement chain broken");
        }
        Ok(report)
    }

    async fn load(
        &self,
        ctx: &TenantContext,
        account_id: AccountId,
    ) -> Result<LedgerAccount, LedgerError> {
        find_account(&self.db, ctx.tenant_id.into_inner(), account_id.into_inner())
            .await
            .map(LedgerAccount::from)
    }
}

/// Plain read of an account in the caller's tenant.
pub(crate) async fn find_account<C: ConnectionTrait>(
    conn: &C,
    tenant_id: Uuid,
    account_id: Uuid,
) -> Result<ledger_accounts::Model, LedgerError> {
    ledger_accounts::Entity::find_by_id(account_id)
        .filter(ledger_accounts::Column::TenantId.eq(tenant_id))
        .one(conn)
        .await
        .map_err(store_error)?
        .ok_or(LedgerError::AccountNotFound(account_id))
}

/// Resolves the target of a post inside the transaction.
async fn resolve_account<C: ConnectionTrait>(
    conn: &C,
    ctx: &TenantContext,
    account: AccountRef,
) -> Result<ledger_accounts::Model, LedgerError> {
    let tenant = ctx.tenant_id.into_inner();
    match account {
        AccountRef::Account(id) => lock_account(conn, tenant, id.into_inner()).await,
        AccountRef::Supplier(supplier_id) => {
            match lock_owner_account(conn, tenant, AccountKind::Supplier, supplier_id.into_inner())
                .await?
            {
                Some(row) => Ok(row),
                None => create_supplier_account(conn, ctx, supplier_id).await,
            }
        }
    }
}

/// Opens a supplier current account on first use.
///
/// A concurrent first post for the same supplier hits the owner unique index
/// and is retried, finding this row.
async fn create_supplier_account<C: ConnectionTrait>(
    conn: &C,
    ctx: &TenantContext,
    supplier_id: SupplierId,
) -> Result<ledger_accounts::Model, LedgerError> {
    let now = Utc::now();
    let row = ledger_accounts::ActiveModel {
        id: Set(AccountId::new().into_inner()),
        tenant_id: Set(ctx.tenant_id.into_inner()),
        kind: Set(DbAccountKind::Supplier),
        owner_id: Set(Some(supplier_id.into_inner())),
        name: Set(format!("Supplier {supplier_id}")),
        balance_minor: Set(0),
        opening_balance_minor: Set(0),
        credit_limit_minor: Set(0),
        is_active: Set(true),
        version: Set(0),
        created_at: Set(now),
        updated_at: Set(now),
    }
    .insert(conn)
    .await
    .map_err(store_error)?;

    info!(tenant_id = %ctx.tenant_id, supplier_id = %supplier_id, account_id = %row.id, "supplier account created");
    Ok(row)
}
