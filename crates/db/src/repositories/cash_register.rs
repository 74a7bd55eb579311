//! Cash register sessions.
//!
//! Each session owns an implicit `cash_register` ledger account seeded with
//! the opening float. Sales receipts and manual INCOME/EXPENSE entries are
//! ordinary movements on that account, so the expected balance is always
//! derivable from the movement list. Closing deactivates the account, which
//! freezes it for good.

use chrono::Utc;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, DbErr, EntityTrait,
    PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Set, TransactionTrait,
};
use serde::{Deserialize, Serialize};
use tillbook_core::ledger::{
    CreditLimitPolicy, DocumentLink, LedgerError, LedgerService, Movement, MovementType,
};
use tillbook_core::payment::PaymentMethod;
use tillbook_core::register::{
    ensure_open, scope_key, validate_declared_balance, validate_opening_balance, Reconciliation,
    RegisterEntryKind, RegisterSession, SessionStatus, SessionSummary, SessionTotals,
};
use tillbook_shared::types::{AccountId, ActorId, LocationId, PageRequest, PageResponse, SessionId};
use tillbook_shared::{Amount, LedgerConfig, RegisterScope, TenantContext};
use tracing::{error, info, warn};
use uuid::Uuid;

use super::store::{
    apply_movement, find_session, is_unique_violation, lock_account, minor, store_error,
    with_retry, MovementDraft,
};
use crate::entities::sea_orm_active_enums::{
    AccountKind as DbAccountKind, MovementType as DbMovementType, SessionStatus as DbSessionStatus,
};
use crate::entities::{cash_register_sessions, ledger_accounts, movements};

/// A manual drawer entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegisterEntry {
    /// INCOME or EXPENSE.
    pub kind: RegisterEntryKind,
    /// Positive amount; the sign follows the kind.
    pub amount: Amount,
    /// Free-form category, e.g. `supplies`.
    #[serde(default)]
    pub category: Option<String>,
    /// Description.
    pub concept: String,
    /// External reference.
    #[serde(default)]
    pub reference: Option<String>,
}

/// A movement routed to a session's register account.
struct SessionPosting<'a> {
    movement_type: MovementType,
    amount: Amount,
    concept: &'a str,
    reference: Option<&'a str>,
    category: Option<&'a str>,
    document: Option<&'a DocumentLink>,
}

/// Repository for cash register sessions.
#[derive(Debug, Clone)]
pub struct CashRegisterRepository {
    db: DatabaseConnection,
    scope: RegisterScope,
    max_retries: u32,
}

impl CashRegisterRepository {
    /// Creates a new repository.
    #[must_use]
    pub fn new(db: DatabaseConnection, config: &LedgerConfig) -> Self {
        Self {
            db,
            scope: config.register_scope,
            max_retries: config.max_retries,
        }
    }

    /// Opens a session and its register account.
    ///
    /// # Errors
    ///
    /// `InvalidAmount` for a negative float, `SessionAlreadyOpen` when the
    /// scope already has an open session.
    pub async fn open(
        &self,
        ctx: &TenantContext,
        location_id: LocationId,
        operator_id: ActorId,
        opening_balance: Amount,
    ) -> Result<RegisterSession, LedgerError> {
        validate_opening_balance(opening_balance)?;
        let scope = scope_key(self.scope, location_id, operator_id);
        let opening_minor = minor(opening_balance)?;

        let session = with_retry("open_register", self.max_retries, || {
            self.open_once(ctx, location_id, operator_id, opening_minor, &scope)
        })
        .await?;

        info!(
            tenant_id = %ctx.tenant_id,
            session_id = %session.id,
            %scope,
            %opening_balance,
            "cash register opened"
        );
        Ok(session)
    }

    async fn open_once(
        &self,
        ctx: &TenantContext,
        location_id: LocationId,
        operator_id: ActorId,
        opening_minor: i64,
        scope: &str,
    ) -> Result<RegisterSession, LedgerError> {
        let tenant = ctx.tenant_id.into_inner();
        let session_id = SessionId::new();
        let account_id = AccountId::new();
        let now = Utc::now();
        let already_open = |err: DbErr| {
            if is_unique_violation(&err) {
                LedgerError::SessionAlreadyOpen {
                    scope: scope.to_string(),
                }
            } else {
                store_error(err)
            }
        };

        let txn = self.db.begin().await.map_err(store_error)?;

        ledger_accounts::ActiveModel {
            id: Set(account_id.into_inner()),
            tenant_id: Set(tenant),
            kind: Set(DbAccountKind::CashRegister),
            owner_id: Set(Some(session_id.into_inner())),
            name: Set(format!("Register {scope}")),
            balance_minor: Set(opening_minor),
            opening_balance_minor: Set(opening_minor),
            credit_limit_minor: Set(0),
            is_active: Set(true),
            version: Set(0),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(&txn)
        .await
        .map_err(store_error)?;

        let row = cash_register_sessions::ActiveModel {
            id: Set(session_id.into_inner()),
            tenant_id: Set(tenant),
            location_id: Set(location_id.into_inner()),
            operator_id: Set(operator_id.into_inner()),
            scope_key: Set(scope.to_string()),
            open_scope_key: Set(Some(scope.to_string())),
            status: Set(DbSessionStatus::Open),
            account_id: Set(account_id.into_inner()),
            opening_balance_minor: Set(opening_minor),
            closing_balance_declared_minor: Set(None),
            expected_balance_minor: Set(None),
            discrepancy_minor: Set(None),
            notes: Set(None),
            opened_at: Set(now),
            opened_by: Set(ctx.actor_id.into_inner()),
            closed_at: Set(None),
            closed_by: Set(None),
        }
        .insert(&txn)
        .await
        .map_err(already_open)?;

        txn.commit().await.map_err(already_open)?;
        Ok(row.into())
    }

    /// Finds a session by id.
    ///
    /// # Errors
    ///
    /// `SessionNotFound` outside the caller's tenant.
    pub async fn get(
        &self,
        ctx: &TenantContext,
        session_id: SessionId,
    ) -> Result<RegisterSession, LedgerError> {
        find_session(&self.db, ctx.tenant_id.into_inner(), session_id.into_inner())
            .await
            .map(Into::into)
    }

    /// Returns the open session for the scope of `location_id` / `operator_id`.
    pub async fn current(
        &self,
        ctx: &TenantContext,
        location_id: LocationId,
        operator_id: ActorId,
    ) -> Result<Option<RegisterSession>, LedgerError> {
        let scope = scope_key(self.scope, location_id, operator_id);
        let row = cash_register_sessions::Entity::find()
            .filter(cash_register_sessions::Column::TenantId.eq(ctx.tenant_id.into_inner()))
            .filter(cash_register_sessions::Column::OpenScopeKey.eq(scope))
            .one(&self.db)
            .await
            .map_err(store_error)?;
        Ok(row.map(Into::into))
    }

    /// Lists sessions, newest first.
    pub async fn list(
        &self,
        ctx: &TenantContext,
        status: Option<SessionStatus>,
        page: PageRequest,
    ) -> Result<PageResponse<RegisterSession>, LedgerError> {
        let page = page.normalized();
        let mut query = cash_register_sessions::Entity::find()
            .filter(cash_register_sessions::Column::TenantId.eq(ctx.tenant_id.into_inner()));
        if let Some(status) = status {
            query = query
                .filter(cash_register_sessions::Column::Status.eq(DbSessionStatus::from(status)));
        }

        let total = query.clone().count(&self.db).await.map_err(store_error)?;
        let rows = query
            .order_by_desc(cash_register_sessions::Column::OpenedAt)
            .order_by_desc(cash_register_sessions::Column::Id)
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

    /// Records a manual INCOME or EXPENSE on an open session.
    ///
    /// # Errors
    ///
    /// `InvalidAmount` unless the amount is positive, `SessionAlreadyClosed`,
    /// `InsufficientFunds` when an expense exceeds the drawer.
    pub async fn record_transaction(
        &self,
        ctx: &TenantContext,
        session_id: SessionId,
        entry: &RegisterEntry,
    ) -> Result<Movement, LedgerError> {
        if !entry.amount.is_positive() {
            return Err(LedgerError::InvalidAmount(format!(
                "register entry amount must be positive, got {}",
                entry.amount
            )));
        }
        let concept = LedgerService::validate_concept(&entry.concept)?;
        let signed = match entry.kind {
            RegisterEntryKind::Income => entry.amount,
            RegisterEntryKind::Expense => -entry.amount,
        };
        let posting = SessionPosting {
            movement_type: entry.kind.movement_type(),
            amount: signed,
            concept: &concept,
            reference: entry.reference.as_deref(),
            category: entry.category.as_deref().map(str::trim).filter(|c| !c.is_empty()),
            document: None,
        };
        self.post(ctx, session_id, &posting).await
    }

    /// Records a single-leg cash sale on an open session.
    ///
    /// # Errors
    ///
    /// `InvalidAmount` unless the amount is positive, `SessionAlreadyClosed`.
    pub async fn record_sale_receipt(
        &self,
        ctx: &TenantContext,
        session_id: SessionId,
        amount: Amount,
        concept: &str,
        document: Option<&DocumentLink>,
    ) -> Result<Movement, LedgerError> {
        if !amount.is_positive() {
            return Err(LedgerError::InvalidAmount(format!(
                "sale receipt amount must be positive, got {amount}"
            )));
        }
        let concept = LedgerService::validate_concept(concept)?;
        let posting = SessionPosting {
            movement_type: MovementType::Received,
            amount,
            concept: &concept,
            reference: None,
            category: Some(PaymentMethod::Cash.as_str()),
            document,
        };
        self.post(ctx, session_id, &posting).await
    }

    async fn post(
        &self,
        ctx: &TenantContext,
        session_id: SessionId,
        posting: &SessionPosting<'_>,
    ) -> Result<Movement, LedgerError> {
        let movement = with_retry("register_post", self.max_retries, || {
            self.post_once(ctx, session_id, posting)
        })
        .await?;

        info!(
            tenant_id = %ctx.tenant_id,
            session_id = %session_id,
            movement_type = %movement.movement_type,
            amount = %movement.amount,
            balance_after = %movement.balance_after,
            "register movement posted"
        );
        Ok(movement)
    }

    async fn post_once(
        &self,
        ctx: &TenantContext,
        session_id: SessionId,
        posting: &SessionPosting<'_>,
    ) -> Result<Movement, LedgerError> {
        let tenant = ctx.tenant_id.into_inner();
        let txn = self.db.begin().await.map_err(store_error)?;

        let session = find_session(&txn, tenant, session_id.into_inner()).await?;
        ensure_open(session.id, session.status.into())?;
        let row = lock_account(&txn, tenant, session.account_id).await?;

        let draft = MovementDraft {
            reference: posting.reference,
            category: posting.category,
            document: posting.document,
            session_id: Some(session_id),
            ..MovementDraft::new(posting.movement_type, posting.amount, posting.concept)
        };
        // Register kinds never consult the credit policy.
        let movement = apply_movement(&txn, ctx, &CreditLimitPolicy, row, &draft).await?;

        txn.commit().await.map_err(store_error)?;
        Ok(movement)
    }

    /// Derives the session's running totals and expected balance.
    ///
    /// # Errors
    ///
    /// `SessionNotFound` outside the caller's tenant.
    pub async fn summary(
        &self,
        ctx: &TenantContext,
        session_id: SessionId,
    ) -> Result<SessionSummary, LedgerError> {
        let txn = self.db.begin().await.map_err(store_error)?;
        let session = find_session(&txn, ctx.tenant_id.into_inner(), session_id.into_inner()).await?;
        let totals = session_totals(&txn, session.account_id).await?;
        txn.commit().await.map_err(store_error)?;

        let session = RegisterSession::from(session);
        let expected_balance = totals.expected_balance(session.opening_balance);
        Ok(SessionSummary {
            session,
            totals,
            expected_balance,
        })
    }

    /// Closes a session with the counted cash.
    ///
    /// # Errors
    ///
    /// `InvalidAmount` for a negative count, `SessionAlreadyClosed` if it was
    /// closed before; the stored figures of the first close are kept.
    ///
    /// The reconciliation uses the movement-derived total. If the register
    /// account's stored balance disagrees with it, the close still goes
    /// through and the mismatch is appended to the session notes.
    pub async fn close(
        &self,
        ctx: &TenantContext,
        session_id: SessionId,
        declared_balance: Amount,
        notes: Option<String>,
    ) -> Result<RegisterSession, LedgerError> {
        validate_declared_balance(declared_balance)?;
        let notes = notes.map(|n| n.trim().to_string()).filter(|n| !n.is_empty());

        let session = with_retry("close_register", self.max_retries, || {
            self.close_once(ctx, session_id, declared_balance, notes.as_deref())
        })
        .await?;

        if let Some(discrepancy) = session.discrepancy.filter(|d| !d.is_zero()) {
            warn!(
                tenant_id = %ctx.tenant_id,
                session_id = %session_id,
                %discrepancy,
                "cash register closed with a discrepancy"
            );
        }
        info!(
            tenant_id = %ctx.tenant_id,
            session_id = %session_id,
            %declared_balance,
            "cash register closed"
        );
        Ok(session)
    }

    async fn close_once(
        &self,
        ctx: &TenantContext,
        session_id: SessionId,
        declared_balance: Amount,
        notes: Option<&str>,
    ) -> Result<RegisterSession, LedgerError> {
        let tenant = ctx.tenant_id.into_inner();
        let id = session_id.into_inner();
        let txn = self.db.begin().await.map_err(store_error)?;

        let session = find_session(&txn, tenant, id).await?;
        ensure_open(session.id, session.status.into())?;
        let account = lock_account(&txn, tenant, session.account_id).await?;

        let totals = session_totals(&txn, session.account_id).await?;
        let opening = Amount::from_minor_units(session.opening_balance_minor);
        let expected = totals.expected_balance(opening);
        let ledger_balance = Amount::from_minor_units(account.balance_minor);
        let notes = if expected == ledger_balance {
            notes.map(str::to_string)
        } else {
            error!(
                session_id = %session_id,
                %expected,
                balance = %ledger_balance,
                "register account balance disagrees with its movements"
            );
            let mismatch =
                format!("ledger balance {ledger_balance} differs from movement total {expected}");
            Some(match notes {
                Some(text) => format!("{text}\n{mismatch}"),
                None => mismatch,
            })
        };
        let reconciliation = Reconciliation::new(expected, declared_balance);
        let now = Utc::now();

        let closed = cash_register_sessions::Entity::update_many()
            .col_expr(
                cash_register_sessions::Column::Status,
                Expr::value(DbSessionStatus::Closed),
            )
            .col_expr(
                cash_register_sessions::Column::OpenScopeKey,
                Expr::value(Option::<String>::None),
            )
            .col_expr(
                cash_register_sessions::Column::ClosingBalanceDeclaredMinor,
                Expr::value(minor(reconciliation.declared_balance)?),
            )
            .col_expr(
                cash_register_sessions::Column::ExpectedBalanceMinor,
                Expr::value(minor(reconciliation.expected_balance)?),
            )
            .col_expr(
                cash_register_sessions::Column::DiscrepancyMinor,
                Expr::value(minor(reconciliation.discrepancy)?),
            )
            .col_expr(
                cash_register_sessions::Column::Notes,
                Expr::value(notes),
            )
            .col_expr(cash_register_sessions::Column::ClosedAt, Expr::value(Some(now)))
            .col_expr(
                cash_register_sessions::Column::ClosedBy,
                Expr::value(Some(ctx.actor_id.into_inner())),
            )
            .filter(cash_register_sessions::Column::Id.eq(id))
            .filter(cash_register_sessions::Column::Status.eq(DbSessionStatus::Open))
            .exec(&txn)
            .await
            .map_err(store_error)?;
        if closed.rows_affected == 0 {
            return Err(LedgerError::SessionAlreadyClosed(id));
        }

        let frozen = ledger_accounts::Entity::update_many()
            .col_expr(ledger_accounts::Column::IsActive, Expr::value(false))
            .col_expr(ledger_accounts::Column::UpdatedAt, Expr::value(now))
            .filter(ledger_accounts::Column::Id.eq(account.id))
            .filter(ledger_accounts::Column::Version.eq(account.version))
            .exec(&txn)
            .await
            .map_err(store_error)?;
        if frozen.rows_affected == 0 {
            return Err(LedgerError::ConcurrencyConflict(format!(
                "register account {} moved while closing",
                account.id
            )));
        }

        let row = find_session(&txn, tenant, id).await?;
        txn.commit().await.map_err(store_error)?;
        Ok(row.into())
    }
}

/// Folds the register account's movements into session totals.
async fn session_totals<C: ConnectionTrait>(
    conn: &C,
    account_id: Uuid,
) -> Result<SessionTotals, LedgerError> {
    let rows: Vec<(DbMovementType, i64)> = movements::Entity::find()
        .select_only()
        .column(movements::Column::MovementType)
        .column(movements::Column::AmountMinor)
        .filter(movements::Column::AccountId.eq(account_id))
        .order_by_asc(movements::Column::Sequence)
        .into_tuple()
        .all(conn)
        .await
        .map_err(store_error)?;

    Ok(SessionTotals::from_movements(rows.into_iter().map(
        |(movement_type, amount)| (movement_type.into(), Amount::from_minor_units(amount)),
    )))
}
