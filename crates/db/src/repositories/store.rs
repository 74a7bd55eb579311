//! Store plumbing shared by the ledger repositories.
//!
//! - `DbErr` → `LedgerError` mapping with retryable conditions detected
//! - bounded retry of a whole transactional operation
//! - row conversions between entities and core types
//! - the in-transaction posting primitive every balance change goes through

use std::future::Future;
use std::time::Duration;

use chrono::Utc;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DbBackend, DbErr, EntityTrait, QueryFilter,
    QuerySelect, Set, SqlErr,
};
use tillbook_core::ledger::{
    AccountKind, CreditPolicy, DocumentLink, LedgerAccount, LedgerError, LedgerService, Movement,
    MovementType,
};
use tillbook_core::register::RegisterSession;
use tillbook_shared::types::{MovementId, SessionId, TransferGroupId};
use tillbook_shared::{Amount, TenantContext};
use tracing::{error, warn};
use uuid::Uuid;

use crate::entities::sea_orm_active_enums::AccountKind as DbAccountKind;
use crate::entities::{cash_register_sessions, ledger_accounts, movements};

/// Substrings of store errors that mean "lost a race, try again".
const RETRYABLE_MESSAGES: [&str; 6] = [
    "could not serialize access",
    "deadlock detected",
    "database is locked",
    "database table is locked",
    "40001",
    "40p01",
];

/// True for unique-constraint violations.
pub(crate) fn is_unique_violation(err: &DbErr) -> bool {
    matches!(err.sql_err(), Some(SqlErr::UniqueConstraintViolation(_)))
}

/// True when the failure was caused by a concurrent writer.
pub(crate) fn is_retryable_store_error(err: &DbErr) -> bool {
    if is_unique_violation(err) {
        return true;
    }
    let message = err.to_string().to_ascii_lowercase();
    RETRYABLE_MESSAGES.iter().any(|needle| message.contains(needle))
}

/// Folds a store error into the ledger taxonomy.
pub(crate) fn store_error(err: DbErr) -> LedgerError {
    if is_retryable_store_error(&err) {
        return LedgerError::ConcurrencyConflict(err.to_string());
    }
    error!(error = %err, "store operation failed");
    LedgerError::Database(err.to_string())
}

/// Converts an amount to storage cents.
pub(crate) fn minor(amount: Amount) -> Result<i64, LedgerError> {
    amount
        .to_minor_units()
        .map_err(|e| LedgerError::InvalidAmount(e.to_string()))
}

fn backoff(attempt: u32) -> Duration {
    Duration::from_millis(5u64 << attempt.min(6))
}

/// Runs `op` until it succeeds, fails with a non-retryable error, or
/// `max_attempts` is reached.
///
/// Each attempt must open and commit its own transaction so a retry always
/// starts from a fresh read.
pub(crate) async fn with_retry<T, F, Fut>(
    operation: &'static str,
    max_attempts: u32,
    mut op: F,
) -> Result<T, LedgerError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, LedgerError>>,
{
    let max_attempts = max_attempts.max(1);
    let mut attempt = 1;
    loop {
        match op().await {
            Err(err) if err.is_retryable() && attempt < max_attempts => {
                warn!(operation, attempt, error = %err, "concurrency conflict, retrying");
                tokio::time::sleep(backoff(attempt)).await;
                attempt += 1;
            }
            Err(err) if err.is_retryable() => {
                warn!(operation, attempt, error = %err, "giving up after repeated conflicts");
                return Err(LedgerError::ConcurrencyConflict(format!(
                    "{operation} failed after {attempt} attempts: {err}"
                )));
            }
            other => return other,
        }
    }
}

impl From<ledger_accounts::Model> for LedgerAccount {
    fn from(m: ledger_accounts::Model) -> Self {
        Self {
            id: m.id.into(),
            tenant_id: m.tenant_id.into(),
            kind: m.kind.into(),
            owner_id: m.owner_id,
            name: m.name,
            balance: Amount::from_minor_units(m.balance_minor),
            opening_balance: Amount::from_minor_units(m.opening_balance_minor),
            credit_limit: Amount::from_minor_units(m.credit_limit_minor),
            is_active: m.is_active,
            version: m.version,
        }
    }
}

impl From<movements::Model> for Movement {
    fn from(m: movements::Model) -> Self {
        let document = m
            .document_type
            .zip(m.document_id)
            .map(|(document_type, document_id)| DocumentLink {
                document_type,
                document_id,
            });
        Self {
            id: m.id.into(),
            tenant_id: m.tenant_id.into(),
            account_id: m.account_id.into(),
            movement_type: m.movement_type.into(),
            amount: Amount::from_minor_units(m.amount_minor),
            sequence: m.sequence,
            balance_before: Amount::from_minor_units(m.balance_before_minor),
            balance_after: Amount::from_minor_units(m.balance_after_minor),
            concept: m.concept,
            reference: m.reference,
            category: m.category,
            document,
            session_id: m.session_id.map(Into::into),
            transfer_group_id: m.transfer_group_id.map(Into::into),
            actor_id: m.actor_id.into(),
            created_at: m.created_at,
        }
    }
}

impl From<cash_register_sessions::Model> for RegisterSession {
    fn from(m: cash_register_sessions::Model) -> Self {
        Self {
            id: m.id.into(),
            tenant_id: m.tenant_id.into(),
            location_id: m.location_id.into(),
            operator_id: m.operator_id.into(),
            scope_key: m.scope_key,
            status: m.status.into(),
            account_id: m.account_id.into(),
            opening_balance: Amount::from_minor_units(m.opening_balance_minor),
            closing_balance_declared: m.closing_balance_declared_minor.map(Amount::from_minor_units),
            expected_balance: m.expected_balance_minor.map(Amount::from_minor_units),
            discrepancy: m.discrepancy_minor.map(Amount::from_minor_units),
            notes: m.notes,
            opened_at: m.opened_at,
            opened_by: m.opened_by.into(),
            closed_at: m.closed_at,
            closed_by: m.closed_by.map(Into::into),
        }
    }
}

/// Reads an account row inside the caller's transaction.
///
/// Takes a row lock (`SELECT … FOR UPDATE`) on backends that support it; on
/// SQLite the write lock taken by the transaction plus the version guard
/// serialize writers instead.
pub(crate) async fn lock_account<C: ConnectionTrait>(
    conn: &C,
    tenant_id: Uuid,
    account_id: Uuid,
) -> Result<ledger_accounts::Model, LedgerError> {
    let mut query = ledger_accounts::Entity::find_by_id(account_id)
        .filter(ledger_accounts::Column::TenantId.eq(tenant_id));
    if conn.get_database_backend() != DbBackend::Sqlite {
        query = query.lock_exclusive();
    }
    query
        .one(conn)
        .await
        .map_err(store_error)?
        .ok_or(LedgerError::AccountNotFound(account_id))
}

/// Reads the current account of a customer or supplier, locked.
pub(crate) async fn lock_owner_account<C: ConnectionTrait>(
    conn: &C,
    tenant_id: Uuid,
    kind: AccountKind,
    owner_id: Uuid,
) -> Result<Option<ledger_accounts::Model>, LedgerError> {
    let mut query = ledger_accounts::Entity::find()
        .filter(ledger_accounts::Column::TenantId.eq(tenant_id))
        .filter(ledger_accounts::Column::Kind.eq(DbAccountKind::from(kind)))
        .filter(ledger_accounts::Column::OwnerId.eq(owner_id));
    if conn.get_database_backend() != DbBackend::Sqlite {
        query = query.lock_exclusive();
    }
    query.one(conn).await.map_err(store_error)
}

/// Reads a register session of the caller's tenant.
pub(crate) async fn find_session<C: ConnectionTrait>(
    conn: &C,
    tenant_id: Uuid,
    session_id: Uuid,
) -> Result<cash_register_sessions::Model, LedgerError> {
    cash_register_sessions::Entity::find_by_id(session_id)
        .filter(cash_register_sessions::Column::TenantId.eq(tenant_id))
        .one(conn)
        .await
        .map_err(store_error)?
        .ok_or(LedgerError::SessionNotFound(session_id))
}

/// One movement to be applied inside an open transaction.
#[derive(Debug, Clone)]
pub(crate) struct MovementDraft<'a> {
    pub movement_type: MovementType,
    pub amount: Amount,
    /// Already trimmed and validated.
    pub concept: &'a str,
    pub reference: Option<&'a str>,
    pub category: Option<&'a str>,
    pub document: Option<&'a DocumentLink>,
    pub session_id: Option<SessionId>,
    pub transfer_group_id: Option<TransferGroupId>,
}

impl<'a> MovementDraft<'a> {
    pub(crate) fn new(movement_type: MovementType, amount: Amount, concept: &'a str) -> Self {
        Self {
            movement_type,
            amount,
            concept,
            reference: None,
            category: None,
            document: None,
            session_id: None,
            transfer_group_id: None,
        }
    }
}

/// Applies one movement to a freshly read account row.
///
/// Inserts the movement with its snapshots and `sequence = version + 1`, then
/// moves the account forward guarded by `WHERE version = old`. A lost race
/// surfaces as `ConcurrencyConflict`; the caller's transaction must then be
/// dropped and the whole operation retried.
pub(crate) async fn apply_movement<C: ConnectionTrait>(
    conn: &C,
    ctx: &TenantContext,
    policy: &dyn CreditPolicy,
    account_row: ledger_accounts::Model,
    draft: &MovementDraft<'_>,
) -> Result<Movement, LedgerError> {
    let account = LedgerAccount::from(account_row);
    let plan = LedgerService::plan_post(&account, draft.movement_type, draft.amount, policy)?;
    let now = Utc::now();

    let row = movements::ActiveModel {
        id: Set(MovementId::new().into_inner()),
        tenant_id: Set(ctx.tenant_id.into_inner()),
        account_id: Set(account.id.into_inner()),
        movement_type: Set(draft.movement_type.into()),
        amount_minor: Set(minor(draft.amount)?),
        sequence: Set(plan.sequence),
        balance_before_minor: Set(minor(plan.balance_before)?),
        balance_after_minor: Set(minor(plan.balance_after)?),
        concept: Set(draft.concept.to_string()),
        reference: Set(draft.reference.map(str::to_string)),
        category: Set(draft.category.map(str::to_string)),
        document_type: Set(draft.document.map(|d| d.document_type.clone())),
        document_id: Set(draft.document.map(|d| d.document_id)),
        session_id: Set(draft.session_id.map(SessionId::into_inner)),
        transfer_group_id: Set(draft.transfer_group_id.map(TransferGroupId::into_inner)),
        actor_id: Set(ctx.actor_id.into_inner()),
        created_at: Set(now),
    }
    .insert(conn)
    .await
    .map_err(store_error)?;

    let updated = ledger_accounts::Entity::update_many()
        .col_expr(
            ledger_accounts::Column::BalanceMinor,
            Expr::value(minor(plan.balance_after)?),
        )
        .col_expr(ledger_accounts::Column::Version, Expr::value(plan.new_version))
        .col_expr(ledger_accounts::Column::UpdatedAt, Expr::value(now))
        .filter(ledger_accounts::Column::Id.eq(account.id.into_inner()))
        .filter(ledger_accounts::Column::Version.eq(plan.expected_version))
        .exec(conn)
        .await
        .map_err(store_error)?;

    if updated.rows_affected == 0 {
        return Err(LedgerError::ConcurrencyConflict(format!(
            "account {} moved past version {}",
            account.id, plan.expected_version
        )));
    }

    Ok(row.into())
}
