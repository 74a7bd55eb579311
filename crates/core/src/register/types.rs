//! Cash register session types.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tillbook_shared::types::{AccountId, ActorId, LocationId, SessionId, TenantId};
use tillbook_shared::{Amount, RegisterScope};

use crate::ledger::MovementType;

/// Lifecycle of a session. Closed is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    /// Accepting movements.
    Open,
    /// Reconciled and frozen.
    Closed,
}

impl SessionStatus {
    /// Stable wire/storage name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Open => "open",
            Self::Closed => "closed",
        }
    }
}

impl fmt::Display for SessionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SessionStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "open" => Ok(Self::Open),
            "closed" => Ok(Self::Closed),
            other => Err(format!("unknown session status '{other}'")),
        }
    }
}

/// Manual register transaction kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RegisterEntryKind {
    /// Cash put into the drawer.
    Income,
    /// Cash taken out of the drawer.
    Expense,
}

impl RegisterEntryKind {
    /// Movement type written for this entry.
    #[must_use]
    pub const fn movement_type(self) -> MovementType {
        match self {
            Self::Income => MovementType::Income,
            Self::Expense => MovementType::Expense,
        }
    }
}

/// Key under which at most one session may be open.
#[must_use]
pub fn scope_key(scope: RegisterScope, location_id: LocationId, operator_id: ActorId) -> String {
    match scope {
        RegisterScope::Location => format!("location:{location_id}"),
        RegisterScope::Operator => format!("operator:{operator_id}"),
    }
}

/// A cash register session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegisterSession {
    /// Session id.
    pub id: SessionId,
    /// Owning tenant.
    pub tenant_id: TenantId,
    /// Point-of-sale location.
    pub location_id: LocationId,
    /// Operator who opened the session.
    pub operator_id: ActorId,
    /// Uniqueness scope key.
    pub scope_key: String,
    /// Lifecycle status.
    pub status: SessionStatus,
    /// Implicit register account.
    pub account_id: AccountId,
    /// Cash in the drawer at open.
    pub opening_balance: Amount,
    /// Cash counted at close.
    pub closing_balance_declared: Option<Amount>,
    /// Ledger-derived balance at close.
    pub expected_balance: Option<Amount>,
    /// `declared − expected`.
    pub discrepancy: Option<Amount>,
    /// Free text entered at close.
    pub notes: Option<String>,
    /// Open time.
    pub opened_at: DateTime<Utc>,
    /// Who opened it.
    pub opened_by: ActorId,
    /// Close time.
    pub closed_at: Option<DateTime<Utc>>,
    /// Who closed it.
    pub closed_by: Option<ActorId>,
}

/// Figures derived from a session's movements.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionTotals {
    /// Σ RECEIVED (cash sales).
    pub sales_cash_total: Amount,
    /// Number of cash sales.
    pub sales_count: u32,
    /// Σ INCOME.
    pub income_total: Amount,
    /// Number of income entries.
    pub income_count: u32,
    /// Σ |EXPENSE|.
    pub expense_total: Amount,
    /// Number of expense entries.
    pub expense_count: u32,
}

/// Session header plus derived figures.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionSummary {
    /// The session.
    pub session: RegisterSession,
    /// Movement totals.
    pub totals: SessionTotals,
    /// `opening + sales + income − expense`.
    pub expected_balance: Amount,
}
