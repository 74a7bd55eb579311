//! Ledger account snapshot and balance view.

use serde::{Deserialize, Serialize};
use tillbook_shared::types::{AccountId, TenantId};
use tillbook_shared::Amount;
use uuid::Uuid;

use super::kind::AccountKind;

/// State of a ledger account as read inside a posting transaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerAccount {
    /// Account id.
    pub id: AccountId,
    /// Owning tenant.
    pub tenant_id: TenantId,
    /// Account kind.
    pub kind: AccountKind,
    /// Customer or supplier id the account belongs to.
    pub owner_id: Option<Uuid>,
    /// Display name.
    pub name: String,
    /// Current running balance.
    pub balance: Amount,
    /// Chain seed.
    pub opening_balance: Amount,
    /// Customer credit limit; zero means unlimited.
    pub credit_limit: Amount,
    /// Inactive accounts only accept reconciling movements.
    pub is_active: bool,
    /// Number of movements; the optimistic concurrency token.
    pub version: i64,
}

impl LedgerAccount {
    /// Credit still available to a customer, `None` when unlimited or not a customer.
    #[must_use]
    pub fn available_credit(&self) -> Option<Amount> {
        if !self.kind.enforces_credit_policy() || self.credit_limit.is_zero() {
            return None;
        }
        Some(self.credit_limit + self.balance)
    }

    /// Public balance view.
    #[must_use]
    pub fn balance_view(&self) -> BalanceView {
        BalanceView {
            account_id: self.id,
            kind: self.kind,
            balance: self.balance,
            credit_limit: self.credit_limit,
            is_active: self.is_active,
            available_credit: self.available_credit(),
            version: self.version,
        }
    }
}

/// Result of a balance query.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BalanceView {
    /// Account id.
    pub account_id: AccountId,
    /// Account kind.
    pub kind: AccountKind,
    /// Current balance.
    pub balance: Amount,
    /// Credit limit (zero = unlimited).
    pub credit_limit: Amount,
    /// Active flag.
    pub is_active: bool,
    /// `credit_limit + balance` for limited customers.
    pub available_credit: Option<Amount>,
    /// Movement count.
    pub version: i64,
}
