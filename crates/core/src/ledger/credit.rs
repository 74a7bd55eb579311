//! Credit policy evaluated before customer debits.

use tillbook_shared::Amount;

use super::account::LedgerAccount;

/// Why a credit policy refused a debit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CreditDenial {
    /// The account is inactive.
    Inactive,
    /// The debit would exceed the limit.
    OverLimit {
        /// Credit available before the debit.
        available: Amount,
        /// Magnitude of the debit.
        attempted: Amount,
    },
}

impl std::fmt::Display for CreditDenial {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Inactive => f.write_str("account inactive"),
            Self::OverLimit {
                available,
                attempted,
            } => write!(
                f,
                "insufficient credit: available {available}, attempted {attempted}"
            ),
        }
    }
}

/// Outcome of a credit policy evaluation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CreditDecision {
    /// The debit may proceed.
    Allow,
    /// The debit is refused.
    Deny(CreditDenial),
}

impl CreditDecision {
    /// Returns true if the decision allows the debit.
    #[must_use]
    pub fn is_allowed(&self) -> bool {
        matches!(self, Self::Allow)
    }
}

/// Rule deciding whether a customer debit is allowed.
///
/// Implementations must be pure: the engine calls them inside an open store
/// transaction with the freshly read account.
pub trait CreditPolicy: Send + Sync {
    /// Evaluates a debit of `attempted` that would leave the account at `prospective`.
    fn evaluate(&self, account: &LedgerAccount, attempted: Amount, prospective: Amount) -> CreditDecision;
}

/// Default policy: a zero limit is unlimited, otherwise the balance may not
/// fall below `-credit_limit`.
#[derive(Debug, Clone, Copy, Default)]
pub struct CreditLimitPolicy;

impl CreditPolicy for CreditLimitPolicy {
    fn evaluate(&self, account: &LedgerAccount, attempted: Amount, prospective: Amount) -> CreditDecision {
        if !account.is_active {
            return CreditDecision::Deny(CreditDenial::Inactive);
        }
        if account.credit_limit.is_zero() || prospective >= -account.credit_limit {
            return CreditDecision::Allow;
        }
        CreditDecision::Deny(CreditDenial::OverLimit {
            available: account.credit_limit + account.balance,
            attempted,
        })
    }
}
