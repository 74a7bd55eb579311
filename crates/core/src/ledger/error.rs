//! Ledger error types for validation, policy and state errors.
//!
//! Every failure of a balance-changing operation maps to one of these
//! variants. Nothing is persisted when one is returned.

use thiserror::Error;
use tillbook_shared::Amount;
use uuid::Uuid;

use super::kind::AccountKind;
use super::movement::MovementType;

/// Errors that can occur during ledger operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LedgerError {
    // ========== Validation Errors ==========
    /// Amount is zero, has the wrong sign, or is out of range.
    #[error("Invalid amount: {0}")]
    InvalidAmount(String),

    /// Concept text is empty after trimming.
    #[error("Movement concept is required")]
    MissingConcept,

    /// Movement type is not defined for the account kind.
    #[error("Movement type {movement_type} is not allowed on {kind} account {account_id}")]
    MovementTypeNotAllowed {
        /// The target account.
        account_id: Uuid,
        /// The account kind.
        kind: AccountKind,
        /// The rejected movement type.
        movement_type: MovementType,
    },

    /// Sum of payment legs does not match the total due.
    #[error("Payment legs total {leg_total} does not match total due {total_due}")]
    UnbalancedPayment {
        /// Amount that had to be settled.
        total_due: Amount,
        /// Sum of the submitted legs.
        leg_total: Amount,
    },

    /// An ACCOUNT payment leg was submitted without a customer.
    #[error("Payment leg {leg_index} uses ACCOUNT but no customer was given")]
    MissingCustomer {
        /// Zero-based index of the offending leg.
        leg_index: usize,
    },

    /// A payment leg failed while posting; every leg was rolled back.
    #[error("Payment leg {leg_index} rejected: {source}")]
    LegRejected {
        /// Zero-based index of the offending leg.
        leg_index: usize,
        /// Why the leg was rejected.
        source: Box<LedgerError>,
    },

    // ========== Account Errors ==========
    /// Account not found in the caller's tenant.
    #[error("Account not found: {0}")]
    AccountNotFound(Uuid),

    /// Account is inactive and the movement type is not a reconciling one.
    #[error("Account {0} is inactive")]
    AccountInactive(Uuid),

    /// Account definition is not acceptable (kind, owner, name or limit).
    #[error("Invalid account: {0}")]
    InvalidAccount(String),

    /// The owner already has an account of that kind.
    #[error("A {kind} account already exists for owner {owner_id}")]
    AccountAlreadyExists {
        /// Account kind.
        kind: AccountKind,
        /// Customer or supplier id.
        owner_id: Uuid,
    },

    /// Account cannot be deleted because movements reference it.
    #[error("Account {0} has movements and cannot be deleted")]
    AccountHasMovements(Uuid),

    // ========== Policy Errors ==========
    /// Customer charge would exceed the credit limit.
    #[error("Account {account_id}: insufficient credit: available {available}, attempted {attempted}")]
    InsufficientCredit {
        /// The customer account.
        account_id: Uuid,
        /// Credit still available before the charge.
        available: Amount,
        /// Magnitude of the rejected charge.
        attempted: Amount,
    },

    /// Debit would take a non-negative account below zero.
    #[error("Account {account_id}: insufficient funds: balance {balance}, attempted {attempted}")]
    InsufficientFunds {
        /// The account.
        account_id: Uuid,
        /// Balance before the rejected debit.
        balance: Amount,
        /// Magnitude of the rejected debit.
        attempted: Amount,
    },

    // ========== Register Session Errors ==========
    /// Register session not found in the caller's tenant.
    #[error("Cash register session not found: {0}")]
    SessionNotFound(Uuid),

    /// The scope already has an open session.
    #[error("A cash register session is already open for {scope}")]
    SessionAlreadyOpen {
        /// Scope key, e.g. `location:<id>`.
        scope: String,
    },

    /// The session has been closed.
    #[error("Cash register session {0} is already closed")]
    SessionAlreadyClosed(Uuid),

    // ========== Concurrency Errors ==========
    /// A concurrent writer won the race on the account; retry from a fresh read.
    #[error("Concurrent modification detected: {0}")]
    ConcurrencyConflict(String),

    // ========== Store Errors ==========
    /// Database error.
    #[error("Database error: {0}")]
    Database(String),

    /// Internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl LedgerError {
    /// Returns the error code for API responses.
    #[must_use]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::InvalidAmount(_) => "INVALID_AMOUNT",
            Self::MissingConcept => "MISSING_CONCEPT",
            Self::MovementTypeNotAllowed { .. } => "MOVEMENT_TYPE_NOT_ALLOWED",
            Self::UnbalancedPayment { .. } => "UNBALANCED_PAYMENT",
            Self::MissingCustomer { .. } => "MISSING_CUSTOMER",
            Self::LegRejected { source, .. } => source.error_code(),
            Self::AccountNotFound(_) => "ACCOUNT_NOT_FOUND",
            Self::AccountInactive(_) => "ACCOUNT_INACTIVE",
            Self::InvalidAccount(_) => "INVALID_ACCOUNT",
            Self::AccountAlreadyExists { .. } => "ACCOUNT_ALREADY_EXISTS",
            Self::AccountHasMovements(_) => "ACCOUNT_HAS_MOVEMENTS",
            Self::InsufficientCredit { .. } => "INSUFFICIENT_CREDIT",
            Self::InsufficientFunds { .. } => "INSUFFICIENT_FUNDS",
            Self::SessionNotFound(_) => "SESSION_NOT_FOUND",
            Self::SessionAlreadyOpen { .. } => "SESSION_ALREADY_OPEN",
            Self::SessionAlreadyClosed(_) => "SESSION_ALREADY_CLOSED",
            Self::ConcurrencyConflict(_) => "CONCURRENCY_CONFLICT",
            Self::Database(_) => "DATABASE_ERROR",
            Self::Internal(_) => "INTERNAL_ERROR",
        }
    }

    /// Returns the HTTP status code for this error.
    #[must_use]
    pub fn http_status_code(&self) -> u16 {
        match self {
            Self::LegRejected { source, .. } => source.http_status_code(),

            // 400 Bad Request - malformed input
            Self::InvalidAmount(_)
            | Self::MissingConcept
            | Self::UnbalancedPayment { .. }
            | Self::MissingCustomer { .. }
            | Self::InvalidAccount(_) => 400,

            // 404 Not Found
            Self::AccountNotFound(_) | Self::SessionNotFound(_) => 404,

            // 409 Conflict - state and concurrency
            Self::AccountHasMovements(_)
            | Self::AccountAlreadyExists { .. }
            | Self::SessionAlreadyOpen { .. }
            | Self::SessionAlreadyClosed(_)
            | Self::ConcurrencyConflict(_) => 409,

            // 422 Unprocessable - business rules
            Self::MovementTypeNotAllowed { .. }
            | Self::AccountInactive(_)
            | Self::InsufficientCredit { .. }
            | Self::InsufficientFunds { .. } => 422,

            // 500 Internal Server Error
            Self::Database(_) | Self::Internal(_) => 500,
        }
    }

    /// Index of the payment leg the error belongs to, if any.
    #[must_use]
    pub const fn leg_index(&self) -> Option<usize> {
        match self {
            Self::MissingCustomer { leg_index } | Self::LegRejected { leg_index, .. } => {
                Some(*leg_index)
            }
            _ => None,
        }
    }

    /// The underlying error with any leg context stripped.
    #[must_use]
    pub fn cause(&self) -> &Self {
        match self {
            Self::LegRejected { source, .. } => source.cause(),
            other => other,
        }
    }

    /// Returns true if this error is retryable.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::ConcurrencyConflict(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_error_codes() {
        assert_eq!(LedgerError::MissingConcept.error_code(), "MISSING_CONCEPT");
        assert_eq!(
            LedgerError::UnbalancedPayment {
                total_due: Amount::new(dec!(100)),
                leg_total: Amount::new(dec!(99)),
            }
            .error_code(),
            "UNBALANCED_PAYMENT"
        );
        assert_eq!(
            LedgerError::SessionAlreadyClosed(Uuid::nil()).error_code(),
            "SESSION_ALREADY_CLOSED"
        );
    }

    #[test]
    fn test_http_status_codes() {
        assert_eq!(LedgerError::InvalidAmount("zero".into()).http_status_code(), 400);
        assert_eq!(LedgerError::AccountNotFound(Uuid::nil()).http_status_code(), 404);
        assert_eq!(
            LedgerError::SessionAlreadyOpen { scope: "location:x".into() }.http_status_code(),
            409
        );
        assert_eq!(LedgerError::AccountInactive(Uuid::nil()).http_status_code(), 422);
        assert_eq!(LedgerError::Database("test".into()).http_status_code(), 500);
    }

    #[test]
    fn test_retryable_errors() {
        assert!(LedgerError::ConcurrencyConflict("version moved".into()).is_retryable());
        assert!(!LedgerError::MissingConcept.is_retryable());
        assert!(!LedgerError::Database("boom".into()).is_retryable());
    }

    #[test]
    fn test_leg_rejection_keeps_the_cause() {
        let id = Uuid::nil();
        let err = LedgerError::LegRejected {
            leg_index: 2,
            source: Box::new(LedgerError::AccountInactive(id)),
        };
        assert_eq!(err.error_code(), "ACCOUNT_INACTIVE");
        assert_eq!(err.http_status_code(), 422);
        assert_eq!(err.leg_index(), Some(2));
        assert_eq!(err.cause(), &LedgerError::AccountInactive(id));
        assert!(!err.is_retryable());
        assert_eq!(
            err.to_string(),
            "Payment leg 2 rejected: Account 00000000-0000-0000-0000-000000000000 is inactive"
        );
        assert_eq!(LedgerError::MissingConcept.leg_index(), None);
    }

    #[test]
    fn test_insufficient_credit_message() {
        let err = LedgerError::InsufficientCredit {
            account_id: Uuid::nil(),
            available: Amount::ZERO,
            attempted: Amount::new(dec!(0.01)),
        };
        assert_eq!(
            err.to_string(),
            "Account 00000000-0000-0000-0000-000000000000: insufficient credit: available 0.00, attempted 0.01"
        );
    }
}
