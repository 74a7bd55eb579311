//! Cash register sessions.
//!
//! A session is opened with a float, accumulates cash movements on an
//! implicit register account, and is closed once with a counted balance.

pub mod reconciliation;
pub mod types;

pub use reconciliation::{ensure_open, validate_declared_balance, validate_opening_balance, Reconciliation};
pub use types::{
    scope_key, RegisterEntryKind, RegisterSession, SessionStatus, SessionSummary, SessionTotals,
};
