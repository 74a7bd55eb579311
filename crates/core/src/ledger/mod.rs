//! Balance ledger logic.
//!
//! This module implements the rules behind every balance change:
//! - Account kinds and their posting policy table
//! - Movement types and the immutable movement record
//! - Credit policy for customer debits
//! - Posting validation (`LedgerService::plan_post`)
//! - Chain replay for audits
//! - Error types for ledger operations

pub mod account;
pub mod chain;
pub mod credit;
pub mod error;
pub mod kind;
pub mod movement;
pub mod service;

#[cfg(test)]
mod service_props;

pub use account::{BalanceView, LedgerAccount};
pub use chain::{verify_chain, ChainBreak, ChainLink, ChainReport};
pub use credit::{CreditDecision, CreditDenial, CreditLimitPolicy, CreditPolicy};
pub use error::LedgerError;
pub use kind::AccountKind;
pub use movement::{AccountRef, Direction, DocumentLink, Movement, MovementType, PostMovement};
pub use service::{LedgerService, PlannedPosting};
