//! Multi-method payment allocation.
//!
//! Splits a total across payment legs and decides which ledger account each
//! leg settles against.

pub mod allocation;
pub mod types;

#[cfg(test)]
mod props;

pub use allocation::{PaymentAllocation, DEFAULT_TOLERANCE};
pub use types::{
    AllocationContext, AllocationPlan, AllocationResult, LegRoute, PaymentLeg, PaymentMethod,
    RoutedLeg, UnmappedLeg,
};
