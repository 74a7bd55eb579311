//! Core business logic for Tillbook.
//!
//! This crate contains pure business logic with ZERO web or database dependencies.
//! All domain types, validation rules, and calculations live here.
//!
//! # Modules
//!
//! - `ledger` - Account kinds, movements, credit policy and posting rules
//! - `payment` - Multi-method payment allocation
//! - `register` - Cash register sessions and reconciliation

pub mod ledger;
pub mod payment;
pub mod register;
