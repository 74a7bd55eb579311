//! Shared types, errors, and configuration for Tillbook.
//!
//! This crate provides common types used across all other crates:
//! - The exact `Amount` money type
//! - Typed IDs and the caller's `TenantContext`
//! - Pagination types for list endpoints
//! - Application-wide error types
//! - Configuration management

pub mod config;
pub mod error;
pub mod types;

pub use config::{AppConfig, LedgerConfig, RegisterScope};
pub use error::AppError;
pub use types::{Amount, AmountError, TenantContext};
