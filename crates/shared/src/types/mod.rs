//! Common types used across the application.

pub mod amount;
pub mod context;
pub mod id;
pub mod pagination;

pub use amount::{Amount, AmountError};
pub use context::TenantContext;
pub use id::*;
pub use pagination::{PageMeta, PageRequest, PageResponse};
