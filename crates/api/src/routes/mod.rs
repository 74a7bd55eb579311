//! API route definitions.

use axum::Router;
use serde::Deserialize;
use tillbook_shared::types::PageRequest;

use crate::AppState;

pub mod accounts;
pub mod allocations;
pub mod cash_registers;
pub mod health;
pub mod payment_methods;
pub mod transfers;

/// Creates the API router with all routes.
///
/// Every route except health reads the caller from the gateway headers.
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .merge(health::routes())
        .merge(accounts::routes())
        .merge(transfers::routes())
        .merge(allocations::routes())
        .merge(cash_registers::routes())
        .merge(payment_methods::routes())
}

/// Page query parameters shared by list endpoints.
#[derive(Debug, Default, Deserialize)]
pub struct PageQuery {
    /// Page number (1-indexed, default: 1).
    pub page: Option<u32>,
    /// Items per page (default: 50, max: 200).
    pub per_page: Option<u32>,
}

impl PageQuery {
    /// Builds a normalized page request.
    #[must_use]
    pub fn to_request(&self) -> PageRequest {
        let defaults = PageRequest::default();
        PageRequest {
            page: self.page.unwrap_or(defaults.page),
            per_page: self.per_page.unwrap_or(defaults.per_page),
        }
        .normalized()
    }
}
