//! HTTP API layer with Axum routes over the ledger engine.
//!
//! This crate provides:
//! - REST API routes for accounts, transfers, allocations and cash registers
//! - The gateway identity extractor
//! - JSON error responses

pub mod error;
pub mod middleware;
pub mod routes;

use axum::Router;
use sea_orm::DatabaseConnection;
use std::sync::Arc;
use tillbook_db::repositories::{
    AccountRepository, CashRegisterRepository, LedgerEngine, PaymentAllocator,
    PaymentMethodRepository,
};
use tillbook_shared::LedgerConfig;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

pub use error::ApiError;

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool.
    pub db: Arc<DatabaseConnection>,
    /// The only writer of balances.
    pub ledger: LedgerEngine,
    /// Account administration.
    pub accounts: AccountRepository,
    /// Payment method mappings.
    pub payment_methods: PaymentMethodRepository,
    /// Multi-method payment allocator.
    pub allocator: PaymentAllocator,
    /// Cash register sessions.
    pub registers: CashRegisterRepository,
}

impl AppState {
    /// Wires every repository over one connection pool.
    #[must_use]
    pub fn new(db: DatabaseConnection, config: &LedgerConfig) -> Self {
        let payment_methods = PaymentMethodRepository::new(db.clone());
        Self {
            ledger: LedgerEngine::new(db.clone(), config),
            accounts: AccountRepository::new(db.clone()),
            allocator: PaymentAllocator::new(
                db.clone(),
                Arc::new(payment_methods.clone()),
                config,
            ),
            registers: CashRegisterRepository::new(db.clone(), config),
            payment_methods,
            db: Arc::new(db),
        }
    }
}

/// Creates the main application router.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .nest("/api/v1", routes::api_routes())
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state)
}
