//! Payment method mapping routes.

use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, put},
};
use serde::Deserialize;
use serde_json::json;
use tillbook_core::payment::PaymentMethod;
use tillbook_shared::AppError;
use tillbook_shared::types::AccountId;

use crate::{AppState, error::ApiError, middleware::AuthTenant};

/// Creates the payment method routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/payment-methods", get(list_mappings))
        .route(
            "/payment-methods/{method}",
            put(set_mapping).delete(remove_mapping),
        )
}

/// Request body for mapping a method.
#[derive(Debug, Deserialize)]
pub struct SetMappingRequest {
    /// Cash account receiving the method's money.
    pub account_id: AccountId,
}

/// GET `/payment-methods` - List configured mappings.
async fn list_mappings(
    State(state): State<AppState>,
    AuthTenant(ctx): AuthTenant,
) -> Result<impl IntoResponse, ApiError> {
    let mappings = state.payment_methods.list(&ctx).await?;
    Ok(Json(json!({ "mappings": mappings })))
}

/// PUT `/payment-methods/{method}` - Map a method to a cash account.
async fn set_mapping(
    State(state): State<AppState>,
    AuthTenant(ctx): AuthTenant,
    Path(method): Path<PaymentMethod>,
    Json(body): Json<SetMappingRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let mapping = state
        .payment_methods
        .set(&ctx, method, body.account_id)
        .await?;
    Ok(Json(mapping))
}

/// DELETE `/payment-methods/{method}` - Remove a mapping.
async fn remove_mapping(
    State(state): State<AppState>,
    AuthTenant(ctx): AuthTenant,
    Path(method): Path<PaymentMethod>,
) -> Result<impl IntoResponse, ApiError> {
    if state.payment_methods.remove(&ctx, method).await? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(AppError::NotFound(format!("No account is mapped to {method}")).into())
    }
}
