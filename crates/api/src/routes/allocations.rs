//! Payment allocation routes.

use axum::{Json, Router, extract::State, http::StatusCode, response::IntoResponse, routing::post};
use serde::Deserialize;
use tillbook_core::payment::{AllocationContext, PaymentLeg};
use tillbook_shared::Amount;

use crate::{AppState, error::ApiError, middleware::AuthTenant};

/// Creates the allocation routes.
pub fn routes() -> Router<AppState> {
    Router::new().route("/allocations", post(allocate))
}

/// Request body for an allocation.
#[derive(Debug, Deserialize)]
pub struct AllocateRequest {
    /// Amount the legs must add up to.
    pub total_due: Amount,
    /// Payment legs.
    pub legs: Vec<PaymentLeg>,
    /// Customer, register session, concept and document.
    #[serde(flatten)]
    pub context: AllocationContext,
}

/// POST `/allocations` - Settle a total across payment legs.
async fn allocate(
    State(state): State<AppState>,
    AuthTenant(ctx): AuthTenant,
    Json(body): Json<AllocateRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let result = state
        .allocator
        .allocate(&ctx, body.total_due, &body.legs, &body.context)
        .await?;
    Ok((StatusCode::CREATED, Json(result)))
}
