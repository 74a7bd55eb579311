//! Cash transfer routes.

use axum::{Json, Router, extract::State, http::StatusCode, response::IntoResponse, routing::post};
use tillbook_db::repositories::TransferRequest;

use crate::{AppState, error::ApiError, middleware::AuthTenant};

/// Creates the transfer routes.
pub fn routes() -> Router<AppState> {
    Router::new().route("/transfers", post(create_transfer))
}

/// POST `/transfers` - Move cash between two envelopes.
async fn create_transfer(
    State(state): State<AppState>,
    AuthTenant(ctx): AuthTenant,
    Json(request): Json<TransferRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let result = state.ledger.transfer(&ctx, &request).await?;
    Ok((StatusCode::CREATED, Json(result)))
}
