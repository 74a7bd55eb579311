//! Cash register session routes.

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
};
use serde::Deserialize;
use tillbook_core::ledger::DocumentLink;
use tillbook_core::register::SessionStatus;
use tillbook_db::repositories::RegisterEntry;
use tillbook_shared::Amount;
use tillbook_shared::types::{ActorId, LocationId, SessionId};

use crate::{AppState, error::ApiError, middleware::AuthTenant};

/// Creates the cash register routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/cash-registers", get(list_sessions).post(open_session))
        .route("/cash-registers/current", get(current_session))
        .route("/cash-registers/{session_id}", get(get_session))
        .route("/cash-registers/{session_id}/transactions", post(record_transaction))
        .route("/cash-registers/{session_id}/sales", post(record_sale))
        .route("/cash-registers/{session_id}/summary", get(session_summary))
        .route("/cash-registers/{session_id}/close", post(close_session))
}

/// Request body for opening a session.
#[derive(Debug, Deserialize)]
pub struct OpenSessionRequest {
    /// Point of sale.
    pub location_id: LocationId,
    /// Operator in charge; defaults to the caller.
    #[serde(default)]
    pub operator_id: Option<ActorId>,
    /// Opening float.
    pub opening_balance: Amount,
}

/// Query parameters for the current session.
#[derive(Debug, Deserialize)]
pub struct CurrentSessionQuery {
    /// Point of sale.
    pub location_id: LocationId,
    /// Operator; defaults to the caller.
    pub operator_id: Option<ActorId>,
}

/// Query parameters for listing sessions.
#[derive(Debug, Deserialize)]
pub struct ListSessionsQuery {
    /// Filter by status.
    pub status: Option<SessionStatus>,
    /// Page number.
    pub page: Option<u32>,
    /// Items per page.
    pub per_page: Option<u32>,
}

/// Request body for a single-leg cash sale.
#[derive(Debug, Deserialize)]
pub struct SaleReceiptRequest {
    /// Cash received.
    pub amount: Amount,
    /// Description.
    pub concept: String,
    /// Originating sale document.
    #[serde(default)]
    pub document: Option<DocumentLink>,
}

/// Request body for closing a session.
#[derive(Debug, Deserialize)]
pub struct CloseSessionRequest {
    /// Counted cash.
    pub declared_balance: Amount,
    /// Free-form notes.
    #[serde(default)]
    pub notes: Option<String>,
}

/// GET `/cash-registers` - List sessions, newest first.
async fn list_sessions(
    State(state): State<AppState>,
    AuthTenant(ctx): AuthTenant,
    Query(query): Query<ListSessionsQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let page = super::PageQuery {
        page: query.page,
        per_page: query.per_page,
    }
    .to_request();
    let sessions = state.registers.list(&ctx, query.status, page).await?;
    Ok(Json(sessions))
}

/// POST `/cash-registers` - Open a session.
async fn open_session(
    State(state): State<AppState>,
    AuthTenant(ctx): AuthTenant,
    Json(body): Json<OpenSessionRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let operator = body.operator_id.unwrap_or(ctx.actor_id);
    let session = state
        .registers
        .open(&ctx, body.location_id, operator, body.opening_balance)
        .await?;
    Ok((StatusCode::CREATED, Json(session)))
}

/// GET `/cash-registers/current` - The open session for a scope, if any.
async fn current_session(
    State(state): State<AppState>,
    AuthTenant(ctx): AuthTenant,
    Query(query): Query<CurrentSessionQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let operator = query.operator_id.unwrap_or(ctx.actor_id);
    match state
        .registers
        .current(&ctx, query.location_id, operator)
        .await?
    {
        Some(session) => Ok(Json(session)),
        None => Err(ApiError::new(
            StatusCode::NOT_FOUND,
            "SESSION_NOT_FOUND",
            format!("No open cash register session for location {}", query.location_id),
        )),
    }
}

/// GET `/cash-registers/{session_id}` - One session.
async fn get_session(
    State(state): State<AppState>,
    AuthTenant(ctx): AuthTenant,
    Path(session_id): Path<SessionId>,
) -> Result<impl IntoResponse, ApiError> {
    let session = state.registers.get(&ctx, session_id).await?;
    Ok(Json(session))
}

/// POST `/cash-registers/{session_id}/transactions` - Manual INCOME/EXPENSE.
async fn record_transaction(
    State(state): State<AppState>,
    AuthTenant(ctx): AuthTenant,
    Path(session_id): Path<SessionId>,
    Json(entry): Json<RegisterEntry>,
) -> Result<impl IntoResponse, ApiError> {
    let movement = state
        .registers
        .record_transaction(&ctx, session_id, &entry)
        .await?;
    Ok((StatusCode::CREATED, Json(movement)))
}

/// POST `/cash-registers/{session_id}/sales` - Cash sale receipt.
async fn record_sale(
    State(state): State<AppState>,
    AuthTenant(ctx): AuthTenant,
    Path(session_id): Path<SessionId>,
    Json(body): Json<SaleReceiptRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let movement = state
        .registers
        .record_sale_receipt(&ctx, session_id, body.amount, &body.concept, body.document.as_ref())
        .await?;
    Ok((StatusCode::CREATED, Json(movement)))
}

/// GET `/cash-registers/{session_id}/summary` - Running totals.
async fn session_summary(
    State(state): State<AppState>,
    AuthTenant(ctx): AuthTenant,
    Path(session_id): Path<SessionId>,
) -> Result<impl IntoResponse, ApiError> {
    let summary = state.registers.summary(&ctx, session_id).await?;
    Ok(Json(summary))
}

/// POST `/cash-registers/{session_id}/close` - Close with counted cash.
async fn close_session(
    State(state): State<AppState>,
    AuthTenant(ctx): AuthTenant,
    Path(session_id): Path<SessionId>,
    Json(body): Json<CloseSessionRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let session = state
        .registers
        .close(&ctx, session_id, body.declared_balance, body.notes)
        .await?;
    Ok(Json(session))
}
