//! Ledger account routes.

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post, put},
};
use serde::Deserialize;
use tillbook_core::ledger::{AccountKind, AccountRef, DocumentLink, MovementType, PostMovement};
use tillbook_db::repositories::{AccountFilter, CreateAccountInput};
use tillbook_shared::Amount;
use tillbook_shared::types::{AccountId, SupplierId};

use super::PageQuery;
use crate::{AppState, error::ApiError, middleware::AuthTenant};

/// Creates the account routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/accounts", get(list_accounts).post(create_account))
        .route("/accounts/{account_id}", get(get_balance).delete(delete_account))
        .route("/accounts/{account_id}/active", put(set_active))
        .route("/accounts/{account_id}/credit-limit", put(set_credit_limit))
        .route(
            "/accounts/{account_id}/movements",
            get(list_movements).post(post_movement),
        )
        .route("/accounts/{account_id}/verify", get(verify_chain))
        .route("/suppliers/{supplier_id}/movements", post(post_supplier_movement))
}

/// Query parameters for listing accounts.
#[derive(Debug, Deserialize)]
pub struct ListAccountsQuery {
    /// Filter by account kind.
    pub kind: Option<AccountKind>,
    /// Filter by active status.
    pub active: Option<bool>,
    /// Page number.
    pub page: Option<u32>,
    /// Items per page.
    pub per_page: Option<u32>,
}

/// Request body for toggling the active flag.
#[derive(Debug, Deserialize)]
pub struct SetActiveRequest {
    /// New flag value.
    pub is_active: bool,
}

/// Request body for changing a credit limit.
#[derive(Debug, Deserialize)]
pub struct SetCreditLimitRequest {
    /// New limit; zero means unlimited.
    pub credit_limit: Amount,
}

/// Request body for posting a movement.
#[derive(Debug, Deserialize)]
pub struct PostMovementRequest {
    /// Signed amount.
    pub amount: Amount,
    /// Movement type.
    pub movement_type: MovementType,
    /// Description.
    pub concept: String,
    /// External reference.
    #[serde(default)]
    pub reference: Option<String>,
    /// Originating document.
    #[serde(default)]
    pub document: Option<DocumentLink>,
}

impl PostMovementRequest {
    fn into_post(self, account: AccountRef) -> PostMovement {
        PostMovement {
            account,
            amount: self.amount,
            movement_type: self.movement_type,
            concept: self.concept,
            reference: self.reference,
            document: self.document,
        }
    }
}

/// GET `/accounts` - List accounts.
async fn list_accounts(
    State(state): State<AppState>,
    AuthTenant(ctx): AuthTenant,
    Query(query): Query<ListAccountsQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let filter = AccountFilter {
        kind: query.kind,
        is_active: query.active,
    };
    let page = PageQuery {
        page: query.page,
        per_page: query.per_page,
    }
    .to_request();
    let accounts = state.accounts.list(&ctx, filter, page).await?;
    Ok(Json(accounts))
}

/// POST `/accounts` - Create a customer, supplier or cash account.
async fn create_account(
    State(state): State<AppState>,
    AuthTenant(ctx): AuthTenant,
    Json(input): Json<CreateAccountInput>,
) -> Result<impl IntoResponse, ApiError> {
    let account = state.accounts.create(&ctx, input).await?;
    Ok((StatusCode::CREATED, Json(account)))
}

/// GET `/accounts/{account_id}` - Current balance and credit position.
async fn get_balance(
    State(state): State<AppState>,
    AuthTenant(ctx): AuthTenant,
    Path(account_id): Path<AccountId>,
) -> Result<impl IntoResponse, ApiError> {
    let view = state.ledger.get_balance(&ctx, account_id).await?;
    Ok(Json(view))
}

/// DELETE `/accounts/{account_id}` - Delete an account without movements.
async fn delete_account(
    State(state): State<AppState>,
    AuthTenant(ctx): AuthTenant,
    Path(account_id): Path<AccountId>,
) -> Result<impl IntoResponse, ApiError> {
    state.accounts.delete(&ctx, account_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// PUT `/accounts/{account_id}/active` - Activate or deactivate.
async fn set_active(
    State(state): State<AppState>,
    AuthTenant(ctx): AuthTenant,
    Path(account_id): Path<AccountId>,
    Json(body): Json<SetActiveRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let account = state
        .accounts
        .set_active(&ctx, account_id, body.is_active)
        .await?;
    Ok(Json(account))
}

/// PUT `/accounts/{account_id}/credit-limit` - Change a customer's limit.
async fn set_credit_limit(
    State(state): State<AppState>,
    AuthTenant(ctx): AuthTenant,
    Path(account_id): Path<AccountId>,
    Json(body): Json<SetCreditLimitRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let account = state
        .accounts
        .set_credit_limit(&ctx, account_id, body.credit_limit)
        .await?;
    Ok(Json(account))
}

/// GET `/accounts/{account_id}/movements` - Movements in chain order.
async fn list_movements(
    State(state): State<AppState>,
    AuthTenant(ctx): AuthTenant,
    Path(account_id): Path<AccountId>,
    Query(page): Query<PageQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let movements = state
        .ledger
        .list_movements(&ctx, account_id, page.to_request())
        .await?;
    Ok(Json(movements))
}

/// POST `/accounts/{account_id}/movements` - Post one movement.
async fn post_movement(
    State(state): State<AppState>,
    AuthTenant(ctx): AuthTenant,
    Path(account_id): Path<AccountId>,
    Json(body): Json<PostMovementRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let request = body.into_post(AccountRef::Account(account_id));
    let movement = state.ledger.post(&ctx, &request).await?;
    Ok((StatusCode::CREATED, Json(movement)))
}

/// POST `/suppliers/{supplier_id}/movements` - Post to a supplier, opening
/// its account on first use.
async fn post_supplier_movement(
    State(state): State<AppState>,
    AuthTenant(ctx): AuthTenant,
    Path(supplier_id): Path<SupplierId>,
    Json(body): Json<PostMovementRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let request = body.into_post(AccountRef::Supplier(supplier_id));
    let movement = state.ledger.post(&ctx, &request).await?;
    Ok((StatusCode::CREATED, Json(movement)))
}

/// GET `/accounts/{account_id}/verify` - Replay the movement chain.
async fn verify_chain(
    State(state): State<AppState>,
    AuthTenant(ctx): AuthTenant,
    Path(account_id): Path<AccountId>,
) -> Result<impl IntoResponse, ApiError> {
    let report = state.ledger.verify_chain(&ctx, account_id).await?;
    Ok(Json(report))
}
