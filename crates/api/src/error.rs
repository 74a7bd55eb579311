//! HTTP error responses.
//!
//! Every failure leaves the API as `{"error": CODE, "message": text}` with the
//! status code the error type assigns itself. Payment leg failures also carry
//! `leg_index`.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use tillbook_core::ledger::LedgerError;
use tillbook_shared::AppError;
use tracing::error;

/// Error returned by every handler.
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    code: &'static str,
    message: String,
    leg_index: Option<usize>,
}

impl ApiError {
    /// Builds an error response by hand.
    #[must_use]
    pub fn new(status: StatusCode, code: &'static str, message: impl Into<String>) -> Self {
        Self {
            status,
            code,
            message: message.into(),
            leg_index: None,
        }
    }

    /// HTTP status of the response.
    #[must_use]
    pub const fn status(&self) -> StatusCode {
        self.status
    }

    /// Machine-readable error code.
    #[must_use]
    pub const fn code(&self) -> &'static str {
        self.code
    }

    /// Payment leg the failure belongs to, if any.
    #[must_use]
    pub const fn leg_index(&self) -> Option<usize> {
        self.leg_index
    }
}

fn status_from(code: u16) -> StatusCode {
    StatusCode::from_u16(code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
}

impl From<LedgerError> for ApiError {
    fn from(err: LedgerError) -> Self {
        Self {
            leg_index: err.leg_index(),
            ..Self::new(
                status_from(err.http_status_code()),
                err.error_code(),
                err.to_string(),
            )
        }
    }
}

impl From<AppError> for ApiError {
    fn from(err: AppError) -> Self {
        Self::new(status_from(err.status_code()), err.error_code(), err.to_string())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if self.status.is_server_error() {
            error!(code = self.code, message = %self.message, "request failed");
        }
        let mut body = json!({
            "error": self.code,
            "message": self.message,
        });
        if let Some(index) = self.leg_index {
            body["leg_index"] = json!(index);
        }
        (self.status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    #[test]
    fn test_ledger_errors_keep_their_status() {
        let id = Uuid::nil();
        let err = ApiError::from(LedgerError::AccountNotFound(id));
        assert_eq!(err.status(), StatusCode::NOT_FOUND);
        assert_eq!(err.code(), "ACCOUNT_NOT_FOUND");

        let err = ApiError::from(LedgerError::SessionAlreadyClosed(id));
        assert_eq!(err.status(), StatusCode::CONFLICT);

        let err = ApiError::from(LedgerError::MissingConcept);
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_leg_errors_carry_the_index() {
        let err = ApiError::from(LedgerError::LegRejected {
            leg_index: 1,
            source: Box::new(LedgerError::InsufficientCredit {
                account_id: Uuid::nil(),
                available: tillbook_shared::Amount::ZERO,
                attempted: tillbook_shared::Amount::from_minor_units(500),
            }),
        });
        assert_eq!(err.status(), StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(err.code(), "INSUFFICIENT_CREDIT");
        assert_eq!(err.leg_index(), Some(1));
        assert_eq!(ApiError::from(LedgerError::MissingConcept).leg_index(), None);
    }

    #[test]
    fn test_app_errors_keep_their_status() {
        let err = ApiError::from(AppError::Unauthorized("missing header".into()));
        assert_eq!(err.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(err.code(), "UNAUTHORIZED");
    }
}
