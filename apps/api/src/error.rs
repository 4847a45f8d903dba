//! HTTP error mapping.
//!
//! ```text
//! CoreError                         HTTP   code
//! ─────────────────────────────     ────   ─────────────────────
//! NotFound                          404    NOT_FOUND
//! Conflict                          409    CONFLICT
//! InvalidTransition, GroupNot*,     422    INVALID_TRANSITION, ...
//!   NotAll*Ready, OrderClosed, ...
//! Validation, SchemaNotSet          400    VALIDATION_ERROR, SCHEMA_NOT_SET
//! Storage                           500    STORAGE_ERROR (logged)
//! ```

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};
use tracing::error;

use comanda_core::{CoreError, ValidationError};

/// Response body for every failed request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub code: String,
    pub message: String,
}

/// API errors.
#[derive(Debug, thiserror::Error)]
#[error("{code}: {message}")]
pub struct ApiError {
    pub status: StatusCode,
    pub code: &'static str,
    pub message: String,
}

impl ApiError {
    pub fn new(status: StatusCode, code: &'static str, message: impl Into<String>) -> Self {
        ApiError {
            status,
            code,
            message: message.into(),
        }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, "BAD_REQUEST", message)
    }

    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::new(StatusCode::SERVICE_UNAVAILABLE, "UNAVAILABLE", message)
    }
}

impl From<CoreError> for ApiError {
    fn from(err: CoreError) -> Self {
        let message = err.to_string();
        let (status, code) = match &err {
            CoreError::NotFound { .. } => (StatusCode::NOT_FOUND, "NOT_FOUND"),
            CoreError::Conflict { .. } => (StatusCode::CONFLICT, "CONFLICT"),

            CoreError::InvalidTransition { .. } => {
                (StatusCode::UNPROCESSABLE_ENTITY, "INVALID_TRANSITION")
            }
            CoreError::GroupNotStaging => (StatusCode::UNPROCESSABLE_ENTITY, "GROUP_NOT_STAGING"),
            CoreError::GroupNotInOrder { .. } => {
                (StatusCode::UNPROCESSABLE_ENTITY, "GROUP_NOT_IN_ORDER")
            }
            CoreError::NotAllItemsReady => {
                (StatusCode::UNPROCESSABLE_ENTITY, "NOT_ALL_ITEMS_READY")
            }
            CoreError::NotAllGroupsReady => {
                (StatusCode::UNPROCESSABLE_ENTITY, "NOT_ALL_GROUPS_READY")
            }
            CoreError::CategoryNotFound => (StatusCode::UNPROCESSABLE_ENTITY, "CATEGORY_NOT_FOUND"),
            CoreError::SizeNotFound => (StatusCode::UNPROCESSABLE_ENTITY, "SIZE_NOT_FOUND"),
            CoreError::ProductUnavailable(_) => {
                (StatusCode::UNPROCESSABLE_ENTITY, "PRODUCT_UNAVAILABLE")
            }
            CoreError::QuantityNotInCategory { .. } => {
                (StatusCode::UNPROCESSABLE_ENTITY, "QUANTITY_NOT_IN_CATEGORY")
            }
            CoreError::OrderMustBePending => {
                (StatusCode::UNPROCESSABLE_ENTITY, "ORDER_MUST_BE_PENDING")
            }
            CoreError::OrderWithoutItems => {
                (StatusCode::UNPROCESSABLE_ENTITY, "ORDER_WITHOUT_ITEMS")
            }
            CoreError::OrderClosed(_) => (StatusCode::UNPROCESSABLE_ENTITY, "ORDER_CLOSED"),
            CoreError::WrongOrderKind { .. } => {
                (StatusCode::UNPROCESSABLE_ENTITY, "WRONG_ORDER_KIND")
            }

            CoreError::SchemaNotSet => (StatusCode::BAD_REQUEST, "SCHEMA_NOT_SET"),
            CoreError::Validation(_) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR"),

            CoreError::Storage(detail) => {
                error!(error = %detail, "Storage failure");
                (StatusCode::INTERNAL_SERVER_ERROR, "STORAGE_ERROR")
            }
        };

        ApiError::new(status, code, message)
    }
}

impl From<ValidationError> for ApiError {
    fn from(err: ValidationError) -> Self {
        CoreError::Validation(err).into()
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            code: self.code.to_string(),
            message: self.message,
        };
        (self.status, Json(body)).into_response()
    }
}

pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        let cases = [
            (CoreError::not_found("order", "1"), StatusCode::NOT_FOUND),
            (CoreError::conflict("order", "1"), StatusCode::CONFLICT),
            (CoreError::GroupNotStaging, StatusCode::UNPROCESSABLE_ENTITY),
            (CoreError::OrderMustBePending, StatusCode::UNPROCESSABLE_ENTITY),
            (CoreError::SchemaNotSet, StatusCode::BAD_REQUEST),
            (
                CoreError::Storage("connection refused".to_string()),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];

        for (err, status) in cases {
            assert_eq!(ApiError::from(err).status, status);
        }
    }

    #[test]
    fn test_storage_message_is_passed_through() {
        let err = ApiError::from(CoreError::Storage("connection refused".to_string()));
        assert_eq!(err.status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(err.code, "STORAGE_ERROR");
        assert!(err.message.contains("connection refused"));
    }
}
