//! API error types and responses.
//!
//! Every handler returns `Result<_, ApiError>`, so this is the single place
//! where failures become HTTP responses. Internal failures are logged here with
//! their full detail and answered with an opaque body.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

use rl_accounts_core::{CoreError, InternalErrorKind};
use rl_accounts_store::StoreError;

use crate::billing::errors::RESOURCE_MISSING;
use crate::billing::{ProviderError, ReconcileError};

/// API error type.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// Unauthorized - missing or invalid credentials.
    #[error("unauthorized")]
    Unauthorized,

    /// Forbidden - origin not allowed or resource belongs to another account.
    #[error("forbidden")]
    Forbidden,

    /// Resource not found.
    #[error("not found: {0}")]
    NotFound(String),

    /// Bad request - invalid input.
    #[error("bad request: {0}")]
    BadRequest(String),

    /// Request body is not in the format the route consumes.
    #[error("unsupported media type: {0}")]
    UnsupportedMediaType(String),

    /// The billing provider refused a subscription change.
    #[error("payment required: {0}")]
    PaymentRequired(InternalErrorKind),

    /// Internal server error.
    #[error("internal error: {0}")]
    Internal(String),

    /// External service error.
    #[error("external service error: {0}")]
    ExternalService(String),
}

/// JSON error response body.
#[derive(Debug, Serialize)]
struct ErrorResponse {
    error: ErrorBody,
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    code: String,
    message: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            Self::Unauthorized => (StatusCode::UNAUTHORIZED, "unauthorized", self.to_string()),
            Self::Forbidden => (StatusCode::FORBIDDEN, "forbidden", self.to_string()),
            Self::NotFound(msg) => (StatusCode::NOT_FOUND, "not_found", msg.clone()),
            Self::BadRequest(msg) => (StatusCode::BAD_REQUEST, "bad_request", msg.clone()),
            Self::UnsupportedMediaType(msg) => (
                StatusCode::UNSUPPORTED_MEDIA_TYPE,
                "unsupported_media_type",
                msg.clone(),
            ),
            Self::PaymentRequired(kind) => (
                StatusCode::PAYMENT_REQUIRED,
                kind.as_str(),
                match kind {
                    InternalErrorKind::NoPaymentMethod => {
                        "Add a payment method before subscribing".to_string()
                    }
                    InternalErrorKind::PaymentFailed => {
                        "The payment could not be completed".to_string()
                    }
                },
            ),
            Self::Internal(msg) => {
                tracing::error!(error = %msg, "Internal server error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal_error",
                    "An internal error occurred".to_string(),
                )
            }
            Self::ExternalService(msg) => {
                (StatusCode::BAD_GATEWAY, "external_service_error", msg.clone())
            }
        };

        let body = ErrorResponse {
            error: ErrorBody {
                code: code.to_string(),
                message,
            },
        };

        (status, Json(body)).into_response()
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound { entity, id } => Self::NotFound(format!("{entity} not found: {id}")),
            StoreError::Database(msg) | StoreError::Serialization(msg) => Self::Internal(msg),
        }
    }
}

impl From<CoreError> for ApiError {
    fn from(err: CoreError) -> Self {
        Self::BadRequest(err.to_string())
    }
}

impl From<ProviderError> for ApiError {
    fn from(err: ProviderError) -> Self {
        match err.code() {
            Some(RESOURCE_MISSING) => Self::NotFound(err.to_string()),
            Some(_) => Self::BadRequest(err.to_string()),
            None => Self::Internal(err.to_string()),
        }
    }
}

impl From<ReconcileError> for ApiError {
    fn from(err: ReconcileError) -> Self {
        match err {
            ReconcileError::Declined(kind) => Self::PaymentRequired(kind),
            ReconcileError::Provider(e) => e.into(),
            ReconcileError::Catalog(e) => e.into(),
        }
    }
}
