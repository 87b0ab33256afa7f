//! HTTP error type for pkv-web handlers

use axum::{
    extract::rejection::{JsonRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use pkv_common::contact::FieldError;
use serde_json::json;
use thiserror::Error;

/// API error returned by handlers
#[derive(Debug, Error)]
pub enum ApiError {
    /// Resource not found (404)
    #[error("{0}")]
    NotFound(String),

    /// Invalid request (400)
    #[error("Invalid request: {0}")]
    BadRequest(String),

    /// Field validation failed (422)
    #[error("Validation failed")]
    Validation(Vec<FieldError>),

    /// Feature switched off in configuration (503)
    #[error("Service unavailable: {0}")]
    Unavailable(String),

    /// Internal server error (500)
    #[error("Internal server error: {0}")]
    Internal(String),

    /// pkv-common error
    #[error("Common error: {0}")]
    Common(#[from] pkv_common::Error),
}

impl ApiError {
    pub fn venue_not_found() -> Self {
        ApiError::NotFound("Venue not found".to_string())
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code, message, fields) = match self {
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, "NOT_FOUND", msg, None),
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "BAD_REQUEST", msg, None),
            ApiError::Validation(errors) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                "VALIDATION_FAILED",
                "One or more fields are invalid".to_string(),
                Some(errors),
            ),
            ApiError::Unavailable(msg) => {
                (StatusCode::SERVICE_UNAVAILABLE, "UNAVAILABLE", msg, None)
            }
            ApiError::Internal(msg) => {
                tracing::error!(error = %msg, "Internal error");
                (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR", msg, None)
            }
            ApiError::Common(err) => match err {
                pkv_common::Error::NotFound(msg) => (StatusCode::NOT_FOUND, "NOT_FOUND", msg, None),
                pkv_common::Error::InvalidInput(msg) => {
                    (StatusCode::BAD_REQUEST, "BAD_REQUEST", msg, None)
                }
                other => {
                    tracing::error!(error = %other, "Request failed");
                    (
                        StatusCode::INTERNAL_SERVER_ERROR,
                        "COMMON_ERROR",
                        other.to_string(),
                        None,
                    )
                }
            },
        };

        let mut error = json!({
            "code": code,
            "message": message,
        });
        if let Some(fields) = fields {
            error["fields"] = json!(fields);
        }

        (status, Json(json!({ "error": error }))).into_response()
    }
}

/// Result type for API handlers
pub type ApiResult<T> = Result<T, ApiError>;
