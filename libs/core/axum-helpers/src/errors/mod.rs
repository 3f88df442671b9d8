pub mod codes;
pub mod handlers;

pub use codes::ErrorCode;

use axum::{
    Json,
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;
use utoipa::ToSchema;

/// Standard error response structure.
///
/// Every error leaves the API in this shape:
///
/// ```json
/// {
///   "code": 1008,
///   "error": "CONFLICT",
///   "message": "Collection documents already exists"
/// }
/// ```
#[derive(Serialize, ToSchema)]
pub struct ErrorResponse {
    /// Integer error code for logging and monitoring
    pub code: i32,
    /// Machine-readable error identifier
    pub error: String,
    /// Human-readable error message
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl ErrorResponse {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code: code.code(),
            error: code.as_str().to_string(),
            message: message.into(),
            details: None,
        }
    }
}

/// Application error type that can be converted to HTTP responses.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum AppError {
    #[error("JSON parsing error: {0}")]
    SerdeJson(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON extraction error: {0}")]
    JsonExtractorRejection(#[from] JsonRejection),

    #[error("Bad Request: {0}")]
    BadRequest(String),

    #[error("Not Found: {0}")]
    NotFound(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Internal Server Error: {0}")]
    InternalServerError(String),

    #[error("Service Unavailable: {0}")]
    ServiceUnavailable(String),
}

impl AppError {
    fn code(&self) -> ErrorCode {
        match self {
            AppError::SerdeJson(_) => ErrorCode::SerdeJsonError,
            AppError::Io(_) => ErrorCode::IoError,
            AppError::JsonExtractorRejection(_) => ErrorCode::JsonExtraction,
            AppError::BadRequest(_) => ErrorCode::BadRequest,
            AppError::NotFound(_) => ErrorCode::NotFound,
            AppError::Conflict(_) => ErrorCode::Conflict,
            AppError::InternalServerError(_) => ErrorCode::InternalError,
            AppError::ServiceUnavailable(_) => ErrorCode::ServiceUnavailable,
        }
    }

    /// Status and client message. Serialization and I/O details are logged,
    /// never returned.
    fn parts(self) -> (StatusCode, String, ErrorCode) {
        let code = self.code();
        let error_code = code.code();
        match self {
            AppError::SerdeJson(e) => {
                tracing::error!(error_code, error = ?e, "JSON serialization failed");
                (code.status(), code.default_message().to_string(), code)
            }
            AppError::Io(e) => {
                tracing::error!(error_code, error = ?e, "I/O failure");
                (code.status(), code.default_message().to_string(), code)
            }
            AppError::JsonExtractorRejection(e) => {
                tracing::warn!(error_code, error = %e, "Rejected request body");
                (e.status(), e.body_text(), code)
            }
            AppError::InternalServerError(msg) => {
                tracing::error!(error_code, message = %msg, "Internal error");
                (code.status(), msg, code)
            }
            AppError::ServiceUnavailable(msg) => {
                tracing::warn!(error_code, message = %msg, "Backing service unavailable");
                (code.status(), msg, code)
            }
            AppError::BadRequest(msg) | AppError::NotFound(msg) | AppError::Conflict(msg) => {
                tracing::info!(error_code, message = %msg, "Request rejected");
                (code.status(), msg, code)
            }
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message, code) = self.parts();
        (status, Json(ErrorResponse::new(code, message))).into_response()
    }
}
