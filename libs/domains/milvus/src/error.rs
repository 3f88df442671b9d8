use axum::response::{IntoResponse, Response};
use axum_helpers::AppError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum MilvusError {
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Collection already exists: {0}")]
    AlreadyExists(String),

    /// Non-success status reported by the database; `message` is kept verbatim.
    #[error("{message}")]
    Upstream { code: i32, message: String },

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

pub type MilvusResult<T> = Result<T, MilvusError>;

impl MilvusError {
    pub fn upstream(code: i32, message: impl Into<String>) -> Self {
        MilvusError::Upstream {
            code,
            message: message.into(),
        }
    }

    pub fn invalid(message: impl Into<String>) -> Self {
        MilvusError::InvalidArgument(message.into())
    }
}

impl From<reqwest::Error> for MilvusError {
    fn from(err: reqwest::Error) -> Self {
        MilvusError::Transport(err.to_string())
    }
}

impl From<serde_json::Error> for MilvusError {
    fn from(err: serde_json::Error) -> Self {
        MilvusError::Internal(format!("JSON error: {}", err))
    }
}

impl From<core_config::ConfigError> for MilvusError {
    fn from(err: core_config::ConfigError) -> Self {
        MilvusError::Config(err.to_string())
    }
}

/// Convert MilvusError to AppError for standardized HTTP error responses
impl From<MilvusError> for AppError {
    fn from(err: MilvusError) -> Self {
        match err {
            MilvusError::InvalidArgument(msg) => AppError::BadRequest(msg),
            MilvusError::AlreadyExists(name) => {
                AppError::Conflict(format!("Collection {} already exists", name))
            }
            MilvusError::Upstream { message, .. } => AppError::BadRequest(message),
            MilvusError::Transport(msg) => AppError::ServiceUnavailable(msg),
            MilvusError::Config(msg) => {
                AppError::InternalServerError(format!("Config error: {}", msg))
            }
            MilvusError::Internal(msg) => AppError::InternalServerError(msg),
        }
    }
}

impl IntoResponse for MilvusError {
    fn into_response(self) -> Response {
        let app_error: AppError = self.into();
        app_error.into_response()
    }
}
