//! Error codes carried in every `ErrorResponse` body.
//!
//! ```rust
//! use axum_helpers::errors::ErrorCode;
//!
//! assert_eq!(ErrorCode::Conflict.as_str(), "CONFLICT");
//! assert_eq!(ErrorCode::Conflict.code(), 1008);
//! assert_eq!(ErrorCode::Conflict.status().as_u16(), 409);
//! ```

use axum::http::StatusCode;
use serde::Serialize;
use utoipa::ToSchema;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    /// Rejected by argument checks or by Milvus itself
    BadRequest,
    NotFound,
    /// Collection name already taken
    Conflict,
    /// Body was not valid JSON for the endpoint
    JsonExtraction,
    InternalError,
    /// Milvus could not be reached
    ServiceUnavailable,
    IoError,
    SerdeJsonError,
}

struct Entry {
    ident: &'static str,
    code: i32,
    status: StatusCode,
    message: &'static str,
}

impl ErrorCode {
    // 1xxx request and upstream outcomes, 4xxx I/O, 5xxx serialization.
    const fn entry(self) -> Entry {
        let (ident, code, status, message) = match self {
            Self::BadRequest => (
                "BAD_REQUEST",
                1000,
                StatusCode::BAD_REQUEST,
                "Request could not be processed",
            ),
            Self::JsonExtraction => (
                "JSON_EXTRACTION",
                1003,
                StatusCode::BAD_REQUEST,
                "Failed to parse request body",
            ),
            Self::NotFound => ("NOT_FOUND", 1004, StatusCode::NOT_FOUND, "Resource not found"),
            Self::InternalError => (
                "INTERNAL_ERROR",
                1005,
                StatusCode::INTERNAL_SERVER_ERROR,
                "An internal server error occurred",
            ),
            Self::Conflict => (
                "CONFLICT",
                1008,
                StatusCode::CONFLICT,
                "Collection already exists",
            ),
            Self::ServiceUnavailable => (
                "SERVICE_UNAVAILABLE",
                1011,
                StatusCode::SERVICE_UNAVAILABLE,
                "Milvus is unreachable",
            ),
            Self::IoError => (
                "IO_ERROR",
                4001,
                StatusCode::INTERNAL_SERVER_ERROR,
                "I/O error occurred",
            ),
            Self::SerdeJsonError => (
                "SERDE_JSON_ERROR",
                5001,
                StatusCode::INTERNAL_SERVER_ERROR,
                "JSON serialization error",
            ),
        };
        Entry {
            ident,
            code,
            status,
            message,
        }
    }

    pub const fn as_str(self) -> &'static str {
        self.entry().ident
    }

    /// Integer form, logged as `error_code`.
    pub const fn code(self) -> i32 {
        self.entry().code
    }

    /// Default status; JSON rejections carry their own.
    pub const fn status(self) -> StatusCode {
        self.entry().status
    }

    /// Used when the underlying error must not reach the client.
    pub const fn default_message(self) -> &'static str {
        self.entry().message
    }
}

impl std::fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALL: [ErrorCode; 8] = [
        ErrorCode::BadRequest,
        ErrorCode::NotFound,
        ErrorCode::Conflict,
        ErrorCode::JsonExtraction,
        ErrorCode::InternalError,
        ErrorCode::ServiceUnavailable,
        ErrorCode::IoError,
        ErrorCode::SerdeJsonError,
    ];

    #[test]
    fn test_codes_are_unique() {
        let mut codes: Vec<i32> = ALL.iter().map(|c| c.code()).collect();
        codes.sort_unstable();
        codes.dedup();
        assert_eq!(codes.len(), ALL.len());
    }

    #[test]
    fn test_serialized_form_matches_identifier() {
        for code in ALL {
            let json = serde_json::to_string(&code).unwrap();
            assert_eq!(json, format!("\"{}\"", code.as_str()));
        }
    }

    #[test]
    fn test_facade_outcomes_map_to_statuses() {
        assert_eq!(ErrorCode::BadRequest.status(), StatusCode::BAD_REQUEST);
        assert_eq!(ErrorCode::Conflict.status(), StatusCode::CONFLICT);
        assert_eq!(ErrorCode::ServiceUnavailable.status(), StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(ErrorCode::ServiceUnavailable.code(), 1011);
    }

    #[test]
    fn test_display_is_identifier() {
        assert_eq!(ErrorCode::NotFound.to_string(), "NOT_FOUND");
    }
}
