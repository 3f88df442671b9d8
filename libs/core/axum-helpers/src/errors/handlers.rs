use axum::{
    Json,
    response::{IntoResponse, Response},
};

use super::{ErrorCode, ErrorResponse};

/// Fallback handler for unrouted paths.
pub async fn not_found() -> Response {
    let code = ErrorCode::NotFound;
    let body = Json(ErrorResponse::new(code, "No route for this path"));

    (code.status(), body).into_response()
}
