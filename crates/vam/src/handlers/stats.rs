//! Health check handler.

use axum::http::StatusCode;

/// Health check endpoint.
#[utoipa::path(
    get,
    path = "/health",
    tag = "health",
    responses(
        (status = 200, description = "Health check passed")
    )
)]
pub async fn health_check() -> StatusCode {
    StatusCode::OK
}
