use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;
use tracing::error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Store error: {0}")]
    Store(#[from] object_store::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Stream source error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Stream source returned HTTP {0}")]
    UpstreamStatus(u16),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("A sync is already running")]
    SyncInProgress,

    #[error("Queue error: {0}")]
    Queue(#[from] anyhow::Error),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_message) = match &self {
            AppError::Store(e) => {
                error!("Store error: {e}");
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error")
            }
            AppError::Serialization(e) => {
                error!("Serialization error: {e}");
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error")
            }
            AppError::Io(e) => {
                error!("IO error: {e}");
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error")
            }
            AppError::Http(e) => {
                error!("Stream source error: {e}");
                (StatusCode::BAD_GATEWAY, "Stream source unavailable")
            }
            AppError::UpstreamStatus(code) => {
                error!("Stream source returned HTTP {code}");
                (StatusCode::BAD_GATEWAY, "Stream source unavailable")
            }
            AppError::InvalidInput(msg) => (StatusCode::BAD_REQUEST, msg.as_str()),
            AppError::SyncInProgress => (StatusCode::CONFLICT, "A sync is already running"),
            AppError::Queue(e) => {
                error!("Queue error: {e}");
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error")
            }
        };

        let body = Json(json!({
            "error": error_message,
        }));

        (status, body).into_response()
    }
}
