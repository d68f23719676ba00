//! Bulk sync of the athlete's activity history.

use axum::{
    Extension,
    extract::Query,
    http::StatusCode,
    response::Json,
};
use serde::Deserialize;
use utoipa::IntoParams;
use validator::Validate;

use crate::{
    activity_queue::{ActivityQueue, SyncProgress},
    config::AppConfig,
    errors::AppError,
    settings::validation_messages,
};

#[derive(Debug, Deserialize, IntoParams, Validate)]
#[into_params(parameter_in = Query)]
pub struct SyncQuery {
    /// Defaults to the configured maximum.
    #[validate(range(min = 1, max = 1000, message = "max_activities must be between 1 and 1000"))]
    pub max_activities: Option<usize>,
}

/// Start processing the athlete's recent rides in the background.
#[utoipa::path(
    post,
    path = "/sync",
    tag = "sync",
    params(SyncQuery),
    responses(
        (status = 202, description = "Sync started", body = SyncProgress),
        (status = 400, description = "Invalid max_activities"),
        (status = 409, description = "A sync is already running")
    )
)]
pub async fn start_sync(
    Extension(queue): Extension<ActivityQueue>,
    Extension(config): Extension<AppConfig>,
    Query(query): Query<SyncQuery>,
) -> Result<(StatusCode, Json<SyncProgress>), AppError> {
    query
        .validate()
        .map_err(|e| AppError::InvalidInput(validation_messages(&e).join(", ")))?;

    let max = query.max_activities.unwrap_or(config.sync_max_activities);
    queue.start_sync(max)?;
    Ok((StatusCode::ACCEPTED, Json(queue.status())))
}

/// Get the progress of the current or last sync.
#[utoipa::path(
    get,
    path = "/sync/status",
    tag = "sync",
    responses(
        (status = 200, description = "Sync progress", body = SyncProgress)
    )
)]
pub async fn get_sync_status(Extension(queue): Extension<ActivityQueue>) -> Json<SyncProgress> {
    Json(queue.status())
}
