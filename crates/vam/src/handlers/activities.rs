//! Activity processing handlers.

use axum::{
    Extension,
    extract::{Path, Query},
    response::Json,
};
use serde::Deserialize;
use time::OffsetDateTime;
use utoipa::{IntoParams, ToSchema};

use crate::{
    activity_queue::{ActivityOutcome, ActivityQueue},
    errors::AppError,
    models::{ActivityMetadata, ActivitySummary, StreamTriple},
};

/// Optional details recorded with the activity's personal bests.
#[derive(Debug, Default, Deserialize, ToSchema, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct ActivityDetails {
    pub name: Option<String>,
    pub sport_type: Option<String>,
    /// RFC 3339 start time; defaults to now.
    #[serde(default, with = "time::serde::rfc3339::option")]
    #[schema(value_type = Option<String>, format = DateTime)]
    #[param(value_type = Option<String>)]
    pub date: Option<OffsetDateTime>,
}

impl ActivityDetails {
    fn into_metadata(self) -> ActivityMetadata {
        ActivityMetadata {
            name: self.name.unwrap_or_else(|| "Untitled Activity".to_string()),
            sport_type: self.sport_type.unwrap_or_else(|| "Ride".to_string()),
            date: self.date.unwrap_or_else(OffsetDateTime::now_utc),
        }
    }
}

/// Streams supplied by the caller, plus optional activity details.
#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct StreamUpload {
    #[serde(flatten)]
    pub streams: StreamTriple,
    #[serde(flatten)]
    pub details: ActivityDetails,
}

/// Fetch an activity's streams from the stream source and update personal bests.
#[utoipa::path(
    post,
    path = "/activities/{id}/process",
    tag = "activities",
    params(
        ("id" = String, Path, description = "Activity ID"),
        ActivityDetails
    ),
    responses(
        (status = 200, description = "Peaks found and new best count", body = ActivityOutcome),
        (status = 502, description = "Stream source unavailable")
    )
)]
pub async fn process_activity(
    Extension(queue): Extension<ActivityQueue>,
    Path(id): Path<String>,
    Query(details): Query<ActivityDetails>,
) -> Result<Json<ActivityOutcome>, AppError> {
    let summary = ActivitySummary {
        id,
        metadata: details.into_metadata(),
        elevation_gain: None,
    };
    Ok(Json(queue.process_activity(&summary).await?))
}

/// Process streams supplied in the request body and update personal bests.
#[utoipa::path(
    post,
    path = "/activities/{id}/streams",
    tag = "activities",
    params(
        ("id" = String, Path, description = "Activity ID")
    ),
    request_body = StreamUpload,
    responses(
        (status = 200, description = "Peaks found and new best count", body = ActivityOutcome),
        (status = 400, description = "Streams empty or not index-aligned")
    )
)]
pub async fn process_streams(
    Extension(queue): Extension<ActivityQueue>,
    Path(id): Path<String>,
    Json(upload): Json<StreamUpload>,
) -> Result<Json<ActivityOutcome>, AppError> {
    let StreamUpload { streams, details } = upload;
    if streams.is_empty() {
        return Err(AppError::InvalidInput("Elevation stream is empty".to_string()));
    }
    if !streams.is_aligned() {
        return Err(AppError::InvalidInput(
            "Streams must have equal length, strictly increasing time and non-decreasing distance"
                .to_string(),
        ));
    }

    let outcome = queue
        .process_streams(&id, details.into_metadata(), streams)
        .await?;
    Ok(Json(outcome))
}
