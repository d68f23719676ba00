//! Personal-best leaderboard handler.

use axum::{Extension, extract::Query, response::Json};
use serde::Serialize;
use utoipa::ToSchema;

use crate::{
    errors::AppError,
    leaderboard::{self, LeaderboardEntry, LeaderboardQuery, LeaderboardStats},
    store::VamStore,
};

#[derive(Debug, Serialize, ToSchema)]
pub struct LeaderboardResponse {
    pub entries: Vec<LeaderboardEntry>,
    /// Computed over the filtered entries.
    pub stats: LeaderboardStats,
}

/// Get personal bests as leaderboard rows for one tracking mode.
#[utoipa::path(
    get,
    path = "/leaderboard",
    tag = "leaderboard",
    params(LeaderboardQuery),
    responses(
        (status = 200, description = "Filtered and sorted leaderboard", body = LeaderboardResponse)
    )
)]
pub async fn get_leaderboard(
    Extension(store): Extension<VamStore>,
    Query(query): Query<LeaderboardQuery>,
) -> Result<Json<LeaderboardResponse>, AppError> {
    let bests = store.load_personal_bests().await?;
    let metadata = store.load_activity_metadata().await?;

    let rows = leaderboard::build_leaderboard(&bests, &metadata);
    let entries = leaderboard::filter_and_sort(&rows, &query);
    let stats = leaderboard::stats(&entries);

    Ok(Json(LeaderboardResponse { entries, stats }))
}
