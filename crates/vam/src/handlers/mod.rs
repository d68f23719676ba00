//! HTTP request handlers for the VAM API.
//!
//! This module re-exports handlers from focused submodules organized by domain.

pub mod activities;
pub mod leaderboards;
pub mod personal_bests;
pub mod settings;
pub mod stats;
pub mod sync;

// Re-export handlers from submodules (including utoipa __path types for OpenAPI)
pub use activities::{
    __path_process_activity, __path_process_streams, ActivityDetails, StreamUpload,
    process_activity, process_streams,
};
pub use leaderboards::{__path_get_leaderboard, LeaderboardResponse, get_leaderboard};
pub use personal_bests::{
    __path_clear_personal_bests, __path_get_personal_bests, clear_personal_bests,
    get_personal_bests,
};
pub use settings::{
    __path_get_settings, __path_reset_settings, __path_update_settings, get_settings,
    reset_settings, update_settings,
};
pub use stats::{__path_health_check, health_check};
pub use sync::{__path_get_sync_status, __path_start_sync, SyncQuery, get_sync_status, start_sync};
