//! Tracking mode and target ladder settings.

use axum::{Extension, response::Json};
use tracing::info;

use crate::{errors::AppError, settings::Settings, store::VamStore};

/// Get the current settings, or the defaults if none were saved.
#[utoipa::path(
    get,
    path = "/settings",
    tag = "settings",
    responses(
        (status = 200, description = "Current settings", body = Settings)
    )
)]
pub async fn get_settings(
    Extension(store): Extension<VamStore>,
) -> Result<Json<Settings>, AppError> {
    Ok(Json(store.load_settings().await?))
}

/// Replace the settings. Ladders are stored sorted by target value.
#[utoipa::path(
    put,
    path = "/settings",
    tag = "settings",
    request_body = Settings,
    responses(
        (status = 200, description = "Saved settings", body = Settings),
        (status = 400, description = "Invalid target or duplicate label")
    )
)]
pub async fn update_settings(
    Extension(store): Extension<VamStore>,
    Json(settings): Json<Settings>,
) -> Result<Json<Settings>, AppError> {
    settings.validate()?;
    let settings = settings.normalized();
    store.save_settings(&settings).await?;
    info!(
        "Settings saved with {} enabled mode(s)",
        settings.tracking_modes.len()
    );
    Ok(Json(settings))
}

/// Restore the built-in ladders.
#[utoipa::path(
    post,
    path = "/settings/reset",
    tag = "settings",
    responses(
        (status = 200, description = "Default settings", body = Settings)
    )
)]
pub async fn reset_settings(
    Extension(store): Extension<VamStore>,
) -> Result<Json<Settings>, AppError> {
    Ok(Json(store.reset_settings().await?))
}
