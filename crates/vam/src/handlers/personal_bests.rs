use axum::{Extension, http::StatusCode, response::Json};
use tracing::info;

use crate::{errors::AppError, models::PersonalBests, store::VamStore};

/// Get every stored personal best, keyed by mode and target label.
#[utoipa::path(
    get,
    path = "/personal-bests",
    tag = "personal-bests",
    responses(
        (status = 200, description = "Personal bests by mode and label", body = Object)
    )
)]
pub async fn get_personal_bests(
    Extension(store): Extension<VamStore>,
) -> Result<Json<PersonalBests>, AppError> {
    Ok(Json(store.load_personal_bests().await?))
}

/// Forget all personal bests. Activity metadata is kept.
#[utoipa::path(
    delete,
    path = "/personal-bests",
    tag = "personal-bests",
    responses(
        (status = 204, description = "Personal bests cleared")
    )
)]
pub async fn clear_personal_bests(
    Extension(store): Extension<VamStore>,
) -> Result<StatusCode, AppError> {
    store.clear_personal_bests().await?;
    info!("Personal bests cleared");
    Ok(StatusCode::NO_CONTENT)
}
