pub mod activity_queue;
pub mod config;
pub mod effort_search;
pub mod errors;
pub mod handlers;
pub mod leaderboard;
pub mod models;
pub mod peaks;
pub mod personal_bests;
pub mod request_id;
pub mod scoring;
pub mod settings;
pub mod store;
pub mod stream_source;

use std::sync::Arc;

use axum::{
    Extension, Router, middleware,
    http::{HeaderValue, Method, header},
    routing::{get, post},
};
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    set_header::SetResponseHeaderLayer,
};
use tracing::info;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::{
    activity_queue::{ActivityOutcome, ActivityQueue, SyncProgress},
    config::AppConfig,
    handlers::{
        ActivityDetails, LeaderboardResponse, StreamUpload, clear_personal_bests, get_leaderboard,
        get_personal_bests, get_settings, get_sync_status, health_check, process_activity,
        process_streams, reset_settings, start_sync, update_settings,
    },
    leaderboard::{LeaderboardEntry, LeaderboardStats, SortColumn, SortDirection},
    models::{
        ActivityMetadata, EffortResult, PersonalBestRecord, StreamTriple, TargetConfig, TargetUnit,
        TrackingMode,
    },
    request_id::request_id_middleware,
    settings::Settings,
    store::{ObjectStoreKv, VamStore},
    stream_source::{StravaClient, StreamSource},
};

#[derive(OpenApi)]
#[openapi(
    info(title = "VAM API", description = "Climbing-rate personal bests from ride telemetry"),
    paths(
        handlers::health_check,
        handlers::get_settings,
        handlers::update_settings,
        handlers::reset_settings,
        handlers::get_personal_bests,
        handlers::clear_personal_bests,
        handlers::process_activity,
        handlers::process_streams,
        handlers::get_leaderboard,
        handlers::start_sync,
        handlers::get_sync_status,
    ),
    components(schemas(
        Settings,
        TargetConfig,
        TargetUnit,
        TrackingMode,
        EffortResult,
        PersonalBestRecord,
        ActivityMetadata,
        StreamTriple,
        StreamUpload,
        ActivityDetails,
        ActivityOutcome,
        SyncProgress,
        LeaderboardEntry,
        LeaderboardStats,
        LeaderboardResponse,
        SortColumn,
        SortDirection,
    )),
    tags(
        (name = "settings", description = "Tracking modes and target ladders"),
        (name = "personal-bests", description = "Stored best efforts"),
        (name = "activities", description = "Per-activity processing"),
        (name = "leaderboard", description = "Personal bests as ranked rows"),
        (name = "sync", description = "Bulk processing of activity history"),
    )
)]
pub struct ApiDoc;

pub fn create_router(queue: ActivityQueue, config: AppConfig) -> Router {
    let store = queue.store().clone();

    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers(Any)
        .allow_origin(Any);

    Router::new()
        .route("/health", get(health_check))
        .route("/settings", get(get_settings).put(update_settings))
        .route("/settings/reset", post(reset_settings))
        .route(
            "/personal-bests",
            get(get_personal_bests).delete(clear_personal_bests),
        )
        .route("/activities/{id}/process", post(process_activity))
        .route("/activities/{id}/streams", post(process_streams))
        .route("/leaderboard", get(get_leaderboard))
        .route("/sync", post(start_sync))
        .route("/sync/status", get(get_sync_status))
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .layer(Extension(store))
        .layer(Extension(queue))
        .layer(Extension(config))
        .layer(middleware::from_fn(request_id_middleware))
        .layer(cors)
        .layer(CompressionLayer::new())
        // Security headers
        .layer(SetResponseHeaderLayer::overriding(
            header::X_CONTENT_TYPE_OPTIONS,
            HeaderValue::from_static("nosniff"),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            header::X_FRAME_OPTIONS,
            HeaderValue::from_static("DENY"),
        ))
        .layer(SetResponseHeaderLayer::if_not_present(
            header::REFERRER_POLICY,
            HeaderValue::from_static("strict-origin-when-cross-origin"),
        ))
}

pub async fn run_server(config: AppConfig) -> anyhow::Result<()> {
    let store = VamStore::new(ObjectStoreKv::new_local(&config.store_path)?);

    let mut client = StravaClient::new(config.strava_base_url.clone());
    match &config.strava_session_cookie {
        Some(cookie) => client = client.with_session_cookie(cookie.clone()),
        None => tracing::warn!("STRAVA_SESSION_COOKIE not set; stream fetches will be anonymous"),
    }
    let source: Arc<dyn StreamSource> = Arc::new(client);

    let queue = ActivityQueue::new(store, source, config.sync_delay);
    let port = config.port;
    let app = create_router(queue, config);

    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{port}")).await?;
    info!("Server running on http://0.0.0.0:{port}");

    axum::serve(listener, app).await?;

    Ok(())
}
