//! Seed script: replays a synthetic season through the VAM engine.
//!
//! Run with:
//! ```
//! cargo run -p test-data --bin seed
//! ```
//!
//! `SEED`, `RIDES` and `STORE_PATH` override the defaults.

use std::{env, sync::Arc, time::Duration};

use rand::{SeedableRng, rngs::StdRng};
use test_data::{config::SeedConfig, generate_season, stream_source};
use time::OffsetDateTime;
use tracing_subscriber::EnvFilter;
use vam::{
    activity_queue::{ActivityQueue, SyncProgress},
    leaderboard::{self, LeaderboardQuery},
    store::{ObjectStoreKv, VamStore},
};

fn env_or<T: std::str::FromStr>(key: &str, default: T) -> T {
    env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let defaults = SeedConfig::default();
    let config = SeedConfig {
        ride_count: env_or("RIDES", defaults.ride_count),
        seed: env_or("SEED", defaults.seed),
        store_path: env_or("STORE_PATH", defaults.store_path.clone()),
        ..defaults
    };

    let mut rng = StdRng::seed_from_u64(config.seed);
    let rides = generate_season(&config, OffsetDateTime::now_utc(), &mut rng);
    tracing::info!("Generated {} rides with seed {}", rides.len(), config.seed);

    let store = VamStore::new(ObjectStoreKv::new_local(&config.store_path)?);
    let queue = ActivityQueue::new(store.clone(), Arc::new(stream_source(&rides)), Duration::ZERO);

    queue.start_sync(rides.len())?.await?;

    match queue.status() {
        SyncProgress::Complete {
            processed,
            new_bests,
        } => tracing::info!("Processed {processed} rides, {new_bests} set new bests"),
        other => anyhow::bail!("Sync did not complete: {other:?}"),
    }

    let bests = store.load_personal_bests().await?;
    let metadata = store.load_activity_metadata().await?;
    let rows = leaderboard::build_leaderboard(&bests, &metadata);
    let top = leaderboard::filter_and_sort(&rows, &LeaderboardQuery::default());
    let stats = leaderboard::stats(&top);

    tracing::info!("Seed completed into {}", config.store_path);
    tracing::info!("  Time bests: {}", top.len());
    tracing::info!("  Best VAM: {} m/h", stats.best_vam);
    tracing::info!("  Average VAM: {} m/h", stats.average_vam);
    for row in top.iter().take(5) {
        tracing::info!("  {:>7} {:>5} m/h  {}", row.period, row.vam, row.activity_name);
    }

    Ok(())
}
