use std::{sync::Arc, time::Duration};

use serde::Serialize;
use tokio::{sync::watch, task::JoinHandle};
use tracing::{error, info, warn};
use utoipa::ToSchema;

use crate::{
    errors::AppError,
    models::{ActivityMetadata, ActivitySummary, ModeResults, StreamTriple},
    peaks,
    personal_bests,
    store::VamStore,
    stream_source::StreamSource,
};

pub const DEFAULT_SYNC_DELAY: Duration = Duration::from_millis(200);
pub const DEFAULT_MAX_ACTIVITIES: usize = 100;

/// What processing one activity produced.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ActivityOutcome {
    pub activity_id: String,
    #[schema(value_type = Object)]
    pub results: ModeResults,
    pub new_best_count: usize,
}

impl ActivityOutcome {
    fn skipped(activity_id: &str) -> Self {
        Self {
            activity_id: activity_id.to_string(),
            results: ModeResults::new(),
            new_best_count: 0,
        }
    }
}

/// Bulk sync state. `new_bests` counts activities that set at least one
/// personal best.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, ToSchema)]
#[serde(tag = "status", rename_all = "camelCase")]
pub enum SyncProgress {
    #[default]
    Idle,
    #[serde(rename_all = "camelCase")]
    Running {
        processed: usize,
        total: usize,
        new_bests: usize,
    },
    #[serde(rename_all = "camelCase")]
    Complete {
        processed: usize,
        new_bests: usize,
    },
    Failed {
        error: String,
    },
}

impl SyncProgress {
    pub fn is_running(&self) -> bool {
        matches!(self, SyncProgress::Running { .. })
    }
}

/// Runs activities through peak search and personal-best tracking.
///
/// Cloning is cheap; all clones share the store and the sync state.
#[derive(Clone)]
pub struct ActivityQueue {
    store: VamStore,
    source: Arc<dyn StreamSource>,
    sync_delay: Duration,
    progress: Arc<watch::Sender<SyncProgress>>,
}

impl ActivityQueue {
    pub fn new(store: VamStore, source: Arc<dyn StreamSource>, sync_delay: Duration) -> Self {
        let (progress, _) = watch::channel(SyncProgress::Idle);
        Self {
            store,
            source,
            sync_delay,
            progress: Arc::new(progress),
        }
    }

    pub fn store(&self) -> &VamStore {
        &self.store
    }

    pub fn status(&self) -> SyncProgress {
        self.progress.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<SyncProgress> {
        self.progress.subscribe()
    }

    /// Fetch streams for `summary` and process them. Activities without
    /// usable streams are skipped with an empty outcome.
    pub async fn process_activity(
        &self,
        summary: &ActivitySummary,
    ) -> Result<ActivityOutcome, AppError> {
        match self.source.fetch_streams(&summary.id).await? {
            Some(streams) => {
                self.process_streams(&summary.id, summary.metadata.clone(), streams)
                    .await
            }
            None => {
                info!("Skipping activity {}: no elevation or time stream", summary.id);
                Ok(ActivityOutcome::skipped(&summary.id))
            }
        }
    }

    /// Process streams the caller already holds.
    pub async fn process_streams(
        &self,
        activity_id: &str,
        metadata: ActivityMetadata,
        streams: StreamTriple,
    ) -> Result<ActivityOutcome, AppError> {
        let settings = self.store.load_settings().await?;

        // The search is CPU bound; keep it off the async workers.
        let results =
            tokio::task::spawn_blocking(move || peaks::calculate_peaks(&streams, &settings))
                .await
                .map_err(anyhow::Error::from)?;

        let update =
            personal_bests::record_activity(&self.store, activity_id, metadata, &results).await?;

        Ok(ActivityOutcome {
            activity_id: activity_id.to_string(),
            results,
            new_best_count: update.new_best_count(),
        })
    }

    /// Start a background sync of up to `max_activities` listed activities.
    ///
    /// Fails with [`AppError::SyncInProgress`] while another sync runs.
    /// Activities are processed one at a time; every committed update stays
    /// valid if the task is aborted part way, and the state then reads
    /// `Failed` so a new sync can start.
    pub fn start_sync(&self, max_activities: usize) -> Result<JoinHandle<()>, AppError> {
        let started = self.progress.send_if_modified(|progress| {
            if progress.is_running() {
                return false;
            }
            *progress = SyncProgress::Running {
                processed: 0,
                total: 0,
                new_bests: 0,
            };
            true
        });
        if !started {
            return Err(AppError::SyncInProgress);
        }

        let queue = self.clone();
        let guard = SyncGuard {
            progress: self.progress.clone(),
        };
        Ok(tokio::spawn(async move {
            let final_state = match queue.run_sync(max_activities).await {
                Ok((processed, new_bests)) => {
                    info!(
                        "Sync complete: {processed} activities processed, {new_bests} with new bests"
                    );
                    SyncProgress::Complete {
                        processed,
                        new_bests,
                    }
                }
                Err(e) => {
                    error!("Sync failed: {e}");
                    SyncProgress::Failed {
                        error: e.to_string(),
                    }
                }
            };
            queue.progress.send_replace(final_state);
            drop(guard);
        }))
    }

    async fn run_sync(&self, max_activities: usize) -> Result<(usize, usize), AppError> {
        info!("Starting sync of up to {max_activities} activities");
        let activities = self.source.list_activities(max_activities).await?;
        let total = activities.len();
        info!("Found {total} activities to process");

        let mut processed = 0;
        let mut new_bests = 0;
        self.publish(processed, total, new_bests);

        for (i, activity) in activities.iter().enumerate() {
            if i > 0 && !self.sync_delay.is_zero() {
                tokio::time::sleep(self.sync_delay).await;
            }

            match self.process_activity(activity).await {
                Ok(outcome) if outcome.new_best_count > 0 => new_bests += 1,
                Ok(_) => {}
                Err(e) => warn!("Failed to process activity {}: {e}", activity.id),
            }
            processed += 1;
            self.publish(processed, total, new_bests);
        }

        Ok((processed, new_bests))
    }

    fn publish(&self, processed: usize, total: usize, new_bests: usize) {
        self.progress.send_replace(SyncProgress::Running {
            processed,
            total,
            new_bests,
        });
    }
}

/// Leaves the sync state as `Failed` when a sync task is aborted or panics
/// while still `Running`.
struct SyncGuard {
    progress: Arc<watch::Sender<SyncProgress>>,
}

impl Drop for SyncGuard {
    fn drop(&mut self) {
        let interrupted = self.progress.send_if_modified(|progress| {
            if !progress.is_running() {
                return false;
            }
            *progress = SyncProgress::Failed {
                error: "Sync aborted".to_string(),
            };
            true
        });
        if interrupted {
            warn!("Sync stopped before completing");
        }
    }
}
