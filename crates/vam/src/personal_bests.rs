//! Personal-best tracking across activities.
//!
//! A stored best for a `(mode, label)` key is only replaced by a strictly
//! greater VAM. Keys are independent of each other, so the merged map can be
//! recomputed from scratch and written back in one go.

use time::OffsetDateTime;
use tracing::{debug, info};

use crate::{
    errors::AppError,
    models::{ActivityMetadata, ModeResults, PersonalBestRecord, PersonalBests},
    store::VamStore,
};

/// Outcome of merging one activity's results into the stored bests.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct PersonalBestUpdate {
    pub any_new_best: bool,
    /// Only the keys this activity took over.
    pub new_bests: PersonalBests,
    /// Every key after the merge.
    pub all_bests: PersonalBests,
}

impl PersonalBestUpdate {
    pub fn new_best_count(&self) -> usize {
        self.new_bests.values().map(|labels| labels.len()).sum()
    }
}

/// Merge `current` into `existing` on behalf of `activity_id`.
///
/// A missing key counts as VAM −∞, so the first result for a key always
/// becomes the best, even a zero one. Equal VAM keeps the older record.
pub fn update_personal_bests(
    activity_id: &str,
    current: &ModeResults,
    existing: PersonalBests,
    now: OffsetDateTime,
) -> PersonalBestUpdate {
    let mut all_bests = existing;
    let mut new_bests = PersonalBests::new();

    for (mode, efforts) in current {
        for (label, effort) in efforts {
            let stored = all_bests.get(mode).and_then(|labels| labels.get(label));

            let should_award = match stored {
                None => true,
                Some(record) => effort.vam > record.effort.vam,
            };
            if !should_award {
                continue;
            }

            match stored {
                Some(record) => info!(
                    "New {mode} best for {label}: {} m/h beats {} m/h from activity {}",
                    effort.vam, record.effort.vam, record.activity_id
                ),
                None => debug!("First {mode} best for {label}: {} m/h", effort.vam),
            }

            let record = PersonalBestRecord {
                effort: *effort,
                activity_id: activity_id.to_string(),
                date: now,
            };
            new_bests
                .entry(*mode)
                .or_default()
                .insert(label.clone(), record.clone());
            all_bests.entry(*mode).or_default().insert(label.clone(), record);
        }
    }

    PersonalBestUpdate {
        any_new_best: !new_bests.is_empty(),
        new_bests,
        all_bests,
    }
}

/// Load, merge and persist bests for one processed activity.
///
/// The merged map is written back whole, and only when something changed.
/// Metadata is kept only for activities that set at least one best.
pub async fn record_activity(
    store: &VamStore,
    activity_id: &str,
    metadata: ActivityMetadata,
    results: &ModeResults,
) -> Result<PersonalBestUpdate, AppError> {
    let existing = store.load_personal_bests().await?;
    let update = update_personal_bests(activity_id, results, existing, OffsetDateTime::now_utc());

    if update.any_new_best {
        store.save_personal_bests(&update.all_bests).await?;
        store.save_activity_metadata(activity_id, metadata).await?;
        info!(
            "Activity {activity_id} set {} new personal best(s)",
            update.new_best_count()
        );
    }

    Ok(update)
}
