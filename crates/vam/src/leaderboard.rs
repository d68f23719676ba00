//! Flattened view over stored personal bests, joined with activity metadata.

use std::{cmp::Ordering, collections::HashSet};

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use utoipa::{IntoParams, ToSchema};

use crate::models::{MetadataMap, PersonalBests, TrackingMode};

const UNKNOWN_ACTIVITY: &str = "Unknown Activity";
const DEFAULT_SPORT: &str = "Ride";
/// Filter value that disables the sport or period filter.
pub const ALL: &str = "all";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LeaderboardEntry {
    pub mode: TrackingMode,
    /// Target label, e.g. "10 min".
    pub period: String,
    pub activity_id: String,
    pub vam: i64,
    pub elevation_gain: i64,
    pub duration: i64,
    pub distance: i64,
    /// When the best was recorded.
    #[serde(with = "time::serde::rfc3339")]
    #[schema(value_type = String, format = DateTime)]
    pub date: OffsetDateTime,
    pub activity_name: String,
    pub sport_type: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum SortColumn {
    #[default]
    Vam,
    Date,
    Elevation,
    Duration,
    Period,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    Asc,
    #[default]
    Desc,
}

#[derive(Debug, Clone, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct LeaderboardQuery {
    /// Sport type to keep, or "all".
    pub sport: Option<String>,
    #[serde(default = "default_mode")]
    #[param(value_type = Option<TrackingMode>)]
    pub mode: TrackingMode,
    /// Target label to keep, or "all".
    pub period: Option<String>,
    #[serde(default)]
    #[param(value_type = Option<SortColumn>)]
    pub sort: SortColumn,
    #[serde(default)]
    #[param(value_type = Option<SortDirection>)]
    pub direction: SortDirection,
}

fn default_mode() -> TrackingMode {
    TrackingMode::Time
}

impl Default for LeaderboardQuery {
    fn default() -> Self {
        Self {
            sport: None,
            mode: default_mode(),
            period: None,
            sort: SortColumn::default(),
            direction: SortDirection::default(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LeaderboardStats {
    /// Distinct activities among the rows.
    pub total_activities: usize,
    pub average_vam: i64,
    pub best_vam: i64,
    pub total_elevation: i64,
}

/// One row per stored best. Bests whose activity has no metadata get a
/// placeholder name and the best's own date.
pub fn build_leaderboard(bests: &PersonalBests, metadata: &MetadataMap) -> Vec<LeaderboardEntry> {
    bests
        .iter()
        .flat_map(|(mode, labels)| {
            labels.iter().map(move |(label, best)| {
                let (activity_name, sport_type) = match metadata.get(&best.activity_id) {
                    Some(meta) => (meta.name.clone(), meta.sport_type.clone()),
                    None => (UNKNOWN_ACTIVITY.to_string(), DEFAULT_SPORT.to_string()),
                };
                LeaderboardEntry {
                    mode: *mode,
                    period: label.clone(),
                    activity_id: best.activity_id.clone(),
                    vam: best.effort.vam,
                    elevation_gain: best.effort.elevation_gain,
                    duration: best.effort.duration,
                    distance: best.effort.distance.unwrap_or(0),
                    date: best.date,
                    activity_name,
                    sport_type,
                }
            })
        })
        .collect()
}

fn matches_filter(filter: Option<&str>, value: &str) -> bool {
    filter.is_none_or(|f| f == ALL || f == value)
}

/// Leading number of a label such as "10 min" or "2.5 km".
fn period_value(label: &str) -> Option<f64> {
    let trimmed = label.trim_start();
    let end = trimmed
        .char_indices()
        .find(|&(i, c)| !(c.is_ascii_digit() || c == '.' || (i == 0 && (c == '-' || c == '+'))))
        .map_or(trimmed.len(), |(i, _)| i);
    trimmed[..end].parse().ok()
}

fn compare(a: &LeaderboardEntry, b: &LeaderboardEntry, column: SortColumn) -> Ordering {
    match column {
        SortColumn::Vam => a.vam.cmp(&b.vam),
        SortColumn::Date => a.date.cmp(&b.date),
        SortColumn::Elevation => a.elevation_gain.cmp(&b.elevation_gain),
        SortColumn::Duration => a.duration.cmp(&b.duration),
        SortColumn::Period => match (period_value(&a.period), period_value(&b.period)) {
            (Some(x), Some(y)) => x.total_cmp(&y),
            (x, y) => x.is_some().cmp(&y.is_some()),
        },
    }
}

/// Rows of `query.mode` matching the sport and period filters, sorted
/// stably by the requested column.
pub fn filter_and_sort(
    entries: &[LeaderboardEntry],
    query: &LeaderboardQuery,
) -> Vec<LeaderboardEntry> {
    let mut rows: Vec<_> = entries
        .iter()
        .filter(|e| e.mode == query.mode)
        .filter(|e| matches_filter(query.sport.as_deref(), &e.sport_type))
        .filter(|e| matches_filter(query.period.as_deref(), &e.period))
        .cloned()
        .collect();

    rows.sort_by(|a, b| {
        let ord = compare(a, b, query.sort);
        match query.direction {
            SortDirection::Asc => ord,
            SortDirection::Desc => ord.reverse(),
        }
    });
    rows
}

/// Summary over `entries`; all zero when empty.
pub fn stats(entries: &[LeaderboardEntry]) -> LeaderboardStats {
    if entries.is_empty() {
        return LeaderboardStats::default();
    }

    let total_activities = entries
        .iter()
        .map(|e| e.activity_id.as_str())
        .collect::<HashSet<_>>()
        .len();
    let vam_sum: i64 = entries.iter().map(|e| e.vam).sum();

    LeaderboardStats {
        total_activities,
        average_vam: (vam_sum as f64 / entries.len() as f64).round() as i64,
        best_vam: entries.iter().map(|e| e.vam).max().unwrap_or_default(),
        total_elevation: entries.iter().map(|e| e.elevation_gain).sum(),
    }
}
