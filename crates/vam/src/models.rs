use std::{collections::BTreeMap, fmt};

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use utoipa::ToSchema;
use validator::Validate;

/// Which stream defines the length of a search window.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, ToSchema,
)]
#[serde(rename_all = "lowercase")]
pub enum TrackingMode {
    Time,
    Ascent,
    Distance,
}

impl TrackingMode {
    pub const ALL: [TrackingMode; 3] = [
        TrackingMode::Time,
        TrackingMode::Ascent,
        TrackingMode::Distance,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            TrackingMode::Time => "time",
            TrackingMode::Ascent => "ascent",
            TrackingMode::Distance => "distance",
        }
    }
}

impl fmt::Display for TrackingMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub enum TargetUnit {
    #[serde(rename = "s")]
    Seconds,
    #[serde(rename = "m")]
    Meters,
}

/// One thing to search for, e.g. "hold 10 minutes" or "climb 500 m".
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema, Validate)]
pub struct TargetConfig {
    #[validate(range(exclusive_min = 0.0, message = "Target value must be positive"))]
    pub value: f64,
    #[validate(length(min = 1, max = 32, message = "Label must be between 1 and 32 characters"))]
    pub label: String,
    pub unit: TargetUnit,
}

impl TargetConfig {
    pub fn new(value: f64, label: impl Into<String>, unit: TargetUnit) -> Self {
        Self {
            value,
            label: label.into(),
            unit,
        }
    }
}

/// Three index-aligned telemetry streams for one activity.
///
/// The stream source guarantees that every present sequence has the same
/// length, that `time` is strictly increasing and that `distance`, when
/// present, is strictly increasing. The search code relies on this and does
/// not re-check it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct StreamTriple {
    /// Meters above reference, noisy.
    pub elevation: Vec<f64>,
    /// Seconds since activity start.
    pub time: Vec<f64>,
    /// Meters travelled.
    #[serde(default)]
    pub distance: Option<Vec<f64>>,
}

impl StreamTriple {
    pub fn new(elevation: Vec<f64>, time: Vec<f64>, distance: Option<Vec<f64>>) -> Self {
        Self {
            elevation,
            time,
            distance,
        }
    }

    pub fn len(&self) -> usize {
        self.elevation.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elevation.is_empty()
    }

    pub fn has_distance(&self) -> bool {
        self.distance.is_some()
    }

    /// Cheap shape check for callers that do not trust their source.
    ///
    /// Time must strictly increase. Distance may repeat while the rider is
    /// stopped but never decrease.
    pub fn is_aligned(&self) -> bool {
        let n = self.elevation.len();
        let increasing = |s: &[f64]| s.windows(2).all(|w| w[1] > w[0]);
        let non_decreasing = |s: &[f64]| s.windows(2).all(|w| w[1] >= w[0]);

        self.time.len() == n
            && increasing(&self.time)
            && self
                .distance
                .as_deref()
                .is_none_or(|d| d.len() == n && non_decreasing(d))
    }
}

/// Best window found for one target.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct EffortResult {
    /// Meters per hour, rounded.
    pub vam: i64,
    pub elevation_gain: i64,
    pub duration: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub distance: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_idx: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_idx: Option<usize>,
}

impl EffortResult {
    /// Record returned when no window qualifies for `target` in `mode`.
    pub fn null(mode: TrackingMode, target: f64) -> Self {
        match mode {
            TrackingMode::Time => Self {
                duration: target.round() as i64,
                ..Self::default()
            },
            TrackingMode::Ascent => Self::default(),
            TrackingMode::Distance => Self {
                distance: Some(target.round() as i64),
                ..Self::default()
            },
        }
    }

    pub fn is_null(&self) -> bool {
        self.start_idx.is_none()
    }
}

/// An effort that is (or was) the best ever seen for its `(mode, label)` key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PersonalBestRecord {
    #[serde(flatten)]
    pub effort: EffortResult,
    pub activity_id: String,
    #[serde(with = "time::serde::rfc3339")]
    #[schema(value_type = String, format = DateTime)]
    pub date: OffsetDateTime,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ActivityMetadata {
    pub name: String,
    pub sport_type: String,
    #[serde(with = "time::serde::rfc3339")]
    #[schema(value_type = String, format = DateTime)]
    pub date: OffsetDateTime,
}

/// Activity as listed by the stream source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ActivitySummary {
    pub id: String,
    pub metadata: ActivityMetadata,
    /// Total climbing reported by the source, if any.
    #[serde(default)]
    pub elevation_gain: Option<f64>,
}

/// Per-mode, per-label search results for one activity.
pub type ModeResults = BTreeMap<TrackingMode, BTreeMap<String, EffortResult>>;

/// Persisted best for every `(mode, label)` key.
pub type PersonalBests = BTreeMap<TrackingMode, BTreeMap<String, PersonalBestRecord>>;

/// Activity metadata keyed by activity id.
pub type MetadataMap = BTreeMap<String, ActivityMetadata>;
