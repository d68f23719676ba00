//! User settings: which tracking modes are enabled and the target ladder for
//! each mode.

use std::collections::{BTreeMap, HashSet};

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::{Validate, ValidationErrors};

use crate::{
    errors::AppError,
    models::{TargetConfig, TargetUnit, TrackingMode},
};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Settings {
    pub tracking_modes: Vec<TrackingMode>,
    pub custom_configs: BTreeMap<TrackingMode, Vec<TargetConfig>>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            tracking_modes: TrackingMode::ALL.to_vec(),
            custom_configs: default_configs(),
        }
    }
}

/// Built-in ladders: 1–60 minutes, 100–1500 m of climbing, 1–10 km.
pub fn default_configs() -> BTreeMap<TrackingMode, Vec<TargetConfig>> {
    let time = [1, 2, 5, 10, 15, 20, 30, 60]
        .into_iter()
        .map(|min| TargetConfig::new((min * 60) as f64, format!("{min} min"), TargetUnit::Seconds))
        .collect();
    let ascent = [100, 250, 500, 1000, 1500]
        .into_iter()
        .map(|m| TargetConfig::new(m as f64, format!("{m} m"), TargetUnit::Meters))
        .collect();
    let distance = [1, 2, 5, 10]
        .into_iter()
        .map(|km| TargetConfig::new((km * 1000) as f64, format!("{km} km"), TargetUnit::Meters))
        .collect();

    BTreeMap::from([
        (TrackingMode::Time, time),
        (TrackingMode::Ascent, ascent),
        (TrackingMode::Distance, distance),
    ])
}

impl Settings {
    pub fn is_enabled(&self, mode: TrackingMode) -> bool {
        self.tracking_modes.contains(&mode)
    }

    pub fn configs(&self, mode: TrackingMode) -> &[TargetConfig] {
        self.custom_configs
            .get(&mode)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// Labels of `mode` in display order.
    pub fn ordered_labels(&self, mode: TrackingMode) -> impl Iterator<Item = &str> {
        self.configs(mode).iter().map(|c| c.label.as_str())
    }

    /// Rejects non-positive targets, empty or overlong labels, and duplicate
    /// labels within a mode.
    pub fn validate(&self) -> Result<(), AppError> {
        let mut messages = Vec::new();

        for (mode, configs) in &self.custom_configs {
            let mut seen = HashSet::new();
            for config in configs {
                if let Err(e) = config.validate() {
                    messages.extend(
                        validation_messages(&e)
                            .into_iter()
                            .map(|m| format!("{mode} '{}': {m}", config.label)),
                    );
                }
                if !seen.insert(config.label.as_str()) {
                    messages.push(format!("{mode}: duplicate label '{}'", config.label));
                }
            }
        }

        if messages.is_empty() {
            Ok(())
        } else {
            Err(AppError::InvalidInput(messages.join(", ")))
        }
    }

    /// Copy with modes de-duplicated and every ladder sorted by target value.
    pub fn normalized(mut self) -> Self {
        let mut seen = HashSet::new();
        self.tracking_modes.retain(|m| seen.insert(*m));

        for configs in self.custom_configs.values_mut() {
            configs.sort_by(|a, b| a.value.total_cmp(&b.value));
        }
        self
    }
}

/// Flattens validator errors into their human-readable messages.
pub fn validation_messages(errors: &ValidationErrors) -> Vec<String> {
    errors
        .field_errors()
        .into_iter()
        .flat_map(|(_, errors)| {
            errors
                .iter()
                .filter_map(|e| e.message.as_ref().map(|m| m.to_string()))
        })
        .collect()
}
