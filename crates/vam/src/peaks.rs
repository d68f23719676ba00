//! Runs the windowed search for every configured target of one activity.

use std::collections::BTreeMap;

use tracing::debug;

use crate::{
    effort_search::{EffortSearch, SearchOptions},
    models::{ModeResults, StreamTriple, TrackingMode},
    settings::Settings,
};

/// Best effort per enabled mode and per target label, with default search
/// options.
pub fn calculate_peaks(streams: &StreamTriple, settings: &Settings) -> ModeResults {
    calculate_peaks_with(streams, settings, SearchOptions::default())
}

/// Like [`calculate_peaks`] with explicit search options.
///
/// A mode contributes an entry only when it is enabled and has at least one
/// target; distance mode additionally needs a distance stream. Elevation is
/// smoothed once and shared by every search.
pub fn calculate_peaks_with(
    streams: &StreamTriple,
    settings: &Settings,
    options: SearchOptions,
) -> ModeResults {
    let search = EffortSearch::new(streams, options);
    let mut results = ModeResults::new();

    for mode in TrackingMode::ALL {
        let configs = settings.configs(mode);
        if !settings.is_enabled(mode) || configs.is_empty() {
            continue;
        }
        if mode == TrackingMode::Distance && !streams.has_distance() {
            debug!("No distance stream, skipping distance targets");
            continue;
        }

        let efforts: BTreeMap<_, _> = configs
            .iter()
            .map(|config| (config.label.clone(), search.best(mode, config.value)))
            .collect();

        debug!(
            %mode,
            targets = efforts.len(),
            found = efforts.values().filter(|e| !e.is_null()).count(),
            "Computed peaks"
        );
        results.insert(mode, efforts);
    }

    results
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{EffortResult, TargetConfig, TargetUnit};

    fn climb(n: usize) -> StreamTriple {
        // 10 s samples, 1.5 m and 25 m per sample: 540 m/h.
        let elevation = (0..n).map(|i| 300.0 + 1.5 * i as f64).collect();
        let time = (0..n).map(|i| 10.0 * i as f64).collect();
        let distance = (0..n).map(|i| 25.0 * i as f64).collect();
        StreamTriple::new(elevation, time, Some(distance))
    }

    #[test]
    fn default_settings_cover_every_label() {
        let streams = climb(800);
        let settings = Settings::default();
        let results = calculate_peaks(&streams, &settings);

        assert_eq!(results.len(), 3);
        for mode in TrackingMode::ALL {
            let labels: Vec<_> = settings.ordered_labels(mode).collect();
            assert_eq!(results[&mode].len(), labels.len());
            assert!(labels.iter().all(|l| results[&mode].contains_key(*l)));
        }

        let ten_min = results[&TrackingMode::Time]["10 min"];
        assert_eq!(ten_min.vam, 540);
        assert!((540..=660).contains(&ten_min.duration));
        let five_km = results[&TrackingMode::Distance]["5 km"];
        assert!(five_km.distance.is_some());
        assert!(!five_km.is_null());
    }

    #[test]
    fn disabled_and_empty_modes_are_skipped() {
        let streams = climb(100);
        let mut settings = Settings {
            tracking_modes: vec![TrackingMode::Ascent],
            ..Settings::default()
        };
        let results = calculate_peaks(&streams, &settings);
        assert_eq!(results.keys().collect::<Vec<_>>(), [&TrackingMode::Ascent]);

        settings.tracking_modes = TrackingMode::ALL.to_vec();
        settings.custom_configs.insert(TrackingMode::Time, Vec::new());
        let results = calculate_peaks(&streams, &settings);
        assert!(!results.contains_key(&TrackingMode::Time));
        assert!(results.contains_key(&TrackingMode::Distance));
    }

    #[test]
    fn distance_mode_needs_a_distance_stream() {
        let mut streams = climb(100);
        streams.distance = None;
        let results = calculate_peaks(&streams, &Settings::default());
        assert!(!results.contains_key(&TrackingMode::Distance));
        assert!(results.contains_key(&TrackingMode::Time));
    }

    #[test]
    fn config_order_does_not_change_results() {
        let streams = climb(400);
        let forward = Settings::default();
        let mut reversed = Settings::default();
        for configs in reversed.custom_configs.values_mut() {
            configs.reverse();
        }
        assert_eq!(
            calculate_peaks(&streams, &forward),
            calculate_peaks(&streams, &reversed)
        );
    }

    #[test]
    fn unreachable_targets_yield_null_results() {
        let streams = climb(30);
        let settings = Settings {
            tracking_modes: vec![TrackingMode::Time],
            custom_configs: BTreeMap::from([(
                TrackingMode::Time,
                vec![TargetConfig::new(3600.0, "60 min", TargetUnit::Seconds)],
            )]),
        };
        let results = calculate_peaks(&streams, &settings);
        assert_eq!(
            results[&TrackingMode::Time]["60 min"],
            EffortResult::null(TrackingMode::Time, 3600.0)
        );
    }
}
