//! Windowed best-effort search.
//!
//! For one activity, find the sub-segment with the highest VAM among all
//! windows whose length (elapsed time, cumulative ascent or distance) lies in
//! a relative tolerance band around a target. Every start index is paired
//! with every later end index; the inner scan stops as soon as the window
//! length passes `target * (1 + tolerance)`, which is safe because all three
//! length measures are non-decreasing in the end index.

use tracing::trace;

use crate::{
    models::{EffortResult, StreamTriple, TrackingMode},
    scoring::{DEFAULT_SMOOTHING_WINDOW, ElevationGainMetric, TrackMetric, smooth_elevation, vam},
};

/// Relative half-width of the acceptance band around a target.
pub const DEFAULT_TOLERANCE: f64 = 0.1;

/// Minimum climbing for time and distance windows.
pub const MIN_GAIN_METERS: f64 = 5.0;

/// Fraction of the target an ascent window must actually climb.
pub const ASCENT_GAIN_FLOOR: f64 = 0.9;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SearchOptions {
    pub tolerance: f64,
    /// Moving-average width for elevation; 1 disables smoothing.
    pub smoothing_window: usize,
    /// Stop scanning end indices once the window overshoots the band.
    pub early_exit: bool,
}

impl Default for SearchOptions {
    fn default() -> Self {
        Self {
            tolerance: DEFAULT_TOLERANCE,
            smoothing_window: DEFAULT_SMOOTHING_WINDOW,
            early_exit: true,
        }
    }
}

impl SearchOptions {
    pub fn with_tolerance(tolerance: f64) -> Self {
        Self {
            tolerance,
            ..Self::default()
        }
    }
}

/// Search state for one activity: the smoothed elevation is computed once
/// and shared by every target searched through it.
#[derive(Debug, Clone)]
pub struct EffortSearch<'a> {
    smoothed: Vec<f64>,
    time: &'a [f64],
    distance: Option<&'a [f64]>,
    options: SearchOptions,
}

impl<'a> EffortSearch<'a> {
    pub fn new(streams: &'a StreamTriple, options: SearchOptions) -> Self {
        Self::from_slices(
            &streams.elevation,
            &streams.time,
            streams.distance.as_deref(),
            options,
        )
    }

    pub fn from_slices(
        elevation: &[f64],
        time: &'a [f64],
        distance: Option<&'a [f64]>,
        options: SearchOptions,
    ) -> Self {
        Self {
            smoothed: smooth_elevation(elevation, options.smoothing_window),
            time,
            distance,
            options,
        }
    }

    pub fn smoothed_elevation(&self) -> &[f64] {
        &self.smoothed
    }

    /// Best window for `target` measured along `mode`'s stream.
    ///
    /// Returns [`EffortResult::null`] when nothing qualifies, when distance
    /// mode is asked for without a distance stream, or when the target is not
    /// a positive finite number.
    pub fn best(&self, mode: TrackingMode, target: f64) -> EffortResult {
        let null = EffortResult::null(mode, target);
        if !(target.is_finite() && target > 0.0) {
            return null;
        }

        let distance = match (mode, self.distance) {
            (TrackingMode::Distance, None) => return null,
            (TrackingMode::Distance, Some(d)) => d,
            _ => &[][..],
        };

        let mut n = self.smoothed.len().min(self.time.len());
        if mode == TrackingMode::Distance {
            n = n.min(distance.len());
        }

        let band = target * self.options.tolerance;
        let ceiling = target * (1.0 + self.options.tolerance);
        let min_gain = match mode {
            TrackingMode::Ascent => target * ASCENT_GAIN_FLOOR,
            TrackingMode::Time | TrackingMode::Distance => MIN_GAIN_METERS,
        };

        let mut best_vam = 0.0;
        let mut best: Option<EffortResult> = None;

        for i in 0..n.saturating_sub(1) {
            let mut gain_metric = ElevationGainMetric::default();
            gain_metric.next_point(self.smoothed[i]);

            for j in (i + 1)..n {
                gain_metric.next_point(self.smoothed[j]);
                let gain = gain_metric.finish();
                let elapsed = self.time[j] - self.time[i];

                let length = match mode {
                    TrackingMode::Time => elapsed,
                    TrackingMode::Ascent => gain,
                    TrackingMode::Distance => distance[j] - distance[i],
                };

                if (length - target).abs() <= band {
                    let timed = mode == TrackingMode::Time || elapsed > 0.0;
                    if gain >= min_gain && timed {
                        let rate = vam(gain, elapsed);
                        if rate > best_vam {
                            best_vam = rate;
                            best = Some(EffortResult {
                                vam: rate.round() as i64,
                                elevation_gain: gain.round() as i64,
                                duration: elapsed.round() as i64,
                                distance: (mode == TrackingMode::Distance)
                                    .then(|| length.round() as i64),
                                start_idx: Some(i),
                                end_idx: Some(j),
                            });
                        }
                    }
                }

                if self.options.early_exit && length > ceiling {
                    break;
                }
            }
        }

        trace!(%mode, target, best_vam, "windowed search finished");
        best.unwrap_or(null)
    }
}

/// Highest-VAM window lasting `target_seconds` (within tolerance).
pub fn find_best_vam_by_time(
    elevation: &[f64],
    time: &[f64],
    target_seconds: f64,
    tolerance: f64,
) -> EffortResult {
    EffortSearch::from_slices(elevation, time, None, SearchOptions::with_tolerance(tolerance))
        .best(TrackingMode::Time, target_seconds)
}

/// Highest-VAM window climbing `target_ascent` meters (within tolerance).
pub fn find_best_vam_by_ascent(
    elevation: &[f64],
    time: &[f64],
    target_ascent: f64,
    tolerance: f64,
) -> EffortResult {
    EffortSearch::from_slices(elevation, time, None, SearchOptions::with_tolerance(tolerance))
        .best(TrackingMode::Ascent, target_ascent)
}

/// Highest-VAM window covering `target_distance` meters (within tolerance).
pub fn find_best_vam_by_distance(
    elevation: &[f64],
    time: &[f64],
    distance: Option<&[f64]>,
    target_distance: f64,
    tolerance: f64,
) -> EffortResult {
    EffortSearch::from_slices(
        elevation,
        time,
        distance,
        SearchOptions::with_tolerance(tolerance),
    )
    .best(TrackingMode::Distance, target_distance)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scoring::cumulative_gain;

    const RAW: SearchOptions = SearchOptions {
        tolerance: DEFAULT_TOLERANCE,
        smoothing_window: 1,
        early_exit: true,
    };

    fn uniform_time(n: usize, step: f64) -> Vec<f64> {
        (0..n).map(|i| i as f64 * step).collect()
    }

    /// Deterministic rolling climb with sensor noise and a few descents.
    fn rolling_ride(n: usize) -> StreamTriple {
        let mut elevation = Vec::with_capacity(n);
        let mut time = Vec::with_capacity(n);
        let mut distance = Vec::with_capacity(n);
        let (mut t, mut d) = (0.0, 0.0);
        for i in 0..n {
            let x = i as f64;
            let trend = 0.9 * x + 25.0 * (x / 40.0).sin();
            let noise = ((i * 7919) % 13) as f64 / 6.0 - 1.0;
            elevation.push(500.0 + trend + noise);
            time.push(t);
            distance.push(d);
            t += 5.0 + (i % 3) as f64;
            d += 30.0 + ((i * 31) % 11) as f64;
        }
        StreamTriple::new(elevation, time, Some(distance))
    }

    #[test]
    fn steady_climb_by_time_on_raw_stream() {
        // Smoothing disabled. The default pipeline smooths first and reports
        // 480 m/h for this climb, see the next test.
        let streams = StreamTriple::new(
            vec![100.0, 110.0, 120.0, 130.0, 140.0, 150.0],
            uniform_time(6, 60.0),
            None,
        );
        let best = EffortSearch::new(&streams, RAW).best(TrackingMode::Time, 300.0);

        assert_eq!(best.vam, 600);
        assert_eq!(best.elevation_gain, 50);
        assert_eq!(best.duration, 300);
        assert_eq!((best.start_idx, best.end_idx), (Some(0), Some(5)));
        assert_eq!(best.distance, None);
    }

    #[test]
    fn steady_climb_by_time_with_default_smoothing() {
        // Edge-truncated smoothing pulls the endpoints inwards: 105 .. 145.
        let elevation = [100.0, 110.0, 120.0, 130.0, 140.0, 150.0];
        let best = find_best_vam_by_time(&elevation, &uniform_time(6, 60.0), 300.0, 0.1);

        assert_eq!(best.elevation_gain, 40);
        assert_eq!(best.duration, 300);
        assert_eq!(best.vam, 480);
    }

    #[test]
    fn ascent_uses_cumulative_not_net_gain() {
        let elevation = [100.0, 120.0, 115.0, 130.0, 125.0, 140.0];
        let time = uniform_time(6, 60.0);
        let streams = StreamTriple::new(elevation.to_vec(), time.clone(), None);

        let best = EffortSearch::new(&streams, RAW).best(TrackingMode::Ascent, 35.0);
        let (i, j) = (best.start_idx.unwrap(), best.end_idx.unwrap());
        let gain = cumulative_gain(&elevation, i, j);

        assert_eq!((i, j), (0, 3));
        assert_eq!(best.elevation_gain, gain.round() as i64);
        assert_eq!(best.elevation_gain, 35);
        assert_ne!(best.elevation_gain, (elevation[j] - elevation[i]) as i64);
        assert_eq!(best.vam, vam(gain, time[j] - time[i]).round() as i64);
        assert_eq!(best.vam, 700);
    }

    #[test]
    fn ascent_target_out_of_reach_on_short_rolling_profile() {
        // No window of this profile climbs 36..44 m cumulatively, raw or smoothed.
        let elevation = [100.0, 120.0, 115.0, 130.0, 125.0, 140.0];
        let time = uniform_time(6, 60.0);
        let streams = StreamTriple::new(elevation.to_vec(), time.clone(), None);

        for opts in [RAW, SearchOptions::default()] {
            let best = EffortSearch::new(&streams, opts).best(TrackingMode::Ascent, 40.0);
            assert!(best.is_null());
            assert_eq!(best, EffortResult::null(TrackingMode::Ascent, 40.0));
        }
    }

    #[test]
    fn flat_profile_has_no_ascent_effort() {
        let best = find_best_vam_by_ascent(
            &[100.0, 100.0, 100.0, 100.0],
            &[0.0, 60.0, 120.0, 180.0],
            100.0,
            0.1,
        );
        assert_eq!(best.vam, 0);
        assert_eq!(best.elevation_gain, 0);
        assert_eq!(best.duration, 0);
        assert!(best.start_idx.is_none());
    }

    #[test]
    fn missing_distance_stream_returns_null_with_target() {
        let best = find_best_vam_by_distance(
            &[100.0, 120.0, 140.0],
            &[0.0, 60.0, 120.0],
            None,
            5000.0,
            0.1,
        );
        assert_eq!(best.vam, 0);
        assert_eq!(best.elevation_gain, 0);
        assert_eq!(best.duration, 0);
        assert_eq!(best.distance, Some(5000));
    }

    #[test]
    fn time_null_result_carries_target_duration() {
        // Barely any climbing: the 5 m floor rejects everything.
        let elevation = [100.0, 101.0, 100.0, 101.0, 100.0, 101.0];
        let best = find_best_vam_by_time(&elevation, &uniform_time(6, 60.0), 120.0, 0.1);
        assert_eq!(best, EffortResult::null(TrackingMode::Time, 120.0));
        assert_eq!(best.duration, 120);
    }

    #[test]
    fn distance_search_reports_rounded_distance() {
        let streams = StreamTriple::new(
            vec![200.0, 210.0, 225.0, 240.0, 250.0, 255.0],
            uniform_time(6, 60.0),
            Some(vec![0.0, 240.0, 500.0, 760.0, 1010.0, 1300.0]),
        );
        let best = EffortSearch::new(&streams, RAW).best(TrackingMode::Distance, 1000.0);

        // (0,4) covers 1010 m and climbs 50 m in 240 s; (1,5) covers 1060 m
        // and climbs 45 m in 240 s.
        assert_eq!((best.start_idx, best.end_idx), (Some(0), Some(4)));
        assert_eq!(best.distance, Some(1010));
        assert_eq!(best.elevation_gain, 50);
        assert_eq!(best.vam, 750);
    }

    #[test]
    fn tolerance_band_is_relative_and_inclusive() {
        let elevation = [0.0, 10.0, 20.0, 30.0, 40.0];
        let time = [0.0, 50.0, 110.0, 170.0, 240.0];
        let streams = StreamTriple::new(elevation.to_vec(), time.to_vec(), None);
        let search = EffortSearch::new(&streams, RAW);

        // Target 100 s with 10% tolerance accepts 90..=110 s windows only.
        let best = search.best(TrackingMode::Time, 100.0);
        assert!(matches!(best.duration, 90..=110), "got {}", best.duration);
        assert_eq!(best.duration, 110);
    }

    #[test]
    fn ascent_floor_can_reject_windows_inside_a_wide_band() {
        // With 20% tolerance the band starts at 80 m but the floor is 90 m.
        let elevation = [0.0, 85.0, 85.0, 85.0];
        let time = [0.0, 60.0, 120.0, 180.0];
        let streams = StreamTriple::new(elevation.to_vec(), time.to_vec(), None);
        let opts = SearchOptions {
            tolerance: 0.2,
            ..RAW
        };
        let best = EffortSearch::new(&streams, opts).best(TrackingMode::Ascent, 100.0);
        assert!(best.is_null());

        let elevation = [0.0, 85.0, 85.0, 180.0];
        let streams = StreamTriple::new(elevation.to_vec(), time.to_vec(), None);
        let best = EffortSearch::new(&streams, opts).best(TrackingMode::Ascent, 100.0);
        // (0,1) and (0,2) climb 85 m and are rejected, (0,3) overshoots at
        // 180 m; (1,3) and (2,3) both climb 95 m and the shorter one wins.
        assert_eq!((best.start_idx, best.end_idx), (Some(2), Some(3)));
        assert_eq!(best.elevation_gain, 95);
        assert_eq!(best.vam, 5700);
    }

    #[test]
    fn early_exit_never_changes_the_answer() {
        let ride = rolling_ride(400);
        let with_break = EffortSearch::new(&ride, SearchOptions::default());
        let without_break = EffortSearch::new(
            &ride,
            SearchOptions {
                early_exit: false,
                ..SearchOptions::default()
            },
        );

        for (mode, target) in [
            (TrackingMode::Time, 60.0),
            (TrackingMode::Time, 300.0),
            (TrackingMode::Time, 900.0),
            (TrackingMode::Ascent, 20.0),
            (TrackingMode::Ascent, 100.0),
            (TrackingMode::Distance, 1000.0),
            (TrackingMode::Distance, 5000.0),
        ] {
            assert_eq!(
                with_break.best(mode, target),
                without_break.best(mode, target),
                "{mode} {target}"
            );
        }
    }

    #[test]
    fn winning_window_respects_band_and_guard() {
        let ride = rolling_ride(300);
        let search = EffortSearch::new(&ride, SearchOptions::default());
        let smoothed = search.smoothed_elevation();

        let best = search.best(TrackingMode::Time, 600.0);
        let (i, j) = (best.start_idx.unwrap(), best.end_idx.unwrap());
        let elapsed = ride.time[j] - ride.time[i];
        let gain = cumulative_gain(smoothed, i, j);

        assert!((elapsed - 600.0).abs() <= 60.0);
        assert!(gain >= MIN_GAIN_METERS);
        assert_eq!(best.vam, vam(gain, elapsed).round() as i64);
    }

    #[test]
    fn shared_smoothing_matches_per_call_smoothing() {
        let ride = rolling_ride(200);
        let shared = EffortSearch::new(&ride, SearchOptions::default());
        let distance = ride.distance.as_deref();

        assert_eq!(
            shared.best(TrackingMode::Time, 300.0),
            find_best_vam_by_time(&ride.elevation, &ride.time, 300.0, DEFAULT_TOLERANCE)
        );
        assert_eq!(
            shared.best(TrackingMode::Ascent, 50.0),
            find_best_vam_by_ascent(&ride.elevation, &ride.time, 50.0, DEFAULT_TOLERANCE)
        );
        assert_eq!(
            shared.best(TrackingMode::Distance, 2000.0),
            find_best_vam_by_distance(
                &ride.elevation,
                &ride.time,
                distance,
                2000.0,
                DEFAULT_TOLERANCE
            )
        );
    }

    #[test]
    fn degenerate_inputs_do_not_panic() {
        let empty = StreamTriple::default();
        let search = EffortSearch::new(&empty, SearchOptions::default());
        assert!(search.best(TrackingMode::Time, 60.0).is_null());

        let single = StreamTriple::new(vec![100.0], vec![0.0], Some(vec![0.0]));
        let search = EffortSearch::new(&single, SearchOptions::default());
        assert!(search.best(TrackingMode::Distance, 1000.0).is_null());

        let ride = rolling_ride(50);
        let search = EffortSearch::new(&ride, SearchOptions::default());
        assert!(search.best(TrackingMode::Ascent, 0.0).is_null());
        assert!(search.best(TrackingMode::Time, -60.0).is_null());
        assert!(search.best(TrackingMode::Time, f64::NAN).is_null());
    }
}
