//! Elevation primitives shared by every windowed search: noise smoothing,
//! cumulative gain accounting and the VAM rate itself.

/// Default width of the centred moving average applied to elevation.
pub const DEFAULT_SMOOTHING_WINDOW: usize = 3;

const SECONDS_PER_HOUR: f64 = 3600.0;

/// Streaming accumulator over one stream of samples.
pub trait TrackMetric {
    type Score;
    fn next_point(&mut self, sample: f64);
    fn finish(&mut self) -> Self::Score;
}

/// Sums only the positive steps between consecutive elevation samples.
#[derive(Debug, Clone, Default)]
pub struct ElevationGainMetric {
    total_gain: f64,
    last_elevation: Option<f64>,
}

impl TrackMetric for ElevationGainMetric {
    type Score = f64;

    fn next_point(&mut self, elevation: f64) {
        if let Some(last) = self.last_elevation {
            let gain = elevation - last;
            if gain > 0.0 {
                self.total_gain += gain;
            }
        }
        self.last_elevation = Some(elevation);
    }

    fn finish(&mut self) -> f64 {
        self.total_gain
    }
}

/// Edge-truncated centred moving average.
///
/// Sample `i` becomes the mean of the inputs in
/// `[i - window/2, i + window/2]`, clipped to the slice. Boundary windows are
/// simply smaller; there is no padding. Inputs shorter than `window_size` are
/// returned unchanged.
pub fn smooth_elevation(elevation: &[f64], window_size: usize) -> Vec<f64> {
    if elevation.len() < window_size {
        return elevation.to_vec();
    }

    let half = window_size / 2;
    let last = elevation.len() - 1;

    (0..elevation.len())
        .map(|i| {
            let window = &elevation[i.saturating_sub(half)..=(i + half).min(last)];
            window.iter().sum::<f64>() / window.len() as f64
        })
        .collect()
}

/// Total meters climbed between `start_idx` and `end_idx` inclusive.
///
/// Every positive step counts, so a path that climbs, dips and climbs again
/// reports the sum of both climbs rather than the net change. Requires
/// `start_idx < end_idx < elevation.len()`; anything else yields 0.
pub fn cumulative_gain(elevation: &[f64], start_idx: usize, end_idx: usize) -> f64 {
    if start_idx >= end_idx || end_idx >= elevation.len() {
        return 0.0;
    }

    let mut metric = ElevationGainMetric::default();
    for &e in &elevation[start_idx..=end_idx] {
        metric.next_point(e);
    }
    metric.finish()
}

/// Vertical ascent rate in meters per hour. Zero elapsed time yields 0.
pub fn vam(gain: f64, seconds: f64) -> f64 {
    if seconds == 0.0 {
        return 0.0;
    }
    gain / (seconds / SECONDS_PER_HOUR)
}
