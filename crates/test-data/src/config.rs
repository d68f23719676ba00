//! Configuration types for synthetic ride generation.

use serde::{Deserialize, Serialize};

/// Shape of one generated ride.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RideConfig {
    /// Course length in meters.
    pub distance_meters: f64,
    /// Recording interval in seconds.
    pub sample_interval_s: f64,
    /// Altimeter noise standard deviation in meters.
    pub elevation_jitter_m: f64,
    /// Probability that a sample follows an auto-paused stop.
    pub pause_probability: f64,
    /// Duration range for stops (min, max) in seconds.
    pub pause_duration_range: (f64, f64),
    /// Record a distance stream (some devices omit it).
    pub with_distance: bool,
}

impl Default for RideConfig {
    fn default() -> Self {
        Self {
            distance_meters: 30_000.0,
            sample_interval_s: 2.0,
            elevation_jitter_m: 1.5,
            pause_probability: 0.002,
            pause_duration_range: (20.0, 240.0),
            with_distance: true,
        }
    }
}

/// Terrain preset for a generated course.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Terrain {
    Alpine,
    Foothills,
    Flat,
}

/// Configuration for the seed binary.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SeedConfig {
    /// Number of rides to generate.
    pub ride_count: usize,
    /// RNG seed; the same seed yields the same rides.
    pub seed: u64,
    /// Store directory the rides are processed into.
    pub store_path: String,
    /// Days between consecutive rides, counting back from now.
    pub days_between_rides: i64,
}

impl Default for SeedConfig {
    fn default() -> Self {
        Self {
            ride_count: 20,
            seed: 12345,
            store_path: "./vam-data".to_string(),
            days_between_rides: 3,
        }
    }
}
