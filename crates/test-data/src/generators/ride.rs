//! Synthetic ride telemetry.

use rand::Rng;
use rand_distr::{Distribution, Normal};
use time::OffsetDateTime;
use vam::{
    models::{ActivityMetadata, ActivitySummary, StreamTriple},
    scoring::{DEFAULT_SMOOTHING_WINDOW, cumulative_gain, smooth_elevation},
};

use crate::{
    config::{RideConfig, Terrain},
    profiles::{self, AthleteProfile},
    terrain::{ElevationGenerator, add_elevation_jitter},
};

/// Distance over which the rider "sees" the grade, in meters.
const GRADE_SPAN_M: f64 = 20.0;

/// A generated ride with its listing entry.
#[derive(Debug, Clone)]
pub struct GeneratedRide {
    pub summary: ActivitySummary,
    pub streams: StreamTriple,
}

/// Generates index-aligned elevation, time and distance streams.
pub struct RideGenerator {
    config: RideConfig,
    elevation: ElevationGenerator,
}

impl RideGenerator {
    pub fn new(seed: u32) -> Self {
        Self {
            config: RideConfig::default(),
            elevation: ElevationGenerator::new(seed),
        }
    }

    pub fn for_terrain(terrain: Terrain, seed: u32) -> Self {
        let elevation = match terrain {
            Terrain::Alpine => ElevationGenerator::alpine(seed),
            Terrain::Foothills => ElevationGenerator::foothills(seed),
            Terrain::Flat => ElevationGenerator::flat(seed),
        };
        Self {
            config: RideConfig::default(),
            elevation,
        }
    }

    pub fn with_config(mut self, config: RideConfig) -> Self {
        self.config = config;
        self
    }

    pub fn with_distance(mut self, meters: f64) -> Self {
        self.config.distance_meters = meters;
        self
    }

    pub fn with_elevation(mut self, elevation: ElevationGenerator) -> Self {
        self.elevation = elevation;
        self
    }

    pub fn without_distance_stream(mut self) -> Self {
        self.config.with_distance = false;
        self
    }

    /// Rides the course once with `profile`.
    ///
    /// Time and distance are strictly increasing. Stops show up as gaps in
    /// the time stream, the way auto-pause records them.
    pub fn generate(&self, profile: &dyn AthleteProfile, rng: &mut impl Rng) -> StreamTriple {
        let form = profiles::sample_variance(profile, rng);
        let interval = self.config.sample_interval_s.max(0.1);
        // Small sample-to-sample speed wobble.
        let wobble = Normal::<f64>::new(1.0, 0.03).ok();

        let mut elevation = Vec::new();
        let mut time = Vec::new();
        let mut distance = Vec::new();
        let (mut t, mut d) = (0.0_f64, 0.0_f64);

        loop {
            let true_elev = self.elevation.elevation_at(d);
            elevation.push(add_elevation_jitter(true_elev, rng, self.config.elevation_jitter_m));
            time.push(t);
            distance.push(d);

            if d >= self.config.distance_meters {
                break;
            }

            let grade = self.elevation.grade_at(d, GRADE_SPAN_M);
            let noise = wobble.map_or(1.0, |w| w.sample(rng).clamp(0.9, 1.1));
            let speed = profiles::speed_at_grade(profile, grade, form * noise);
            d += speed * interval;

            t += interval;
            if rng.r#gen::<f64>() < self.config.pause_probability {
                let (min, max) = self.config.pause_duration_range;
                t += if max > min { rng.gen_range(min..max) } else { min.max(0.0) };
            }
        }

        StreamTriple::new(
            elevation,
            time,
            self.config.with_distance.then_some(distance),
        )
    }

    /// A complete listing entry plus streams, as a stream source would serve it.
    pub fn generate_ride(
        &self,
        id: impl Into<String>,
        date: OffsetDateTime,
        profile: &dyn AthleteProfile,
        rng: &mut impl Rng,
    ) -> GeneratedRide {
        let streams = self.generate(profile, rng);
        let smoothed = smooth_elevation(&streams.elevation, DEFAULT_SMOOTHING_WINDOW);
        let gain = cumulative_gain(&smoothed, 0, smoothed.len().saturating_sub(1));

        GeneratedRide {
            summary: ActivitySummary {
                id: id.into(),
                metadata: ActivityMetadata {
                    name: super::ride_name(rng),
                    sport_type: profile.sport_type().to_string(),
                    date,
                },
                elevation_gain: Some(gain),
            },
            streams,
        }
    }
}
