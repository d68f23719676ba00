//! Synthetic ride telemetry for the VAM engine.
//!
//! Courses come from Perlin-noise terrain, riders from simple climbing
//! profiles, and sensors add altimeter noise and auto-pause gaps. Everything
//! is driven by a caller-supplied RNG so a seed reproduces the same season.
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use test_data::prelude::*;
//!
//! let mut rng = StdRng::seed_from_u64(7);
//! let ride = RideGenerator::for_terrain(Terrain::Alpine, 7)
//!     .with_distance(40_000.0)
//!     .generate(&CyclistProfile::elite(), &mut rng);
//! let peaks = vam::peaks::calculate_peaks(&ride, &Settings::default());
//! ```

pub mod config;
pub mod generators;
pub mod profiles;
pub mod terrain;

use rand::Rng;
use time::{Duration, OffsetDateTime};
use vam::stream_source::StaticStreamSource;

use crate::{
    config::{SeedConfig, Terrain},
    generators::{GeneratedRide, RideGenerator},
    profiles::CyclistProfile,
};

/// A season of rides over mixed terrain and riders, newest first.
pub fn generate_season(
    config: &SeedConfig,
    now: OffsetDateTime,
    rng: &mut impl Rng,
) -> Vec<GeneratedRide> {
    const TERRAINS: [Terrain; 3] = [Terrain::Alpine, Terrain::Foothills, Terrain::Flat];

    (0..config.ride_count)
        .map(|i| {
            let terrain = TERRAINS[rng.gen_range(0..TERRAINS.len())];
            let profile = match rng.gen_range(0..3) {
                0 => CyclistProfile::elite(),
                1 => CyclistProfile::recreational(),
                _ => CyclistProfile::mountain_biker(),
            };
            let distance = rng.gen_range(15_000.0..60_000.0);
            let date = now - Duration::days(config.days_between_rides * i as i64);

            RideGenerator::for_terrain(terrain, rng.r#gen())
                .with_distance(distance)
                .generate_ride(format!("synthetic-{}", i + 1), date, &profile, rng)
        })
        .collect()
}

/// Serves `rides` the way a stream source would.
pub fn stream_source(rides: &[GeneratedRide]) -> StaticStreamSource {
    rides.iter().fold(StaticStreamSource::new(), |source, ride| {
        source.with_activity(ride.summary.clone(), Some(ride.streams.clone()))
    })
}

pub mod prelude {
    //! Convenient re-exports for common usage.

    pub use crate::config::{RideConfig, SeedConfig, Terrain};
    pub use crate::generators::{GeneratedRide, RideGenerator, ride_name};
    pub use crate::profiles::{AthleteProfile, CyclistProfile, sample_variance, speed_at_grade};
    pub use crate::terrain::ElevationGenerator;
    pub use crate::{generate_season, stream_source};
    pub use rand::{SeedableRng, rngs::StdRng};
    pub use vam::settings::Settings;
}
