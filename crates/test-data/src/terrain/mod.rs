//! Terrain generation utilities.
//!
//! Elevation profiles along a course, built from Perlin noise.

mod elevation;

pub use elevation::{ElevationGenerator, add_elevation_jitter};
