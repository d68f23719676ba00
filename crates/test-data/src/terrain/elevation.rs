//! Perlin noise-based elevation along a course.

use noise::{NoiseFn, Perlin};
use rand::Rng;
use rand_distr::{Distribution, Normal};

/// Elevation as a function of distance travelled.
///
/// Several octaves of Perlin noise give long climbs with small-scale
/// undulation on top. The same seed always yields the same course.
#[derive(Debug, Clone)]
pub struct ElevationGenerator {
    perlin: Perlin,
    /// Valley floor in meters.
    base_elevation: f64,
    /// Peak-to-valley amplitude in meters.
    height_scale: f64,
    /// Cycles per meter of the largest feature.
    frequency: f64,
    octaves: u32,
}

impl ElevationGenerator {
    pub fn new(seed: u32) -> Self {
        Self {
            perlin: Perlin::new(seed),
            base_elevation: 600.0,
            height_scale: 400.0,
            frequency: 0.0002,
            octaves: 4,
        }
    }

    /// High mountain passes: long sustained climbs of 1000 m and more.
    pub fn alpine(seed: u32) -> Self {
        Self {
            perlin: Perlin::new(seed),
            base_elevation: 1200.0,
            height_scale: 1100.0,
            frequency: 0.00005,
            octaves: 5,
        }
    }

    /// Short, punchy hills.
    pub fn foothills(seed: u32) -> Self {
        Self {
            perlin: Perlin::new(seed),
            base_elevation: 400.0,
            height_scale: 250.0,
            frequency: 0.0003,
            octaves: 4,
        }
    }

    /// Barely any climbing.
    pub fn flat(seed: u32) -> Self {
        Self {
            perlin: Perlin::new(seed),
            base_elevation: 50.0,
            height_scale: 15.0,
            frequency: 0.0004,
            octaves: 2,
        }
    }

    pub fn with_base_elevation(mut self, elevation: f64) -> Self {
        self.base_elevation = elevation;
        self
    }

    pub fn with_height_scale(mut self, scale: f64) -> Self {
        self.height_scale = scale;
        self
    }

    pub fn with_frequency(mut self, freq: f64) -> Self {
        self.frequency = freq;
        self
    }

    /// Elevation at `distance` meters along the course (fractal Brownian motion).
    pub fn elevation_at(&self, distance: f64) -> f64 {
        let mut total = 0.0;
        let mut amplitude = 1.0;
        let mut frequency = self.frequency;
        let mut max_amplitude = 0.0;

        for octave in 0..self.octaves {
            // Offset each octave on the second axis so they decorrelate.
            let noise_val = self.perlin.get([distance * frequency, 0.5 + octave as f64 * 7.3]);
            total += noise_val * amplitude;
            max_amplitude += amplitude;
            amplitude *= 0.5;
            frequency *= 2.0;
        }

        let normalized = total / max_amplitude;
        self.base_elevation + normalized * self.height_scale
    }

    /// Grade (rise over run) around `distance`, measured over `span` meters.
    pub fn grade_at(&self, distance: f64, span: f64) -> f64 {
        if span <= 0.0 {
            return 0.0;
        }
        (self.elevation_at(distance + span) - self.elevation_at(distance)) / span
    }
}

/// Adds barometric or GPS altimeter noise to `elevation`.
///
/// Real devices read within a few meters; `std_dev <= 0` disables the noise.
pub fn add_elevation_jitter(elevation: f64, rng: &mut impl Rng, std_dev: f64) -> f64 {
    match Normal::new(0.0, std_dev) {
        Ok(normal) if std_dev > 0.0 => elevation + normal.sample(rng),
        _ => elevation,
    }
}

#[cfg(test)]
mod tests {
    use rand::{SeedableRng, rngs::StdRng};

    use super::*;

    #[test]
    fn test_elevation_consistency() {
        let elev_gen = ElevationGenerator::new(42);
        let elev1 = elev_gen.elevation_at(12_345.0);
        let elev2 = elev_gen.elevation_at(12_345.0);
        assert!((elev1 - elev2).abs() < 0.001);
    }

    #[test]
    fn test_elevation_range() {
        let elev_gen = ElevationGenerator::alpine(7);
        for d in (0..50_000).step_by(250) {
            let elev = elev_gen.elevation_at(d as f64);
            assert!(elev >= elev_gen.base_elevation - elev_gen.height_scale);
            assert!(elev <= elev_gen.base_elevation + elev_gen.height_scale);
        }
    }

    #[test]
    fn test_flat_is_flatter_than_alpine() {
        let relief = |g: &ElevationGenerator| {
            let samples: Vec<f64> = (0..400).map(|i| g.elevation_at(i as f64 * 100.0)).collect();
            let max = samples.iter().cloned().fold(f64::MIN, f64::max);
            let min = samples.iter().cloned().fold(f64::MAX, f64::min);
            max - min
        };
        assert!(relief(&ElevationGenerator::flat(3)) < relief(&ElevationGenerator::alpine(3)));
    }

    #[test]
    fn test_jitter_disabled_for_zero_std_dev() {
        let mut rng = StdRng::seed_from_u64(1);
        assert_eq!(add_elevation_jitter(100.0, &mut rng, 0.0), 100.0);
        let noisy = add_elevation_jitter(100.0, &mut rng, 2.0);
        assert!((noisy - 100.0).abs() < 20.0);
    }
}
