//! Rider performance profiles.
//!
//! A profile turns terrain grade into speed. The ride generator uses it to
//! space samples along the course and so to shape the VAM a ride produces.

mod cyclist;

pub use cyclist::CyclistProfile;

/// Trait for athletic performance profiles.
pub trait AthleteProfile: Send + Sync {
    /// Base speed on flat terrain in meters per second.
    fn base_speed_mps(&self) -> f64;

    /// Speed multiplier for a given grade (fraction, e.g. 0.05 = 5%).
    ///
    /// Below 1.0 means slower than base (uphill), above 1.0 faster (downhill).
    fn grade_factor(&self, grade: f64) -> f64;

    /// Day-to-day performance variance as a coefficient of variation.
    fn variance(&self) -> f64;

    /// Sport type reported for rides with this profile.
    fn sport_type(&self) -> &'static str {
        "Ride"
    }
}

/// Speed for `grade` scaled by the day's form, never below 0.5 m/s.
pub fn speed_at_grade(profile: &dyn AthleteProfile, grade: f64, variance_factor: f64) -> f64 {
    let target = profile.base_speed_mps() * profile.grade_factor(grade);
    (target * variance_factor).max(0.5)
}

/// Samples a form multiplier around 1.0, clamped to [0.7, 1.4].
pub fn sample_variance(profile: &dyn AthleteProfile, rng: &mut impl rand::Rng) -> f64 {
    use rand_distr::{Distribution, Normal};

    match Normal::new(1.0, profile.variance()) {
        Ok(normal) if profile.variance() > 0.0 => normal.sample(rng).clamp(0.7, 1.4),
        _ => 1.0,
    }
}

#[cfg(test)]
mod tests {
    use rand::{SeedableRng, rngs::StdRng};

    use super::*;

    #[test]
    fn speed_has_a_floor() {
        let profile = CyclistProfile::recreational();
        assert!(speed_at_grade(&profile, 0.60, 0.7) >= 0.5);
        assert!(speed_at_grade(&profile, 0.0, 1.0) > 6.0);
    }

    #[test]
    fn variance_stays_in_bounds() {
        let profile = CyclistProfile::mountain_biker();
        let mut rng = StdRng::seed_from_u64(9);
        for _ in 0..500 {
            let v = sample_variance(&profile, &mut rng);
            assert!((0.7..=1.4).contains(&v));
        }
    }
}
