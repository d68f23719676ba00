//! Cyclist athletic profile.

use super::AthleteProfile;

/// Athletic profile for cycling.
///
/// On the flat the rider holds `base_speed`. Uphill, speed is limited by the
/// vertical rate the rider can sustain, so steep climbs are ridden at roughly
/// constant VAM. Downhill speed grows with the slope up to 2.5× base.
#[derive(Debug, Clone)]
pub struct CyclistProfile {
    /// Base speed in m/s on flat terrain.
    base_speed: f64,
    /// Sustainable climbing rate in meters per hour.
    climbing_vam: f64,
    /// Performance variance (coefficient of variation).
    variance: f64,
    sport_type: &'static str,
}

impl Default for CyclistProfile {
    fn default() -> Self {
        Self {
            base_speed: 8.0, // ~28 km/h
            climbing_vam: 900.0,
            variance: 0.10,
            sport_type: "Ride",
        }
    }
}

impl CyclistProfile {
    /// A profile with the given flat speed (km/h) and climbing rate (m/h).
    pub fn new(speed_kmh: f64, climbing_vam: f64) -> Self {
        Self {
            base_speed: speed_kmh / 3.6,
            climbing_vam,
            ..Default::default()
        }
    }

    /// ~35 km/h, 1400 m/h.
    pub fn elite() -> Self {
        Self::new(35.0, 1400.0)
    }

    /// ~22 km/h, 650 m/h.
    pub fn recreational() -> Self {
        Self::new(22.0, 650.0)
    }

    /// ~18 km/h with more variance, recorded as gravel rides.
    pub fn mountain_biker() -> Self {
        Self {
            base_speed: 5.0,
            climbing_vam: 800.0,
            variance: 0.15,
            sport_type: "GravelRide",
        }
    }

    pub fn climbing_vam(&self) -> f64 {
        self.climbing_vam
    }
}

impl AthleteProfile for CyclistProfile {
    fn base_speed_mps(&self) -> f64 {
        self.base_speed
    }

    fn grade_factor(&self, grade: f64) -> f64 {
        if grade > 0.0 {
            let vertical_limited = self.climbing_vam / 3600.0 / grade;
            (vertical_limited / self.base_speed).clamp(0.12, 1.0)
        } else {
            // grade is negative
            (1.0 - grade * 15.0).min(2.5)
        }
    }

    fn variance(&self) -> f64 {
        self.variance
    }

    fn sport_type(&self) -> &'static str {
        self.sport_type
    }
}
