//! Generators for synthetic rides.

mod ride;

pub use ride::{GeneratedRide, RideGenerator};

use fake::{Fake, faker::address::en::CityName};
use rand::Rng;

const RIDE_PREFIXES: &[&str] = &[
    "Morning Ride",
    "Evening Ride",
    "Hill Repeats",
    "Road Ride",
    "Gravel Ride",
    "Climbing Day",
];

/// A ride name, sometimes with a destination.
pub fn ride_name(rng: &mut impl Rng) -> String {
    let prefix = RIDE_PREFIXES[rng.gen_range(0..RIDE_PREFIXES.len())];

    if rng.r#gen::<f64>() < 0.4 {
        let city: String = CityName().fake_with_rng(rng);
        format!("{prefix} to {city}")
    } else {
        prefix.to_string()
    }
}
