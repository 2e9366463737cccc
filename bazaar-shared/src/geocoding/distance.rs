//! Distance between two coordinates

use super::config::{DistanceMode, Units};
use serde::{Deserialize, Serialize};

/// Mean earth radius in kilometres
pub const EARTH_RADIUS_KM: f64 = 6371.0;

/// Mean earth radius in miles
pub const EARTH_RADIUS_MI: f64 = 3956.0;

/// A latitude/longitude pair in degrees
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinates {
    /// Builds coordinates, rejecting values outside the valid ranges
    pub fn new(latitude: f64, longitude: f64) -> Option<Self> {
        let valid = latitude.is_finite()
            && longitude.is_finite()
            && (-90.0..=90.0).contains(&latitude)
            && (-180.0..=180.0).contains(&longitude);

        valid.then_some(Self {
            latitude,
            longitude,
        })
    }
}

fn earth_radius(units: Units) -> f64 {
    match units {
        Units::Km => EARTH_RADIUS_KM,
        Units::Mi => EARTH_RADIUS_MI,
    }
}

/// Distance from `a` to `b`
pub fn distance_between(a: Coordinates, b: Coordinates, units: Units, mode: DistanceMode) -> f64 {
    let phi1 = a.latitude.to_radians();
    let phi2 = b.latitude.to_radians();
    let d_phi = (b.latitude - a.latitude).to_radians();
    let d_lambda = (b.longitude - a.longitude).to_radians();

    let angle = match mode {
        DistanceMode::Spherical => {
            let h = (d_phi / 2.0).sin().powi(2)
                + phi1.cos() * phi2.cos() * (d_lambda / 2.0).sin().powi(2);
            2.0 * h.sqrt().atan2((1.0 - h).sqrt())
        }
        DistanceMode::Linear => {
            let x = d_lambda * ((phi1 + phi2) / 2.0).cos();
            (x * x + d_phi * d_phi).sqrt()
        }
    };

    angle * earth_radius(units)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: f64, b: f64, tolerance: f64) -> bool {
        (a - b).abs() <= tolerance
    }

    #[test]
    fn test_one_degree_of_longitude_at_equator() {
        let a = Coordinates::new(0.0, 0.0).unwrap();
        let b = Coordinates::new(0.0, 1.0).unwrap();

        let km = distance_between(a, b, Units::Km, DistanceMode::Spherical);
        assert!(close(km, 111.195, 0.01), "got {}", km);

        let mi = distance_between(a, b, Units::Mi, DistanceMode::Spherical);
        assert!(close(mi, 69.046, 0.01), "got {}", mi);
    }

    #[test]
    fn test_linear_matches_spherical_over_short_distances() {
        // Hoan Kiem lake to the Temple of Literature, Hanoi
        let a = Coordinates::new(21.0288, 105.8522).unwrap();
        let b = Coordinates::new(21.0294, 105.8355).unwrap();

        let spherical = distance_between(a, b, Units::Km, DistanceMode::Spherical);
        let linear = distance_between(a, b, Units::Km, DistanceMode::Linear);
        assert!(close(spherical, linear, 0.001));
        assert!(close(spherical, 1.73, 0.05), "got {}", spherical);
    }

    #[test]
    fn test_hanoi_to_saigon() {
        let hanoi = Coordinates::new(21.0285, 105.8542).unwrap();
        let saigon = Coordinates::new(10.8231, 106.6297).unwrap();

        let km = distance_between(hanoi, saigon, Units::Km, DistanceMode::Spherical);
        assert!(close(km, 1137.0, 5.0), "got {}", km);
    }

    #[test]
    fn test_distance_is_symmetric_and_zero_for_same_point() {
        let a = Coordinates::new(16.0544, 108.2022).unwrap();
        let b = Coordinates::new(10.0452, 105.7469).unwrap();

        let ab = distance_between(a, b, Units::Km, DistanceMode::Spherical);
        let ba = distance_between(b, a, Units::Km, DistanceMode::Spherical);
        assert!(close(ab, ba, 1e-9));
        assert_eq!(distance_between(a, a, Units::Km, DistanceMode::Linear), 0.0);
    }

    #[test]
    fn test_coordinates_reject_out_of_range() {
        assert!(Coordinates::new(91.0, 0.0).is_none());
        assert!(Coordinates::new(0.0, -181.0).is_none());
        assert!(Coordinates::new(f64::NAN, 0.0).is_none());
    }
}
