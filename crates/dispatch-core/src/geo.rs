//! Geographic primitives: coordinates, proximity and distances.

use serde::{Deserialize, Serialize};

/// Tolerance (degrees, both axes) under which two points are the same place.
/// Roughly 100 m; not corrected for latitude.
pub const NEAR_TOLERANCE_DEG: f64 = 0.001;

const EARTH_RADIUS_M: f64 = 6_371_000.0;

/// A point as `[longitude, latitude]`, matching GeoJSON axis order.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(from = "[f64; 2]", into = "[f64; 2]")]
pub struct Coordinate {
    pub lon: f64,
    pub lat: f64,
}

impl Coordinate {
    pub const fn new(lon: f64, lat: f64) -> Self {
        Self { lon, lat }
    }
}

impl From<[f64; 2]> for Coordinate {
    fn from([lon, lat]: [f64; 2]) -> Self {
        Self { lon, lat }
    }
}

impl From<Coordinate> for [f64; 2] {
    fn from(c: Coordinate) -> Self {
        [c.lon, c.lat]
    }
}

/// Approximate equality within [`NEAR_TOLERANCE_DEG`] on each axis.
///
/// Absent inputs are never near anything.
pub fn is_near(a: Option<Coordinate>, b: Option<Coordinate>) -> bool {
    match (a, b) {
        (Some(a), Some(b)) => {
            (a.lat - b.lat).abs() < NEAR_TOLERANCE_DEG && (a.lon - b.lon).abs() < NEAR_TOLERANCE_DEG
        }
        _ => false,
    }
}

/// Per-axis linear interpolation, `t` in `[0, 1]`.
pub fn lerp(a: Coordinate, b: Coordinate, t: f64) -> Coordinate {
    Coordinate {
        lon: a.lon + (b.lon - a.lon) * t,
        lat: a.lat + (b.lat - a.lat) * t,
    }
}

/// Calculate distance between two points in meters (Haversine formula).
pub fn haversine_distance(a: Coordinate, b: Coordinate) -> f64 {
    let phi1 = a.lat.to_radians();
    let phi2 = b.lat.to_radians();
    let dphi = (b.lat - a.lat).to_radians();
    let dlambda = (b.lon - a.lon).to_radians();

    let h = (dphi / 2.0).sin().powi(2) + phi1.cos() * phi2.cos() * (dlambda / 2.0).sin().powi(2);

    2.0 * EARTH_RADIUS_M * h.sqrt().atan2((1.0 - h).sqrt())
}

/// Total length of a polyline in meters.
pub fn path_length_m(path: &[Coordinate]) -> f64 {
    path.windows(2)
        .map(|leg| haversine_distance(leg[0], leg[1]))
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;

    const CANTEEN: Coordinate = Coordinate::new(116.315263, 40.0053343);

    #[test]
    fn near_within_half_tolerance() {
        let other = Coordinate::new(CANTEEN.lon + 0.0005, CANTEEN.lat - 0.0005);
        assert!(is_near(Some(CANTEEN), Some(other)));
        assert!(is_near(Some(other), Some(CANTEEN)));
    }

    #[test]
    fn not_near_at_full_tolerance_on_either_axis() {
        let east = Coordinate::new(CANTEEN.lon + 0.001, CANTEEN.lat);
        let north = Coordinate::new(CANTEEN.lon, CANTEEN.lat + 0.0011);
        assert!(!is_near(Some(CANTEEN), Some(east)));
        assert!(!is_near(Some(CANTEEN), Some(north)));
    }

    #[test]
    fn absent_coordinates_are_never_near() {
        assert!(!is_near(None, Some(CANTEEN)));
        assert!(!is_near(Some(CANTEEN), None));
        assert!(!is_near(None, None));
    }

    #[test]
    fn coordinate_serializes_as_lon_lat_array() {
        let json = serde_json::to_string(&CANTEEN).unwrap();
        assert_eq!(json, "[116.315263,40.0053343]");
        let back: Coordinate = serde_json::from_str("[116.32, 40.01]").unwrap();
        assert_eq!(back, Coordinate::new(116.32, 40.01));
    }

    #[test]
    fn test_haversine_known_distance() {
        // ~111km between these points (1 degree latitude)
        let dist = haversine_distance(Coordinate::new(0.0, 0.0), Coordinate::new(0.0, 1.0));
        assert!((dist - 111_194.0).abs() < 100.0);
    }

    #[test]
    fn path_length_sums_legs() {
        let a = Coordinate::new(0.0, 0.0);
        let b = Coordinate::new(0.0, 0.5);
        let c = Coordinate::new(0.0, 1.0);
        let direct = haversine_distance(a, c);
        assert!((path_length_m(&[a, b, c]) - direct).abs() < 1.0);
        assert_eq!(path_length_m(&[a]), 0.0);
    }
}
