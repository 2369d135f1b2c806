use geo::{Distance, Geodesic, Point};
use serde::{Deserialize, Serialize};

/// A WGS84 position in degrees
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    pub lat: f64,
    pub lon: f64,
}

impl Coordinate {
    pub fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }

    /// Finite and inside the lat/lon ranges
    pub fn is_usable(&self) -> bool {
        self.lat.is_finite()
            && self.lon.is_finite()
            && (-90.0..=90.0).contains(&self.lat)
            && (-180.0..=180.0).contains(&self.lon)
    }

    /// Geodesic (WGS84 ellipsoid) distance to `other` in kilometers.
    pub fn distance_km(&self, other: &Coordinate) -> f64 {
        // geo points are (x = lon, y = lat)
        let a = Point::new(self.lon, self.lat);
        let b = Point::new(other.lon, other.lat);
        Geodesic::distance(a, b) / 1000.0
    }

    /// Bit-exact key for hashing, with -0.0 folded into 0.0
    pub(crate) fn key(&self) -> (u64, u64) {
        ((self.lat + 0.0).to_bits(), (self.lon + 0.0).to_bits())
    }
}

/// Round to two decimal places
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
