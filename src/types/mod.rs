use serde::{Deserialize, Serialize};

/// Single GPS observation (degrees, seconds since epoch)
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct GeoFix {
    pub latitude: f64,
    pub longitude: f64,
    pub timestamp: f64,
}

impl GeoFix {
    pub fn new(latitude: f64, longitude: f64, timestamp: f64) -> Self {
        Self {
            latitude,
            longitude,
            timestamp,
        }
    }

    /// Finite and inside the WGS84 ranges
    pub fn is_valid(&self) -> bool {
        self.latitude.is_finite()
            && self.longitude.is_finite()
            && self.timestamp.is_finite()
            && self.latitude.abs() <= 90.0
            && self.longitude.abs() <= 180.0
    }
}

/// Position in the downstream planar space (simulation meters)
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct PlanarPosition {
    pub x: f64,
    pub y: f64,
}

impl PlanarPosition {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

impl From<geo::Coord<f64>> for PlanarPosition {
    fn from(c: geo::Coord<f64>) -> Self {
        Self { x: c.x, y: c.y }
    }
}

impl From<PlanarPosition> for geo::Coord<f64> {
    fn from(p: PlanarPosition) -> Self {
        geo::Coord { x: p.x, y: p.y }
    }
}
