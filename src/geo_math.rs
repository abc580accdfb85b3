//! Distance and bearing helpers shared by the filter, tracker and controller.
use crate::types::{GeoFix, PlanarPosition};
use geo::{Coord, EuclideanDistance, Point};

/// Mean Earth radius used for all great-circle math (meters)
pub const EARTH_RADIUS_M: f64 = 6_371_000.0;

/// Great-circle distance between two fixes in meters (haversine)
pub fn haversine_distance(a: &GeoFix, b: &GeoFix) -> f64 {
    let lat1 = a.latitude.to_radians();
    let lat2 = b.latitude.to_radians();
    let d_lat = (b.latitude - a.latitude).to_radians();
    let d_lon = (b.longitude - a.longitude).to_radians();

    let h = (d_lat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (d_lon / 2.0).sin().powi(2);
    let c = 2.0 * h.sqrt().atan2((1.0 - h).max(0.0).sqrt());
    EARTH_RADIUS_M * c
}

/// Euclidean distance in raw degrees, used as the sub-resolution jitter test
pub fn coordinate_delta(a: &GeoFix, b: &GeoFix) -> f64 {
    let d_lat = b.latitude - a.latitude;
    let d_lon = b.longitude - a.longitude;
    (d_lat * d_lat + d_lon * d_lon).sqrt()
}

/// Initial bearing from `a` towards `b`, degrees clockwise from north in [0, 360)
pub fn initial_bearing(a: &GeoFix, b: &GeoFix) -> f64 {
    let lat1 = a.latitude.to_radians();
    let lat2 = b.latitude.to_radians();
    let d_lon = (b.longitude - a.longitude).to_radians();

    let numerator = d_lon.sin() * lat2.cos();
    let denominator = lat1.cos() * lat2.sin() - lat1.sin() * lat2.cos() * d_lon.cos();
    numerator.atan2(denominator).to_degrees().rem_euclid(360.0)
}

pub fn planar_distance(p: &PlanarPosition, q: &PlanarPosition) -> f64 {
    let a = Point::from(Coord::from(*p));
    let b = Point::from(Coord::from(*q));
    a.euclidean_distance(&b)
}
