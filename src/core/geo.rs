//! Great-circle math on a spherical Earth.
//!
//! Ellipsoidal correction is deliberately ignored: geofences are at most a
//! few hundred meters wide and the haversine error stays well under a meter
//! at that scale.

use crate::models::coordinate::Coordinate;

/// Mean Earth radius in meters.
pub const EARTH_RADIUS_METERS: f64 = 6_371_000.0;

/// Haversine distance between two points, in meters.
pub fn distance_meters(a: Coordinate, b: Coordinate) -> f64 {
    let lat1 = a.latitude.to_radians();
    let lat2 = b.latitude.to_radians();
    let d_lat = (b.latitude - a.latitude).to_radians();
    let d_lon = (b.longitude - a.longitude).to_radians();

    let h = (d_lat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (d_lon / 2.0).sin().powi(2);

    // clamp: rounding can push h a hair above 1 for antipodal points
    2.0 * EARTH_RADIUS_METERS * h.sqrt().min(1.0).asin()
}

/// Point reached by travelling `distance_m` from `origin` along the initial
/// bearing `bearing_deg` (0 = north, 90 = east).
pub fn destination(origin: Coordinate, bearing_deg: f64, distance_m: f64) -> Coordinate {
    let delta = distance_m / EARTH_RADIUS_METERS;
    let theta = bearing_deg.to_radians();
    let phi1 = origin.latitude.to_radians();
    let lambda1 = origin.longitude.to_radians();

    let phi2 = (phi1.sin() * delta.cos() + phi1.cos() * delta.sin() * theta.cos()).asin();
    let lambda2 = lambda1
        + (theta.sin() * delta.sin() * phi1.cos()).atan2(delta.cos() - phi1.sin() * phi2.sin());

    // normalise longitude to [-180, 180)
    let lon = (lambda2.to_degrees() + 540.0).rem_euclid(360.0) - 180.0;
    Coordinate::new(phi2.to_degrees(), lon)
}
