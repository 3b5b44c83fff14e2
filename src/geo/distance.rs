//! Great-circle distance.
//!
//! Haversine on a sphere of mean Earth radius. Accurate to ~0.5% against the
//! WGS84 ellipsoid, far below the noise of the travel-time heuristics that
//! consume it.
//!
//! ```text
//! a = sin²(Δφ/2) + cos φ₁ · cos φ₂ · sin²(Δλ/2)
//! d = 2R · asin(√a)
//! ```
//!
//! Non-finite input yields `f64::INFINITY` instead of an error, so any
//! `d <= epsilon` comparison against an invalid point is simply false.

use super::GeoPoint;

/// Mean Earth radius in kilometres.
pub const EARTH_RADIUS_KM: f64 = 6371.0;

/// Approximate kilometres per degree of latitude.
///
/// Also used for longitude after scaling by `cos(lat)`.
pub const KM_PER_DEGREE: f64 = 111.0;

/// Haversine distance in kilometres between two coordinate pairs.
///
/// ```rust
/// use loci::geo::distance_km;
///
/// assert_eq!(distance_km(59.91, 10.75, 59.91, 10.75), 0.0);
/// assert_eq!(distance_km(f64::NAN, 10.75, 59.91, 10.75), f64::INFINITY);
/// ```
pub fn distance_km(lat1: f64, lng1: f64, lat2: f64, lng2: f64) -> f64 {
    if !(lat1.is_finite() && lng1.is_finite() && lat2.is_finite() && lng2.is_finite()) {
        return f64::INFINITY;
    }

    let phi1 = lat1.to_radians();
    let phi2 = lat2.to_radians();
    let d_phi = (lat2 - lat1).to_radians();
    let d_lambda = (lng2 - lng1).to_radians();

    let s1 = (d_phi / 2.0).sin();
    let s2 = (d_lambda / 2.0).sin();
    let a = s1 * s1 + phi1.cos() * phi2.cos() * s2 * s2;

    // Rounding can push `a` a hair above 1 for antipodal points.
    2.0 * EARTH_RADIUS_KM * a.sqrt().min(1.0).asin()
}

/// Haversine distance in kilometres between two points.
#[inline]
pub fn haversine_km(a: &GeoPoint, b: &GeoPoint) -> f64 {
    distance_km(a.lat, a.lng, b.lat, b.lng)
}
