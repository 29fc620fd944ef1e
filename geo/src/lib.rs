//! Geofencing for location claims.
//!
//! Distances use the haversine formula on a spherical Earth. The claim radius
//! is configuration; [`GeoValidator`] carries it so callers never compare
//! against a literal.

use cleanchain_types::Coordinates;
use serde::Serialize;

/// Mean Earth radius in metres.
pub const EARTH_RADIUS_M: f64 = 6_371_000.0;

/// Default claim radius (10 km).
pub const DEFAULT_CLAIM_RADIUS_M: f64 = 10_000.0;

/// Great-circle distance between two points, in metres.
pub fn distance(lat1: f64, lng1: f64, lat2: f64, lng2: f64) -> f64 {
    let d_lat = (lat2 - lat1).to_radians();
    let d_lng = (lng2 - lng1).to_radians();

    let a = (d_lat / 2.0).sin().powi(2)
        + lat1.to_radians().cos() * lat2.to_radians().cos() * (d_lng / 2.0).sin().powi(2);
    let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());

    EARTH_RADIUS_M * c
}

/// Distance between two coordinate pairs, in metres.
pub fn distance_between(a: Coordinates, b: Coordinates) -> f64 {
    distance(a.lat, a.lng, b.lat, b.lng)
}

/// `dist <= threshold`.
pub fn within_range(dist: f64, threshold_m: f64) -> bool {
    dist <= threshold_m
}

/// Round a distance to centimetres. Every distance reported to a caller goes
/// through this, so two reports of the same pair always agree.
pub fn round_distance(dist: f64) -> f64 {
    (dist * 100.0).round() / 100.0
}

/// The outcome of checking a point against a geofence.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct DistanceReport {
    /// Rounded distance in metres.
    pub meters: f64,
    pub within_range: bool,
}

/// Applies the configured claim radius.
#[derive(Clone, Copy, Debug)]
pub struct GeoValidator {
    threshold_m: f64,
}

impl GeoValidator {
    pub fn new(threshold_m: f64) -> Self {
        Self { threshold_m }
    }

    pub fn threshold_m(&self) -> f64 {
        self.threshold_m
    }

    /// Measure `from` → `to` and decide against the threshold.
    ///
    /// The decision uses the exact distance; only the reported value is rounded.
    pub fn check(&self, from: Coordinates, to: Coordinates) -> DistanceReport {
        let dist = distance_between(from, to);
        DistanceReport {
            meters: round_distance(dist),
            within_range: within_range(dist, self.threshold_m),
        }
    }
}

impl Default for GeoValidator {
    fn default() -> Self {
        Self::new(DEFAULT_CLAIM_RADIUS_M)
    }
}
