//! Great-circle math shared by mission compilation and geofence validation.

use serde::{Deserialize, Serialize};

/// Mean Earth radius used by every distance computation in the workspace.
pub const EARTH_RADIUS_M: f64 = 6_371_000.0;

/// Below this horizontal distance the pitch toward a target is treated as straight down.
pub const MIN_PITCH_DISTANCE_M: f64 = 5.0;

/// A WGS84 position in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub lat: f64,
    pub lon: f64,
}

impl GeoPoint {
    pub fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }
}

/// Calculate distance between two points in meters using Haversine formula.
///
/// Symmetric in its arguments and zero only when both points coincide.
pub fn distance(a: GeoPoint, b: GeoPoint) -> f64 {
    let phi1 = a.lat.to_radians();
    let phi2 = b.lat.to_radians();
    let dphi = (b.lat - a.lat).to_radians();
    let dlambda = (b.lon - a.lon).to_radians();
    let h = (dphi / 2.0).sin().powi(2) + phi1.cos() * phi2.cos() * (dlambda / 2.0).sin().powi(2);
    2.0 * EARTH_RADIUS_M * h.sqrt().atan2((1.0 - h).sqrt())
}

/// Initial bearing from `a` to `b` in degrees, normalized to [0, 360).
///
/// 0 = north, 90 = east.
pub fn bearing(a: GeoPoint, b: GeoPoint) -> f64 {
    let phi1 = a.lat.to_radians();
    let phi2 = b.lat.to_radians();
    let delta_lambda = (b.lon - a.lon).to_radians();

    let x = delta_lambda.sin() * phi2.cos();
    let y = phi1.cos() * phi2.sin() - phi1.sin() * phi2.cos() * delta_lambda.cos();

    let deg = x.atan2(y).to_degrees().rem_euclid(360.0);
    // rem_euclid can round up to exactly 360.0 for tiny negative inputs
    if deg >= 360.0 {
        0.0
    } else {
        deg
    }
}

/// Pitch in degrees needed to look from `from` (at `from_height`) toward `to` (at `to_height`).
///
/// Negative values look down. Returns -90 when the horizontal distance is under
/// [`MIN_PITCH_DISTANCE_M`].
pub fn pitch_angle(from: GeoPoint, to: GeoPoint, from_height: f64, to_height: f64) -> f64 {
    let horizontal = distance(from, to);
    if horizontal < MIN_PITCH_DISTANCE_M {
        return -90.0;
    }
    ((to_height - from_height) / horizontal).atan().to_degrees()
}

/// Sum of consecutive leg distances along an ordered path, in meters.
pub fn path_length(points: &[GeoPoint]) -> f64 {
    points
        .windows(2)
        .map(|leg| distance(leg[0], leg[1]))
        .sum()
}

/// Convert a [0, 360) bearing to the signed [-180, 180] range used by heading fields.
pub fn signed_heading(bearing_deg: f64) -> f64 {
    if bearing_deg > 180.0 {
        bearing_deg - 360.0
    } else {
        bearing_deg
    }
}
