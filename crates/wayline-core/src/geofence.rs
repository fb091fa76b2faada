//! Geofence validation: containment, route checks and restriction ranking.

use std::collections::HashSet;

use crate::geometry::{self, GeoPoint};
use crate::models::{FlyZone, ValidationOutcome, ValidationResult, WaypointSpec, ZoneMatch};

/// Whether `point` lies inside `zone` (altitude is not considered).
pub fn is_inside(point: GeoPoint, zone: &FlyZone) -> bool {
    zone.contains(point)
}

/// Test every waypoint against every zone.
///
/// A waypoint may hit several zones and a zone may be hit by several waypoints.
/// An empty zone set always yields [`ValidationOutcome::Clear`].
pub fn validate(waypoints: &[WaypointSpec], zones: &[FlyZone]) -> ValidationResult {
    let mut affected_waypoint_indices = Vec::new();
    let mut seen_waypoints = HashSet::new();
    let mut intersecting_zones: Vec<FlyZone> = Vec::new();
    let mut seen_zones = HashSet::new();
    let mut matches = Vec::new();

    for waypoint in waypoints {
        let point = waypoint.position();
        for zone in zones {
            if !is_inside(point, zone) {
                continue;
            }
            if seen_waypoints.insert(waypoint.index) {
                affected_waypoint_indices.push(waypoint.index);
            }
            if seen_zones.insert(zone.id.clone()) {
                intersecting_zones.push(zone.clone());
            }
            matches.push(ZoneMatch {
                waypoint_index: waypoint.index,
                zone_id: zone.id.clone(),
            });
        }
    }

    let outcome = if matches.is_empty() {
        ValidationOutcome::Clear
    } else {
        ValidationOutcome::Flagged
    };

    if outcome == ValidationOutcome::Flagged {
        tracing::info!(
            waypoints = affected_waypoint_indices.len(),
            zones = intersecting_zones.len(),
            "route enters restricted airspace"
        );
    }

    ValidationResult {
        affected_waypoint_indices,
        intersecting_zones,
        matches,
        outcome,
    }
}

/// Highest-priority zone by category; ties keep the first occurrence.
pub fn most_restrictive(zones: &[FlyZone]) -> Option<&FlyZone> {
    zones.iter().fold(None, |best: Option<&FlyZone>, zone| match best {
        Some(current) if current.category.priority() >= zone.category.priority() => Some(current),
        _ => Some(zone),
    })
}

/// Drop zones whose id was already seen; first occurrence wins.
pub fn dedup_zones(zones: Vec<FlyZone>) -> Vec<FlyZone> {
    let mut seen = HashSet::new();
    zones
        .into_iter()
        .filter(|zone| seen.insert(zone.id.clone()))
        .collect()
}

/// Point a zone check is centered on: vehicle position if known, else the first waypoint.
pub fn reference_point(vehicle: Option<GeoPoint>, waypoints: &[WaypointSpec]) -> Option<GeoPoint> {
    vehicle.or_else(|| waypoints.first().map(WaypointSpec::position))
}

/// Whether any part of `zone` can fall within `check_radius_m` of `reference`.
pub fn within_check_radius(zone: &FlyZone, reference: GeoPoint, check_radius_m: f64) -> bool {
    geometry::distance(reference, zone.center()) <= check_radius_m + zone.reach_m()
}
