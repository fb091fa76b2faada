//! Core data models for mission planning.

use serde::{Deserialize, Serialize};

use crate::geometry::{self, GeoPoint};

/// One waypoint of a planned route. `index` is its 0-based position in flight order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WaypointSpec {
    pub index: usize,
    pub lat: f64,
    pub lon: f64,
    pub altitude_m: f64,
    pub speed_mps: f64,
    /// Gimbal pitch in degrees, down is negative
    pub gimbal_pitch_deg: f64,
    #[serde(default)]
    pub heading_mode: HeadingMode,
    #[serde(default)]
    pub turn_mode: TurnMode,
}

impl WaypointSpec {
    pub fn position(&self) -> GeoPoint {
        GeoPoint::new(self.lat, self.lon)
    }
}

/// Waypoint as authored in a plan file, before indices and gimbal pitch are resolved.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WaypointInput {
    #[serde(default)]
    pub index: Option<usize>,
    pub lat: f64,
    pub lon: f64,
    pub altitude_m: f64,
    pub speed_mps: f64,
    #[serde(default)]
    pub gimbal_pitch_deg: Option<f64>,
    #[serde(default)]
    pub heading_mode: HeadingMode,
    #[serde(default)]
    pub turn_mode: TurnMode,
}

impl WaypointInput {
    /// Resolve into a [`WaypointSpec`] at `position` in flight order.
    ///
    /// A missing pitch aims the gimbal at the point of interest when one is set,
    /// otherwise straight down.
    pub fn resolve(&self, position: usize, poi: Option<&PointOfInterest>) -> WaypointSpec {
        let here = GeoPoint::new(self.lat, self.lon);
        let gimbal_pitch_deg = self.gimbal_pitch_deg.unwrap_or_else(|| match poi {
            Some(poi) => geometry::pitch_angle(here, poi.position(), self.altitude_m, poi.height_m),
            None => -90.0,
        });

        WaypointSpec {
            index: self.index.unwrap_or(position),
            lat: self.lat,
            lon: self.lon,
            altitude_m: self.altitude_m,
            speed_mps: self.speed_mps,
            gimbal_pitch_deg,
            heading_mode: self.heading_mode,
            turn_mode: self.turn_mode,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HeadingMode {
    #[default]
    FollowRoute,
    TowardPointOfInterest,
}

impl HeadingMode {
    pub fn as_wpml(self) -> &'static str {
        match self {
            HeadingMode::FollowRoute => "followWayline",
            HeadingMode::TowardPointOfInterest => "towardPOI",
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TurnMode {
    CoordinateTurn,
    #[default]
    ToPointAndStopWithDiscontinuityCurvature,
    ToPointAndStopWithContinuityCurvature,
    ToPointAndPassWithContinuityCurvature,
}

impl TurnMode {
    pub fn as_wpml(self) -> &'static str {
        match self {
            TurnMode::CoordinateTurn => "coordinateTurn",
            TurnMode::ToPointAndStopWithDiscontinuityCurvature => {
                "toPointAndStopWithDiscontinuityCurvature"
            }
            TurnMode::ToPointAndStopWithContinuityCurvature => {
                "toPointAndStopWithContinuityCurvature"
            }
            TurnMode::ToPointAndPassWithContinuityCurvature => {
                "toPointAndPassWithContinuityCurvature"
            }
        }
    }

    /// Only coordinated turns cut the corner; every other mode passes through the point.
    pub fn damping_distance_m(self) -> f64 {
        match self {
            TurnMode::CoordinateTurn => 0.2,
            _ => 0.0,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FlyToFirstMode {
    #[default]
    Safely,
    PointToPoint,
}

impl FlyToFirstMode {
    pub fn as_wpml(self) -> &'static str {
        match self {
            FlyToFirstMode::Safely => "safely",
            FlyToFirstMode::PointToPoint => "pointToPoint",
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FinishAction {
    None,
    #[default]
    GoHome,
    AutoLand,
    GoToFirstWaypoint,
}

impl FinishAction {
    pub fn as_wpml(self) -> &'static str {
        match self {
            FinishAction::None => "noAction",
            FinishAction::GoHome => "goHome",
            FinishAction::AutoLand => "autoLand",
            FinishAction::GoToFirstWaypoint => "gotoFirstWaypoint",
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RcLostBehavior {
    #[default]
    ExecuteLostAction,
    Continue,
}

impl RcLostBehavior {
    pub fn as_wpml(self) -> &'static str {
        match self {
            RcLostBehavior::ExecuteLostAction => "executeLostAction",
            RcLostBehavior::Continue => "goContinue",
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RcLostAction {
    #[default]
    GoBack,
    Land,
    Hover,
    GoAlternatePoint,
}

impl RcLostAction {
    pub fn as_wpml(self) -> &'static str {
        match self {
            RcLostAction::GoBack => "goBack",
            RcLostAction::Land => "landing",
            RcLostAction::Hover => "hover",
            RcLostAction::GoAlternatePoint => "goAlternatePoint",
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HeightMode {
    Egm96,
    #[default]
    RelativeToStartPoint,
    Wgs84,
    AboveGroundLevel,
}

impl HeightMode {
    pub fn as_wpml(self) -> &'static str {
        match self {
            HeightMode::Egm96 => "EGM96",
            HeightMode::RelativeToStartPoint => "relativeToStartPoint",
            HeightMode::Wgs84 => "WGS84",
            HeightMode::AboveGroundLevel => "aboveGroundLevel",
        }
    }
}

/// Fixed target the vehicle yaw (and optionally gimbal) points at.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PointOfInterest {
    pub lat: f64,
    pub lon: f64,
    pub height_m: f64,
}

impl PointOfInterest {
    pub fn position(&self) -> GeoPoint {
        GeoPoint::new(self.lat, self.lon)
    }
}

/// Firmware model identity of the aircraft.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DroneInfo {
    pub enum_value: u32,
    pub sub_enum_value: u32,
}

impl Default for DroneInfo {
    fn default() -> Self {
        Self {
            enum_value: 68,
            sub_enum_value: 0,
        }
    }
}

/// Firmware model identity of the camera payload.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PayloadInfo {
    pub enum_value: u32,
    pub sub_enum_value: u32,
    pub position_index: u32,
}

/// Mission-wide settings authored once per planning session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MissionSettings {
    pub name: String,
    #[serde(default)]
    pub fly_to_first_mode: FlyToFirstMode,
    #[serde(default)]
    pub finish_action: FinishAction,
    #[serde(default)]
    pub rc_lost_behavior: RcLostBehavior,
    #[serde(default)]
    pub rc_lost_action: RcLostAction,
    pub takeoff_security_height_m: f64,
    pub global_transitional_speed_mps: f64,
    #[serde(default)]
    pub height_mode: HeightMode,
    #[serde(default)]
    pub point_of_interest: Option<PointOfInterest>,
    #[serde(default)]
    pub drone: DroneInfo,
    #[serde(default)]
    pub payload: PayloadInfo,
}

/// A mission plan file: settings plus authored waypoints.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MissionPlan {
    pub settings: MissionSettings,
    pub waypoints: Vec<WaypointInput>,
}

impl MissionPlan {
    /// Resolve authored waypoints into flight-ordered specs.
    pub fn waypoint_specs(&self) -> Vec<WaypointSpec> {
        let poi = self.settings.point_of_interest.as_ref();
        self.waypoints
            .iter()
            .enumerate()
            .map(|(position, input)| input.resolve(position, poi))
            .collect()
    }
}

// ========== GEOFENCE MODELS ==========

/// Restriction level of a fly zone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ZoneCategory {
    /// No flights allowed
    Restricted,
    /// Flights allowed with authorization
    Authorization,
    Warning,
    EnhancedWarning,
    Unknown,
}

impl ZoneCategory {
    /// Ranking used by `most_restrictive`; higher wins.
    pub fn priority(self) -> u8 {
        match self {
            ZoneCategory::Restricted => 5,
            ZoneCategory::Authorization => 4,
            ZoneCategory::Warning => 3,
            ZoneCategory::EnhancedWarning => 2,
            ZoneCategory::Unknown => 0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ZoneGeometry {
    Circle { center: GeoPoint, radius_m: f64 },
    /// Ordered vertices; fewer than 3 never contain a point.
    Polygon { vertices: Vec<GeoPoint> },
}

/// Where a zone record came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ZoneSourceKind {
    Live,
    StaticFallback,
}

/// A named airspace region with a restriction category.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlyZone {
    pub id: String,
    pub name: String,
    pub category: ZoneCategory,
    pub geometry: ZoneGeometry,
    pub source: ZoneSourceKind,
}

impl FlyZone {
    /// Check if a point is inside this zone, ignoring altitude.
    pub fn contains(&self, point: GeoPoint) -> bool {
        match &self.geometry {
            ZoneGeometry::Circle { center, radius_m } => {
                geometry::distance(point, *center) <= *radius_m
            }
            ZoneGeometry::Polygon { vertices } => polygon_contains(vertices, point),
        }
    }

    /// Largest distance from the zone's reference center to its boundary.
    pub fn reach_m(&self) -> f64 {
        match &self.geometry {
            ZoneGeometry::Circle { radius_m, .. } => *radius_m,
            ZoneGeometry::Polygon { vertices } => {
                let center = self.center();
                vertices
                    .iter()
                    .map(|vertex| geometry::distance(center, *vertex))
                    .fold(0.0, f64::max)
            }
        }
    }

    /// Circle center, or the vertex average of a polygon.
    pub fn center(&self) -> GeoPoint {
        match &self.geometry {
            ZoneGeometry::Circle { center, .. } => *center,
            ZoneGeometry::Polygon { vertices } => {
                if vertices.is_empty() {
                    return GeoPoint::new(0.0, 0.0);
                }
                let n = vertices.len() as f64;
                let lat = vertices.iter().map(|v| v.lat).sum::<f64>() / n;
                let lon = vertices.iter().map(|v| v.lon).sum::<f64>() / n;
                GeoPoint::new(lat, lon)
            }
        }
    }
}

/// Ray casting: count crossings of a ray cast east from `point`.
fn polygon_contains(vertices: &[GeoPoint], point: GeoPoint) -> bool {
    let n = vertices.len();
    if n < 3 {
        return false;
    }

    let mut inside = false;
    let mut j = n - 1;
    for i in 0..n {
        let yi = vertices[i].lat;
        let xi = vertices[i].lon;
        let yj = vertices[j].lat;
        let xj = vertices[j].lon;

        if ((yi > point.lat) != (yj > point.lat))
            && (point.lon < (xj - xi) * (point.lat - yi) / (yj - yi) + xi)
        {
            inside = !inside;
        }
        j = i;
    }

    inside
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ValidationOutcome {
    Clear,
    Flagged,
}

/// One waypoint falling inside one zone.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ZoneMatch {
    pub waypoint_index: usize,
    pub zone_id: String,
}

/// Result of checking a route against a set of zones.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationResult {
    /// Waypoint indices in first-match order, no duplicates
    pub affected_waypoint_indices: Vec<usize>,
    /// Zones hit by at least one waypoint, deduplicated by id
    pub intersecting_zones: Vec<FlyZone>,
    pub matches: Vec<ZoneMatch>,
    pub outcome: ValidationOutcome,
}

impl ValidationResult {
    pub fn is_clear(&self) -> bool {
        self.outcome == ValidationOutcome::Clear
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn square(lat: f64, lon: f64, half: f64) -> FlyZone {
        FlyZone {
            id: "sq".to_string(),
            name: "Square".to_string(),
            category: ZoneCategory::Restricted,
            geometry: ZoneGeometry::Polygon {
                vertices: vec![
                    GeoPoint::new(lat - half, lon - half),
                    GeoPoint::new(lat - half, lon + half),
                    GeoPoint::new(lat + half, lon + half),
                    GeoPoint::new(lat + half, lon - half),
                ],
            },
            source: ZoneSourceKind::Live,
        }
    }

    #[test]
    fn polygon_contains_centroid() {
        let zone = square(33.7, 73.05, 0.01);
        assert!(zone.contains(zone.center()));
    }

    #[test]
    fn polygon_excludes_point_outside_bounding_box() {
        let zone = square(33.7, 73.05, 0.01);
        assert!(!zone.contains(GeoPoint::new(33.75, 73.05)));
        assert!(!zone.contains(GeoPoint::new(33.7, 72.9)));
    }

    #[test]
    fn two_vertex_polygon_contains_nothing() {
        let zone = FlyZone {
            geometry: ZoneGeometry::Polygon {
                vertices: vec![GeoPoint::new(0.0, 0.0), GeoPoint::new(1.0, 1.0)],
            },
            ..square(0.0, 0.0, 1.0)
        };
        for point in [
            GeoPoint::new(0.0, 0.0),
            GeoPoint::new(0.5, 0.5),
            GeoPoint::new(1.0, 1.0),
        ] {
            assert!(!zone.contains(point));
        }
    }

    #[test]
    fn circle_contains_boundary_inclusive() {
        let center = GeoPoint::new(33.6166, 73.0993);
        let edge = GeoPoint::new(33.6166 + 0.001, 73.0993);
        let zone = FlyZone {
            geometry: ZoneGeometry::Circle {
                center,
                radius_m: geometry::distance(center, edge) + 1e-6,
            },
            ..square(0.0, 0.0, 1.0)
        };
        assert!(zone.contains(center));
        assert!(zone.contains(edge));
        assert!(!zone.contains(GeoPoint::new(33.6166 + 0.002, 73.0993)));
    }

    #[test]
    fn category_priority_order() {
        assert!(ZoneCategory::Restricted.priority() > ZoneCategory::Authorization.priority());
        assert!(ZoneCategory::Authorization.priority() > ZoneCategory::Warning.priority());
        assert!(ZoneCategory::Warning.priority() > ZoneCategory::EnhancedWarning.priority());
        assert_eq!(ZoneCategory::Unknown.priority(), 0);
    }

    #[test]
    fn waypoint_input_without_pitch_looks_down() {
        let input = WaypointInput {
            index: None,
            lat: 33.7,
            lon: 73.05,
            altitude_m: 30.0,
            speed_mps: 5.0,
            gimbal_pitch_deg: None,
            heading_mode: HeadingMode::FollowRoute,
            turn_mode: TurnMode::default(),
        };
        let spec = input.resolve(4, None);
        assert_eq!(spec.index, 4);
        assert_eq!(spec.gimbal_pitch_deg, -90.0);
    }

    #[test]
    fn waypoint_input_aims_at_poi() {
        let input = WaypointInput {
            index: None,
            lat: 0.0,
            lon: 0.0,
            altitude_m: 100.0,
            speed_mps: 5.0,
            gimbal_pitch_deg: None,
            heading_mode: HeadingMode::TowardPointOfInterest,
            turn_mode: TurnMode::default(),
        };
        let poi = PointOfInterest {
            lat: 0.0,
            lon: 0.01,
            height_m: 0.0,
        };
        let spec = input.resolve(0, Some(&poi));
        assert!(spec.gimbal_pitch_deg < 0.0 && spec.gimbal_pitch_deg > -90.0);
    }

    #[test]
    fn mission_plan_parses_with_defaults() {
        let raw = serde_json::json!({
            "settings": {
                "name": "survey",
                "takeoff_security_height_m": 20.0,
                "global_transitional_speed_mps": 5.0
            },
            "waypoints": [
                {"lat": 33.695844, "lon": 73.051886, "altitude_m": 27.43, "speed_mps": 5.0},
                {"lat": 33.695748, "lon": 73.051997, "altitude_m": 27.43, "speed_mps": 5.0, "gimbal_pitch_deg": -45.0}
            ]
        });
        let plan: MissionPlan = serde_json::from_value(raw).expect("parse plan");
        assert_eq!(plan.settings.finish_action, FinishAction::GoHome);
        assert_eq!(plan.settings.drone, DroneInfo::default());
        let specs = plan.waypoint_specs();
        assert_eq!(specs[0].index, 0);
        assert_eq!(specs[1].index, 1);
        assert_eq!(specs[1].gimbal_pitch_deg, -45.0);
    }
}
