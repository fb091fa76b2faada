//! Mission document compiler.
//!
//! Turns mission settings and an ordered waypoint list into the route and
//! config documents the flight controller expects. Totals are computed here;
//! text encoding lives in [`crate::wpml`].

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{MissionError, Result};
use crate::geometry::{self, GeoPoint};
use crate::models::{HeadingMode, MissionSettings, PointOfInterest, TurnMode, WaypointSpec};

const DEFAULT_AUTHOR: &str = "wayline";

#[derive(Debug, Clone)]
pub struct CompileOptions {
    pub author: String,
    pub created_at: DateTime<Utc>,
    pub template_id: u32,
    pub wayline_id: u32,
}

impl Default for CompileOptions {
    fn default() -> Self {
        Self {
            author: DEFAULT_AUTHOR.to_string(),
            created_at: Utc::now(),
            template_id: 0,
            wayline_id: 0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentHeader {
    pub author: String,
    /// Unix seconds
    pub create_time: i64,
    /// Unix seconds
    pub update_time: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RouteTotals {
    pub distance_m: f64,
    pub duration_s: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HeadingParam {
    pub mode: HeadingMode,
    /// Signed heading in degrees, [-180, 180]
    pub angle_deg: f64,
    pub poi: Option<PointOfInterest>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TurnParam {
    pub mode: TurnMode,
    pub damping_dist_m: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionTrigger {
    ReachPoint,
}

impl ActionTrigger {
    pub fn as_wpml(self) -> &'static str {
        match self {
            ActionTrigger::ReachPoint => "reachPoint",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "function", rename_all = "snake_case")]
pub enum ActuatorFunction {
    /// Absolute-angle gimbal move
    GimbalRotate {
        pitch_deg: f64,
        payload_position_index: u32,
    },
    /// Gimbal pitch interpolated over the leg; older firmware rejects it
    GimbalEvenlyRotate {
        pitch_deg: f64,
        payload_position_index: u32,
    },
    TakePhoto {
        file_suffix: String,
        payload_position_index: u32,
    },
}

impl ActuatorFunction {
    pub fn as_wpml(&self) -> &'static str {
        match self {
            ActuatorFunction::GimbalRotate { .. } => "gimbalRotate",
            ActuatorFunction::GimbalEvenlyRotate { .. } => "gimbalEvenlyRotate",
            ActuatorFunction::TakePhoto { .. } => "takePhoto",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Action {
    pub id: u32,
    pub function: ActuatorFunction,
}

/// Actions fired when the aircraft reaches one waypoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActionGroup {
    pub id: u32,
    pub start_index: usize,
    pub end_index: usize,
    pub trigger: ActionTrigger,
    pub actions: Vec<Action>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Placemark {
    pub index: usize,
    pub position: GeoPoint,
    pub execute_height_m: f64,
    pub speed_mps: f64,
    pub heading: HeadingParam,
    pub turn: TurnParam,
    pub action_group: Option<ActionGroup>,
}

/// Executable per-waypoint sequence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RouteDocument {
    pub header: DocumentHeader,
    pub settings: MissionSettings,
    pub template_id: u32,
    pub wayline_id: u32,
    pub totals: RouteTotals,
    pub placemarks: Vec<Placemark>,
}

/// Mission-wide settings plus computed totals.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConfigDocument {
    pub header: DocumentHeader,
    pub settings: MissionSettings,
    pub template_id: u32,
    pub totals: RouteTotals,
    pub global_height_m: f64,
    pub global_turn_mode: TurnMode,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MissionDocuments {
    pub route: RouteDocument,
    pub config: ConfigDocument,
}

/// Compile with default options (author `wayline`, timestamps now).
pub fn compile(settings: &MissionSettings, waypoints: &[WaypointSpec]) -> Result<MissionDocuments> {
    compile_with(settings, waypoints, &CompileOptions::default())
}

pub fn compile_with(
    settings: &MissionSettings,
    waypoints: &[WaypointSpec],
    options: &CompileOptions,
) -> Result<MissionDocuments> {
    validate_input(settings, waypoints)?;

    let totals = route_totals(waypoints, settings.global_transitional_speed_mps);
    let header = DocumentHeader {
        author: options.author.clone(),
        create_time: options.created_at.timestamp(),
        update_time: options.created_at.timestamp(),
    };

    let placemarks: Vec<Placemark> = waypoints
        .iter()
        .enumerate()
        .map(|(position, waypoint)| Placemark {
            index: waypoint.index,
            position: waypoint.position(),
            execute_height_m: waypoint.altitude_m,
            speed_mps: waypoint.speed_mps,
            heading: heading_param(settings, waypoints, position),
            turn: TurnParam {
                mode: waypoint.turn_mode,
                damping_dist_m: waypoint.turn_mode.damping_distance_m(),
            },
            action_group: capture_group(waypoint, settings.payload.position_index),
        })
        .collect();

    tracing::debug!(
        mission = %settings.name,
        waypoints = waypoints.len(),
        distance_m = totals.distance_m,
        duration_s = totals.duration_s,
        "compiled mission documents"
    );

    // Non-empty is guaranteed by validate_input
    let first = &waypoints[0];
    Ok(MissionDocuments {
        route: RouteDocument {
            header: header.clone(),
            settings: settings.clone(),
            template_id: options.template_id,
            wayline_id: options.wayline_id,
            totals,
            placemarks,
        },
        config: ConfigDocument {
            header,
            settings: settings.clone(),
            template_id: options.template_id,
            totals,
            global_height_m: first.altitude_m,
            global_turn_mode: first.turn_mode,
        },
    })
}

/// Total leg distance and `ceil(distance / speed)` duration.
pub fn route_totals(waypoints: &[WaypointSpec], speed_mps: f64) -> RouteTotals {
    let points: Vec<GeoPoint> = waypoints.iter().map(WaypointSpec::position).collect();
    let distance_m = geometry::path_length(&points);
    let duration_s = if speed_mps > 0.0 {
        (distance_m / speed_mps).ceil() as u64
    } else {
        0
    };
    RouteTotals {
        distance_m,
        duration_s,
    }
}

fn validate_input(settings: &MissionSettings, waypoints: &[WaypointSpec]) -> Result<()> {
    if waypoints.is_empty() {
        return Err(MissionError::InvalidMission(
            "mission has no waypoints".to_string(),
        ));
    }
    if !(settings.global_transitional_speed_mps.is_finite()
        && settings.global_transitional_speed_mps > 0.0)
    {
        return Err(MissionError::InvalidMission(format!(
            "global transitional speed must be positive, got {}",
            settings.global_transitional_speed_mps
        )));
    }

    for (position, waypoint) in waypoints.iter().enumerate() {
        if waypoint.index != position {
            return Err(MissionError::InvalidMission(format!(
                "waypoint at position {} has index {}",
                position, waypoint.index
            )));
        }
        if !(waypoint.lat.is_finite() && (-90.0..=90.0).contains(&waypoint.lat))
            || !(waypoint.lon.is_finite() && (-180.0..=180.0).contains(&waypoint.lon))
        {
            return Err(MissionError::InvalidMission(format!(
                "waypoint {} has invalid coordinates ({}, {})",
                waypoint.index, waypoint.lat, waypoint.lon
            )));
        }
        if !(waypoint.altitude_m.is_finite() && waypoint.altitude_m > 0.0) {
            return Err(MissionError::InvalidMission(format!(
                "waypoint {} altitude must be positive, got {}",
                waypoint.index, waypoint.altitude_m
            )));
        }
        if !(waypoint.speed_mps.is_finite() && waypoint.speed_mps > 0.0) {
            return Err(MissionError::InvalidMission(format!(
                "waypoint {} speed must be positive, got {}",
                waypoint.index, waypoint.speed_mps
            )));
        }
    }

    Ok(())
}

fn heading_param(settings: &MissionSettings, waypoints: &[WaypointSpec], position: usize) -> HeadingParam {
    if let Some(poi) = settings.point_of_interest {
        return HeadingParam {
            mode: HeadingMode::TowardPointOfInterest,
            angle_deg: 0.0,
            poi: Some(poi),
        };
    }

    if waypoints[position].heading_mode == HeadingMode::TowardPointOfInterest {
        tracing::debug!(
            index = position,
            "waypoint asks for POI heading but mission has no point of interest"
        );
    }

    HeadingParam {
        mode: HeadingMode::FollowRoute,
        angle_deg: leg_heading(waypoints, position),
        poi: None,
    }
}

/// Heading of the leg leaving `position`; the last waypoint keeps the inbound leg.
fn leg_heading(waypoints: &[WaypointSpec], position: usize) -> f64 {
    let (from, to) = if position + 1 < waypoints.len() {
        (&waypoints[position], &waypoints[position + 1])
    } else if position > 0 {
        (&waypoints[position - 1], &waypoints[position])
    } else {
        return 0.0;
    };
    geometry::signed_heading(geometry::bearing(from.position(), to.position()))
}

/// Gimbal move then photo for every waypoint after the first.
///
/// The launch waypoint carries no action group.
fn capture_group(waypoint: &WaypointSpec, payload_position_index: u32) -> Option<ActionGroup> {
    if waypoint.index == 0 {
        return None;
    }
    let ordinal = (waypoint.index - 1) as u32;

    Some(ActionGroup {
        id: ordinal,
        start_index: waypoint.index,
        end_index: waypoint.index,
        trigger: ActionTrigger::ReachPoint,
        actions: vec![
            Action {
                id: 2 * ordinal,
                function: ActuatorFunction::GimbalRotate {
                    pitch_deg: waypoint.gimbal_pitch_deg,
                    payload_position_index,
                },
            },
            Action {
                id: 2 * ordinal + 1,
                function: ActuatorFunction::TakePhoto {
                    file_suffix: format!("point{}", waypoint.index),
                    payload_position_index,
                },
            },
        ],
    })
}
