//! Wayline core: mission compilation, compatibility cleaning and geofence checks.

pub mod cleaner;
pub mod compiler;
pub mod error;
pub mod execution;
pub mod geofence;
pub mod geometry;
pub mod models;
pub mod wpml;

pub use cleaner::{clean, CleanReport, Cleaned, CleanerRules};
pub use compiler::{
    compile, compile_with, Action, ActionGroup, ActuatorFunction, CompileOptions, ConfigDocument,
    MissionDocuments, RouteDocument, RouteTotals,
};
pub use error::MissionError;
pub use execution::{ExecutionMonitor, ExecutionState, StatusReport, WaypointProgress};
pub use geofence::{dedup_zones, is_inside, most_restrictive, reference_point, validate};
pub use geometry::{bearing, distance, pitch_angle, GeoPoint};
pub use models::{
    FlyZone, MissionPlan, MissionSettings, ValidationOutcome, ValidationResult, WaypointInput,
    WaypointSpec, ZoneCategory, ZoneGeometry, ZoneSourceKind,
};
