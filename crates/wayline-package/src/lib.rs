//! Wayline package - mission container I/O
//!
//! Packs compiled documents into the firmware container, stages every write
//! atomically and gates dispatch on geofence validation.

pub mod assembler;
pub mod checker;
pub mod dispatch;
pub mod error;
pub mod pipeline;
pub mod staging;

pub use assembler::{pack, pack_text, unpack, MissionPackage, CONFIG_ENTRY, ROUTE_ENTRY};
pub use checker::{validate_container, CheckReport, FormatChecker, StructuralChecker};
pub use dispatch::{dispatch, DirectoryUplink, MissionUplink};
pub use error::PackageError;
pub use pipeline::{prepare_mission, PreparedMission};
pub use staging::{write_atomic, StagedFile};
