//! Hand-off of validated packages to the flight-control side.

use std::path::{Path, PathBuf};

use wayline_core::ValidationResult;

use crate::error::{PackageError, Result};
use crate::staging;

/// Transport that delivers a container to the aircraft.
pub trait MissionUplink: Send + Sync {
    /// Deliver the container; returns a transport-specific receipt.
    fn upload(&self, package_path: &Path) -> Result<String>;
}

/// Sideload workflow: copy containers into an outbox directory.
#[derive(Debug, Clone)]
pub struct DirectoryUplink {
    outbox: PathBuf,
}

impl DirectoryUplink {
    pub fn new(outbox: impl Into<PathBuf>) -> Self {
        Self {
            outbox: outbox.into(),
        }
    }

    pub fn outbox(&self) -> &Path {
        &self.outbox
    }
}

impl MissionUplink for DirectoryUplink {
    fn upload(&self, package_path: &Path) -> Result<String> {
        let name = package_path.file_name().ok_or_else(|| {
            PackageError::Packaging(format!("{} has no file name", package_path.display()))
        })?;
        let target = self.outbox.join(name);
        let bytes = std::fs::read(package_path)?;
        staging::write_atomic(&target, &bytes)?;
        Ok(target.display().to_string())
    }
}

/// Upload `package_path` unless validation flagged the route.
pub fn dispatch(
    package_path: &Path,
    validation: &ValidationResult,
    uplink: &dyn MissionUplink,
) -> Result<String> {
    if !validation.is_clear() {
        let zones: Vec<String> = validation
            .intersecting_zones
            .iter()
            .map(|zone| zone.name.clone())
            .collect();
        tracing::warn!(
            path = %package_path.display(),
            waypoints = ?validation.affected_waypoint_indices,
            "dispatch blocked by geofence"
        );
        return Err(PackageError::Blocked { zones });
    }

    let receipt = uplink.upload(package_path)?;
    tracing::info!(path = %package_path.display(), %receipt, "mission dispatched");
    Ok(receipt)
}

#[cfg(test)]
mod tests {
    use super::*;
    use wayline_core::{FlyZone, GeoPoint, ValidationOutcome, ZoneCategory, ZoneGeometry, ZoneSourceKind};

    fn clear() -> ValidationResult {
        ValidationResult {
            affected_waypoint_indices: Vec::new(),
            intersecting_zones: Vec::new(),
            matches: Vec::new(),
            outcome: ValidationOutcome::Clear,
        }
    }

    #[test]
    fn clear_mission_lands_in_outbox() {
        let dir = tempfile::tempdir().unwrap();
        let package = dir.path().join("mission.kmz");
        std::fs::write(&package, b"zip bytes").unwrap();
        let uplink = DirectoryUplink::new(dir.path().join("outbox"));

        let receipt = dispatch(&package, &clear(), &uplink).unwrap();
        assert!(receipt.ends_with("mission.kmz"));
        assert_eq!(
            std::fs::read(uplink.outbox().join("mission.kmz")).unwrap(),
            b"zip bytes"
        );
    }

    #[test]
    fn flagged_mission_is_blocked() {
        let dir = tempfile::tempdir().unwrap();
        let package = dir.path().join("mission.kmz");
        std::fs::write(&package, b"zip bytes").unwrap();
        let uplink = DirectoryUplink::new(dir.path().join("outbox"));

        let mut validation = clear();
        validation.outcome = ValidationOutcome::Flagged;
        validation.affected_waypoint_indices = vec![0];
        validation.intersecting_zones = vec![FlyZone {
            id: "nur-khan".to_string(),
            name: "PAF Base Nur Khan".to_string(),
            category: ZoneCategory::Restricted,
            geometry: ZoneGeometry::Circle {
                center: GeoPoint::new(33.6166, 73.0993),
                radius_m: 5000.0,
            },
            source: ZoneSourceKind::StaticFallback,
        }];

        match dispatch(&package, &validation, &uplink) {
            Err(PackageError::Blocked { zones }) => {
                assert_eq!(zones, vec!["PAF Base Nur Khan".to_string()])
            }
            other => panic!("unexpected result {other:?}"),
        }
        assert!(!uplink.outbox().exists());
    }
}
