//! Container format checking.

use std::path::Path;

use wayline_core::wpml::{inspect_config, inspect_route};

use crate::assembler::{unpack, MissionPackage};
use crate::error::{PackageError, Result};

/// Outcome of one format check. An empty diagnostic list means the container passed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CheckReport {
    pub diagnostics: Vec<String>,
}

impl CheckReport {
    pub fn passed(&self) -> bool {
        self.diagnostics.is_empty()
    }
}

/// Firmware-side format checker; treated as opaque pass/fail plus diagnostics.
pub trait FormatChecker: Send + Sync {
    fn check(&self, route_text: &str, config_text: &str) -> CheckReport;
}

/// Built-in checker: both entries parse, carry their required elements, and
/// route placemark indices run contiguously from 0.
#[derive(Debug, Clone, Copy, Default)]
pub struct StructuralChecker;

impl FormatChecker for StructuralChecker {
    fn check(&self, route_text: &str, config_text: &str) -> CheckReport {
        let mut diagnostics = Vec::new();

        match inspect_route(route_text) {
            Ok(route) => {
                if route.wpml_namespace.is_none() {
                    diagnostics.push("route: missing wpml namespace".to_string());
                }
                if route.waypoint_count() == 0 {
                    diagnostics.push("route: no placemarks".to_string());
                } else if !route.indices_contiguous() {
                    diagnostics.push(format!(
                        "route: placemark indices not contiguous: {:?}",
                        route.waypoint_indices
                    ));
                }
                if route.distance_m.is_none() || route.duration_s.is_none() {
                    diagnostics.push("route: missing distance or duration".to_string());
                }
            }
            Err(err) => diagnostics.push(format!("route: {}", err)),
        }

        match inspect_config(config_text) {
            Ok(config) => {
                if !config.has_mission_config {
                    diagnostics.push("config: missing mission config block".to_string());
                }
                if config.template_type.is_none() {
                    diagnostics.push("config: missing template type".to_string());
                }
            }
            Err(err) => diagnostics.push(format!("config: {}", err)),
        }

        CheckReport { diagnostics }
    }
}

/// Re-open the package at `path` and run `checker` over both entries.
pub fn validate_container(path: &Path, checker: &dyn FormatChecker) -> Result<CheckReport> {
    let package = MissionPackage::read(path)?;
    let (route, config) = unpack(&package)?;
    let report = checker.check(&route, &config);

    if report.passed() {
        tracing::debug!(path = %path.display(), "container passed format check");
        Ok(report)
    } else {
        tracing::warn!(
            path = %path.display(),
            diagnostics = report.diagnostics.len(),
            "container rejected by format checker"
        );
        Err(PackageError::ContainerRejected(report.diagnostics))
    }
}
