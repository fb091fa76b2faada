//! Compile, pack, clean and stage one mission end to end.

use std::path::{Path, PathBuf};

use wayline_core::{
    clean, compile_with, CleanReport, CleanerRules, CompileOptions, MissionSettings, RouteTotals,
    WaypointSpec,
};

use crate::assembler::{pack, pack_text, unpack};
use crate::checker::{validate_container, FormatChecker};
use crate::error::Result;
use crate::staging::StagedFile;

#[derive(Debug, Clone, PartialEq)]
pub struct PreparedMission {
    pub path: PathBuf,
    pub totals: RouteTotals,
    pub route_report: CleanReport,
    pub config_report: CleanReport,
    pub bytes: usize,
}

/// Build a firmware-ready container at `destination`.
///
/// The container is compiled and packed, unpacked again so the cleaner sees the
/// exact packed text, cleaned, repacked, then staged beside `destination` and
/// checked before it is promoted. Any failure removes the staged file and
/// leaves `destination` untouched.
pub fn prepare_mission(
    settings: &MissionSettings,
    waypoints: &[WaypointSpec],
    destination: &Path,
    options: &CompileOptions,
    rules: &CleanerRules,
    checker: &dyn FormatChecker,
) -> Result<PreparedMission> {
    let docs = compile_with(settings, waypoints, options)?;
    let raw = pack(&docs.route, &docs.config)?;

    let (route_text, config_text) = unpack(&raw)?;
    let route = clean(&route_text, rules)?;
    let config = clean(&config_text, rules)?;
    tracing::debug!(
        removed_fields = route.report.removed_fields + config.report.removed_fields,
        removed_groups = route.report.removed_groups,
        "cleaned mission documents"
    );

    let package = pack_text(&route.text, &config.text)?;

    let mut staged = StagedFile::new(destination)?;
    staged.write_all(package.as_bytes())?;
    validate_container(staged.path(), checker)?;
    let path = staged.promote()?;

    tracing::info!(
        mission = %settings.name,
        path = %path.display(),
        bytes = package.len(),
        "mission package ready"
    );

    Ok(PreparedMission {
        path,
        totals: docs.route.totals,
        route_report: route.report,
        config_report: config.report,
        bytes: package.len(),
    })
}
