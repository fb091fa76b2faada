//! Mission plan files.

use std::path::Path;

use anyhow::{bail, Context, Result};
use wayline_core::{MissionPlan, MissionSettings, WaypointSpec};

/// A plan with waypoints resolved into flight order.
#[derive(Debug, Clone)]
pub struct LoadedPlan {
    pub settings: MissionSettings,
    pub waypoints: Vec<WaypointSpec>,
}

impl LoadedPlan {
    /// File stem used for generated artifacts.
    pub fn slug(&self) -> String {
        let slug: String = self
            .settings
            .name
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() { c.to_ascii_lowercase() } else { '-' })
            .collect();
        let slug = slug.trim_matches('-').to_string();
        if slug.is_empty() {
            "mission".to_string()
        } else {
            slug
        }
    }
}

pub fn parse_plan(text: &str) -> Result<LoadedPlan> {
    let plan: MissionPlan = serde_json::from_str(text).context("Invalid mission plan JSON")?;
    if plan.waypoints.is_empty() {
        bail!("mission plan has no waypoints");
    }
    let waypoints = plan.waypoint_specs();
    Ok(LoadedPlan {
        settings: plan.settings,
        waypoints,
    })
}

pub fn load_plan(path: &Path) -> Result<LoadedPlan> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read plan {}", path.display()))?;
    parse_plan(&text).with_context(|| format!("Failed to load plan {}", path.display()))
}
