//! Wayline operator CLI.

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use wayline_cli::{load_plan, Config, LoadedPlan};
use wayline_core::geofence::{most_restrictive, reference_point, validate};
use wayline_core::wpml::{encode_config, encode_route, inspect_config, inspect_route};
use wayline_core::{clean, compile_with, CleanerRules, CompileOptions, GeoPoint, ValidationResult};
use wayline_package::{
    dispatch, prepare_mission, unpack, DirectoryUplink, MissionPackage, StructuralChecker,
    CONFIG_ENTRY, ROUTE_ENTRY,
};
use wayline_zones::{ZoneQuery, ZoneResolver};

/// Compile, check and package waypoint missions
#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Compile a plan into route and config documents
    Compile {
        plan: PathBuf,
        /// Output directory (default: WAYLINE_OUTPUT_DIR)
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// Strip firmware-incompatible content from a document
    Clean {
        input: PathBuf,
        /// Output file (default: overwrite input)
        #[arg(long)]
        out: Option<PathBuf>,
        /// Extra actuator function to drop whole action groups for
        #[arg(long = "deny-action")]
        deny_actions: Vec<String>,
    },
    /// Summarize a mission package
    Inspect { package: PathBuf },
    /// Check a plan against fly zones
    Check {
        plan: PathBuf,
        /// Vehicle latitude, if known
        #[arg(long, requires = "lon", allow_negative_numbers = true)]
        lat: Option<f64>,
        /// Vehicle longitude, if known
        #[arg(long, requires = "lat", allow_negative_numbers = true)]
        lon: Option<f64>,
    },
    /// Build a firmware-ready package and optionally dispatch it
    Prepare {
        plan: PathBuf,
        /// Package path (default: <output dir>/<mission>.kmz)
        #[arg(long)]
        out: Option<PathBuf>,
        /// Copy the package into this outbox when the route is clear
        #[arg(long)]
        outbox: Option<PathBuf>,
        #[arg(long, requires = "lon", allow_negative_numbers = true)]
        lat: Option<f64>,
        #[arg(long, requires = "lat", allow_negative_numbers = true)]
        lon: Option<f64>,
    },
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(tracing_subscriber::EnvFilter::from_default_env().add_directive("wayline=info".parse()?))
        .init();

    let args = Args::parse();
    let config = Config::from_env();

    match args.command {
        Command::Compile { plan, out } => {
            compile_plan(&config, &plan, out.as_deref().unwrap_or(&config.output_dir))?;
            Ok(ExitCode::SUCCESS)
        }
        Command::Clean {
            input,
            out,
            deny_actions,
        } => {
            clean_file(&input, out.as_deref().unwrap_or(&input), deny_actions)?;
            Ok(ExitCode::SUCCESS)
        }
        Command::Inspect { package } => {
            inspect_package(&package)?;
            Ok(ExitCode::SUCCESS)
        }
        Command::Check { plan, lat, lon } => {
            let plan = load_plan(&plan)?;
            let result = check_plan(&config, &plan, vehicle(lat, lon)).await;
            print_validation(&result)?;
            Ok(if result.is_clear() {
                ExitCode::SUCCESS
            } else {
                ExitCode::from(2)
            })
        }
        Command::Prepare {
            plan,
            out,
            outbox,
            lat,
            lon,
        } => prepare(&config, &plan, out, outbox, vehicle(lat, lon)).await,
    }
}

fn vehicle(lat: Option<f64>, lon: Option<f64>) -> Option<GeoPoint> {
    Some(GeoPoint::new(lat?, lon?))
}

fn compile_options(config: &Config) -> CompileOptions {
    CompileOptions {
        author: config.author.clone(),
        ..CompileOptions::default()
    }
}

fn compile_plan(config: &Config, plan_path: &Path, out_dir: &Path) -> Result<()> {
    let plan = load_plan(plan_path)?;
    let docs = compile_with(&plan.settings, &plan.waypoints, &compile_options(config))
        .context("Failed to compile mission")?;

    let route_path = out_dir.join("waylines.wpml");
    let config_path = out_dir.join("template.kml");
    wayline_package::write_atomic(&route_path, encode_route(&docs.route)?.as_bytes())
        .with_context(|| format!("Failed to write {}", route_path.display()))?;
    wayline_package::write_atomic(&config_path, encode_config(&docs.config)?.as_bytes())
        .with_context(|| format!("Failed to write {}", config_path.display()))?;

    println!(
        "Compiled {} waypoints: {:.1} m, {} s",
        plan.waypoints.len(),
        docs.route.totals.distance_m,
        docs.route.totals.duration_s
    );
    println!("  {}", route_path.display());
    println!("  {}", config_path.display());
    Ok(())
}

fn clean_file(input: &Path, output: &Path, deny_actions: Vec<String>) -> Result<()> {
    let text = std::fs::read_to_string(input)
        .with_context(|| format!("Failed to read {}", input.display()))?;
    let rules = deny_actions
        .into_iter()
        .fold(CleanerRules::legacy_firmware(), |rules, action| {
            rules.deny_actuator_function(action)
        });

    let cleaned = clean(&text, &rules).with_context(|| format!("Failed to clean {}", input.display()))?;
    wayline_package::write_atomic(output, cleaned.text.as_bytes())
        .with_context(|| format!("Failed to write {}", output.display()))?;

    println!(
        "Removed {} fields and {} action groups, rewrote {} namespace lines",
        cleaned.report.removed_fields, cleaned.report.removed_groups, cleaned.report.rewritten_namespaces
    );
    Ok(())
}

fn inspect_package(path: &Path) -> Result<()> {
    let package = MissionPackage::read(path).with_context(|| format!("Failed to read {}", path.display()))?;
    let (route_text, config_text) = unpack(&package)?;
    let route = inspect_route(&route_text).with_context(|| format!("Invalid {}", ROUTE_ENTRY))?;
    let config = inspect_config(&config_text).with_context(|| format!("Invalid {}", CONFIG_ENTRY))?;

    let summary = serde_json::json!({
        "bytes": package.len(),
        "route": route,
        "config": config,
    });
    println!("{}", serde_json::to_string_pretty(&summary)?);
    Ok(())
}

async fn check_plan(config: &Config, plan: &LoadedPlan, vehicle: Option<GeoPoint>) -> ValidationResult {
    let zones = match reference_point(vehicle, &plan.waypoints) {
        Some(reference) => {
            let resolver = ZoneResolver::from_config(&config.zones);
            let query = ZoneQuery::new(reference, config.zones.check_radius_m);
            resolver
                .resolve_until(&query, async {
                    tokio::signal::ctrl_c().await.ok();
                })
                .await
        }
        None => Vec::new(),
    };
    tracing::debug!(zones = zones.len(), "zones resolved for check");
    validate(&plan.waypoints, &zones)
}

fn print_validation(result: &ValidationResult) -> Result<()> {
    if result.is_clear() {
        println!("Route is clear");
        return Ok(());
    }

    println!(
        "Route enters {} zone(s) at waypoints {:?}",
        result.intersecting_zones.len(),
        result.affected_waypoint_indices
    );
    if let Some(zone) = most_restrictive(&result.intersecting_zones) {
        println!("  Most restrictive: {} ({:?})", zone.name, zone.category);
    }
    println!("{}", serde_json::to_string_pretty(&result.matches)?);
    Ok(())
}

async fn prepare(
    config: &Config,
    plan_path: &Path,
    out: Option<PathBuf>,
    outbox: Option<PathBuf>,
    vehicle: Option<GeoPoint>,
) -> Result<ExitCode> {
    let plan = load_plan(plan_path)?;
    let destination = out.unwrap_or_else(|| config.output_dir.join(format!("{}.kmz", plan.slug())));

    let prepared = prepare_mission(
        &plan.settings,
        &plan.waypoints,
        &destination,
        &compile_options(config),
        &CleanerRules::legacy_firmware(),
        &StructuralChecker,
    )
    .context("Failed to prepare mission package")?;
    println!(
        "Prepared {} ({} bytes, {:.1} m, {} s)",
        prepared.path.display(),
        prepared.bytes,
        prepared.totals.distance_m,
        prepared.totals.duration_s
    );

    let result = check_plan(config, &plan, vehicle).await;
    print_validation(&result)?;

    let Some(outbox) = outbox else {
        return Ok(if result.is_clear() {
            ExitCode::SUCCESS
        } else {
            ExitCode::from(2)
        });
    };

    match dispatch(&prepared.path, &result, &DirectoryUplink::new(outbox)) {
        Ok(receipt) => {
            println!("Dispatched to {}", receipt);
            Ok(ExitCode::SUCCESS)
        }
        Err(wayline_package::PackageError::Blocked { zones }) => {
            eprintln!("Dispatch blocked: {}", zones.join(", "));
            Ok(ExitCode::from(2))
        }
        Err(err) => Err(err).context("Failed to dispatch mission"),
    }
}
