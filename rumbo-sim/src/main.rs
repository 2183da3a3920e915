//! Venue wayfinding toolkit: route planning, data validation and
//! scripted guidance walks from the command line.

mod error;
mod scenario;
mod trace;

use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;
use std::time::{Duration, Instant};

use clap::{Parser, Subcommand};
use rumbo_core::algo::{Severity, validate_venue};
use rumbo_core::guidance::{GuidanceEvent, GuidanceSession, PositionSource};
use rumbo_core::loading::load_venue;
use rumbo_core::model::Venue;
use rumbo_core::routing::{Route, shortest_route};
use tracing::{info, warn};

use crate::error::Error;
use crate::scenario::Scenario;
use crate::trace::TraceWriter;

#[derive(Parser)]
#[command(name = "rumbo", version, about = "Venue wayfinding toolkit")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Summarise a venue document
    Info {
        /// Venue JSON document
        venue: PathBuf,
        /// Instruction language to load
        #[arg(long, default_value = "en-GB")]
        language: String,
    },
    /// Plan the fastest route between two waypoints
    Route {
        /// Venue JSON document
        venue: PathBuf,
        /// Waypoint id to start from
        from: String,
        /// Waypoint id to reach
        to: String,
        #[arg(long, default_value = "en-GB")]
        language: String,
        /// Write the route as GeoJSON to this file
        #[arg(long)]
        geojson: Option<PathBuf>,
    },
    /// Check venue data integrity
    Validate {
        /// Venue JSON document
        venue: PathBuf,
        #[arg(long, default_value = "en-GB")]
        language: String,
    },
    /// Replay a scripted walk through a guidance session
    Walk {
        /// Venue JSON document
        venue: PathBuf,
        /// Scenario TOML file (endpoints, config, readings)
        scenario: PathBuf,
        /// Write a CSV trace of every event to this file
        #[arg(long)]
        trace: Option<PathBuf>,
        /// Replay at full speed instead of the scenario's intervals
        #[arg(long)]
        fast: bool,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let cli = Cli::parse();
    let outcome = match cli.command {
        Command::Info { venue, language } => info_command(&venue, &language),
        Command::Route {
            venue,
            from,
            to,
            language,
            geojson,
        } => route_command(&venue, &from, &to, &language, geojson.as_deref()),
        Command::Validate { venue, language } => validate_command(&venue, &language),
        Command::Walk {
            venue,
            scenario,
            trace,
            fast,
        } => walk_command(&venue, &scenario, trace.as_deref(), fast).await,
    };

    match outcome {
        Ok(code) => code,
        Err(error) => {
            eprintln!("error: {error}");
            ExitCode::FAILURE
        }
    }
}

fn info_command(venue_path: &Path, language: &str) -> Result<ExitCode, Error> {
    let venue = load_venue(venue_path, language)?;

    println!("{}", venue.name);
    println!(
        "  {} waypoints, {} segments",
        venue.graph.waypoint_count(),
        venue.graph.segment_count()
    );
    for platform in &venue.platforms {
        println!(
            "  platform '{}' serves: {}",
            platform.name,
            platform.destinations.join(", ")
        );
    }
    for exit in &venue.exits {
        println!("  exit '{}' ({})", exit.name, exit.mode);
    }
    let destinations = venue.destinations();
    if !destinations.is_empty() {
        println!("  destinations: {}", destinations.join(", "));
    }
    Ok(ExitCode::SUCCESS)
}

fn route_command(
    venue_path: &Path,
    from: &str,
    to: &str,
    language: &str,
    geojson: Option<&Path>,
) -> Result<ExitCode, Error> {
    let venue = load_venue(venue_path, language)?;
    let route = plan(&venue, from, to)?;

    println!(
        "{} -> {}: {} legs, {:.0} s",
        from,
        to,
        route.len(),
        route.total_weight()
    );
    for (index, leg) in route.legs().iter().enumerate() {
        let from_name = waypoint_name(&venue, &leg.source);
        let to_name = waypoint_name(&venue, &leg.target);
        println!(
            "  {}. [{}] {} -> {} ({:.0} s)",
            index + 1,
            leg.id,
            from_name,
            to_name,
            leg.travel_time()
        );
        if let Some(text) = &leg.instructions.start {
            println!("     {text}");
        }
    }

    if let Some(path) = geojson {
        let collection = route.to_feature_collection(&venue.graph)?;
        std::fs::write(path, serde_json::to_string_pretty(&collection)?)?;
        info!("route written to {}", path.display());
    }
    Ok(ExitCode::SUCCESS)
}

fn validate_command(venue_path: &Path, language: &str) -> Result<ExitCode, Error> {
    let venue = load_venue(venue_path, language)?;
    let report = validate_venue(&venue);

    for finding in &report.findings {
        match finding.severity {
            Severity::Error => println!("error: {}", finding.message),
            Severity::Warning => println!("warning: {}", finding.message),
        }
    }
    if report.passed() {
        println!(
            "'{}' passed validation ({} warnings)",
            venue.name,
            report.warning_count()
        );
        Ok(ExitCode::SUCCESS)
    } else {
        println!(
            "'{}' failed validation: {} errors, {} warnings",
            venue.name,
            report.error_count(),
            report.warning_count()
        );
        Ok(ExitCode::FAILURE)
    }
}

async fn walk_command(
    venue_path: &Path,
    scenario_path: &Path,
    trace_path: Option<&Path>,
    fast: bool,
) -> Result<ExitCode, Error> {
    let scenario = Scenario::load(scenario_path)?;
    let venue = load_venue(venue_path, &scenario.language)?;

    let mut config = scenario.config.clone();
    config.language = scenario.language.clone();
    let mut session = GuidanceSession::start(
        Arc::clone(&venue.graph),
        config,
        &scenario.from,
        &scenario.to,
    )?;
    let mut source = scenario.source()?;
    let mut trace = match trace_path {
        Some(path) => Some(TraceWriter::create(path)?),
        None => None,
    };

    info!(
        "walking '{}': {} -> {} ({} readings)",
        venue.name,
        scenario.from,
        scenario.to,
        source.len()
    );
    let interval = Duration::from_millis(scenario.interval_ms);
    let started = Instant::now();

    for event in session.begin() {
        report(&mut trace, &started, &session, &event)?;
    }

    let mut interrupted = false;
    while let Some(reading) = source.next_reading() {
        if !fast {
            tokio::select! {
                () = tokio::time::sleep(interval) => {}
                _ = tokio::signal::ctrl_c() => {
                    warn!("interrupted, stopping the walk");
                    interrupted = true;
                }
            }
            if interrupted {
                break;
            }
        }
        let mut unroutable = false;
        for event in session.process_reading(&reading) {
            if matches!(event, GuidanceEvent::RouteUnavailable { .. }) {
                unroutable = true;
            }
            report(&mut trace, &started, &session, &event)?;
        }
        if session.is_complete() {
            break;
        }
        if unroutable {
            break;
        }
    }

    if let Some(trace) = trace {
        trace.finish()?;
    }

    if session.is_complete() {
        println!("-- arrived at {}", session.progress().destination());
        Ok(ExitCode::SUCCESS)
    } else {
        println!(
            "-- walk ended before arrival (at {}, {} legs remaining)",
            session.progress().current_waypoint(),
            session.progress().remaining_legs()
        );
        Ok(ExitCode::FAILURE)
    }
}

/// Prints one event and appends it to the trace when one is open.
fn report(
    trace: &mut Option<TraceWriter>,
    started: &Instant,
    session: &GuidanceSession,
    event: &GuidanceEvent,
) -> Result<(), Error> {
    match event {
        GuidanceEvent::Instruction(instruction) => println!("speak: {}", instruction.text),
        GuidanceEvent::Silent(_) => {}
        GuidanceEvent::Rerouted { from, to } => {
            println!("-- rerouted: {from} back to {to}");
        }
        GuidanceEvent::RouteUnavailable { from, to } => {
            println!("-- no route from {from} back to {to}");
        }
        GuidanceEvent::Arrived { at } => println!("-- arrived: {at}"),
    }
    if let Some(trace) = trace {
        trace.record(
            started.elapsed().as_millis(),
            event,
            &session.progress().state_snapshot(),
        )?;
    }
    Ok(())
}

fn plan(venue: &Venue, from: &str, to: &str) -> Result<Route, Error> {
    let origin = venue
        .graph
        .node(from)
        .ok_or_else(|| rumbo_core::Error::WaypointNotFound(from.to_string()))?;
    let target = venue
        .graph
        .node(to)
        .ok_or_else(|| rumbo_core::Error::WaypointNotFound(to.to_string()))?;
    let route =
        shortest_route(&venue.graph, origin, target).ok_or_else(|| rumbo_core::Error::NoRoute {
            from: from.to_string(),
            to: to.to_string(),
        })?;
    Ok(route)
}

fn waypoint_name<'a>(venue: &'a Venue, id: &'a str) -> &'a str {
    venue
        .graph
        .waypoint_by_id(id)
        .map_or(id, |waypoint| waypoint.name.as_str())
}
