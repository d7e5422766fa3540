//! trail-sim-server binary
//!
//! Loads a route and an athlete roster, then publishes position snapshots
//! on a local broadcast channel while accepting control commands.
//!
//! ## Configuration (flags / env)
//!
//! | Key                  | Default      | Description                      |
//! |----------------------|--------------|----------------------------------|
//! | `TRAIL_ROUTE`        | *(required)* | GeoJSON route file               |
//! | `TRAIL_ATHLETES`     | *(none)*     | JSON athlete roster file         |
//! | `TRAIL_SESSION`      | `default`    | Session name stamped on events   |
//! | `TRAIL_TICK_RATE_HZ` | `10`         | Snapshot publish rate            |
//! | `TRAIL_AUTOSTART`    | `false`      | Start every athlete immediately  |

use anyhow::{Context, Result};
use clap::Parser;
use parking_lot::Mutex;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use trail_sim::{
    bus::{RaceBusAgent, RaceBusConfig},
    service::RaceService,
    time::SystemTimeSource,
    types::{Athlete, RoutePoint},
    RouteModel,
};

// ---------------------------------------------------------------------------
// CLI
// ---------------------------------------------------------------------------

#[derive(Parser, Debug)]
#[command(name = "trail-sim-server", about = "Trail race position simulator", version)]
struct Args {
    /// GeoJSON file containing the route (LineString or MultiLineString)
    #[arg(long, env = "TRAIL_ROUTE")]
    route: PathBuf,

    /// JSON athlete roster file; a small demo roster is used when omitted
    #[arg(long, env = "TRAIL_ATHLETES")]
    athletes: Option<PathBuf>,

    /// Session name stamped into every outbound event
    #[arg(long, env = "TRAIL_SESSION", default_value = "default")]
    session: String,

    /// Snapshot publish rate (Hz)
    #[arg(long, env = "TRAIL_TICK_RATE_HZ", default_value_t = 10.0)]
    tick_rate_hz: f32,

    /// Start every athlete as soon as the server is up
    #[arg(long, env = "TRAIL_AUTOSTART", default_value_t = false)]
    autostart: bool,
}

// ---------------------------------------------------------------------------
// Entry point
// ---------------------------------------------------------------------------

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("trail_sim=debug".parse()?),
        )
        .init();

    let args = Args::parse();

    let route = Arc::new(load_route(&args.route)?);
    log::info!(
        "route loaded: {} points, {:.2} km total",
        route.point_count(),
        route.total_distance_km()
    );

    let athletes = match &args.athletes {
        Some(path) => load_roster(path)?,
        None => demo_roster(),
    };
    log::info!("roster: {} athletes", athletes.len());

    let mut service = RaceService::new(Arc::new(SystemTimeSource::new()));
    service.initialize(athletes, route)?;
    if args.autostart {
        service.start()?;
        log::info!("autostarted all athletes");
    }

    let config = RaceBusConfig {
        session: args.session,
        tick_rate_hz: args.tick_rate_hz,
        ..Default::default()
    };
    RaceBusAgent::new(config, Arc::new(Mutex::new(service)))
        .run()
        .await
}

// ---------------------------------------------------------------------------
// Loaders
// ---------------------------------------------------------------------------

/// Pull the first line's coordinates out of a GeoJSON document.
///
/// Accepts `LineString` and `MultiLineString` geometries, bare or wrapped
/// in a `Feature` / `FeatureCollection`.
fn load_route(path: &Path) -> Result<RouteModel> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("reading route file {}", path.display()))?;
    let doc: serde_json::Value = serde_json::from_str(&raw).context("parsing route GeoJSON")?;

    let geometry = if doc["type"] == "FeatureCollection" {
        doc["features"][0]["geometry"].clone()
    } else if doc["type"] == "Feature" {
        doc["geometry"].clone()
    } else {
        doc
    };

    let coordinates = match geometry["type"].as_str() {
        Some("LineString") => geometry["coordinates"].clone(),
        Some("MultiLineString") => geometry["coordinates"][0].clone(),
        other => anyhow::bail!("unsupported geometry type {:?}", other),
    };

    let coords: Vec<Vec<f64>> =
        serde_json::from_value(coordinates).context("decoding coordinate array")?;
    let points: Vec<RoutePoint> = coords
        .iter()
        .map(|c| RoutePoint::from_coordinate(c))
        .collect::<Option<_>>()
        .context("coordinate with fewer than 2 components")?;

    Ok(RouteModel::new(points)?)
}

fn load_roster(path: &Path) -> Result<Vec<Athlete>> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("reading roster file {}", path.display()))?;
    serde_json::from_str(&raw).context("parsing athlete roster JSON")
}

/// Built-in roster used when no roster file is supplied.
fn demo_roster() -> Vec<Athlete> {
    [
        ("101", "Sarah Johnson", 12.3, 42.5),
        ("102", "Mike Chen", 11.8, 41.2),
        ("103", "Emma Wilson", 11.5, 39.8),
    ]
    .into_iter()
    .map(|(bib, name, speed_kmh, start_km)| {
        let mut athlete = Athlete::new(bib);
        athlete.name = Some(name.to_string());
        athlete.bib = Some(bib.to_string());
        athlete.base_speed_kmh = Some(speed_kmh);
        athlete.initial_distance_km = start_km;
        athlete
    })
    .collect()
}
