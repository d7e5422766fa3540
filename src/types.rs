//! Core simulation types shared across all modules.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

// ---------------------------------------------------------------------------
// Route geometry
// ---------------------------------------------------------------------------

/// A single vertex of the route polyline. Ordering is significant:
/// consecutive points define route segments.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct RoutePoint {
    pub lng: f64,
    pub lat: f64,
    #[serde(default)]
    pub elevation: f64,
}

impl RoutePoint {
    pub fn new(lng: f64, lat: f64, elevation: f64) -> Self {
        Self {
            lng,
            lat,
            elevation,
        }
    }

    /// Build from a GeoJSON-style `[lng, lat, elevation?]` coordinate.
    /// Elevation defaults to 0 when absent.
    pub fn from_coordinate(coord: &[f64]) -> Option<Self> {
        match *coord {
            [lng, lat] => Some(Self::new(lng, lat, 0.0)),
            [lng, lat, elevation, ..] => Some(Self::new(lng, lat, elevation)),
            _ => None,
        }
    }
}

impl std::fmt::Display for RoutePoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({:.5}, {:.5}, {:.1}m)", self.lng, self.lat, self.elevation)
    }
}

/// An interpolated position along the route.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct RoutePosition {
    pub lng: f64,
    pub lat: f64,
    pub elevation: f64,
    /// Index of the segment (by its leading vertex) this position falls on.
    pub segment_index: usize,
}

// ---------------------------------------------------------------------------
// Athletes
// ---------------------------------------------------------------------------

/// Speed assigned to athletes whose descriptor declares none.
pub const DEFAULT_SPEED_KMH: f64 = 4.0;

/// Externally supplied participant descriptor.
///
/// The engine reads it and passes it back untouched in every state snapshot;
/// display metadata beyond the known fields rides along in `extra`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Athlete {
    pub id: String,
    pub name: Option<String>,
    pub bib: Option<String>,
    /// Starting offset along the route, in km from the route origin.
    #[serde(default)]
    pub initial_distance_km: f64,
    /// Declared speed; [`DEFAULT_SPEED_KMH`] when absent.
    pub base_speed_kmh: Option<f64>,
    /// Arbitrary display metadata (nationality, club, sponsors, ...).
    #[serde(flatten)]
    pub extra: HashMap<String, serde_json::Value>,
}

impl Athlete {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: None,
            bib: None,
            initial_distance_km: 0.0,
            base_speed_kmh: None,
            extra: HashMap::new(),
        }
    }

    pub fn speed_kmh(&self) -> f64 {
        self.base_speed_kmh.unwrap_or(DEFAULT_SPEED_KMH)
    }
}

// ---------------------------------------------------------------------------
// Run state
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunState {
    Idle,
    Running,
    Paused,
}

// ---------------------------------------------------------------------------
// State snapshots
// ---------------------------------------------------------------------------

/// Point-in-time snapshot of one athlete. Plain data, safe to serialize and
/// hand to any consumer; no engine internals leak out.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AthleteState {
    pub athlete_id: String,
    pub position: RoutePosition,
    /// Cumulative km traveled from the very start of the route (not from the
    /// athlete's own starting offset).
    pub distance_covered_km: f64,
    pub progress_percent: f64,
    /// Cumulative time-in-motion in hours; 0 while idle.
    pub elapsed_time_hours: f64,
    pub estimated_total_time_hours: f64,
    pub speed_kmh: f64,
    pub is_finished: bool,
    pub is_paused: bool,
    /// The originating descriptor, passed through unmodified.
    pub athlete: Athlete,
}

/// Aggregate counters for dashboards and the stats command.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RaceStats {
    pub athletes: usize,
    pub running: usize,
    pub paused: usize,
    pub finished: usize,
    pub total_route_km: f64,
}
