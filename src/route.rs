//! Immutable route model: ordered vertices plus a length computed once.

use crate::error::{Result, SimError};
use crate::geo;
use crate::types::{RoutePoint, RoutePosition};

/// A fixed geographic route.
///
/// Construction validates and measures the polyline exactly once; afterwards
/// the model is read-only and can be shared by `Arc` across every athlete
/// clock without synchronization.
#[derive(Debug, Clone)]
pub struct RouteModel {
    points: Vec<RoutePoint>,
    total_km: f64,
}

impl RouteModel {
    /// Build a route from at least two vertices with finite coordinates.
    pub fn new(points: Vec<RoutePoint>) -> Result<Self> {
        if points.len() < 2 {
            return Err(SimError::DegenerateRoute {
                reason: format!("route needs at least 2 points, got {}", points.len()),
            });
        }
        if points
            .iter()
            .any(|p| !p.lng.is_finite() || !p.lat.is_finite() || !p.elevation.is_finite())
        {
            return Err(SimError::DegenerateRoute {
                reason: "route contains non-finite coordinates".into(),
            });
        }

        let total_km = geo::route_length_km(&points);
        Ok(Self { points, total_km })
    }

    pub fn total_distance_km(&self) -> f64 {
        self.total_km
    }

    pub fn points(&self) -> &[RoutePoint] {
        &self.points
    }

    pub fn point_count(&self) -> usize {
        self.points.len()
    }

    /// True when every vertex coincides. Athletes on such a route are
    /// treated as immediately finished rather than dividing by zero.
    pub fn is_zero_length(&self) -> bool {
        self.total_km <= 0.0
    }

    pub fn position_at(&self, distance_km: f64) -> RoutePosition {
        geo::position_at_distance(&self.points, distance_km)
    }
}
