//! Great-circle geometry primitives.
//!
//! Pure functions over route polylines: point-to-point haversine distance,
//! cumulative route length, and position interpolation at a distance along
//! the route. No state, no allocation beyond the returned value.

use crate::types::{RoutePoint, RoutePosition};

/// Mean Earth radius in kilometers.
pub const EARTH_RADIUS_KM: f64 = 6371.0;

/// Great-circle distance between two points, in kilometers.
pub fn haversine_distance_km(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    let d_lat = (lat2 - lat1).to_radians();
    let d_lon = (lon2 - lon1).to_radians();

    let a = (d_lat / 2.0).sin().powi(2)
        + lat1.to_radians().cos() * lat2.to_radians().cos() * (d_lon / 2.0).sin().powi(2);

    // Floating-point overshoot can push `a` a hair outside [0, 1]; clamp so
    // both square roots stay real for antipodal and near-zero inputs.
    let a = a.clamp(0.0, 1.0);
    let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());

    EARTH_RADIUS_KM * c
}

/// Total length of the polyline, summing consecutive haversine distances.
/// A single point has length 0.
pub fn route_length_km(points: &[RoutePoint]) -> f64 {
    points
        .windows(2)
        .map(|pair| haversine_distance_km(pair[0].lat, pair[0].lng, pair[1].lat, pair[1].lng))
        .sum()
}

/// Position at `target_km` along the polyline.
///
/// Walks accumulated segment distances and interpolates linearly in
/// coordinate space within the containing segment. Not geodesically exact,
/// but adequate at trail-route vertex density. Past the end of the route
/// (including trailing zero-length segments) the final vertex is returned.
///
/// Requires a non-empty slice.
pub fn position_at_distance(points: &[RoutePoint], target_km: f64) -> RoutePosition {
    let mut accumulated = 0.0;

    for (index, pair) in points.windows(2).enumerate() {
        let (a, b) = (pair[0], pair[1]);
        let segment_km = haversine_distance_km(a.lat, a.lng, b.lat, b.lng);

        if segment_km > 0.0 && accumulated + segment_km >= target_km {
            let ratio = ((target_km - accumulated) / segment_km).clamp(0.0, 1.0);
            return RoutePosition {
                lng: a.lng + (b.lng - a.lng) * ratio,
                lat: a.lat + (b.lat - a.lat) * ratio,
                elevation: a.elevation + (b.elevation - a.elevation) * ratio,
                segment_index: index,
            };
        }

        accumulated += segment_km;
    }

    let last = points[points.len() - 1];
    RoutePosition {
        lng: last.lng,
        lat: last.lat,
        elevation: last.elevation,
        segment_index: points.len() - 1,
    }
}
