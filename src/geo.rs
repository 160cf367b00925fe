//! Geodistance
//!
//! Great-circle distances between located nodes. Distances only rank
//! candidates; they never exclude one.

use std::cmp::Ordering;

use crate::directory::Node;
use crate::domain::GeoPoint;

/// Mean Earth radius in kilometers
pub const EARTH_RADIUS_KM: f64 = 6371.0;

/// Haversine distance between two points in km.
pub fn haversine_km(a: GeoPoint, b: GeoPoint) -> f64 {
    let lat1 = a.lat.to_radians();
    let lat2 = b.lat.to_radians();
    let dlat = lat2 - lat1;
    let dlon = (b.lon - a.lon).to_radians();

    let h = (dlat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (dlon / 2.0).sin().powi(2);
    let c = 2.0 * h.sqrt().atan2((1.0 - h).sqrt());

    EARTH_RADIUS_KM * c
}

/// Distance between two nodes, or `None` if either lacks coordinates.
pub fn distance_km(a: &Node, b: &Node) -> Option<f64> {
    Some(haversine_km(a.location?, b.location?))
}

/// Sort key placing unknown distances after every known one.
pub fn ranking_key(distance: Option<f64>) -> f64 {
    distance.unwrap_or(f64::INFINITY)
}

/// Compare two optional distances, unknown last.
pub fn compare_distance(a: Option<f64>, b: Option<f64>) -> Ordering {
    ranking_key(a).total_cmp(&ranking_key(b))
}
