//! Coordinate resolution from an upstream location object
//!
//! Candidates, most precise first:
//! 1. `shape.links[0].points[0]` - first polyline vertex
//! 2. `displayPoint`
//! 3. `origin`
//!
//! Latitude and longitude are resolved independently, so a point may take its
//! latitude from one candidate and its longitude from another. An axis with no
//! candidate resolves to `0.0`.

use serde_json::Value;

/// Resolved position; `0.0` on an axis means unresolved
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

/// Resolve coordinates from an optional location object
///
/// Missing keys, empty lists and wrong types only disqualify the candidate
/// they appear in.
pub fn resolve_coordinates(location: Option<&Value>) -> Coordinates {
    let Some(location) = location else {
        return Coordinates::default();
    };

    let candidates = [
        location.pointer("/shape/links/0/points/0"),
        location.get("displayPoint"),
        location.get("origin"),
    ];

    Coordinates {
        latitude: first_axis(&candidates, "lat"),
        longitude: first_axis(&candidates, "lng"),
    }
}

fn first_axis(candidates: &[Option<&Value>], axis: &str) -> f64 {
    candidates
        .iter()
        .flatten()
        .find_map(|point| point.get(axis).and_then(Value::as_f64))
        .unwrap_or(0.0)
}
