//! Incident model and request value types

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// Normalized traffic incident
///
/// Built once per upstream record by [`crate::normalize::normalize_incident`]
/// and never modified afterwards. `latitude`/`longitude` of `0.0` mean the
/// position could not be resolved and must not be treated as a real fix.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Incident {
    pub id: String,
    #[serde(rename = "type")]
    pub incident_type: String,
    pub description: String,
    pub latitude: f64,
    pub longitude: f64,
    /// Ordinal derived from `criticality` (see [`severity_for`])
    pub severity: i32,
    /// Lowercase upstream criticality label
    pub criticality: String,
    pub start_time: String,
    /// Empty when the upstream record carries no end time
    pub end_time: String,
    pub road_name: Option<String>,
    pub location_name: Option<String>,
    pub length: f64,
}

/// Criticality assumed when upstream omits it or sends a non-string value
pub const DEFAULT_CRITICALITY: &str = "minor";

/// Map a normalized criticality label to its severity ordinal
///
/// `critical` → 3, `major` → 2, `minor` → 1, `low` → 0. Anything else is 0.
pub fn severity_for(criticality: &str) -> i32 {
    match criticality {
        "critical" => 3,
        "major" => 2,
        "minor" => 1,
        "low" => 0,
        _ => 0,
    }
}

/// Geographic bounding box as `minLon,minLat,maxLon,maxLat`
///
/// Only the component count is checked; the text is forwarded to the
/// upstream API verbatim.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Bbox(String);

impl Bbox {
    pub fn parse(raw: &str) -> Result<Self> {
        if raw.split(',').count() != 4 || raw.is_empty() {
            return Err(Error::InvalidInput(
                "Invalid bbox. Expected 'minLon,minLat,maxLon,maxLat'".to_string(),
            ));
        }
        Ok(Self(raw.to_string()))
    }

    /// Square-ish box of `radius_m` metres around a centre point
    ///
    /// One degree of latitude is taken as 111 km; the longitude span is
    /// widened by `1 / cos(latitude)`.
    pub fn around(latitude: f64, longitude: f64, radius_m: f64) -> Self {
        let lat_offset = radius_m / 111_000.0;
        let cos_lat = latitude.to_radians().cos().abs().max(f64::EPSILON);
        let lon_offset = radius_m / (111_000.0 * cos_lat);

        Self(format!(
            "{},{},{},{}",
            longitude - lon_offset,
            latitude - lat_offset,
            longitude + lon_offset,
            latitude + lat_offset
        ))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for Bbox {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}
