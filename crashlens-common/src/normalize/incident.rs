//! Raw upstream incident → [`Incident`]

use chrono::Utc;
use serde_json::Value;
use thiserror::Error;
use tracing::warn;

use super::field_text::extract_text;
use super::geolocation::resolve_coordinates;
use crate::models::{severity_for, Incident, DEFAULT_CRITICALITY};

/// Why a single upstream record could not be normalized
#[derive(Debug, Clone, PartialEq, Error)]
pub enum NormalizeError {
    #[error("record is not a JSON object")]
    NotAnObject,

    #[error("field `{field}` has unexpected type (expected {expected})")]
    InvalidField {
        field: &'static str,
        expected: &'static str,
    },
}

/// Normalize one raw upstream incident record
///
/// Fails only when the record itself or one of its typed fields has the wrong
/// JSON type; every other gap is filled with a default.
pub fn normalize_incident(raw: &Value) -> Result<Incident, NormalizeError> {
    if !raw.is_object() {
        return Err(NormalizeError::NotAnObject);
    }

    let details = optional_object(raw, "incidentDetails")?;
    // A location of the wrong shape only costs the record its coordinates
    let location = raw.get("location").filter(|v| v.is_object());

    let criticality = details
        .and_then(|d| d.get("criticality"))
        .and_then(Value::as_str)
        .map(str::to_lowercase)
        .unwrap_or_else(|| DEFAULT_CRITICALITY.to_string());
    let severity = severity_for(&criticality);

    let incident_type = match details.map(|d| optional_str(d, "type")).transpose()?.flatten() {
        Some(t) => t.to_string(),
        None => optional_str(raw, "type")?
            .unwrap_or("unknown")
            .to_string(),
    };

    let details_description = details.and_then(|d| d.get("description"));
    let description = extract_text(details_description)
        .or_else(|| extract_text(raw.get("description")))
        .unwrap_or_default();

    let location_name = extract_text(location.and_then(|l| l.get("description")))
        .or_else(|| extract_text(location.and_then(|l| l.pointer("/displayPoint/description"))))
        .or_else(|| extract_text(details_description));

    let road_name = extract_text(location.and_then(|l| l.get("roadName")))
        .or_else(|| extract_text(location.and_then(|l| l.pointer("/primaryLocation/roadName"))))
        .or_else(|| extract_text(location.and_then(|l| l.pointer("/primaryLocation/address"))))
        .or_else(|| location_name.clone());

    let id = match details.map(|d| optional_str(d, "id")).transpose()?.flatten() {
        Some(id) => id.to_string(),
        None => optional_str(raw, "incidentId")?.unwrap_or_default().to_string(),
    };

    let start_time = match details.map(|d| optional_str(d, "startTime")).transpose()?.flatten() {
        Some(ts) => ts.to_string(),
        None => Utc::now().to_rfc3339(),
    };
    let end_time = details
        .map(|d| optional_str(d, "endTime"))
        .transpose()?
        .flatten()
        .unwrap_or_default()
        .to_string();

    let length = match location.and_then(|l| l.get("length")) {
        None | Some(Value::Null) => 0.0,
        Some(v) => v.as_f64().ok_or(NormalizeError::InvalidField {
            field: "length",
            expected: "number",
        })?,
    };

    let coords = resolve_coordinates(location);

    Ok(Incident {
        id,
        incident_type,
        description,
        latitude: coords.latitude,
        longitude: coords.longitude,
        severity,
        criticality,
        start_time,
        end_time,
        road_name,
        location_name,
        length,
    })
}

/// Normalize every record, dropping (and logging) the ones that fail
pub fn normalize_batch(records: &[Value]) -> Vec<Incident> {
    records
        .iter()
        .filter_map(|raw| match normalize_incident(raw) {
            Ok(incident) => Some(incident),
            Err(e) => {
                let incident_id = raw.get("incidentId").unwrap_or(&Value::Null);
                warn!(
                    incident_id = %incident_id,
                    error = %e,
                    "Skipping malformed upstream incident"
                );
                None
            }
        })
        .collect()
}

fn optional_str<'a>(obj: &'a Value, field: &'static str) -> Result<Option<&'a str>, NormalizeError> {
    match obj.get(field) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => Ok(Some(s.as_str())),
        Some(_) => Err(NormalizeError::InvalidField {
            field,
            expected: "string",
        }),
    }
}

fn optional_object<'a>(
    obj: &'a Value,
    field: &'static str,
) -> Result<Option<&'a Value>, NormalizeError> {
    match obj.get(field) {
        None | Some(Value::Null) => Ok(None),
        Some(v @ Value::Object(_)) => Ok(Some(v)),
        Some(_) => Err(NormalizeError::InvalidField {
            field,
            expected: "object",
        }),
    }
}
