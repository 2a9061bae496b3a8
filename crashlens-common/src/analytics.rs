//! Incident tallies used by the analytics summary

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::Incident;

const UNKNOWN: &str = "unknown";

/// Counts of incidents, grouped by criticality and by type
///
/// `by_severity` is keyed by criticality label; the name is kept for
/// compatibility with existing dashboard clients.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct IncidentTally {
    pub total_incidents: usize,
    pub by_severity: BTreeMap<String, usize>,
    pub by_type: BTreeMap<String, usize>,
}

impl IncidentTally {
    /// Tally persisted records (opaque JSON objects)
    ///
    /// Records without a string `criticality` or `type` are counted as `unknown`.
    pub fn from_records(records: &[Value]) -> Self {
        let mut tally = Self::default();
        for record in records {
            tally.add(
                record.get("criticality").and_then(Value::as_str).unwrap_or(UNKNOWN),
                record.get("type").and_then(Value::as_str).unwrap_or(UNKNOWN),
            );
        }
        tally
    }

    /// Tally freshly normalized incidents
    pub fn from_incidents(incidents: &[Incident]) -> Self {
        let mut tally = Self::default();
        for incident in incidents {
            tally.add(&incident.criticality, &incident.incident_type);
        }
        tally
    }

    fn add(&mut self, criticality: &str, incident_type: &str) {
        self.total_incidents += 1;
        *self.by_severity.entry(criticality.to_string()).or_insert(0) += 1;
        *self.by_type.entry(incident_type.to_string()).or_insert(0) += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::normalize::normalize_incident;
    use serde_json::json;

    #[test]
    fn test_empty_tally_is_all_zero() {
        let tally = IncidentTally::from_records(&[]);
        assert_eq!(tally.total_incidents, 0);
        assert!(tally.by_severity.is_empty());
        assert!(tally.by_type.is_empty());
    }

    #[test]
    fn test_records_grouped_with_unknown_bucket() {
        let records = vec![
            json!({"criticality": "major", "type": "accident"}),
            json!({"criticality": "major", "type": "construction"}),
            json!({"criticality": "low"}),
            json!({"type": 5}),
        ];
        let tally = IncidentTally::from_records(&records);
        assert_eq!(tally.total_incidents, 4);
        assert_eq!(tally.by_severity["major"], 2);
        assert_eq!(tally.by_severity["low"], 1);
        assert_eq!(tally.by_severity["unknown"], 1);
        assert_eq!(tally.by_type["accident"], 1);
        assert_eq!(tally.by_type["construction"], 1);
        assert_eq!(tally.by_type["unknown"], 2);
    }

    #[test]
    fn test_incidents_and_records_agree() {
        let incidents: Vec<Incident> = [
            json!({"incidentDetails": {"criticality": "critical", "type": "accident"}}),
            json!({"incidentDetails": {"type": "roadClosure"}}),
        ]
        .iter()
        .map(|raw| normalize_incident(raw).unwrap())
        .collect();

        let records: Vec<Value> = incidents
            .iter()
            .map(|i| serde_json::to_value(i).unwrap())
            .collect();

        assert_eq!(
            IncidentTally::from_incidents(&incidents),
            IncidentTally::from_records(&records)
        );
    }
}
