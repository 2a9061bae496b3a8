//! Analytics summary with layered fallback
//!
//! Persisted incidents from the last 24 hours are preferred. When storage
//! has nothing (or fails), a live listing is attempted for the request bbox or
//! the configured default. Whatever list comes out is tallied; this service
//! never returns an error.

use chrono::{Duration, Utc};
use crashlens_common::analytics::IncidentTally;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, warn};

use super::incident_source::IncidentSource;
use super::storage::{IncidentStore, StorageFilter};

/// Which tier produced the summarized data
///
/// `Live` is also reported when the live fallback produced nothing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DataSource {
    Storage,
    Live,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalyticsSummary {
    pub period: String,
    #[serde(flatten)]
    pub tally: IncidentTally,
    pub source: DataSource,
    pub timestamp: String,
}

pub struct AnalyticsService {
    store: Arc<dyn IncidentStore>,
    incidents: Arc<IncidentSource>,
    default_bbox: Option<String>,
}

impl AnalyticsService {
    pub fn new(
        store: Arc<dyn IncidentStore>,
        incidents: Arc<IncidentSource>,
        default_bbox: Option<String>,
    ) -> Self {
        Self {
            store,
            incidents,
            default_bbox,
        }
    }

    pub async fn summary(&self, bbox: Option<&str>) -> AnalyticsSummary {
        let stored = match self.store.query(&StorageFilter::recent(Duration::hours(24))).await {
            Ok(records) => records,
            Err(e) => {
                warn!("Storage query failed, treating as empty: {}", e);
                Vec::new()
            }
        };

        let (tally, source) = if !stored.is_empty() {
            (IncidentTally::from_records(&stored), DataSource::Storage)
        } else {
            (self.live_tally(bbox).await, DataSource::Live)
        };

        info!(
            total = tally.total_incidents,
            source = ?source,
            "Analytics summary computed"
        );

        AnalyticsSummary {
            period: "24h".to_string(),
            tally,
            source,
            timestamp: Utc::now().to_rfc3339(),
        }
    }

    async fn live_tally(&self, bbox: Option<&str>) -> IncidentTally {
        let bbox = bbox
            .filter(|b| !b.is_empty())
            .or(self.default_bbox.as_deref());

        let Some(bbox) = bbox else {
            return IncidentTally::default();
        };

        match self.incidents.list_incidents(bbox, None).await {
            Ok(incidents) => IncidentTally::from_incidents(&incidents),
            Err(e) => {
                warn!(bbox, "Live analytics fallback failed: {}", e);
                IncidentTally::default()
            }
        }
    }
}
