//! Incident listing pipeline
//!
//! cache → upstream fetch → normalize → background persist → cache fill

use crashlens_common::normalize::normalize_batch;
use crashlens_common::{Bbox, Incident};
use serde_json::Value;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info, warn};

use super::cache::{IncidentCache, INCIDENT_CACHE_TTL_SECS};
use super::here_client::{TrafficApi, UpstreamError};
use super::storage::IncidentStore;

#[derive(Debug, Error)]
pub enum SourceError {
    #[error("HERE_API_KEY is not configured")]
    MissingApiKey,

    #[error("{0}")]
    InvalidBbox(String),

    #[error(transparent)]
    Upstream(#[from] UpstreamError),
}

/// Sources incident listings for a bounding box
pub struct IncidentSource {
    /// `None` when no upstream API key is configured
    upstream: Option<Arc<dyn TrafficApi>>,
    cache: Arc<IncidentCache>,
    store: Arc<dyn IncidentStore>,
}

impl IncidentSource {
    pub fn new(
        upstream: Option<Arc<dyn TrafficApi>>,
        cache: Arc<IncidentCache>,
        store: Arc<dyn IncidentStore>,
    ) -> Self {
        Self {
            upstream,
            cache,
            store,
        }
    }

    /// Upstream client, or the configuration error when none is set up
    pub fn upstream(&self) -> Result<&Arc<dyn TrafficApi>, SourceError> {
        self.upstream.as_ref().ok_or(SourceError::MissingApiKey)
    }

    pub fn cache(&self) -> &IncidentCache {
        &self.cache
    }

    /// List normalized incidents for `bbox`, optionally filtered by criticality
    ///
    /// A cache hit is returned as-is and is not persisted again. On a miss,
    /// every normalized record is handed to storage in the background and the
    /// listing is cached for [`INCIDENT_CACHE_TTL_SECS`].
    pub async fn list_incidents(
        &self,
        bbox: &str,
        criticality: Option<&str>,
    ) -> Result<Vec<Incident>, SourceError> {
        let upstream = self.upstream()?;
        let bbox = Bbox::parse(bbox).map_err(|e| match e {
            crashlens_common::Error::InvalidInput(msg) => SourceError::InvalidBbox(msg),
            other => SourceError::InvalidBbox(other.to_string()),
        })?;
        let criticality = criticality.filter(|c| !c.is_empty());

        let cache_key = cache_key(&bbox, criticality);

        // An empty payload reads as a miss
        if let Some(cached) = self.cache.get(&cache_key).await.filter(|c| !c.is_empty()) {
            match serde_json::from_slice::<Vec<Incident>>(&cached) {
                Ok(incidents) => {
                    debug!(key = %cache_key, count = incidents.len(), "Incident cache hit");
                    return Ok(incidents);
                }
                Err(e) => self.cache.disable(&format!("unreadable entry {}: {}", cache_key, e)),
            }
        }

        let document = upstream.incidents(bbox.as_str(), criticality).await?;
        let results = document
            .get("results")
            .and_then(Value::as_array)
            .map(Vec::as_slice)
            .unwrap_or_default();

        let incidents = normalize_batch(results);
        info!(
            bbox = %bbox,
            received = results.len(),
            normalized = incidents.len(),
            "Incidents normalized"
        );

        self.persist_in_background(&incidents);

        match serde_json::to_vec(&incidents) {
            Ok(bytes) => {
                self.cache
                    .set(&cache_key, INCIDENT_CACHE_TTL_SECS, &bytes)
                    .await
            }
            Err(e) => warn!("Failed to serialize incidents for cache: {}", e),
        }

        Ok(incidents)
    }

    /// Fire-and-forget saves; failures never reach the caller
    fn persist_in_background(&self, incidents: &[Incident]) {
        for incident in incidents {
            let record = match serde_json::to_value(incident) {
                Ok(record) => record,
                Err(e) => {
                    warn!(incident_id = %incident.id, "Failed to encode incident for storage: {}", e);
                    continue;
                }
            };
            let store = Arc::clone(&self.store);
            tokio::spawn(async move {
                if !store.save(&record).await {
                    debug!(
                        incident_id = record.get("id").and_then(serde_json::Value::as_str).unwrap_or(""),
                        "Background incident save not accepted"
                    );
                }
            });
        }
    }
}

/// Cache key for a listing; an absent criticality renders as empty
pub fn cache_key(bbox: &Bbox, criticality: Option<&str>) -> String {
    format!("incidents:{}:{}", bbox, criticality.unwrap_or(""))
}
