//! Incident persistence adapters
//!
//! Records are opaque JSON objects. Storage is best-effort from the service's
//! point of view: saves report a success flag, queries may fail, and callers
//! fall back when they do.

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use crashlens_common::{Error, Result};
use serde_json::Value;
use std::str::FromStr;
use tokio::sync::RwLock;
use tracing::{debug, warn};

/// Which persistence backend to use
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageKind {
    /// Supabase PostgREST table `incidents`
    Supabase,
    /// In-process store (lost on restart)
    Memory,
    /// Saves succeed and queries return nothing
    None,
}

impl FromStr for StorageKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "supabase" => Ok(StorageKind::Supabase),
            "memory" => Ok(StorageKind::Memory),
            "none" | "" => Ok(StorageKind::None),
            other => Err(Error::Config(format!(
                "Unknown STORAGE_TYPE '{}' (expected supabase, memory or none)",
                other
            ))),
        }
    }
}

/// Filter for persisted incident queries
#[derive(Debug, Clone, PartialEq)]
pub struct StorageFilter {
    /// Only records with `start_time >= since`
    pub since: DateTime<Utc>,
}

impl StorageFilter {
    /// Records from the trailing window ending now
    pub fn recent(window: Duration) -> Self {
        Self {
            since: Utc::now() - window,
        }
    }

    /// PostgREST query parameters
    pub fn query_params(&self) -> Vec<(String, String)> {
        vec![(
            "start_time".to_string(),
            format!("gte.{}", self.since.to_rfc3339()),
        )]
    }

    fn matches(&self, record: &Value) -> bool {
        start_time(record).is_some_and(|ts| ts >= self.since)
    }

    /// Dated before the window; undated records never expire
    fn expired(&self, record: &Value) -> bool {
        start_time(record).is_some_and(|ts| ts < self.since)
    }
}

fn start_time(record: &Value) -> Option<DateTime<Utc>> {
    record
        .get("start_time")
        .and_then(Value::as_str)
        .and_then(|ts| DateTime::parse_from_rfc3339(ts).ok())
        .map(|ts| ts.with_timezone(&Utc))
}

fn record_id(record: &Value) -> Option<&str> {
    record
        .get("id")
        .and_then(Value::as_str)
        .filter(|id| !id.is_empty())
}

/// Persistence collaborator
#[async_trait]
pub trait IncidentStore: Send + Sync {
    /// Persist one record; `false` when the backend did not accept it
    async fn save(&self, record: &Value) -> bool;

    /// Fetch records matching the filter
    async fn query(&self, filter: &StorageFilter) -> Result<Vec<Value>>;

    /// Whether a real backend is configured (reported by `/health`)
    fn is_configured(&self) -> bool {
        true
    }
}

/// Supabase (PostgREST) store
pub struct SupabaseStore {
    http_client: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl SupabaseStore {
    pub fn new(base_url: impl Into<String>, api_key: String) -> Result<Self> {
        let http_client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(10))
            .build()
            .map_err(|e| Error::Internal(format!("HTTP client build failed: {}", e)))?;

        Ok(Self {
            http_client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key,
        })
    }

    fn table_url(&self) -> String {
        format!("{}/rest/v1/incidents", self.base_url)
    }
}

#[async_trait]
impl IncidentStore for SupabaseStore {
    async fn save(&self, record: &Value) -> bool {
        let result = self
            .http_client
            .post(self.table_url())
            .header("apikey", &self.api_key)
            .bearer_auth(&self.api_key)
            .json(record)
            .send()
            .await;

        match result {
            Ok(response) if response.status() == reqwest::StatusCode::CREATED => true,
            Ok(response) => {
                warn!(status = response.status().as_u16(), "Supabase rejected incident");
                false
            }
            Err(e) => {
                warn!("Supabase save failed: {}", e);
                false
            }
        }
    }

    async fn query(&self, filter: &StorageFilter) -> Result<Vec<Value>> {
        let response = self
            .http_client
            .get(self.table_url())
            .header("apikey", &self.api_key)
            .bearer_auth(&self.api_key)
            .query(&filter.query_params())
            .send()
            .await
            .map_err(|e| Error::Internal(format!("Supabase query failed: {}", e)))?;

        if response.status() != reqwest::StatusCode::OK {
            debug!(status = response.status().as_u16(), "Supabase query returned no data");
            return Ok(Vec::new());
        }

        response
            .json::<Vec<Value>>()
            .await
            .map_err(|e| Error::Internal(format!("Supabase response decode failed: {}", e)))
    }
}

/// How long the in-process store keeps a record after its `start_time`
pub const MEMORY_RETENTION_HOURS: i64 = 24;

/// In-process store
///
/// Records are keyed by `id`: saving an id again replaces the earlier copy.
/// Every save also drops records that started before the retention window.
pub struct MemoryStore {
    records: RwLock<Vec<Value>>,
    retention: Duration,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::with_retention(Duration::hours(MEMORY_RETENTION_HOURS))
    }
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_retention(retention: Duration) -> Self {
        Self {
            records: RwLock::new(Vec::new()),
            retention,
        }
    }

    /// Number of records held
    pub async fn len(&self) -> usize {
        self.records.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

#[async_trait]
impl IncidentStore for MemoryStore {
    async fn save(&self, record: &Value) -> bool {
        let window = StorageFilter::recent(self.retention);
        let mut records = self.records.write().await;
        records.retain(|r| !window.expired(r));

        let existing = record_id(record)
            .and_then(|id| records.iter().position(|r| record_id(r) == Some(id)));
        match existing {
            Some(index) => records[index] = record.clone(),
            None => records.push(record.clone()),
        }
        true
    }

    async fn query(&self, filter: &StorageFilter) -> Result<Vec<Value>> {
        Ok(self
            .records
            .read()
            .await
            .iter()
            .filter(|r| filter.matches(r))
            .cloned()
            .collect())
    }
}

/// Store that keeps nothing
pub struct NullStore;

#[async_trait]
impl IncidentStore for NullStore {
    async fn save(&self, _record: &Value) -> bool {
        true
    }

    async fn query(&self, _filter: &StorageFilter) -> Result<Vec<Value>> {
        Ok(Vec::new())
    }

    fn is_configured(&self) -> bool {
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_storage_kind_parse() {
        assert_eq!("supabase".parse::<StorageKind>().unwrap(), StorageKind::Supabase);
        assert_eq!("Memory".parse::<StorageKind>().unwrap(), StorageKind::Memory);
        assert_eq!("none".parse::<StorageKind>().unwrap(), StorageKind::None);
        assert!("firebase".parse::<StorageKind>().is_err());
    }

    #[test]
    fn test_filter_query_params() {
        let since = DateTime::parse_from_rfc3339("2024-05-01T00:00:00Z")
            .unwrap()
            .with_timezone(&Utc);
        let filter = StorageFilter { since };
        assert_eq!(
            filter.query_params(),
            vec![("start_time".to_string(), "gte.2024-05-01T00:00:00+00:00".to_string())]
        );
    }

    #[tokio::test]
    async fn test_memory_store_filters_by_start_time() {
        let store = MemoryStore::new();
        let recent = Utc::now().to_rfc3339();
        let old = (Utc::now() - Duration::hours(48)).to_rfc3339();

        assert!(store.save(&json!({"id": "new", "start_time": recent})).await);
        assert!(store.save(&json!({"id": "old", "start_time": old})).await);
        assert_eq!(store.len().await, 2);

        let found = store.query(&StorageFilter::recent(Duration::hours(24))).await.unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0]["id"], "new");
    }

    #[tokio::test]
    async fn test_memory_store_upserts_by_id() {
        let store = MemoryStore::new();
        let now = Utc::now().to_rfc3339();

        store
            .save(&json!({"id": "a", "criticality": "minor", "start_time": now}))
            .await;
        store
            .save(&json!({"id": "a", "criticality": "major", "start_time": now}))
            .await;
        assert_eq!(store.len().await, 1);

        let found = store.query(&StorageFilter::recent(Duration::hours(24))).await.unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0]["criticality"], "major");
    }

    #[tokio::test]
    async fn test_memory_store_prunes_expired_on_save() {
        let store = MemoryStore::new();
        let old = (Utc::now() - Duration::hours(48)).to_rfc3339();
        let recent = Utc::now().to_rfc3339();

        store.save(&json!({"id": "old", "start_time": old})).await;
        store.save(&json!({"id": "undated"})).await;
        store.save(&json!({"id": "new", "start_time": recent})).await;

        assert_eq!(store.len().await, 2);
    }

    #[tokio::test]
    async fn test_null_store() {
        let store = NullStore;
        assert!(store.save(&json!({"id": "x"})).await);
        assert!(store
            .query(&StorageFilter::recent(Duration::hours(24)))
            .await
            .unwrap()
            .is_empty());
        assert!(!store.is_configured());
    }
}
