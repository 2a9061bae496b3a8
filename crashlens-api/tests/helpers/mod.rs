//! Shared fakes for crashlens-api integration tests

#![allow(dead_code)]

use async_trait::async_trait;
use crashlens_api::services::here_client::{TrafficApi, UpstreamError};
use crashlens_api::services::{
    CacheBackend, IncidentCache, IncidentStore, MemoryCache, MemoryStore, StorageFilter,
};
use crashlens_api::AppState;
use crashlens_common::{Error, Result};
use serde_json::{json, Value};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

pub const TEST_BBOX: &str = "-122.5,37.7,-122.3,37.9";

/// Upstream double returning a canned document or error
pub struct FakeTrafficApi {
    response: Mutex<Option<std::result::Result<Value, (u16, Option<String>)>>>,
    pub incident_calls: AtomicUsize,
    pub flow_calls: AtomicUsize,
    pub last_criticality: Mutex<Option<String>>,
}

impl FakeTrafficApi {
    pub fn with_document(document: Value) -> Arc<Self> {
        Arc::new(Self {
            response: Mutex::new(Some(Ok(document))),
            incident_calls: AtomicUsize::new(0),
            flow_calls: AtomicUsize::new(0),
            last_criticality: Mutex::new(None),
        })
    }

    pub fn failing(status: u16, message: Option<&str>) -> Arc<Self> {
        Arc::new(Self {
            response: Mutex::new(Some(Err((status, message.map(str::to_string))))),
            incident_calls: AtomicUsize::new(0),
            flow_calls: AtomicUsize::new(0),
            last_criticality: Mutex::new(None),
        })
    }

    pub fn incident_calls(&self) -> usize {
        self.incident_calls.load(Ordering::SeqCst)
    }

    fn respond(&self) -> std::result::Result<Value, UpstreamError> {
        match self.response.lock().unwrap().clone() {
            Some(Ok(document)) => Ok(document),
            Some(Err((status, message))) => Err(UpstreamError::Status { status, message }),
            None => Err(UpstreamError::Network("no response configured".to_string())),
        }
    }
}

#[async_trait]
impl TrafficApi for FakeTrafficApi {
    async fn incidents(
        &self,
        _bbox: &str,
        criticality: Option<&str>,
    ) -> std::result::Result<Value, UpstreamError> {
        self.incident_calls.fetch_add(1, Ordering::SeqCst);
        *self.last_criticality.lock().unwrap() = criticality.map(str::to_string);
        self.respond()
    }

    async fn flow(&self, _bbox: &str) -> std::result::Result<Value, UpstreamError> {
        self.flow_calls.fetch_add(1, Ordering::SeqCst);
        self.respond()
    }
}

/// Store whose queries always fail and whose saves are never accepted
pub struct FailingStore {
    pub save_calls: AtomicUsize,
}

impl FailingStore {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            save_calls: AtomicUsize::new(0),
        })
    }
}

#[async_trait]
impl IncidentStore for FailingStore {
    async fn save(&self, _record: &Value) -> bool {
        self.save_calls.fetch_add(1, Ordering::SeqCst);
        false
    }

    async fn query(&self, _filter: &StorageFilter) -> Result<Vec<Value>> {
        Err(Error::Internal("storage unreachable".to_string()))
    }
}

/// Cache backend that errors on every call
pub struct BrokenCache;

#[async_trait]
impl CacheBackend for BrokenCache {
    async fn get(
        &self,
        _key: &str,
    ) -> std::result::Result<Option<Vec<u8>>, crashlens_api::services::cache::CacheError> {
        Err(crashlens_api::services::cache::CacheError::Backend(
            "connection refused".to_string(),
        ))
    }

    async fn set_with_expiry(
        &self,
        _key: &str,
        _ttl_secs: u64,
        _value: &[u8],
    ) -> std::result::Result<(), crashlens_api::services::cache::CacheError> {
        Err(crashlens_api::services::cache::CacheError::Backend(
            "connection refused".to_string(),
        ))
    }
}

/// One well-formed upstream incident
pub fn raw_incident(id: &str, criticality: &str, kind: &str) -> Value {
    json!({
        "incidentId": format!("top-{}", id),
        "incidentDetails": {
            "id": id,
            "criticality": criticality,
            "type": kind,
            "description": {"value": format!("Incident {}", id)},
            "startTime": chrono::Utc::now().to_rfc3339()
        },
        "location": {
            "length": 0.4,
            "shape": {"links": [{"points": [{"lat": 37.8, "lng": -122.4}]}]}
        }
    })
}

pub fn results_document(results: Vec<Value>) -> Value {
    json!({ "results": results })
}

pub fn memory_cache() -> Arc<IncidentCache> {
    Arc::new(IncidentCache::new(Arc::new(MemoryCache::new())))
}

/// State with a fake upstream, in-memory cache and store
pub fn test_state(
    upstream: Option<Arc<FakeTrafficApi>>,
    store: Arc<dyn IncidentStore>,
    default_bbox: Option<&str>,
) -> AppState {
    AppState::new(
        upstream.map(|u| u as Arc<dyn TrafficApi>),
        memory_cache(),
        store,
        default_bbox.map(str::to_string),
    )
}

/// Wait for fire-and-forget saves to land in a memory store
pub async fn wait_for_records(store: &MemoryStore, expected: usize) -> usize {
    for _ in 0..50 {
        let n = store.len().await;
        if n >= expected {
            return n;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    store.len().await
}
