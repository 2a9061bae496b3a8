//! Incident listing pipeline tests
//!
//! Covers cache hits/misses, fail-open cache behaviour, batch normalization
//! with malformed records, background persistence and precondition errors.

mod helpers;

use crashlens_api::services::incident_source::cache_key;
use crashlens_api::services::{
    CacheBackend, IncidentCache, IncidentSource, MemoryCache, MemoryStore, NullStore, SourceError,
};
use crashlens_common::Bbox;
use helpers::*;
use serde_json::json;
use std::sync::Arc;

fn source(
    upstream: &Arc<FakeTrafficApi>,
    cache: Arc<IncidentCache>,
    store: Arc<dyn crashlens_api::services::IncidentStore>,
) -> IncidentSource {
    IncidentSource::new(
        Some(upstream.clone() as Arc<dyn crashlens_api::services::TrafficApi>),
        cache,
        store,
    )
}

#[tokio::test]
async fn test_example_record_normalizes() {
    let upstream = FakeTrafficApi::with_document(results_document(vec![json!({
        "incidentDetails": {"criticality": "Major"},
        "location": {"shape": {"links": [{"points": [{"lat": 37.8, "lng": -122.4}]}]}}
    })]));
    let source = source(&upstream, memory_cache(), Arc::new(NullStore));

    let incidents = source.list_incidents(TEST_BBOX, None).await.unwrap();

    assert_eq!(incidents.len(), 1);
    assert_eq!(incidents[0].criticality, "major");
    assert_eq!(incidents[0].severity, 2);
    assert_eq!(incidents[0].latitude, 37.8);
    assert_eq!(incidents[0].longitude, -122.4);
}

#[tokio::test]
async fn test_cached_listing_is_identical_and_skips_upstream() {
    let upstream = FakeTrafficApi::with_document(results_document(vec![
        raw_incident("a", "critical", "accident"),
        raw_incident("b", "minor", "construction"),
    ]));
    let source = source(&upstream, memory_cache(), Arc::new(NullStore));

    let first = source.list_incidents(TEST_BBOX, Some("major")).await.unwrap();
    let second = source.list_incidents(TEST_BBOX, Some("major")).await.unwrap();

    assert_eq!(upstream.incident_calls(), 1);
    assert_eq!(
        serde_json::to_vec(&first).unwrap(),
        serde_json::to_vec(&second).unwrap()
    );
}

#[tokio::test]
async fn test_cache_key_includes_criticality() {
    let upstream = FakeTrafficApi::with_document(results_document(vec![raw_incident(
        "a", "major", "accident",
    )]));
    let source = source(&upstream, memory_cache(), Arc::new(NullStore));

    source.list_incidents(TEST_BBOX, None).await.unwrap();
    source.list_incidents(TEST_BBOX, Some("major")).await.unwrap();

    assert_eq!(upstream.incident_calls(), 2);
    assert_eq!(
        upstream.last_criticality.lock().unwrap().as_deref(),
        Some("major")
    );
}

#[tokio::test]
async fn test_empty_criticality_treated_as_absent() {
    let upstream = FakeTrafficApi::with_document(results_document(vec![]));
    let source = source(&upstream, memory_cache(), Arc::new(NullStore));

    source.list_incidents(TEST_BBOX, Some("")).await.unwrap();
    source.list_incidents(TEST_BBOX, None).await.unwrap();

    assert_eq!(upstream.incident_calls(), 1);
    assert_eq!(*upstream.last_criticality.lock().unwrap(), None);
}

#[tokio::test]
async fn test_broken_cache_disables_and_keeps_serving() {
    let upstream = FakeTrafficApi::with_document(results_document(vec![raw_incident(
        "a", "low", "accident",
    )]));
    let cache = Arc::new(IncidentCache::new(Arc::new(BrokenCache)));
    let source = source(&upstream, cache.clone(), Arc::new(NullStore));

    let first = source.list_incidents(TEST_BBOX, None).await.unwrap();
    assert!(!cache.is_enabled());

    let second = source.list_incidents(TEST_BBOX, None).await.unwrap();
    assert_eq!(first, second);
    assert_eq!(upstream.incident_calls(), 2);
}

#[tokio::test]
async fn test_malformed_record_is_skipped() {
    let upstream = FakeTrafficApi::with_document(results_document(vec![
        raw_incident("a", "major", "accident"),
        json!({"incidentId": "broken", "incidentDetails": {"startTime": 1714550400}}),
        raw_incident("b", "minor", "congestion"),
        raw_incident("c", "critical", "accident"),
    ]));
    let store = Arc::new(MemoryStore::new());
    let source = source(&upstream, memory_cache(), store.clone());

    let incidents = source.list_incidents(TEST_BBOX, None).await.unwrap();
    let ids: Vec<&str> = incidents.iter().map(|i| i.id.as_str()).collect();
    assert_eq!(ids, vec!["a", "b", "c"]);

    assert_eq!(wait_for_records(&store, 3).await, 3);
}

#[tokio::test]
async fn test_cache_hit_does_not_persist_again() {
    let upstream = FakeTrafficApi::with_document(results_document(vec![raw_incident(
        "a", "major", "accident",
    )]));
    let store = Arc::new(MemoryStore::new());
    let source = source(&upstream, memory_cache(), store.clone());

    source.list_incidents(TEST_BBOX, None).await.unwrap();
    assert_eq!(wait_for_records(&store, 1).await, 1);

    source.list_incidents(TEST_BBOX, None).await.unwrap();
    tokio::time::sleep(std::time::Duration::from_millis(50)).await;
    assert_eq!(store.len().await, 1);
}

#[tokio::test]
async fn test_failing_store_does_not_affect_listing() {
    let upstream = FakeTrafficApi::with_document(results_document(vec![
        raw_incident("a", "major", "accident"),
        raw_incident("b", "major", "accident"),
    ]));
    let store = FailingStore::new();
    let source = source(&upstream, memory_cache(), store.clone());

    let incidents = source.list_incidents(TEST_BBOX, None).await.unwrap();
    assert_eq!(incidents.len(), 2);
}

#[tokio::test]
async fn test_missing_results_yields_empty_list() {
    let upstream = FakeTrafficApi::with_document(json!({"status": "ok"}));
    let source = source(&upstream, memory_cache(), Arc::new(NullStore));

    assert!(source.list_incidents(TEST_BBOX, None).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_invalid_bbox_rejected_before_upstream() {
    let upstream = FakeTrafficApi::with_document(results_document(vec![]));
    let source = source(&upstream, memory_cache(), Arc::new(NullStore));

    let err = source.list_incidents("-122.5,37.7,-122.3", None).await.unwrap_err();
    assert!(matches!(err, SourceError::InvalidBbox(_)));
    assert_eq!(upstream.incident_calls(), 0);
}

#[tokio::test]
async fn test_missing_api_key_is_config_error() {
    let source = IncidentSource::new(None, memory_cache(), Arc::new(NullStore));

    let err = source.list_incidents(TEST_BBOX, None).await.unwrap_err();
    assert!(matches!(err, SourceError::MissingApiKey));
}

#[tokio::test]
async fn test_upstream_error_is_reported_and_not_cached() {
    let upstream = FakeTrafficApi::failing(401, Some("Unauthorized"));
    let source = source(&upstream, memory_cache(), Arc::new(NullStore));

    let err = source.list_incidents(TEST_BBOX, None).await.unwrap_err();
    match err {
        SourceError::Upstream(e) => assert_eq!(e.caller_message(), "Unauthorized"),
        other => panic!("expected upstream error, got {:?}", other),
    }

    source.list_incidents(TEST_BBOX, None).await.unwrap_err();
    assert_eq!(upstream.incident_calls(), 2);
}

#[tokio::test]
async fn test_empty_cached_value_is_a_miss() {
    let upstream = FakeTrafficApi::with_document(results_document(vec![raw_incident(
        "a", "major", "accident",
    )]));
    let backend = Arc::new(MemoryCache::new());
    let key = cache_key(&Bbox::parse(TEST_BBOX).unwrap(), None);
    backend.set_with_expiry(&key, 300, b"").await.unwrap();

    let cache = Arc::new(IncidentCache::new(backend));
    let source = source(&upstream, cache.clone(), Arc::new(NullStore));

    let first = source.list_incidents(TEST_BBOX, None).await.unwrap();
    assert_eq!(first.len(), 1);
    assert!(cache.is_enabled());

    // Refilled by the first listing
    let second = source.list_incidents(TEST_BBOX, None).await.unwrap();
    assert_eq!(first, second);
    assert_eq!(upstream.incident_calls(), 1);
}
