//! crashlens-api library
//!
//! Traffic incident listing, analytics and risk endpoints backed by the HERE
//! Traffic API, a fail-open Redis cache and best-effort persistence.

pub mod api;
pub mod config;
pub mod error;
pub mod services;

pub use crate::error::{ApiError, ApiResult};

use axum::http::HeaderValue;
use axum::Router;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use crate::config::ServiceConfig;
use crate::services::{
    AnalyticsService, HereClient, IncidentCache, IncidentSource, IncidentStore, MemoryStore,
    NullStore, StorageKind, SupabaseStore, TrafficApi,
};

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    /// Incident listing pipeline
    pub incidents: Arc<IncidentSource>,
    /// Analytics summary with storage/live fallback
    pub analytics: Arc<AnalyticsService>,
    /// Persistence backend (also reported by `/health`)
    pub store: Arc<dyn IncidentStore>,
    /// Service startup timestamp
    pub startup_time: DateTime<Utc>,
}

impl AppState {
    /// Wire services from explicit collaborators
    pub fn new(
        upstream: Option<Arc<dyn TrafficApi>>,
        cache: Arc<IncidentCache>,
        store: Arc<dyn IncidentStore>,
        default_bbox: Option<String>,
    ) -> Self {
        let incidents = Arc::new(IncidentSource::new(upstream, cache, Arc::clone(&store)));
        let analytics = Arc::new(AnalyticsService::new(
            Arc::clone(&store),
            Arc::clone(&incidents),
            default_bbox,
        ));

        Self {
            incidents,
            analytics,
            store,
            startup_time: Utc::now(),
        }
    }

    /// Build collaborators from resolved configuration
    ///
    /// Missing or unreachable optional collaborators degrade (no cache, null
    /// store) instead of failing startup.
    pub async fn from_config(config: &ServiceConfig) -> anyhow::Result<Self> {
        let upstream: Option<Arc<dyn TrafficApi>> = match &config.here_api_key {
            Some(key) => Some(Arc::new(HereClient::new(
                key.clone(),
                config.here_api_base.clone(),
            )?)),
            None => None,
        };

        let cache = Arc::new(IncidentCache::from_redis_url(config.redis_url.as_deref()).await);
        let store = build_store(config)?;

        Ok(Self::new(upstream, cache, store, config.default_bbox.clone()))
    }
}

fn build_store(config: &ServiceConfig) -> anyhow::Result<Arc<dyn IncidentStore>> {
    let store: Arc<dyn IncidentStore> = match config.storage_kind {
        StorageKind::Supabase => match (&config.storage_url, &config.storage_key) {
            (Some(url), Some(key)) => {
                info!("Persistence: Supabase at {}", url);
                Arc::new(SupabaseStore::new(url.clone(), key.clone())?)
            }
            _ => {
                warn!("STORAGE_URL/STORAGE_KEY not set; incidents will not be persisted");
                Arc::new(NullStore)
            }
        },
        StorageKind::Memory => {
            info!("Persistence: in-memory store");
            Arc::new(MemoryStore::new())
        }
        StorageKind::None => {
            info!("Persistence disabled");
            Arc::new(NullStore)
        }
    };
    Ok(store)
}

/// CORS layer for the configured origins (`*` allows any)
pub fn cors_layer(allowed_origins: &[String]) -> CorsLayer {
    let base = CorsLayer::new().allow_methods(Any).allow_headers(Any);

    if allowed_origins.iter().any(|o| o == "*") {
        return base.allow_origin(Any);
    }

    let origins: Vec<HeaderValue> = allowed_origins
        .iter()
        .filter_map(|o| match HeaderValue::from_str(o) {
            Ok(v) => Some(v),
            Err(_) => {
                warn!("Ignoring invalid CORS origin: {}", o);
                None
            }
        })
        .collect();

    base.allow_origin(AllowOrigin::list(origins))
}

/// Build application router
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .merge(api::health_routes())
        .merge(api::incident_routes())
        .merge(api::analytics_routes())
        .merge(api::flow_routes())
        .merge(api::risk_routes())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
