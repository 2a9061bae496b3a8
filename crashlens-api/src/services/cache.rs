//! Fail-open incident cache
//!
//! [`IncidentCache`] wraps an optional [`CacheBackend`] together with an
//! `enabled` flag. The first backend fault of any kind flips the flag off for
//! the rest of the process; later requests skip the cache instead of retrying
//! it. A request already past the flag check when this happens may still touch
//! the backend once more.

use async_trait::async_trait;
use redis::AsyncCommands;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use thiserror::Error;
use tokio::sync::Mutex;
use tracing::{info, warn};

/// Lifetime of a cached incident listing
pub const INCIDENT_CACHE_TTL_SECS: u64 = 300;

#[derive(Debug, Error)]
pub enum CacheError {
    #[error("Cache backend error: {0}")]
    Backend(String),
}

impl From<redis::RedisError> for CacheError {
    fn from(err: redis::RedisError) -> Self {
        CacheError::Backend(err.to_string())
    }
}

/// Key-value store with per-entry expiry
#[async_trait]
pub trait CacheBackend: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, CacheError>;

    async fn set_with_expiry(&self, key: &str, ttl_secs: u64, value: &[u8]) -> Result<(), CacheError>;
}

/// Redis-backed cache using a shared multiplexed connection
pub struct RedisCache {
    conn: redis::aio::MultiplexedConnection,
}

impl RedisCache {
    /// Connect and verify the server answers `PING`
    pub async fn connect(url: &str) -> Result<Self, CacheError> {
        let client = redis::Client::open(url)?;
        let mut conn = client.get_multiplexed_async_connection().await?;
        let _: String = redis::cmd("PING").query_async(&mut conn).await?;
        Ok(Self { conn })
    }
}

#[async_trait]
impl CacheBackend for RedisCache {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, CacheError> {
        let mut conn = self.conn.clone();
        let value: Option<Vec<u8>> = conn.get(key).await?;
        Ok(value)
    }

    async fn set_with_expiry(&self, key: &str, ttl_secs: u64, value: &[u8]) -> Result<(), CacheError> {
        let mut conn = self.conn.clone();
        let _: () = conn.set_ex(key, value, ttl_secs).await?;
        Ok(())
    }
}

/// In-process cache honouring expiry
#[derive(Default)]
pub struct MemoryCache {
    entries: Mutex<HashMap<String, (Vec<u8>, Instant)>>,
}

impl MemoryCache {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CacheBackend for MemoryCache {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, CacheError> {
        let now = Instant::now();
        let mut entries = self.entries.lock().await;
        entries.retain(|_, (_, expires_at)| *expires_at > now);
        Ok(entries.get(key).map(|(value, _)| value.clone()))
    }

    async fn set_with_expiry(&self, key: &str, ttl_secs: u64, value: &[u8]) -> Result<(), CacheError> {
        let expires_at = Instant::now() + Duration::from_secs(ttl_secs);
        self.entries
            .lock()
            .await
            .insert(key.to_string(), (value.to_vec(), expires_at));
        Ok(())
    }
}

/// Cache client owning the process-wide `enabled` state
pub struct IncidentCache {
    backend: Option<Arc<dyn CacheBackend>>,
    enabled: AtomicBool,
}

impl IncidentCache {
    pub fn new(backend: Arc<dyn CacheBackend>) -> Self {
        Self {
            backend: Some(backend),
            enabled: AtomicBool::new(true),
        }
    }

    /// Cache that is never consulted
    pub fn disabled() -> Self {
        Self {
            backend: None,
            enabled: AtomicBool::new(false),
        }
    }

    /// Connect to Redis if a URL is configured; any failure yields a disabled cache
    pub async fn from_redis_url(url: Option<&str>) -> Self {
        let Some(url) = url else {
            info!("REDIS_URL not set, incident cache disabled");
            return Self::disabled();
        };

        match RedisCache::connect(url).await {
            Ok(cache) => {
                info!("✓ Connected to Redis cache");
                Self::new(Arc::new(cache))
            }
            Err(e) => {
                warn!("Redis not reachable, disabling cache: {}", e);
                Self::disabled()
            }
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.backend.is_some() && self.enabled.load(Ordering::Relaxed)
    }

    /// Permanently turn the cache off for this process
    pub fn disable(&self, reason: &str) {
        if self.enabled.swap(false, Ordering::Relaxed) {
            warn!("Cache error, disabling cache: {}", reason);
        }
    }

    /// Read an entry; faults disable the cache and read as a miss
    pub async fn get(&self, key: &str) -> Option<Vec<u8>> {
        let backend = self.active_backend()?;
        match backend.get(key).await {
            Ok(value) => value,
            Err(e) => {
                self.disable(&e.to_string());
                None
            }
        }
    }

    /// Write an entry; faults disable the cache
    pub async fn set(&self, key: &str, ttl_secs: u64, value: &[u8]) {
        let Some(backend) = self.active_backend() else {
            return;
        };
        if let Err(e) = backend.set_with_expiry(key, ttl_secs, value).await {
            self.disable(&e.to_string());
        }
    }

    fn active_backend(&self) -> Option<&Arc<dyn CacheBackend>> {
        if self.enabled.load(Ordering::Relaxed) {
            self.backend.as_ref()
        } else {
            None
        }
    }
}
