//! Business logic services

pub mod analytics;
pub mod cache;
pub mod here_client;
pub mod incident_source;
pub mod risk;
pub mod storage;

pub use analytics::{AnalyticsService, AnalyticsSummary, DataSource};
pub use cache::{CacheBackend, IncidentCache, MemoryCache, RedisCache};
pub use here_client::{HereClient, TrafficApi, UpstreamError};
pub use incident_source::{IncidentSource, SourceError};
pub use risk::{RiskReport, RiskRequest};
pub use storage::{IncidentStore, MemoryStore, NullStore, StorageFilter, StorageKind, SupabaseStore};
