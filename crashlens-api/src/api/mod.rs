//! HTTP API handlers for crashlens-api

pub mod analytics;
pub mod flow;
pub mod health;
pub mod incidents;
pub mod risk;

pub use analytics::analytics_routes;
pub use flow::flow_routes;
pub use health::health_routes;
pub use incidents::incident_routes;
pub use risk::risk_routes;
