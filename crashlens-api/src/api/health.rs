//! Service banner and health check endpoints

use axum::{extract::State, routing::get, Json, Router};
use chrono::Utc;
use serde::Serialize;

use crate::AppState;

/// GET / response
#[derive(Debug, Serialize)]
pub struct ServiceBanner {
    pub service: String,
    pub status: String,
    pub version: String,
    pub timestamp: String,
}

/// Per-collaborator status reported by `/health`
#[derive(Debug, Serialize)]
pub struct HealthChecks {
    pub api: &'static str,
    /// "ok" or "missing_key"
    pub here_api: &'static str,
    /// "ok" or "not_configured"
    pub storage: &'static str,
    /// "ok" or "disabled"; flips to "disabled" after the first cache fault
    pub cache: &'static str,
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub module: String,
    pub version: String,
    pub uptime_seconds: u64,
    pub checks: HealthChecks,
}

/// GET /api/buildinfo response, filled in by the build script
#[derive(Debug, Serialize)]
pub struct BuildInfo {
    pub version: &'static str,
    pub git_hash: &'static str,
    pub build_timestamp: &'static str,
    pub build_profile: &'static str,
}

/// GET /
pub async fn service_banner() -> Json<ServiceBanner> {
    Json(ServiceBanner {
        service: "CrashLens API".to_string(),
        status: "operational".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        timestamp: Utc::now().to_rfc3339(),
    })
}

/// GET /health
pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    let uptime = Utc::now().signed_duration_since(state.startup_time);

    let checks = HealthChecks {
        api: "ok",
        here_api: if state.incidents.upstream().is_ok() {
            "ok"
        } else {
            "missing_key"
        },
        storage: if state.store.is_configured() {
            "ok"
        } else {
            "not_configured"
        },
        cache: if state.incidents.cache().is_enabled() {
            "ok"
        } else {
            "disabled"
        },
    };

    Json(HealthResponse {
        status: "healthy".to_string(),
        module: "crashlens-api".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_seconds: uptime.num_seconds().max(0) as u64,
        checks,
    })
}

/// GET /api/buildinfo
pub async fn build_info() -> Json<BuildInfo> {
    Json(BuildInfo {
        version: env!("CARGO_PKG_VERSION"),
        git_hash: env!("GIT_HASH"),
        build_timestamp: env!("BUILD_TIMESTAMP"),
        build_profile: env!("BUILD_PROFILE"),
    })
}

/// Build health check routes
pub fn health_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(service_banner))
        .route("/health", get(health_check))
        .route("/api/buildinfo", get(build_info))
}
