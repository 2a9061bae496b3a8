//! Analytics summary endpoint

use axum::{
    extract::{Query, State},
    routing::get,
    Json, Router,
};
use serde::Deserialize;

use crate::services::AnalyticsSummary;
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct SummaryQuery {
    pub bbox: Option<String>,
}

/// GET /api/analytics/summary[?bbox=...]
///
/// Always 200; storage and upstream faults degrade to a zeroed summary.
pub async fn analytics_summary(
    State(state): State<AppState>,
    Query(query): Query<SummaryQuery>,
) -> Json<AnalyticsSummary> {
    Json(state.analytics.summary(query.bbox.as_deref()).await)
}

pub fn analytics_routes() -> Router<AppState> {
    Router::new().route("/api/analytics/summary", get(analytics_summary))
}
