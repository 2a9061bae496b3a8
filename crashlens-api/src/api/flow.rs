//! Traffic flow pass-through endpoint

use axum::{
    extract::{Query, State},
    routing::get,
    Json, Router,
};
use chrono::Utc;
use crashlens_common::Bbox;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{ApiError, ApiResult, AppState};

fn default_max_points() -> usize {
    100
}

#[derive(Debug, Deserialize)]
pub struct FlowQuery {
    pub bbox: Option<String>,
    #[serde(default = "default_max_points")]
    pub max_points: usize,
}

#[derive(Debug, Serialize)]
pub struct FlowResponse {
    pub timestamp: String,
    pub count: usize,
    pub results: Vec<Value>,
}

/// GET /api/traffic-flow?bbox=...[&max_points=100]
pub async fn traffic_flow(
    State(state): State<AppState>,
    Query(query): Query<FlowQuery>,
) -> ApiResult<Json<FlowResponse>> {
    let upstream = state.incidents.upstream()?;

    let bbox = query
        .bbox
        .ok_or_else(|| ApiError::BadRequest("Missing required parameter 'bbox'".to_string()))?;
    let bbox = Bbox::parse(&bbox)?;

    let document = upstream.flow(bbox.as_str()).await?;

    let results: Vec<Value> = document
        .get("results")
        .and_then(Value::as_array)
        .map(|results| results.iter().take(query.max_points).cloned().collect())
        .unwrap_or_default();

    Ok(Json(FlowResponse {
        timestamp: Utc::now().to_rfc3339(),
        count: results.len(),
        results,
    }))
}

pub fn flow_routes() -> Router<AppState> {
    Router::new().route("/api/traffic-flow", get(traffic_flow))
}
