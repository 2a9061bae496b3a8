//! Incident listing endpoint

use axum::{
    extract::{Query, State},
    routing::get,
    Json, Router,
};
use crashlens_common::Incident;
use serde::Deserialize;

use crate::{ApiError, ApiResult, AppState};

#[derive(Debug, Deserialize)]
pub struct IncidentQuery {
    pub bbox: Option<String>,
    pub criticality: Option<String>,
}

/// GET /api/incidents?bbox=minLon,minLat,maxLon,maxLat[&criticality=major]
pub async fn list_incidents(
    State(state): State<AppState>,
    Query(query): Query<IncidentQuery>,
) -> ApiResult<Json<Vec<Incident>>> {
    // Configuration problems outrank a bad request
    state.incidents.upstream()?;

    let bbox = query
        .bbox
        .ok_or_else(|| ApiError::BadRequest("Missing required parameter 'bbox'".to_string()))?;

    let incidents = state
        .incidents
        .list_incidents(&bbox, query.criticality.as_deref())
        .await?;

    Ok(Json(incidents))
}

pub fn incident_routes() -> Router<AppState> {
    Router::new().route("/api/incidents", get(list_incidents))
}
