//! Location risk analysis endpoint

use axum::{extract::State, routing::post, Json, Router};

use crate::services::{RiskReport, RiskRequest};
use crate::{ApiError, ApiResult, AppState};

/// POST /api/risk-analysis
///
/// Lists incidents inside a box around the point and scores them.
pub async fn analyze_risk(
    State(state): State<AppState>,
    Json(request): Json<RiskRequest>,
) -> ApiResult<Json<RiskReport>> {
    request.validate().map_err(ApiError::BadRequest)?;

    let bbox = request.bbox();
    let incidents = state.incidents.list_incidents(bbox.as_str(), None).await?;

    tracing::info!(
        latitude = request.latitude,
        longitude = request.longitude,
        radius = request.radius,
        incidents = incidents.len(),
        "Risk analysis computed"
    );

    Ok(Json(RiskReport::assess(&request, incidents)))
}

pub fn risk_routes() -> Router<AppState> {
    Router::new().route("/api/risk-analysis", post(analyze_risk))
}
