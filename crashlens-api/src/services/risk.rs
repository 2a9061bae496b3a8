//! Placeholder location risk assessment
//!
//! The score is a linear function of nearby incident count, capped at 100.
//! There is no model behind it.

use chrono::Utc;
use crashlens_common::{Bbox, Incident};
use serde::{Deserialize, Serialize};

fn default_radius() -> u32 {
    5000
}

#[derive(Debug, Clone, Deserialize)]
pub struct RiskRequest {
    pub latitude: f64,
    pub longitude: f64,
    /// Metres
    #[serde(default = "default_radius")]
    pub radius: u32,
}

impl RiskRequest {
    pub fn validate(&self) -> Result<(), String> {
        if !(-90.0..=90.0).contains(&self.latitude) {
            return Err(format!("latitude {} out of range", self.latitude));
        }
        if !(-180.0..=180.0).contains(&self.longitude) {
            return Err(format!("longitude {} out of range", self.longitude));
        }
        if self.radius == 0 {
            return Err("radius must be positive".to_string());
        }
        Ok(())
    }

    pub fn bbox(&self) -> Bbox {
        Bbox::around(self.latitude, self.longitude, f64::from(self.radius))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskLevel {
    Low,
    Moderate,
    High,
}

impl RiskLevel {
    pub fn from_score(score: u32) -> Self {
        match score {
            0..=29 => RiskLevel::Low,
            30..=69 => RiskLevel::Moderate,
            _ => RiskLevel::High,
        }
    }
}

/// 10 points per incident, capped at 100
pub fn risk_score(incident_count: usize) -> u32 {
    incident_count.saturating_mul(10).min(100) as u32
}

#[derive(Debug, Clone, Serialize)]
pub struct RiskLocation {
    pub latitude: f64,
    pub longitude: f64,
    pub radius: u32,
}

#[derive(Debug, Clone, Serialize)]
pub struct RiskReport {
    pub location: RiskLocation,
    pub risk_score: u32,
    pub risk_level: RiskLevel,
    pub incident_count: usize,
    pub incidents: Vec<Incident>,
    pub analysis_time: String,
}

impl RiskReport {
    pub fn assess(request: &RiskRequest, incidents: Vec<Incident>) -> Self {
        let risk_score = risk_score(incidents.len());
        Self {
            location: RiskLocation {
                latitude: request.latitude,
                longitude: request.longitude,
                radius: request.radius,
            },
            risk_score,
            risk_level: RiskLevel::from_score(risk_score),
            incident_count: incidents.len(),
            incidents,
            analysis_time: Utc::now().to_rfc3339(),
        }
    }
}
