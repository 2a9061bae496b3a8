//! HERE Traffic API client
//!
//! Fetches raw incident and flow documents. Responses are returned as
//! untyped JSON; shaping them is the normalizer's job.

use async_trait::async_trait;
use serde_json::Value;
use std::time::Duration;
use thiserror::Error;

pub const DEFAULT_HERE_API_BASE: &str = "https://data.traffic.hereapi.com/v7";
const USER_AGENT: &str = concat!("CrashLens/", env!("CARGO_PKG_VERSION"));

/// Every upstream call is bounded by this timeout; there are no retries
pub const UPSTREAM_TIMEOUT: Duration = Duration::from_secs(10);

/// Upstream client errors
#[derive(Debug, Error)]
pub enum UpstreamError {
    #[error("Network error: {0}")]
    Network(String),

    /// Non-success HTTP status; `message` is the upstream's own text when
    /// the error payload carried one
    #[error("HTTP {status}: {}", .message.as_deref().unwrap_or("no error message"))]
    Status { status: u16, message: Option<String> },

    #[error("Parse error: {0}")]
    Parse(String),
}

impl UpstreamError {
    /// Message reported to API callers
    pub fn caller_message(&self) -> String {
        match self {
            UpstreamError::Status {
                message: Some(message),
                ..
            } => message.clone(),
            UpstreamError::Status {
                status,
                message: None,
            } => format!("upstream returned HTTP {}", status),
            other => other.to_string(),
        }
    }
}

/// Upstream traffic data source
#[async_trait]
pub trait TrafficApi: Send + Sync {
    /// Raw incidents document (`{"results": [...]}`) for a bbox
    async fn incidents(&self, bbox: &str, criticality: Option<&str>) -> Result<Value, UpstreamError>;

    /// Raw traffic flow document for a bbox
    async fn flow(&self, bbox: &str) -> Result<Value, UpstreamError>;
}

/// HERE Traffic v7 client
pub struct HereClient {
    http_client: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl HereClient {
    pub fn new(api_key: String, base_url: impl Into<String>) -> Result<Self, UpstreamError> {
        let http_client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(UPSTREAM_TIMEOUT)
            .build()
            .map_err(|e| UpstreamError::Network(e.to_string()))?;

        Ok(Self {
            http_client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key,
        })
    }

    async fn get_json(&self, endpoint: &str, params: &[(&str, String)]) -> Result<Value, UpstreamError> {
        let url = format!("{}/{}", self.base_url, endpoint);

        tracing::debug!(endpoint, "Querying HERE API");

        let response = self
            .http_client
            .get(&url)
            .query(&[("apiKey", self.api_key.as_str())])
            .query(params)
            .send()
            .await
            .map_err(|e| UpstreamError::Network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = extract_error_message(&body);
            tracing::warn!(
                endpoint,
                status = status.as_u16(),
                message = message.as_deref().unwrap_or(""),
                "HERE API request failed"
            );
            return Err(UpstreamError::Status {
                status: status.as_u16(),
                message,
            });
        }

        response
            .json::<Value>()
            .await
            .map_err(|e| UpstreamError::Parse(e.to_string()))
    }
}

#[async_trait]
impl TrafficApi for HereClient {
    async fn incidents(&self, bbox: &str, criticality: Option<&str>) -> Result<Value, UpstreamError> {
        let mut params = vec![
            ("in", format!("bbox:{}", bbox)),
            ("locationReferencing", "shape".to_string()),
        ];
        if let Some(criticality) = criticality {
            params.push(("criticality", criticality.to_string()));
        }

        let document = self.get_json("incidents", &params).await?;

        tracing::info!(
            results = document
                .get("results")
                .and_then(serde_json::Value::as_array)
                .map(Vec::len)
                .unwrap_or(0),
            "HERE incidents fetched"
        );

        Ok(document)
    }

    async fn flow(&self, bbox: &str) -> Result<Value, UpstreamError> {
        let params = [
            ("in", format!("bbox:{}", bbox)),
            ("locationReferencing", "shape".to_string()),
        ];
        self.get_json("flow", &params).await
    }
}

/// Pull a human-readable message out of an upstream error body
///
/// Looks at `title`, then `error_description`, then `message`.
pub fn extract_error_message(body: &str) -> Option<String> {
    let payload: Value = serde_json::from_str(body).ok()?;
    ["title", "error_description", "message"]
        .iter()
        .filter_map(|key| payload.get(*key).and_then(Value::as_str))
        .find(|msg| !msg.trim().is_empty())
        .map(str::to_string)
}
