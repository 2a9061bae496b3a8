//! Configuration resolution for crashlens-api
//!
//! **Priority:** CLI argument → environment variable → TOML config → compiled default
//!
//! clap handles the first two tiers (every flag has an `env` fallback); the
//! TOML tier comes from [`crashlens_common::config`].

use clap::Parser;
use crashlens_common::config::{is_valid_key, TomlConfig};
use crashlens_common::Result;
use std::path::PathBuf;
use tracing::{info, warn};

use crate::services::here_client::DEFAULT_HERE_API_BASE;
use crate::services::storage::StorageKind;

pub const DEFAULT_PORT: u16 = 8000;
pub const DEFAULT_HOST: &str = "0.0.0.0";

/// Command-line arguments (each also readable from the environment)
#[derive(Debug, Clone, Default, Parser)]
#[command(name = "crashlens-api", version, about = "Real-time traffic incident monitoring API")]
pub struct Args {
    /// Path to TOML config file
    #[arg(long, env = "CRASHLENS_CONFIG")]
    pub config: Option<PathBuf>,

    /// HERE Traffic API key
    #[arg(long, env = "HERE_API_KEY", hide_env_values = true)]
    pub here_api_key: Option<String>,

    /// HERE Traffic API base URL
    #[arg(long, env = "HERE_API_BASE")]
    pub here_api_base: Option<String>,

    /// Redis URL for the incident cache
    #[arg(long, env = "REDIS_URL")]
    pub redis_url: Option<String>,

    /// Persistence backend: supabase, memory or none
    #[arg(long, env = "STORAGE_TYPE")]
    pub storage_type: Option<String>,

    /// Storage service base URL
    #[arg(long, env = "STORAGE_URL")]
    pub storage_url: Option<String>,

    /// Storage service key
    #[arg(long, env = "STORAGE_KEY", hide_env_values = true)]
    pub storage_key: Option<String>,

    /// Comma-separated CORS origins ("*" for any)
    #[arg(long, env = "ALLOWED_ORIGINS")]
    pub allowed_origins: Option<String>,

    /// Bind host
    #[arg(long, env = "HOST")]
    pub host: Option<String>,

    /// Bind port
    #[arg(long, env = "PORT")]
    pub port: Option<u16>,

    /// Bbox used by the analytics live fallback when a request gives none
    #[arg(long, env = "DEFAULT_BBOX")]
    pub default_bbox: Option<String>,
}

/// Fully resolved service configuration
#[derive(Debug, Clone, PartialEq)]
pub struct ServiceConfig {
    pub here_api_key: Option<String>,
    pub here_api_base: String,
    pub redis_url: Option<String>,
    pub storage_kind: StorageKind,
    pub storage_url: Option<String>,
    pub storage_key: Option<String>,
    pub allowed_origins: Vec<String>,
    pub host: String,
    pub port: u16,
    pub default_bbox: Option<String>,
}

impl ServiceConfig {
    /// Merge CLI/ENV arguments over the TOML tier and compiled defaults
    pub fn resolve(args: Args, toml: TomlConfig) -> Result<Self> {
        let here_api_key = args
            .here_api_key
            .or(toml.here_api_key)
            .filter(|k| is_valid_key(k));
        if here_api_key.is_none() {
            warn!("HERE_API_KEY not configured; incident endpoints will report a configuration error");
        }

        let storage_kind: StorageKind = args
            .storage_type
            .or(toml.storage_type)
            .as_deref()
            .unwrap_or("supabase")
            .parse()?;

        let allowed_origins = match args.allowed_origins {
            Some(raw) => split_origins(&raw),
            None => toml.allowed_origins.unwrap_or_else(|| vec!["*".to_string()]),
        };

        let config = Self {
            here_api_key,
            here_api_base: args
                .here_api_base
                .or(toml.here_api_base)
                .unwrap_or_else(|| DEFAULT_HERE_API_BASE.to_string()),
            redis_url: non_empty(args.redis_url.or(toml.redis_url)),
            storage_kind,
            storage_url: non_empty(args.storage_url.or(toml.storage_url)),
            storage_key: non_empty(args.storage_key.or(toml.storage_key)),
            allowed_origins,
            host: args
                .host
                .or(toml.host)
                .unwrap_or_else(|| DEFAULT_HOST.to_string()),
            port: args.port.or(toml.port).unwrap_or(DEFAULT_PORT),
            default_bbox: non_empty(args.default_bbox.or(toml.default_bbox)),
        };

        info!(
            storage = ?config.storage_kind,
            cache = config.redis_url.is_some(),
            default_bbox = config.default_bbox.as_deref().unwrap_or("none"),
            "Configuration resolved"
        );

        Ok(config)
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn split_origins(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|o| !o.is_empty())
        .map(str::to_string)
        .collect()
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}
