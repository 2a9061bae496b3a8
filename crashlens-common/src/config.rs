//! Configuration file loading
//!
//! Settings are resolved in priority order by the service binary:
//! 1. Command-line argument (highest priority)
//! 2. Environment variable
//! 3. TOML config file
//! 4. Compiled default (fallback)
//!
//! This module owns tier 3. A missing or unreadable config file never stops
//! startup; it is logged and treated as empty.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use crate::{Error, Result};

/// Logging section of the TOML config
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Default tracing filter directive (e.g. "info", "crashlens_api=debug")
    pub level: Option<String>,
}

/// Contents of `config.toml`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TomlConfig {
    pub here_api_key: Option<String>,
    pub here_api_base: Option<String>,
    pub redis_url: Option<String>,
    pub storage_type: Option<String>,
    pub storage_url: Option<String>,
    pub storage_key: Option<String>,
    pub allowed_origins: Option<Vec<String>>,
    pub host: Option<String>,
    pub port: Option<u16>,
    pub default_bbox: Option<String>,
    pub logging: LoggingConfig,
}

/// Parse a TOML config file
pub fn load_toml_config(path: &Path) -> Result<TomlConfig> {
    let content = std::fs::read_to_string(path)?;
    toml::from_str(&content)
        .map_err(|e| Error::Config(format!("Parse TOML failed ({}): {}", path.display(), e)))
}

/// Load the config file if one can be found, else defaults
///
/// An explicit path that fails to load is reported with a warning; the
/// service still starts with an empty TOML tier.
pub fn load_or_default(explicit: Option<&Path>) -> TomlConfig {
    let path = match explicit {
        Some(p) => p.to_path_buf(),
        None => match default_config_path() {
            Some(p) => p,
            None => return TomlConfig::default(),
        },
    };

    match load_toml_config(&path) {
        Ok(config) => {
            info!("Loaded config file: {}", path.display());
            config
        }
        Err(e) => {
            warn!("Config file not used, falling back to defaults: {}", e);
            TomlConfig::default()
        }
    }
}

/// Locate the default config file for the platform
///
/// Checks `<config_dir>/crashlens/config.toml`, then `/etc/crashlens/config.toml`
/// on Linux. Returns `None` when neither exists.
pub fn default_config_path() -> Option<PathBuf> {
    let user_config = dirs::config_dir().map(|d| d.join("crashlens").join("config.toml"));
    if let Some(path) = user_config {
        if path.exists() {
            return Some(path);
        }
    }

    if cfg!(target_os = "linux") {
        let system_config = PathBuf::from("/etc/crashlens/config.toml");
        if system_config.exists() {
            return Some(system_config);
        }
    }

    None
}

/// Validate API key (non-empty, non-whitespace)
pub fn is_valid_key(key: &str) -> bool {
    !key.trim().is_empty()
}
