//! Configuration loading and config file discovery
//!
//! Settings resolve in this priority order:
//! 1. Command-line argument (highest priority)
//! 2. Environment variable
//! 3. TOML config file
//! 4. Compiled default (fallback)
//!
//! Tiers 1 and 2 are handled by each service's argument parser. This module
//! owns tier 3: locating and parsing the TOML file. A missing file is not an
//! error; the service starts with compiled defaults and logs a warning.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Directory name under the platform config dir
const CONFIG_DIR_NAME: &str = "dfd";

/// Config file name inside [`CONFIG_DIR_NAME`]
const CONFIG_FILE_NAME: &str = "config.toml";

/// Root of the TOML configuration file
///
/// Every section is optional so that partial files are accepted.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TomlConfig {
    pub logging: LoggingConfig,
    pub server: ServerSection,
    pub engine: EngineSection,
    pub workflow: WorkflowSection,
    pub events: EventsSection,
}

/// `[logging]` section
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Default level when RUST_LOG is not set ("trace" .. "error")
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

impl LoggingConfig {
    /// Build an EnvFilter directive for the given crate target
    ///
    /// Unknown levels fall back to "info".
    pub fn filter_directive(&self, target: &str) -> String {
        let level = match self.level.trim().to_ascii_lowercase().as_str() {
            l @ ("trace" | "debug" | "info" | "warn" | "error") => l.to_string(),
            other => {
                warn!("Unknown log level '{}', using info", other);
                "info".to_string()
            }
        };
        format!("{target}={level},tower_http={level}")
    }
}

/// `[server]` section
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerSection {
    pub host: Option<String>,
    pub port: Option<u16>,
}

/// `[engine]` section
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineSection {
    /// "remote" or "deterministic"
    pub kind: Option<String>,
    /// Analysis endpoint URL for the remote engine
    pub endpoint: Option<String>,
    /// Bearer token sent to the remote engine
    pub api_key: Option<String>,
    pub timeout_secs: Option<u64>,
    /// Artificial delay for the deterministic engine
    pub simulated_latency_ms: Option<u64>,
}

/// `[workflow]` section
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkflowSection {
    pub recording_seconds: Option<u64>,
    pub auto_analyze_recordings: Option<bool>,
    pub max_upload_bytes: Option<usize>,
}

/// `[events]` section
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EventsSection {
    /// Broadcast channel capacity
    pub capacity: Option<usize>,
}

/// Platform config file location (`~/.config/dfd/config.toml` on Linux)
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join(CONFIG_DIR_NAME).join(CONFIG_FILE_NAME))
}

/// Load TOML configuration
///
/// With an explicit path the file must exist. Without one, the platform
/// default location is tried and a missing file yields defaults.
pub fn load_toml_config(explicit_path: Option<&Path>) -> Result<TomlConfig> {
    let path = match explicit_path {
        Some(path) => {
            if !path.exists() {
                return Err(Error::Config(format!(
                    "Config file not found: {}",
                    path.display()
                )));
            }
            path.to_path_buf()
        }
        None => match default_config_path() {
            Some(path) if path.exists() => path,
            Some(path) => {
                warn!(
                    "No config file at {}, using compiled defaults",
                    path.display()
                );
                return Ok(TomlConfig::default());
            }
            None => {
                warn!("Could not determine config directory, using compiled defaults");
                return Ok(TomlConfig::default());
            }
        },
    };

    let content = std::fs::read_to_string(&path)?;
    let config = parse_toml_config(&content)?;
    info!("Loaded configuration from {}", path.display());
    Ok(config)
}

/// Parse TOML configuration text
pub fn parse_toml_config(content: &str) -> Result<TomlConfig> {
    Ok(toml::from_str(content)?)
}
