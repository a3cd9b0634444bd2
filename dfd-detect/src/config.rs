//! Configuration resolution for dfd-detect
//!
//! Each setting resolves with CLI/ENV → TOML → compiled default priority.
//! The argument parser covers the first tier (every flag has an `env`
//! fallback), so values arrive here as [`CliOverrides`] and are merged with
//! the parsed [`TomlConfig`].

use crate::services::{
    EngineKind, EngineSettings, WorkflowSettings, DEFAULT_MAX_UPLOAD_BYTES,
    DEFAULT_RECORDING_SECONDS,
};
use crate::services::analysis_engine::DEFAULT_ENGINE_TIMEOUT_SECS;
use dfd_common::config::TomlConfig;
use dfd_common::{Error, Result};
use std::time::Duration;
use tracing::info;

pub const DEFAULT_HOST: &str = "127.0.0.1";
pub const DEFAULT_PORT: u16 = 5790;
pub const DEFAULT_EVENT_CAPACITY: usize = 100;

/// Values supplied on the command line or through `DFD_*` variables
#[derive(Debug, Clone, Default)]
pub struct CliOverrides {
    pub host: Option<String>,
    pub port: Option<u16>,
    pub engine: Option<String>,
    pub endpoint: Option<String>,
    pub api_key: Option<String>,
    pub timeout_secs: Option<u64>,
    pub simulated_latency_ms: Option<u64>,
    pub recording_seconds: Option<u64>,
    pub auto_analyze_recordings: Option<bool>,
    pub max_upload_bytes: Option<usize>,
}

/// Fully resolved service configuration
#[derive(Debug, Clone, PartialEq)]
pub struct DetectConfig {
    pub host: String,
    pub port: u16,
    pub engine: EngineSettings,
    pub workflow: WorkflowSettings,
    pub event_capacity: usize,
}

impl DetectConfig {
    /// Merge CLI overrides over TOML values over defaults
    ///
    /// # Errors
    /// `Config` for an unknown engine kind or a zero-sized setting.
    pub fn resolve(cli: &CliOverrides, toml: &TomlConfig) -> Result<Self> {
        let kind_text = pick("engine.kind", cli.engine.clone(), toml.engine.kind.clone());
        let kind = match kind_text {
            Some(text) => text.parse::<EngineKind>().map_err(Error::Config)?,
            None => EngineKind::Deterministic,
        };

        let engine = EngineSettings {
            kind,
            endpoint: pick("engine.endpoint", cli.endpoint.clone(), toml.engine.endpoint.clone()),
            api_key: cli
                .api_key
                .clone()
                .or_else(|| toml.engine.api_key.clone())
                .filter(|k| !k.trim().is_empty()),
            timeout: Duration::from_secs(
                pick("engine.timeout_secs", cli.timeout_secs, toml.engine.timeout_secs)
                    .unwrap_or(DEFAULT_ENGINE_TIMEOUT_SECS),
            ),
            simulated_latency: Duration::from_millis(
                pick(
                    "engine.simulated_latency_ms",
                    cli.simulated_latency_ms,
                    toml.engine.simulated_latency_ms,
                )
                .unwrap_or(0),
            ),
        };

        let recording_seconds = pick(
            "workflow.recording_seconds",
            cli.recording_seconds,
            toml.workflow.recording_seconds,
        )
        .unwrap_or(DEFAULT_RECORDING_SECONDS);
        if recording_seconds == 0 {
            return Err(Error::Config(
                "recording_seconds must be at least 1".to_string(),
            ));
        }

        let max_upload_bytes = pick(
            "workflow.max_upload_bytes",
            cli.max_upload_bytes,
            toml.workflow.max_upload_bytes,
        )
        .unwrap_or(DEFAULT_MAX_UPLOAD_BYTES);
        if max_upload_bytes == 0 {
            return Err(Error::Config("max_upload_bytes must be positive".to_string()));
        }

        let workflow = WorkflowSettings {
            recording_duration: Duration::from_secs(recording_seconds),
            auto_analyze_recordings: pick(
                "workflow.auto_analyze_recordings",
                cli.auto_analyze_recordings,
                toml.workflow.auto_analyze_recordings,
            )
            .unwrap_or(true),
            max_upload_bytes,
        };

        let event_capacity = toml.events.capacity.unwrap_or(DEFAULT_EVENT_CAPACITY);
        if event_capacity == 0 {
            return Err(Error::Config("events.capacity must be positive".to_string()));
        }

        Ok(Self {
            host: pick("server.host", cli.host.clone(), toml.server.host.clone())
                .unwrap_or_else(|| DEFAULT_HOST.to_string()),
            port: pick("server.port", cli.port, toml.server.port).unwrap_or(DEFAULT_PORT),
            engine,
            workflow,
            event_capacity,
        })
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// First tier that has a value wins
fn pick<T>(key: &str, cli: Option<T>, toml: Option<T>) -> Option<T> {
    match (cli, toml) {
        (Some(value), _) => {
            tracing::debug!(key, "Using command line / environment value");
            Some(value)
        }
        (None, Some(value)) => {
            info!(key, "Using value from TOML config");
            Some(value)
        }
        (None, None) => None,
    }
}
