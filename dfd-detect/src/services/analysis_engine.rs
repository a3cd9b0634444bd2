//! Analysis engine boundary
//!
//! The orchestrator treats the engine as an opaque asynchronous capability:
//! a request goes in, a result or a typed failure eventually comes out. No
//! latency, ordering or retry behavior is assumed.
//!
//! # Implementations
//!
//! - [`RemoteAnalysisEngine`]: HTTP detection backend
//! - [`DeterministicEngine`]: digest-derived results for tests and offline use

use crate::models::{AnalysisRequest, AnalysisResult, DetectionError};
use crate::services::{DeterministicEngine, RemoteAnalysisEngine};
use std::sync::Arc;
use std::time::Duration;

/// Default remote engine request timeout
pub const DEFAULT_ENGINE_TIMEOUT_SECS: u64 = 30;

/// Deepfake analysis engine
///
/// Implementors must be thread-safe; the orchestrator calls them from
/// spawned tasks.
///
/// # Errors
/// `Network` for transport failures, `AnalysisEngine` for backend
/// failures, `UnsupportedMedia` when the engine refuses the payload type.
#[async_trait::async_trait]
pub trait AnalysisEngine: Send + Sync {
    /// Engine name for logging
    fn name(&self) -> &'static str;

    /// Analyze one request
    async fn analyze(&self, request: AnalysisRequest) -> Result<AnalysisResult, DetectionError>;
}

/// Engine implementations selectable from configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineKind {
    Remote,
    Deterministic,
}

impl std::str::FromStr for EngineKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "remote" => Ok(EngineKind::Remote),
            "deterministic" => Ok(EngineKind::Deterministic),
            other => Err(format!(
                "Unknown engine kind '{}', expected 'remote' or 'deterministic'",
                other
            )),
        }
    }
}

impl std::fmt::Display for EngineKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EngineKind::Remote => write!(f, "remote"),
            EngineKind::Deterministic => write!(f, "deterministic"),
        }
    }
}

/// Engine settings resolved from configuration
#[derive(Debug, Clone, PartialEq)]
pub struct EngineSettings {
    pub kind: EngineKind,
    /// Required for the remote engine
    pub endpoint: Option<String>,
    pub api_key: Option<String>,
    pub timeout: Duration,
    /// Delay added by the deterministic engine
    pub simulated_latency: Duration,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            kind: EngineKind::Deterministic,
            endpoint: None,
            api_key: None,
            timeout: Duration::from_secs(DEFAULT_ENGINE_TIMEOUT_SECS),
            simulated_latency: Duration::ZERO,
        }
    }
}

/// Create the configured engine
///
/// # Errors
/// Returns `InvalidInput` when the remote engine has no usable endpoint.
pub fn create_engine(settings: &EngineSettings) -> Result<Arc<dyn AnalysisEngine>, DetectionError> {
    match settings.kind {
        EngineKind::Remote => {
            let endpoint = settings
                .endpoint
                .as_deref()
                .filter(|e| !e.trim().is_empty())
                .ok_or_else(|| {
                    DetectionError::InvalidInput(
                        "Remote engine selected but no endpoint configured".to_string(),
                    )
                })?;
            let engine =
                RemoteAnalysisEngine::new(endpoint, settings.api_key.clone(), settings.timeout)?;
            tracing::info!(endpoint = %endpoint, "Remote analysis engine initialized");
            Ok(Arc::new(engine))
        }
        EngineKind::Deterministic => {
            tracing::info!(
                latency_ms = settings.simulated_latency.as_millis() as u64,
                "Deterministic analysis engine initialized"
            );
            Ok(Arc::new(DeterministicEngine::new(settings.simulated_latency)))
        }
    }
}
