//! Health check endpoint

use axum::{extract::State, routing::get, Json, Router};
use chrono::Utc;
use dfd_common::events::WorkflowPhase;
use serde::{Deserialize, Serialize};

use crate::AppState;

/// Health check response
#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    /// Service status ("ok")
    pub status: String,
    /// Module name ("dfd-detect")
    pub module: String,
    /// Crate version from Cargo.toml
    pub version: String,
    /// Seconds since service started
    pub uptime_seconds: u64,
    /// Active analysis engine
    pub engine: String,
    pub workflow_phase: WorkflowPhase,
    /// Connected SSE clients and other event subscribers
    pub event_subscribers: usize,
    /// Last analysis failure, if any
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_error: Option<String>,
}

/// GET /health
pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    let uptime = Utc::now().signed_duration_since(state.startup_time);
    let uptime_seconds = uptime.num_seconds().max(0) as u64;

    let last_error = state.last_error.read().await.clone();

    Json(HealthResponse {
        status: "ok".to_string(),
        module: "dfd-detect".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_seconds,
        engine: state.orchestrator.engine_name().to_string(),
        workflow_phase: state.orchestrator.state().await.phase(),
        event_subscribers: state.event_bus.subscriber_count(),
        last_error,
    })
}

/// Build health check routes
pub fn health_routes() -> Router<AppState> {
    Router::new().route("/health", get(health_check))
}
