//! dfd-detect library interface
//!
//! Exposes the detection workflow, its collaborators and the HTTP router
//! for integration testing.

pub mod api;
pub mod config;
pub mod error;
pub mod models;
pub mod services;

pub use crate::error::{ApiError, ApiResult};

use axum::Router;
use chrono::{DateTime, Utc};
use dfd_common::events::{DetectionEvent, EventBus};
use services::WorkflowOrchestrator;
use std::sync::Arc;
use tokio::sync::RwLock;
use tower_http::trace::TraceLayer;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub orchestrator: WorkflowOrchestrator,
    /// Event bus for SSE broadcasting
    pub event_bus: EventBus,
    /// Service startup timestamp for uptime tracking
    pub startup_time: DateTime<Utc>,
    /// Last analysis failure, for diagnostics
    pub last_error: Arc<RwLock<Option<String>>>,
}

impl AppState {
    pub fn new(orchestrator: WorkflowOrchestrator, event_bus: EventBus) -> Self {
        Self {
            orchestrator,
            event_bus,
            startup_time: Utc::now(),
            last_error: Arc::new(RwLock::new(None)),
        }
    }

    /// Keep `last_error` current from AnalysisFailed events
    ///
    /// Runs until the event bus closes.
    pub fn spawn_error_tracker(&self) -> tokio::task::JoinHandle<()> {
        let mut rx = self.event_bus.subscribe();
        let last_error = Arc::clone(&self.last_error);
        tokio::spawn(async move {
            loop {
                match rx.recv().await {
                    Ok(DetectionEvent::AnalysisFailed {
                        request_id,
                        message,
                        ..
                    }) => {
                        *last_error.write().await = Some(format!("{}: {}", request_id, message));
                    }
                    Ok(_) => {}
                    Err(tokio::sync::broadcast::error::RecvError::Lagged(skipped)) => {
                        tracing::warn!(skipped, "Error tracker lagged behind event bus");
                    }
                    Err(tokio::sync::broadcast::error::RecvError::Closed) => break,
                }
            }
        })
    }
}

/// Build application router
pub fn build_router(state: AppState) -> Router {
    use axum::routing::get;

    let max_upload_bytes = state.orchestrator.settings().max_upload_bytes;

    Router::new()
        .merge(api::detection_routes(max_upload_bytes))
        .route("/events", get(api::event_stream))
        .merge(api::health_routes())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
