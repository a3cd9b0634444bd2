//! dfd-detect - Deepfake Detection microservice
//!
//! Hosts the detection workflow behind a JSON + SSE API:
//! - submit an uploaded file, a remote URL or a live recording
//! - observe the workflow state and the analysis result
//! - reset at any time
//!
//! Default address: 127.0.0.1:5790

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use dfd_common::config::load_toml_config;
use dfd_common::events::EventBus;
use tokio::signal;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use dfd_detect::config::{CliOverrides, DetectConfig};
use dfd_detect::services::{create_engine, SilentRecorder, WorkflowOrchestrator};
use dfd_detect::AppState;

/// Command-line arguments for dfd-detect
#[derive(Parser, Debug)]
#[command(name = "dfd-detect")]
#[command(about = "Deepfake detection workflow microservice")]
#[command(version)]
struct Args {
    /// TOML config file (default: <config dir>/dfd/config.toml)
    #[arg(short, long, env = "DFD_CONFIG")]
    config: Option<PathBuf>,

    /// Address to bind
    #[arg(long, env = "DFD_HOST")]
    host: Option<String>,

    /// Port to listen on
    #[arg(short, long, env = "DFD_PORT")]
    port: Option<u16>,

    /// Analysis engine: "remote" or "deterministic"
    #[arg(long, env = "DFD_ENGINE")]
    engine: Option<String>,

    /// Remote engine endpoint URL
    #[arg(long, env = "DFD_ENGINE_ENDPOINT")]
    endpoint: Option<String>,

    /// Bearer token for the remote engine
    #[arg(long, env = "DFD_ENGINE_API_KEY", hide_env_values = true)]
    api_key: Option<String>,

    /// Remote engine request timeout in seconds
    #[arg(long, env = "DFD_ENGINE_TIMEOUT_SECS")]
    timeout_secs: Option<u64>,

    /// Artificial delay of the deterministic engine in milliseconds
    #[arg(long, env = "DFD_SIMULATED_LATENCY_MS")]
    simulated_latency_ms: Option<u64>,

    /// Length of a live recording in seconds
    #[arg(long, env = "DFD_RECORDING_SECONDS")]
    recording_seconds: Option<u64>,

    /// Analyze recordings as soon as capture finishes
    #[arg(long, env = "DFD_AUTO_ANALYZE_RECORDINGS")]
    auto_analyze_recordings: Option<bool>,

    /// Largest accepted upload in bytes
    #[arg(long, env = "DFD_MAX_UPLOAD_BYTES")]
    max_upload_bytes: Option<usize>,
}

impl Args {
    fn overrides(&self) -> CliOverrides {
        CliOverrides {
            host: self.host.clone(),
            port: self.port,
            engine: self.engine.clone(),
            endpoint: self.endpoint.clone(),
            api_key: self.api_key.clone(),
            timeout_secs: self.timeout_secs,
            simulated_latency_ms: self.simulated_latency_ms,
            recording_seconds: self.recording_seconds,
            auto_analyze_recordings: self.auto_analyze_recordings,
            max_upload_bytes: self.max_upload_bytes,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Config is read before tracing starts so the file can set the level
    let toml_config = load_toml_config(args.config.as_deref())
        .context("Failed to load configuration file")?;

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| toml_config.logging.filter_directive("dfd_detect").into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = DetectConfig::resolve(&args.overrides(), &toml_config)
        .context("Invalid configuration")?;

    info!("Starting dfd-detect (Deepfake Detection) microservice");
    info!("Version: {}", env!("CARGO_PKG_VERSION"));
    info!(
        engine = %config.engine.kind,
        recording_seconds = config.workflow.recording_duration.as_secs(),
        auto_analyze_recordings = config.workflow.auto_analyze_recordings,
        max_upload_bytes = config.workflow.max_upload_bytes,
        "Configuration resolved"
    );

    let engine = create_engine(&config.engine).context("Failed to initialize analysis engine")?;

    let event_bus = EventBus::new(config.event_capacity);
    info!("Event bus initialized (capacity {})", config.event_capacity);

    let orchestrator = WorkflowOrchestrator::new(
        engine,
        Arc::new(SilentRecorder::default()),
        event_bus.clone(),
        config.workflow.clone(),
    );

    let state = AppState::new(orchestrator, event_bus);
    state.spawn_error_tracker();

    let app = dfd_detect::build_router(state);

    let addr = config.bind_addr();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;
    info!("Listening on http://{}", addr);
    info!("Health check: http://{}/health", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Server shutdown complete");
    Ok(())
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, shutting down");
        },
        _ = terminate => {
            info!("Received terminate signal, shutting down");
        },
    }
}
