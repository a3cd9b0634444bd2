//! Detection services
//!
//! Leaf-first: resolver, engines and recorder feed the workflow
//! orchestrator; the presenter projects its state for display.

pub mod analysis_engine;
pub mod deterministic_engine;
pub mod media_resolver;
pub mod recorder;
pub mod remote_engine;
pub mod results_presenter;
pub mod workflow_orchestrator;

pub use analysis_engine::{create_engine, AnalysisEngine, EngineKind, EngineSettings};
pub use deterministic_engine::DeterministicEngine;
pub use media_resolver::{MediaSourceResolver, DEFAULT_MAX_UPLOAD_BYTES};
pub use recorder::{RecordingDevice, SilentRecorder, DEFAULT_RECORDING_SECONDS};
pub use remote_engine::RemoteAnalysisEngine;
pub use results_presenter::{
    present, present_failure, present_state, FailureView, ResultView, SignalLevel, Verdict,
    WorkflowView,
};
pub use workflow_orchestrator::{
    WorkflowError, WorkflowOrchestrator, WorkflowSettings, TRANSITION_HISTORY_LIMIT,
};
