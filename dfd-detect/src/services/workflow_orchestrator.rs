//! Detection workflow orchestrator
//!
//! Owns the single [`WorkflowState`] and drives it through input capture,
//! submission, analysis and result/error transitions.
//!
//! # Concurrency
//!
//! All state lives in one [`WorkflowSlot`] behind a `tokio::sync::Mutex`.
//! The engine call and the audio capture are the only suspension points;
//! each runs in a spawned task racing a [`CancellationToken`]. Every entry
//! into Analyzing or Recording bumps the slot generation, and so does
//! reset. A task's outcome is applied only if its generation is still
//! current, so a result that arrives after reset can never resurrect a
//! cleared workflow.

use crate::models::{
    AnalysisRequest, AnalysisResult, DetectionError, FileUpload, InputTab, MediaInput,
    RequestInfo, StateTransition, WorkflowState,
};
use crate::services::{
    AnalysisEngine, MediaSourceResolver, RecordingDevice, DEFAULT_MAX_UPLOAD_BYTES,
    DEFAULT_RECORDING_SECONDS,
};
use chrono::Utc;
use dfd_common::events::{DetectionEvent, EventBus, WorkflowPhase};
use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::{broadcast, Mutex};
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

/// Transition records kept for the audit log
pub const TRANSITION_HISTORY_LIMIT: usize = 64;

/// Workflow operation rejected
#[derive(Debug, Clone, PartialEq, Error)]
pub enum WorkflowError {
    /// An analysis is already running; the request was ignored
    #[error("Analysis {0} is already in progress")]
    AnalysisInFlight(Uuid),

    /// Operation not legal in the current phase
    #[error("Cannot {operation} while workflow is {phase}")]
    InvalidTransition {
        operation: &'static str,
        phase: WorkflowPhase,
    },

    /// Input refused by the resolver; state unchanged
    #[error(transparent)]
    Rejected(#[from] DetectionError),
}

/// Orchestrator tunables
#[derive(Debug, Clone, PartialEq)]
pub struct WorkflowSettings {
    pub recording_duration: Duration,
    /// Analyze captured audio immediately instead of returning to Idle
    pub auto_analyze_recordings: bool,
    pub max_upload_bytes: usize,
}

impl Default for WorkflowSettings {
    fn default() -> Self {
        Self {
            recording_duration: Duration::from_secs(DEFAULT_RECORDING_SECONDS),
            auto_analyze_recordings: true,
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
        }
    }
}

/// Mutable workflow data guarded by one lock
struct WorkflowSlot {
    state: WorkflowState,
    generation: u64,
    in_flight: Option<CancellationToken>,
    history: VecDeque<StateTransition>,
}

struct Inner {
    slot: Mutex<WorkflowSlot>,
    resolver: MediaSourceResolver,
    engine: Arc<dyn AnalysisEngine>,
    recorder: Arc<dyn RecordingDevice>,
    event_bus: EventBus,
    settings: WorkflowSettings,
}

/// Workflow orchestrator handle
///
/// Cheap to clone; all clones drive the same workflow.
#[derive(Clone)]
pub struct WorkflowOrchestrator {
    inner: Arc<Inner>,
}

impl WorkflowOrchestrator {
    pub fn new(
        engine: Arc<dyn AnalysisEngine>,
        recorder: Arc<dyn RecordingDevice>,
        event_bus: EventBus,
        settings: WorkflowSettings,
    ) -> Self {
        let resolver = MediaSourceResolver::new(settings.max_upload_bytes);
        Self {
            inner: Arc::new(Inner {
                slot: Mutex::new(WorkflowSlot {
                    state: WorkflowState::Idle,
                    generation: 0,
                    in_flight: None,
                    history: VecDeque::with_capacity(TRANSITION_HISTORY_LIMIT),
                }),
                resolver,
                engine,
                recorder,
                event_bus,
                settings,
            }),
        }
    }

    /// Snapshot of the current state
    pub async fn state(&self) -> WorkflowState {
        self.inner.slot.lock().await.state.clone()
    }

    /// Recorded transitions, oldest first
    pub async fn transitions(&self) -> Vec<StateTransition> {
        self.inner.slot.lock().await.history.iter().cloned().collect()
    }

    pub fn subscribe(&self) -> broadcast::Receiver<DetectionEvent> {
        self.inner.event_bus.subscribe()
    }

    pub fn settings(&self) -> &WorkflowSettings {
        &self.inner.settings
    }

    pub fn engine_name(&self) -> &'static str {
        self.inner.engine.name()
    }

    /// Open an input tab
    ///
    /// Switching tabs keeps the draft URL.
    pub async fn open_tab(&self, tab: InputTab) -> Result<WorkflowState, WorkflowError> {
        let mut slot = self.inner.slot.lock().await;
        let next = match &slot.state {
            WorkflowState::Idle => WorkflowState::Collecting {
                tab,
                draft_url: None,
            },
            WorkflowState::Collecting { draft_url, .. } => WorkflowState::Collecting {
                tab,
                draft_url: draft_url.clone(),
            },
            other => return Err(rejection(other, "open_tab")),
        };
        self.transition(&mut slot, next, "open_tab");
        Ok(slot.state.clone())
    }

    /// Store URL text as it is typed; validation happens on submit
    pub async fn set_draft_url(&self, text: &str) -> Result<WorkflowState, WorkflowError> {
        let mut slot = self.inner.slot.lock().await;
        if !slot.state.accepts_input() {
            return Err(rejection(&slot.state, "set_draft_url"));
        }
        let next = WorkflowState::Collecting {
            tab: InputTab::Url,
            draft_url: Some(text.to_string()),
        };
        self.transition(&mut slot, next, "set_draft_url");
        Ok(slot.state.clone())
    }

    /// Submit an uploaded file for analysis
    pub async fn submit_file(&self, upload: FileUpload) -> Result<RequestInfo, WorkflowError> {
        self.submit(MediaInput::File(upload), "submit_file").await
    }

    /// Submit a remote URL for analysis
    pub async fn submit_url(&self, url: &str) -> Result<RequestInfo, WorkflowError> {
        self.submit(MediaInput::Url(url.to_string()), "submit_url")
            .await
    }

    async fn submit(
        &self,
        input: MediaInput,
        operation: &'static str,
    ) -> Result<RequestInfo, WorkflowError> {
        let mut slot = self.inner.slot.lock().await;
        if !slot.state.accepts_input() {
            return Err(rejection(&slot.state, operation));
        }

        let source = self.inner.resolver.resolve(input).map_err(|e| {
            tracing::warn!(operation, error = %e, "Submission rejected");
            WorkflowError::Rejected(e)
        })?;

        Ok(self.begin_analysis(&mut slot, AnalysisRequest::new(source), operation))
    }

    /// Start a timed live capture
    pub async fn start_recording(&self) -> Result<WorkflowState, WorkflowError> {
        let mut slot = self.inner.slot.lock().await;
        if !slot.state.accepts_input() {
            return Err(rejection(&slot.state, "start_recording"));
        }

        let duration = self.inner.settings.recording_duration;
        let generation = self.next_generation(&mut slot);
        let token = CancellationToken::new();
        slot.in_flight = Some(token.clone());

        let next = WorkflowState::Recording {
            started_at: Utc::now(),
            duration_ms: duration.as_millis() as u64,
        };
        self.transition(&mut slot, next, "start_recording");
        self.inner.event_bus.emit_lossy(DetectionEvent::RecordingStarted {
            duration_ms: duration.as_millis() as u64,
            timestamp: Utc::now(),
        });
        tracing::info!(
            device = self.inner.recorder.name(),
            duration_ms = duration.as_millis() as u64,
            "Recording started"
        );

        let orchestrator = self.clone();
        tokio::spawn(async move {
            let outcome = tokio::select! {
                biased;
                _ = token.cancelled() => None,
                outcome = orchestrator.inner.recorder.record(duration) => Some(outcome),
            };
            match outcome {
                Some(outcome) => orchestrator.finish_recording(generation, outcome).await,
                None => tracing::debug!(generation, "Recording task cancelled"),
            }
        });

        Ok(slot.state.clone())
    }

    /// Return to Idle from any state
    ///
    /// Cancels in-flight work and clears draft, result and error. A no-op
    /// when already Idle.
    pub async fn reset(&self) -> WorkflowState {
        let mut slot = self.inner.slot.lock().await;
        if let Some(token) = slot.in_flight.take() {
            token.cancel();
        }
        slot.generation += 1;

        if matches!(slot.state, WorkflowState::Idle) {
            tracing::debug!("Reset while idle, nothing to do");
        } else {
            self.transition(&mut slot, WorkflowState::Idle, "reset");
        }
        WorkflowState::Idle
    }

    fn next_generation(&self, slot: &mut WorkflowSlot) -> u64 {
        slot.generation += 1;
        slot.generation
    }

    /// Enter Analyzing and hand the request to the engine
    fn begin_analysis(
        &self,
        slot: &mut WorkflowSlot,
        request: AnalysisRequest,
        trigger: &str,
    ) -> RequestInfo {
        let info = request.info();
        let generation = self.next_generation(slot);
        let token = CancellationToken::new();
        slot.in_flight = Some(token.clone());

        self.transition(
            slot,
            WorkflowState::Analyzing {
                request: info.clone(),
            },
            trigger,
        );
        self.inner.event_bus.emit_lossy(DetectionEvent::AnalysisStarted {
            request_id: info.request_id,
            source_type: info.source_type,
            label: info.label.clone(),
            timestamp: Utc::now(),
        });
        tracing::info!(
            request_id = %info.request_id,
            source_type = %info.source_type,
            engine = self.inner.engine.name(),
            "Analysis started"
        );

        let orchestrator = self.clone();
        let task_info = info.clone();
        tokio::spawn(async move {
            let outcome = tokio::select! {
                biased;
                _ = token.cancelled() => None,
                outcome = orchestrator.inner.engine.analyze(request) => Some(outcome),
            };
            match outcome {
                Some(outcome) => {
                    orchestrator
                        .finish_analysis(generation, task_info, outcome)
                        .await
                }
                None => tracing::debug!(
                    request_id = %task_info.request_id,
                    "Analysis task cancelled"
                ),
            }
        });

        info
    }

    async fn finish_analysis(
        &self,
        generation: u64,
        info: RequestInfo,
        outcome: Result<AnalysisResult, DetectionError>,
    ) {
        let mut slot = self.inner.slot.lock().await;
        let current = slot.generation == generation
            && slot
                .state
                .in_flight_request()
                .is_some_and(|r| r.request_id == info.request_id);
        if !current {
            tracing::info!(
                request_id = %info.request_id,
                generation,
                current_generation = slot.generation,
                "Discarding stale analysis outcome"
            );
            self.inner
                .event_bus
                .emit_lossy(DetectionEvent::StaleOutcomeDiscarded {
                    request_id: Some(info.request_id),
                    timestamp: Utc::now(),
                });
            return;
        }
        slot.in_flight = None;

        match outcome.and_then(|result| shape_result(&info, result)) {
            Ok(result) => {
                tracing::info!(
                    request_id = %info.request_id,
                    is_deepfake = result.is_deepfake,
                    confidence = result.confidence,
                    "Analysis completed"
                );
                self.inner
                    .event_bus
                    .emit_lossy(DetectionEvent::AnalysisCompleted {
                        request_id: info.request_id,
                        is_deepfake: result.is_deepfake,
                        confidence: result.confidence,
                        timestamp: Utc::now(),
                    });
                self.transition(&mut slot, WorkflowState::Completed { result }, "analysis_completed");
            }
            Err(error) => {
                tracing::error!(
                    request_id = %info.request_id,
                    error = %error,
                    "Analysis failed"
                );
                self.inner.event_bus.emit_lossy(DetectionEvent::AnalysisFailed {
                    request_id: info.request_id,
                    failure: error.kind(),
                    message: error.message().to_string(),
                    timestamp: Utc::now(),
                });
                self.transition(&mut slot, WorkflowState::Failed { error }, "analysis_failed");
            }
        }
    }

    async fn finish_recording(&self, generation: u64, outcome: Result<Vec<u8>, DetectionError>) {
        let mut slot = self.inner.slot.lock().await;
        if slot.generation != generation || !matches!(slot.state, WorkflowState::Recording { .. })
        {
            tracing::info!(generation, "Discarding stale recording outcome");
            self.inner
                .event_bus
                .emit_lossy(DetectionEvent::StaleOutcomeDiscarded {
                    request_id: None,
                    timestamp: Utc::now(),
                });
            return;
        }
        slot.in_flight = None;

        self.inner
            .event_bus
            .emit_lossy(DetectionEvent::RecordingFinished {
                captured_bytes: outcome.as_ref().map_or(0, Vec::len),
                timestamp: Utc::now(),
            });

        let source = outcome.and_then(|audio| self.inner.resolver.resolve(MediaInput::Recording(audio)));
        match source {
            Ok(source) if self.inner.settings.auto_analyze_recordings => {
                self.begin_analysis(&mut slot, AnalysisRequest::new(source), "recording_finished");
            }
            Ok(_) => {
                tracing::info!("Recording finished, automatic analysis disabled");
                self.transition(&mut slot, WorkflowState::Idle, "recording_finished");
            }
            Err(error) => {
                tracing::error!(error = %error, "Recording failed");
                self.transition(&mut slot, WorkflowState::Failed { error }, "recording_failed");
            }
        }
    }

    /// Replace the state, recording and broadcasting phase changes
    fn transition(&self, slot: &mut WorkflowSlot, next: WorkflowState, trigger: &str) {
        let old_state = slot.state.phase();
        let new_state = next.phase();
        slot.state = next;

        if old_state == new_state {
            return;
        }

        tracing::info!(
            old_state = %old_state,
            new_state = %new_state,
            trigger,
            "Workflow state changed"
        );

        if slot.history.len() == TRANSITION_HISTORY_LIMIT {
            slot.history.pop_front();
        }
        slot.history
            .push_back(StateTransition::new(old_state, new_state, trigger));

        self.inner
            .event_bus
            .emit_lossy(DetectionEvent::WorkflowStateChanged {
                old_state,
                new_state,
                timestamp: Utc::now(),
            });
    }
}

/// Error for an operation the current state does not accept
fn rejection(state: &WorkflowState, operation: &'static str) -> WorkflowError {
    match state.in_flight_request() {
        Some(request) => WorkflowError::AnalysisInFlight(request.request_id),
        None => WorkflowError::InvalidTransition {
            operation,
            phase: state.phase(),
        },
    }
}

/// Validate an engine result and pin its source type to the request's
fn shape_result(
    info: &RequestInfo,
    mut result: AnalysisResult,
) -> Result<AnalysisResult, DetectionError> {
    result.validate()?;
    if result.source_type != info.source_type {
        tracing::warn!(
            request_id = %info.request_id,
            reported = %result.source_type,
            expected = %info.source_type,
            "Engine reported mismatched source type, overriding"
        );
        result.source_type = info.source_type;
    }
    Ok(result)
}
