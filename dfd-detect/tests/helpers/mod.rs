//! Test Helper Utilities
//!
//! Scripted engines and recorders plus event-waiting helpers shared by the
//! dfd-detect integration tests.

#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use dfd_common::events::{DetectionEvent, EventBus, SourceType, WorkflowPhase};
use dfd_detect::models::{AnalysisFeature, AnalysisRequest, AnalysisResult, DetectionError};
use dfd_detect::services::{
    AnalysisEngine, RecordingDevice, SilentRecorder, WorkflowOrchestrator, WorkflowSettings,
};
use tokio::sync::{broadcast, Semaphore};

/// Upper bound for any event wait in tests
pub const EVENT_TIMEOUT: Duration = Duration::from_secs(5);

pub fn sample_result(source_type: SourceType) -> AnalysisResult {
    AnalysisResult {
        is_deepfake: false,
        confidence: 88.0,
        features: vec![
            AnalysisFeature::new("Spectral Consistency", 91.0),
            AnalysisFeature::new("Synthetic Artifacts", 64.0),
        ],
        source_type,
    }
}

/// Engine that returns a fixed outcome once released
///
/// Starts closed; each `release()` lets one pending analysis finish.
pub struct GatedEngine {
    outcome: Result<AnalysisResult, DetectionError>,
    gate: Semaphore,
    calls: AtomicUsize,
}

impl GatedEngine {
    pub fn new(outcome: Result<AnalysisResult, DetectionError>) -> Arc<Self> {
        Arc::new(Self {
            outcome,
            gate: Semaphore::new(0),
            calls: AtomicUsize::new(0),
        })
    }

    /// Engine that answers immediately
    pub fn open(outcome: Result<AnalysisResult, DetectionError>) -> Arc<Self> {
        let engine = Self::new(outcome);
        engine.gate.add_permits(Semaphore::MAX_PERMITS / 2);
        engine
    }

    pub fn release(&self) {
        self.gate.add_permits(1);
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl AnalysisEngine for GatedEngine {
    fn name(&self) -> &'static str {
        "gated"
    }

    async fn analyze(&self, _request: AnalysisRequest) -> Result<AnalysisResult, DetectionError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let permit = self
            .gate
            .acquire()
            .await
            .map_err(|e| DetectionError::AnalysisEngine(e.to_string()))?;
        permit.forget();
        self.outcome.clone()
    }
}

/// Recorder whose capture always fails
pub struct BrokenRecorder;

#[async_trait::async_trait]
impl RecordingDevice for BrokenRecorder {
    fn name(&self) -> &'static str {
        "broken"
    }

    async fn record(&self, _duration: Duration) -> Result<Vec<u8>, DetectionError> {
        Err(DetectionError::Recording("microphone unavailable".to_string()))
    }
}

/// Settings with a short recording so capture tests stay fast
pub fn fast_settings() -> WorkflowSettings {
    WorkflowSettings {
        recording_duration: Duration::from_millis(50),
        ..WorkflowSettings::default()
    }
}

pub fn build_orchestrator(
    engine: Arc<dyn AnalysisEngine>,
    settings: WorkflowSettings,
) -> WorkflowOrchestrator {
    build_orchestrator_with_recorder(engine, Arc::new(SilentRecorder::default()), settings)
}

pub fn build_orchestrator_with_recorder(
    engine: Arc<dyn AnalysisEngine>,
    recorder: Arc<dyn RecordingDevice>,
    settings: WorkflowSettings,
) -> WorkflowOrchestrator {
    WorkflowOrchestrator::new(engine, recorder, EventBus::new(100), settings)
}

/// Wait for the first event matching `predicate`
pub async fn wait_for_event<F>(
    rx: &mut broadcast::Receiver<DetectionEvent>,
    mut predicate: F,
) -> DetectionEvent
where
    F: FnMut(&DetectionEvent) -> bool,
{
    tokio::time::timeout(EVENT_TIMEOUT, async {
        loop {
            match rx.recv().await {
                Ok(event) if predicate(&event) => return event,
                Ok(_) => continue,
                Err(broadcast::error::RecvError::Lagged(_)) => continue,
                Err(broadcast::error::RecvError::Closed) => panic!("Event bus closed"),
            }
        }
    })
    .await
    .expect("Timed out waiting for event")
}

/// Wait until the workflow enters `phase`
pub async fn wait_for_phase(rx: &mut broadcast::Receiver<DetectionEvent>, phase: WorkflowPhase) {
    wait_for_event(rx, |event| {
        matches!(
            event,
            DetectionEvent::WorkflowStateChanged { new_state, .. } if *new_state == phase
        )
    })
    .await;
}
