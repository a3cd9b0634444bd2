//! Event types for the DFD event system
//!
//! Provides the shared event definitions and the EventBus used to fan
//! workflow activity out to SSE clients and logs.

mod detection_types;

pub use detection_types::{FailureKind, SourceType, WorkflowPhase};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use uuid::Uuid;

/// DFD event types
///
/// Events are broadcast via EventBus and can be serialized for SSE transmission.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum DetectionEvent {
    /// Workflow moved between phases
    ///
    /// Triggers:
    /// - SSE: Swap the visible panel (input / analyzing / results)
    WorkflowStateChanged {
        old_state: WorkflowPhase,
        new_state: WorkflowPhase,
        timestamp: DateTime<Utc>,
    },

    /// Analysis request handed to the engine
    AnalysisStarted {
        request_id: Uuid,
        source_type: SourceType,
        /// Human-readable source description (file name or URL)
        label: String,
        timestamp: DateTime<Utc>,
    },

    /// Engine produced a valid result
    AnalysisCompleted {
        request_id: Uuid,
        is_deepfake: bool,
        confidence: f64,
        timestamp: DateTime<Utc>,
    },

    /// Engine call or result validation failed
    AnalysisFailed {
        request_id: Uuid,
        failure: FailureKind,
        message: String,
        timestamp: DateTime<Utc>,
    },

    /// A late outcome arrived after reset and was dropped
    ///
    /// `request_id` is None for capture outcomes.
    StaleOutcomeDiscarded {
        request_id: Option<Uuid>,
        timestamp: DateTime<Utc>,
    },

    /// Live capture started
    RecordingStarted {
        duration_ms: u64,
        timestamp: DateTime<Utc>,
    },

    /// Live capture finished (successfully or not)
    RecordingFinished {
        /// Size of the captured audio, 0 on failure
        captured_bytes: usize,
        timestamp: DateTime<Utc>,
    },
}

impl DetectionEvent {
    /// Event name used as the SSE `event:` field
    pub fn event_type(&self) -> &'static str {
        match self {
            DetectionEvent::WorkflowStateChanged { .. } => "WorkflowStateChanged",
            DetectionEvent::AnalysisStarted { .. } => "AnalysisStarted",
            DetectionEvent::AnalysisCompleted { .. } => "AnalysisCompleted",
            DetectionEvent::AnalysisFailed { .. } => "AnalysisFailed",
            DetectionEvent::StaleOutcomeDiscarded { .. } => "StaleOutcomeDiscarded",
            DetectionEvent::RecordingStarted { .. } => "RecordingStarted",
            DetectionEvent::RecordingFinished { .. } => "RecordingFinished",
        }
    }
}

// ========================================
// EventBus Implementation
// ========================================

/// Central event distribution bus
///
/// The EventBus uses tokio::broadcast internally, providing:
/// - Non-blocking publish (slow subscribers don't block producers)
/// - Multiple concurrent subscribers
/// - Lagged message detection for slow subscribers
///
/// # Examples
///
/// ```
/// use dfd_common::events::{DetectionEvent, EventBus, WorkflowPhase};
///
/// let event_bus = EventBus::new(100);
/// let mut rx = event_bus.subscribe();
///
/// event_bus.emit(DetectionEvent::WorkflowStateChanged {
///     old_state: WorkflowPhase::Idle,
///     new_state: WorkflowPhase::Collecting,
///     timestamp: chrono::Utc::now(),
/// }).ok();
///
/// assert!(rx.try_recv().is_ok());
/// ```
#[derive(Clone)]
pub struct EventBus {
    tx: broadcast::Sender<DetectionEvent>,
    capacity: usize,
}

impl EventBus {
    /// Creates a new EventBus with specified channel capacity
    ///
    /// Older events are dropped for subscribers that fall more than
    /// `capacity` events behind.
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx, capacity }
    }

    /// Subscribe to all future events
    ///
    /// Events emitted before subscription are not received.
    pub fn subscribe(&self) -> broadcast::Receiver<DetectionEvent> {
        self.tx.subscribe()
    }

    /// Emit an event to all subscribers
    ///
    /// Returns `Ok(subscriber_count)` if at least one subscriber exists.
    /// Returns `Err` if no subscribers are listening.
    #[allow(clippy::result_large_err)]
    pub fn emit(
        &self,
        event: DetectionEvent,
    ) -> Result<usize, broadcast::error::SendError<DetectionEvent>> {
        self.tx.send(event)
    }

    /// Emit an event, ignoring if no subscribers are listening
    pub fn emit_lossy(&self, event: DetectionEvent) {
        let _ = self.tx.send(event);
    }

    /// Get the current number of active subscribers
    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }

    /// Get the configured channel capacity
    pub fn capacity(&self) -> usize {
        self.capacity
    }
}
