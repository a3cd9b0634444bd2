//! Detection workflow types shared between events and services

use serde::{Deserialize, Serialize};

/// Coarse workflow phase
///
/// Fieldless mirror of the orchestrator's workflow state, used in events
/// and transition records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkflowPhase {
    /// Nothing selected, no analysis
    Idle,
    /// An input tab is open
    Collecting,
    /// Live capture in progress
    Recording,
    /// Analysis request in flight
    Analyzing,
    /// Result available
    Completed,
    /// Analysis or capture failed
    Failed,
}

impl WorkflowPhase {
    /// Terminal phases can only be left through reset
    pub fn is_terminal(&self) -> bool {
        matches!(self, WorkflowPhase::Completed | WorkflowPhase::Failed)
    }
}

impl std::fmt::Display for WorkflowPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            WorkflowPhase::Idle => "idle",
            WorkflowPhase::Collecting => "collecting",
            WorkflowPhase::Recording => "recording",
            WorkflowPhase::Analyzing => "analyzing",
            WorkflowPhase::Completed => "completed",
            WorkflowPhase::Failed => "failed",
        };
        f.write_str(name)
    }
}

/// Media type being analyzed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceType {
    Audio,
    Video,
}

impl std::fmt::Display for SourceType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SourceType::Audio => f.write_str("audio"),
            SourceType::Video => f.write_str("video"),
        }
    }
}

/// Failure category carried by failure events
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    /// Malformed or empty input
    InvalidInput,
    /// MIME type is neither audio nor video
    UnsupportedMedia,
    /// Transport failure reaching the engine
    Network,
    /// Engine-side failure or invalid engine output
    AnalysisEngine,
    /// Capture device failure
    Recording,
}

impl FailureKind {
    /// Whether retrying the same input may succeed
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            FailureKind::Network | FailureKind::AnalysisEngine | FailureKind::Recording
        )
    }
}
