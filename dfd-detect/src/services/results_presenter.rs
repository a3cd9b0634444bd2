//! Results presenter
//!
//! Pure projections from workflow data into view models. Nothing here
//! mutates state; feature order from the engine is preserved.

use crate::models::{AnalysisResult, DetectionError, RequestInfo, WorkflowState};
use dfd_common::events::{FailureKind, SourceType, WorkflowPhase};
use serde::{Deserialize, Serialize};

/// Feature scores at or above this are strong signals
pub const STRONG_SIGNAL_THRESHOLD: f64 = 90.0;

/// Feature scores at or above this are moderate signals
pub const MODERATE_SIGNAL_THRESHOLD: f64 = 70.0;

/// Authenticity verdict
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Verdict {
    Deepfake,
    Authentic,
}

/// Strength of an evidence signal
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SignalLevel {
    Strong,
    Moderate,
    Weak,
}

impl SignalLevel {
    pub fn from_score(value: f64) -> Self {
        if value >= STRONG_SIGNAL_THRESHOLD {
            SignalLevel::Strong
        } else if value >= MODERATE_SIGNAL_THRESHOLD {
            SignalLevel::Moderate
        } else {
            SignalLevel::Weak
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureView {
    pub name: String,
    pub value: f64,
    /// Rounded percentage, e.g. "88%"
    pub value_label: String,
    pub level: SignalLevel,
}

/// Completed result ready for display
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResultView {
    pub verdict: Verdict,
    pub headline: String,
    pub confidence: f64,
    pub confidence_label: String,
    pub source_type: SourceType,
    pub source_label: String,
    pub show_video_preview: bool,
    pub features: Vec<FeatureView>,
}

/// Failure ready for display
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FailureView {
    pub kind: FailureKind,
    pub title: String,
    pub message: String,
    /// Submitting the same input again may succeed
    pub retryable: bool,
}

/// Whole-workflow view with UI affordances
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkflowView {
    pub phase: WorkflowPhase,
    pub state: WorkflowState,
    pub can_submit: bool,
    pub can_record: bool,
    pub can_reset: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request: Option<RequestInfo>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<ResultView>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failure: Option<FailureView>,
}

fn percent_label(value: f64) -> String {
    format!("{}%", value.round() as i64)
}

/// Project a completed result
pub fn present(result: &AnalysisResult) -> ResultView {
    let (verdict, headline) = if result.is_deepfake {
        (Verdict::Deepfake, "Potential deepfake detected")
    } else {
        (Verdict::Authentic, "Likely authentic")
    };

    let source_label = match result.source_type {
        SourceType::Audio => "Audio analysis",
        SourceType::Video => "Video analysis",
    };

    ResultView {
        verdict,
        headline: headline.to_string(),
        confidence: result.confidence,
        confidence_label: percent_label(result.confidence),
        source_type: result.source_type,
        source_label: source_label.to_string(),
        show_video_preview: result.source_type == SourceType::Video,
        features: result
            .features
            .iter()
            .map(|f| FeatureView {
                name: f.name.clone(),
                value: f.value,
                value_label: percent_label(f.value),
                level: SignalLevel::from_score(f.value),
            })
            .collect(),
    }
}

/// Project a failure
pub fn present_failure(error: &DetectionError) -> FailureView {
    let kind = error.kind();
    let title = match kind {
        FailureKind::InvalidInput => "Invalid input",
        FailureKind::UnsupportedMedia => "Unsupported media",
        FailureKind::Network => "Could not reach the analysis service",
        FailureKind::AnalysisEngine => "Analysis failed",
        FailureKind::Recording => "Recording failed",
    };

    FailureView {
        kind,
        title: title.to_string(),
        message: error.message().to_string(),
        retryable: kind.is_retryable(),
    }
}

/// Project the whole workflow state
pub fn present_state(state: &WorkflowState) -> WorkflowView {
    let accepts_input = state.accepts_input();
    WorkflowView {
        phase: state.phase(),
        state: state.clone(),
        can_submit: accepts_input,
        can_record: accepts_input,
        can_reset: !matches!(state, WorkflowState::Idle),
        request: state.in_flight_request().cloned(),
        result: state.result().map(present),
        failure: state.error().map(present_failure),
    }
}
