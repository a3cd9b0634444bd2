//! Detection workflow state
//!
//! Exactly one state is active. The orchestrator is the only writer; every
//! change is recorded as a [`StateTransition`].
//!
//! ```text
//! Idle ──open tab──▶ Collecting ──submit──▶ Analyzing ──▶ Completed | Failed
//!   │                    │                      ▲
//!   └────start recording─┴──▶ Recording ────────┘ (auto-analyze)
//! any ──reset──▶ Idle
//! ```

use crate::models::{AnalysisResult, DetectionError, RequestInfo};
use chrono::{DateTime, Utc};
use dfd_common::events::WorkflowPhase;
use serde::{Deserialize, Serialize};

/// Input tab shown while collecting
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InputTab {
    Upload,
    Url,
}

/// Workflow state
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum WorkflowState {
    #[default]
    Idle,
    Collecting {
        tab: InputTab,
        /// URL text typed so far
        draft_url: Option<String>,
    },
    Recording {
        started_at: DateTime<Utc>,
        duration_ms: u64,
    },
    Analyzing {
        request: RequestInfo,
    },
    Completed {
        result: AnalysisResult,
    },
    Failed {
        error: DetectionError,
    },
}

impl WorkflowState {
    pub fn phase(&self) -> WorkflowPhase {
        match self {
            WorkflowState::Idle => WorkflowPhase::Idle,
            WorkflowState::Collecting { .. } => WorkflowPhase::Collecting,
            WorkflowState::Recording { .. } => WorkflowPhase::Recording,
            WorkflowState::Analyzing { .. } => WorkflowPhase::Analyzing,
            WorkflowState::Completed { .. } => WorkflowPhase::Completed,
            WorkflowState::Failed { .. } => WorkflowPhase::Failed,
        }
    }

    /// New submissions are accepted only from Idle or Collecting
    pub fn accepts_input(&self) -> bool {
        matches!(self, WorkflowState::Idle | WorkflowState::Collecting { .. })
    }

    /// Request currently in flight
    pub fn in_flight_request(&self) -> Option<&RequestInfo> {
        match self {
            WorkflowState::Analyzing { request } => Some(request),
            _ => None,
        }
    }

    pub fn result(&self) -> Option<&AnalysisResult> {
        match self {
            WorkflowState::Completed { result } => Some(result),
            _ => None,
        }
    }

    pub fn error(&self) -> Option<&DetectionError> {
        match self {
            WorkflowState::Failed { error } => Some(error),
            _ => None,
        }
    }

    pub fn draft_url(&self) -> Option<&str> {
        match self {
            WorkflowState::Collecting { draft_url, .. } => draft_url.as_deref(),
            _ => None,
        }
    }
}

/// State transition record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StateTransition {
    pub old_state: WorkflowPhase,
    pub new_state: WorkflowPhase,
    /// Operation that caused the transition ("submit_url", "reset", ...)
    pub trigger: String,
    pub transitioned_at: DateTime<Utc>,
}

impl StateTransition {
    pub fn new(old_state: WorkflowPhase, new_state: WorkflowPhase, trigger: &str) -> Self {
        Self {
            old_state,
            new_state,
            trigger: trigger.to_string(),
            transitioned_at: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_phase_mapping() {
        assert_eq!(WorkflowState::Idle.phase(), WorkflowPhase::Idle);
        assert_eq!(
            WorkflowState::Failed {
                error: DetectionError::Network("down".to_string())
            }
            .phase(),
            WorkflowPhase::Failed
        );
    }

    #[test]
    fn test_accepts_input() {
        assert!(WorkflowState::Idle.accepts_input());
        assert!(WorkflowState::Collecting {
            tab: InputTab::Url,
            draft_url: None
        }
        .accepts_input());
        assert!(!WorkflowState::Recording {
            started_at: Utc::now(),
            duration_ms: 5000
        }
        .accepts_input());
    }

    #[test]
    fn test_state_serialization_is_tagged() {
        let state = WorkflowState::Collecting {
            tab: InputTab::Url,
            draft_url: Some("https://example.com".to_string()),
        };
        let json = serde_json::to_value(&state).unwrap();
        assert_eq!(json["state"], "collecting");
        assert_eq!(json["tab"], "url");
        assert_eq!(json["draft_url"], "https://example.com");
        assert_eq!(state.draft_url(), Some("https://example.com"));
    }
}
