//! Detection error taxonomy
//!
//! Errors raised while resolving input, capturing audio or running the
//! analysis engine. They are `Clone` + `Serialize` because a failed
//! workflow carries its error in state and exposes it over the API.

use dfd_common::events::FailureKind;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Error produced by the resolver, the recorder or an analysis engine
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
#[serde(tag = "kind", content = "message", rename_all = "snake_case")]
pub enum DetectionError {
    /// Malformed or empty input (blank URL, empty file, oversized upload)
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Media type is neither audio nor video
    #[error("Unsupported media: {0}")]
    UnsupportedMedia(String),

    /// Transport failure reaching the analysis engine
    #[error("Network error: {0}")]
    Network(String),

    /// Engine-side failure or engine output violating the result contract
    #[error("Analysis engine error: {0}")]
    AnalysisEngine(String),

    /// Capture device failure
    #[error("Recording error: {0}")]
    Recording(String),
}

impl DetectionError {
    /// Failure category for events and views
    pub fn kind(&self) -> FailureKind {
        match self {
            DetectionError::InvalidInput(_) => FailureKind::InvalidInput,
            DetectionError::UnsupportedMedia(_) => FailureKind::UnsupportedMedia,
            DetectionError::Network(_) => FailureKind::Network,
            DetectionError::AnalysisEngine(_) => FailureKind::AnalysisEngine,
            DetectionError::Recording(_) => FailureKind::Recording,
        }
    }

    /// Message without the category prefix
    pub fn message(&self) -> &str {
        match self {
            DetectionError::InvalidInput(m)
            | DetectionError::UnsupportedMedia(m)
            | DetectionError::Network(m)
            | DetectionError::AnalysisEngine(m)
            | DetectionError::Recording(m) => m,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_serializes_with_kind_tag() {
        let err = DetectionError::UnsupportedMedia("text/plain".to_string());
        let json = serde_json::to_value(&err).unwrap();
        assert_eq!(json["kind"], "unsupported_media");
        assert_eq!(json["message"], "text/plain");
    }

    #[test]
    fn test_kind_and_message() {
        let err = DetectionError::Network("connection reset".to_string());
        assert_eq!(err.kind(), FailureKind::Network);
        assert_eq!(err.message(), "connection reset");
        assert_eq!(err.to_string(), "Network error: connection reset");
    }
}
