//! Error types for dfd-detect
//!
//! Every handler error becomes `{"error": {"code", "message"}}` with a
//! matching status code.

use crate::services::WorkflowError;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

/// API error type
#[derive(Debug, Error)]
pub enum ApiError {
    /// Resource not found (404)
    #[error("Resource not found: {0}")]
    NotFound(String),

    /// Invalid request (400)
    #[error("Invalid request: {0}")]
    BadRequest(String),

    /// Workflow operation rejected (400 for bad input, 409 otherwise)
    #[error(transparent)]
    Workflow(#[from] WorkflowError),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_code, message) = match self {
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, "NOT_FOUND", msg),
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "BAD_REQUEST", msg),
            ApiError::Workflow(ref err) => match err {
                WorkflowError::AnalysisInFlight(_) => {
                    (StatusCode::CONFLICT, "ANALYSIS_IN_FLIGHT", err.to_string())
                }
                WorkflowError::InvalidTransition { .. } => {
                    (StatusCode::CONFLICT, "INVALID_TRANSITION", err.to_string())
                }
                WorkflowError::Rejected(detection) => {
                    let code = match detection.kind() {
                        dfd_common::events::FailureKind::UnsupportedMedia => "UNSUPPORTED_MEDIA",
                        _ => "INVALID_INPUT",
                    };
                    (StatusCode::BAD_REQUEST, code, detection.to_string())
                }
            },
        };

        let body = Json(json!({
            "error": {
                "code": error_code,
                "message": message,
            }
        }));

        (status, body).into_response()
    }
}

/// Result type for API handlers
pub type ApiResult<T> = Result<T, ApiError>;
