//! Detection workflow API handlers
//!
//! One endpoint per workflow operation. Submissions return 202 Accepted as
//! soon as the request is in flight; the outcome is observed through
//! `GET /detection/state` or the `/events` stream.

use axum::{
    extract::{DefaultBodyLimit, State},
    http::StatusCode,
    routing::{get, post, put},
    Json, Router,
};
use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use serde::{Deserialize, Serialize};

use crate::{
    error::{ApiError, ApiResult},
    models::{FileUpload, InputTab, RequestInfo, StateTransition},
    services::{present, present_state, ResultView, WorkflowView},
    AppState,
};

/// POST /detection/tab request
#[derive(Debug, Deserialize)]
pub struct OpenTabRequest {
    pub tab: InputTab,
}

/// PUT /detection/draft-url request
#[derive(Debug, Deserialize)]
pub struct DraftUrlRequest {
    pub url: String,
}

/// POST /detection/file request
#[derive(Debug, Deserialize)]
pub struct SubmitFileRequest {
    pub file_name: String,
    #[serde(default)]
    pub mime_type: Option<String>,
    pub data_base64: String,
}

/// POST /detection/url request
#[derive(Debug, Deserialize)]
pub struct SubmitUrlRequest {
    pub url: String,
}

/// Submission response
#[derive(Debug, Serialize)]
pub struct SubmissionResponse {
    pub request: RequestInfo,
}

/// GET /detection/state
pub async fn get_state(State(state): State<AppState>) -> Json<WorkflowView> {
    Json(present_state(&state.orchestrator.state().await))
}

/// GET /detection/transitions
pub async fn get_transitions(State(state): State<AppState>) -> Json<Vec<StateTransition>> {
    Json(state.orchestrator.transitions().await)
}

/// POST /detection/tab
pub async fn open_tab(
    State(state): State<AppState>,
    Json(request): Json<OpenTabRequest>,
) -> ApiResult<Json<WorkflowView>> {
    let workflow = state.orchestrator.open_tab(request.tab).await?;
    Ok(Json(present_state(&workflow)))
}

/// PUT /detection/draft-url
pub async fn set_draft_url(
    State(state): State<AppState>,
    Json(request): Json<DraftUrlRequest>,
) -> ApiResult<Json<WorkflowView>> {
    let workflow = state.orchestrator.set_draft_url(&request.url).await?;
    Ok(Json(present_state(&workflow)))
}

/// POST /detection/file
///
/// File content travels base64-encoded in the JSON body.
pub async fn submit_file(
    State(state): State<AppState>,
    Json(request): Json<SubmitFileRequest>,
) -> ApiResult<(StatusCode, Json<SubmissionResponse>)> {
    let data = BASE64.decode(request.data_base64.trim()).map_err(|e| {
        ApiError::BadRequest(format!("data_base64 is not valid base64: {}", e))
    })?;

    let upload = FileUpload::new(request.file_name, request.mime_type.as_deref(), data);
    tracing::debug!(upload = ?upload, "File submitted");

    let info = state.orchestrator.submit_file(upload).await?;
    Ok((StatusCode::ACCEPTED, Json(SubmissionResponse { request: info })))
}

/// POST /detection/url
pub async fn submit_url(
    State(state): State<AppState>,
    Json(request): Json<SubmitUrlRequest>,
) -> ApiResult<(StatusCode, Json<SubmissionResponse>)> {
    let info = state.orchestrator.submit_url(&request.url).await?;
    Ok((StatusCode::ACCEPTED, Json(SubmissionResponse { request: info })))
}

/// POST /detection/recording
pub async fn start_recording(
    State(state): State<AppState>,
) -> ApiResult<(StatusCode, Json<WorkflowView>)> {
    let workflow = state.orchestrator.start_recording().await?;
    Ok((StatusCode::ACCEPTED, Json(present_state(&workflow))))
}

/// POST /detection/reset
pub async fn reset(State(state): State<AppState>) -> Json<WorkflowView> {
    let workflow = state.orchestrator.reset().await;
    Json(present_state(&workflow))
}

/// GET /detection/result
///
/// 404 unless the workflow is Completed.
pub async fn get_result(State(state): State<AppState>) -> ApiResult<Json<ResultView>> {
    let workflow = state.orchestrator.state().await;
    let result = workflow.result().ok_or_else(|| {
        ApiError::NotFound(format!(
            "No analysis result available (workflow is {})",
            workflow.phase()
        ))
    })?;
    Ok(Json(present(result)))
}

/// Largest JSON body carrying an upload of `max_upload_bytes`
///
/// Base64 inflates by 4/3; the remainder covers the other fields.
pub fn body_limit_for(max_upload_bytes: usize) -> usize {
    max_upload_bytes
        .saturating_add(2)
        .saturating_div(3)
        .saturating_mul(4)
        .saturating_add(64 * 1024)
}

/// Build detection workflow routes
pub fn detection_routes(max_upload_bytes: usize) -> Router<AppState> {
    Router::new()
        .route("/detection/state", get(get_state))
        .route("/detection/transitions", get(get_transitions))
        .route("/detection/tab", post(open_tab))
        .route("/detection/draft-url", put(set_draft_url))
        .route("/detection/file", post(submit_file))
        .route("/detection/url", post(submit_url))
        .route("/detection/recording", post(start_recording))
        .route("/detection/reset", post(reset))
        .route("/detection/result", get(get_result))
        .layer(DefaultBodyLimit::max(body_limit_for(max_upload_bytes)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_body_limit_covers_base64_upload() {
        let max = 3 * 1024;
        let encoded = BASE64.encode(vec![0u8; max]).len();
        assert!(body_limit_for(max) > encoded);
        assert_eq!(body_limit_for(usize::MAX), usize::MAX);
    }
}
