//! Remote analysis engine client
//!
//! Posts each request as JSON to a detection backend and maps the reply onto
//! [`AnalysisResult`]. Media payloads are sent base64-encoded; URL sources
//! are forwarded as-is and fetched by the backend.
//!
//! Failure mapping:
//! - connection, timeout and body-transfer failures → `Network`
//! - HTTP 415 → `UnsupportedMedia`
//! - any other non-2xx status or an unparsable body → `AnalysisEngine`

use crate::models::{AnalysisRequest, AnalysisResult, DetectionError, MediaSource};
use crate::services::AnalysisEngine;
use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use dfd_common::events::SourceType;
use reqwest::{StatusCode, Url};
use serde::Serialize;
use std::time::Duration;
use uuid::Uuid;

const USER_AGENT: &str = concat!("dfd-detect/", env!("CARGO_PKG_VERSION"));

/// Longest backend error body echoed into error messages
const MAX_ERROR_BODY_CHARS: usize = 200;

/// Request body sent to the backend
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct EngineRequestBody<'a> {
    request_id: Uuid,
    source_type: SourceType,
    source: WireSource<'a>,
}

/// Wire form of a media source
#[derive(Debug, Serialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
enum WireSource<'a> {
    File {
        #[serde(rename = "fileName")]
        file_name: &'a str,
        #[serde(rename = "mimeType")]
        mime_type: &'a str,
        #[serde(rename = "dataBase64")]
        data_base64: String,
    },
    Url {
        uri: &'a str,
    },
    Recording {
        #[serde(rename = "mimeType")]
        mime_type: &'a str,
        #[serde(rename = "dataBase64")]
        data_base64: String,
    },
}

impl<'a> WireSource<'a> {
    fn from_source(source: &'a MediaSource) -> Self {
        match source {
            MediaSource::File {
                file_name,
                blob,
                mime_type,
            } => WireSource::File {
                file_name,
                mime_type,
                data_base64: BASE64.encode(blob),
            },
            MediaSource::Url { uri } => WireSource::Url { uri: uri.as_str() },
            MediaSource::Recording { audio_blob } => WireSource::Recording {
                mime_type: crate::models::RECORDING_MIME_TYPE,
                data_base64: BASE64.encode(audio_blob),
            },
        }
    }
}

/// HTTP detection backend client
pub struct RemoteAnalysisEngine {
    http_client: reqwest::Client,
    endpoint: Url,
    api_key: Option<String>,
}

impl RemoteAnalysisEngine {
    /// Create client for `endpoint`
    ///
    /// # Errors
    /// `InvalidInput` for a malformed endpoint, `Network` if the HTTP client
    /// cannot be built.
    pub fn new(
        endpoint: &str,
        api_key: Option<String>,
        timeout: Duration,
    ) -> Result<Self, DetectionError> {
        let endpoint = Url::parse(endpoint.trim()).map_err(|e| {
            DetectionError::InvalidInput(format!("Malformed engine endpoint '{}': {}", endpoint, e))
        })?;

        let http_client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(timeout)
            .build()
            .map_err(|e| DetectionError::Network(e.to_string()))?;

        Ok(Self {
            http_client,
            endpoint,
            api_key: api_key.filter(|k| !k.trim().is_empty()),
        })
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }
}

/// Map a non-success status to a detection error
fn status_error(status: StatusCode, body: &str) -> DetectionError {
    let body: String = body.chars().take(MAX_ERROR_BODY_CHARS).collect();
    if status == StatusCode::UNSUPPORTED_MEDIA_TYPE {
        DetectionError::UnsupportedMedia(format!("Engine rejected media: {}", body))
    } else {
        DetectionError::AnalysisEngine(format!("Engine returned HTTP {}: {}", status.as_u16(), body))
    }
}

/// Parse and validate a success body
fn parse_result(body: &str) -> Result<AnalysisResult, DetectionError> {
    let result: AnalysisResult = serde_json::from_str(body)
        .map_err(|e| DetectionError::AnalysisEngine(format!("Unparsable engine response: {}", e)))?;
    result.validate()?;
    Ok(result)
}

#[async_trait::async_trait]
impl AnalysisEngine for RemoteAnalysisEngine {
    fn name(&self) -> &'static str {
        "remote"
    }

    async fn analyze(&self, request: AnalysisRequest) -> Result<AnalysisResult, DetectionError> {
        let body = EngineRequestBody {
            request_id: request.request_id(),
            source_type: request.source_type(),
            source: WireSource::from_source(request.source()),
        };

        tracing::debug!(
            request_id = %request.request_id(),
            endpoint = %self.endpoint,
            "Sending analysis request to remote engine"
        );

        let mut builder = self.http_client.post(self.endpoint.clone()).json(&body);
        if let Some(key) = &self.api_key {
            builder = builder.bearer_auth(key);
        }

        let response = builder
            .send()
            .await
            .map_err(|e| DetectionError::Network(e.to_string()))?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| DetectionError::Network(e.to_string()))?;

        if !status.is_success() {
            return Err(status_error(status, &text));
        }

        let result = parse_result(&text)?;
        tracing::info!(
            request_id = %request.request_id(),
            is_deepfake = result.is_deepfake,
            confidence = result.confidence,
            "Remote analysis successful"
        );
        Ok(result)
    }
}
