//! Media input, normalized media source and analysis request

use chrono::{DateTime, Utc};
use dfd_common::events::SourceType;
use reqwest::Url;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// MIME type of audio produced by the recorder
pub const RECORDING_MIME_TYPE: &str = "audio/wav";

/// Uploaded file as received from the client
#[derive(Clone)]
pub struct FileUpload {
    pub file_name: String,
    /// Client-declared MIME type; sniffed from content when absent
    pub mime_type: Option<String>,
    pub data: Vec<u8>,
}

impl FileUpload {
    pub fn new(file_name: impl Into<String>, mime_type: Option<&str>, data: Vec<u8>) -> Self {
        Self {
            file_name: file_name.into(),
            mime_type: mime_type.map(str::to_string),
            data,
        }
    }
}

impl std::fmt::Debug for FileUpload {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FileUpload")
            .field("file_name", &self.file_name)
            .field("mime_type", &self.mime_type)
            .field("bytes", &self.data.len())
            .finish()
    }
}

/// Raw user input, one per input modality
#[derive(Debug, Clone)]
pub enum MediaInput {
    /// File picked or dropped on the upload tab
    File(FileUpload),
    /// Text typed into the URL tab (untrimmed)
    Url(String),
    /// Audio produced by a completed capture
    Recording(Vec<u8>),
}

/// Input modality a source came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    File,
    Url,
    Recording,
}

/// Validated media source
///
/// Exactly one modality is populated. Only the resolver constructs these.
#[derive(Clone, PartialEq)]
pub enum MediaSource {
    File {
        file_name: String,
        blob: Vec<u8>,
        /// Lowercase, starts with `audio/` or `video/`
        mime_type: String,
    },
    Url {
        uri: Url,
    },
    Recording {
        audio_blob: Vec<u8>,
    },
}

impl MediaSource {
    pub fn kind(&self) -> SourceKind {
        match self {
            MediaSource::File { .. } => SourceKind::File,
            MediaSource::Url { .. } => SourceKind::Url,
            MediaSource::Recording { .. } => SourceKind::Recording,
        }
    }

    /// Media type the engine will analyze
    ///
    /// Video MIME types and remote URLs are video; audio MIME types and
    /// recordings are audio.
    pub fn source_type(&self) -> SourceType {
        match self {
            MediaSource::File { mime_type, .. } if mime_type.starts_with("video/") => {
                SourceType::Video
            }
            MediaSource::File { .. } => SourceType::Audio,
            MediaSource::Url { .. } => SourceType::Video,
            MediaSource::Recording { .. } => SourceType::Audio,
        }
    }

    /// MIME type of the payload, if known
    pub fn mime_type(&self) -> Option<&str> {
        match self {
            MediaSource::File { mime_type, .. } => Some(mime_type),
            MediaSource::Url { .. } => None,
            MediaSource::Recording { .. } => Some(RECORDING_MIME_TYPE),
        }
    }

    /// Short description for logs and views
    pub fn label(&self) -> String {
        match self {
            MediaSource::File { file_name, .. } => file_name.clone(),
            MediaSource::Url { uri } => uri.to_string(),
            MediaSource::Recording { audio_blob } => {
                format!("Live recording ({} bytes)", audio_blob.len())
            }
        }
    }
}

impl std::fmt::Debug for MediaSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MediaSource::File {
                file_name,
                blob,
                mime_type,
            } => f
                .debug_struct("File")
                .field("file_name", file_name)
                .field("mime_type", mime_type)
                .field("bytes", &blob.len())
                .finish(),
            MediaSource::Url { uri } => f.debug_struct("Url").field("uri", &uri.as_str()).finish(),
            MediaSource::Recording { audio_blob } => f
                .debug_struct("Recording")
                .field("bytes", &audio_blob.len())
                .finish(),
        }
    }
}

/// Request handed to an analysis engine
///
/// Immutable once created; consumed by the engine.
#[derive(Debug, Clone)]
pub struct AnalysisRequest {
    request_id: Uuid,
    source: MediaSource,
    source_type: SourceType,
    submitted_at: DateTime<Utc>,
}

impl AnalysisRequest {
    pub fn new(source: MediaSource) -> Self {
        let source_type = source.source_type();
        Self {
            request_id: Uuid::new_v4(),
            source,
            source_type,
            submitted_at: Utc::now(),
        }
    }

    pub fn request_id(&self) -> Uuid {
        self.request_id
    }

    pub fn source(&self) -> &MediaSource {
        &self.source
    }

    pub fn source_type(&self) -> SourceType {
        self.source_type
    }

    pub fn submitted_at(&self) -> DateTime<Utc> {
        self.submitted_at
    }

    /// Serializable summary kept in workflow state while the request is in flight
    pub fn info(&self) -> RequestInfo {
        RequestInfo {
            request_id: self.request_id,
            source_kind: self.source.kind(),
            source_type: self.source_type,
            label: self.source.label(),
            submitted_at: self.submitted_at,
        }
    }
}

/// Summary of an analysis request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RequestInfo {
    pub request_id: Uuid,
    pub source_kind: SourceKind,
    pub source_type: SourceType,
    pub label: String,
    pub submitted_at: DateTime<Utc>,
}
