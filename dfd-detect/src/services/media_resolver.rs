//! Media source resolver
//!
//! Normalizes the three input modalities (uploaded file, remote URL, live
//! recording) into a [`MediaSource`]. Pure: no I/O, never calls the engine.
//! Input that cannot be analyzed is rejected here, before any request is
//! created.

use crate::models::{DetectionError, FileUpload, MediaInput, MediaSource};
use reqwest::Url;

/// Default upload size limit (200 MiB)
pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 200 * 1024 * 1024;

/// MIME type browsers send when they cannot classify a file
const OCTET_STREAM: &str = "application/octet-stream";

/// Media source resolver
#[derive(Debug, Clone)]
pub struct MediaSourceResolver {
    max_upload_bytes: usize,
}

impl MediaSourceResolver {
    pub fn new(max_upload_bytes: usize) -> Self {
        Self { max_upload_bytes }
    }

    pub fn max_upload_bytes(&self) -> usize {
        self.max_upload_bytes
    }

    /// Resolve raw input into a media source
    ///
    /// # Errors
    /// - `InvalidInput` for empty files, oversized uploads, blank or
    ///   malformed URLs and empty recordings
    /// - `UnsupportedMedia` for files that are neither audio nor video
    pub fn resolve(&self, input: MediaInput) -> Result<MediaSource, DetectionError> {
        match input {
            MediaInput::File(upload) => self.resolve_file(upload),
            MediaInput::Url(text) => resolve_url(&text),
            MediaInput::Recording(audio_blob) => {
                if audio_blob.is_empty() {
                    return Err(DetectionError::InvalidInput(
                        "Recording produced no audio".to_string(),
                    ));
                }
                Ok(MediaSource::Recording { audio_blob })
            }
        }
    }

    fn resolve_file(&self, upload: FileUpload) -> Result<MediaSource, DetectionError> {
        if upload.data.is_empty() {
            return Err(DetectionError::InvalidInput(format!(
                "File '{}' is empty",
                upload.file_name
            )));
        }

        if upload.data.len() > self.max_upload_bytes {
            return Err(DetectionError::InvalidInput(format!(
                "File '{}' is {} bytes, limit is {} bytes",
                upload.file_name,
                upload.data.len(),
                self.max_upload_bytes
            )));
        }

        let declared = upload
            .mime_type
            .as_deref()
            .map(|m| m.trim().to_ascii_lowercase())
            .filter(|m| !m.is_empty() && m != OCTET_STREAM);

        let mime_type = match declared {
            Some(mime) => mime,
            None => {
                let sniffed = infer::get(&upload.data).map(|kind| kind.mime_type().to_string());
                tracing::debug!(
                    file_name = %upload.file_name,
                    sniffed = ?sniffed,
                    "No usable MIME type declared, sniffed from content"
                );
                sniffed.ok_or_else(|| {
                    DetectionError::UnsupportedMedia(format!(
                        "Cannot determine media type of '{}'",
                        upload.file_name
                    ))
                })?
            }
        };

        if !is_analyzable_mime(&mime_type) {
            return Err(DetectionError::UnsupportedMedia(format!(
                "'{}' has type {}, expected audio/* or video/*",
                upload.file_name, mime_type
            )));
        }

        Ok(MediaSource::File {
            file_name: upload.file_name,
            blob: upload.data,
            mime_type,
        })
    }
}

impl Default for MediaSourceResolver {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_UPLOAD_BYTES)
    }
}

/// Only audio and video can be analyzed
fn is_analyzable_mime(mime_type: &str) -> bool {
    mime_type.starts_with("audio/") || mime_type.starts_with("video/")
}

fn resolve_url(text: &str) -> Result<MediaSource, DetectionError> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Err(DetectionError::InvalidInput("URL is empty".to_string()));
    }

    let uri = Url::parse(trimmed)
        .map_err(|e| DetectionError::InvalidInput(format!("Malformed URL '{}': {}", trimmed, e)))?;

    if !matches!(uri.scheme(), "http" | "https") {
        return Err(DetectionError::InvalidInput(format!(
            "Unsupported URL scheme '{}', expected http or https",
            uri.scheme()
        )));
    }

    if uri.host_str().map_or(true, str::is_empty) {
        return Err(DetectionError::InvalidInput(format!(
            "URL '{}' has no host",
            trimmed
        )));
    }

    Ok(MediaSource::Url { uri })
}

#[cfg(test)]
mod tests {
    use super::*;
    use dfd_common::events::SourceType;

    /// Minimal WAV header: RIFF....WAVE
    const WAV_MAGIC: &[u8] = b"RIFF\x24\x00\x00\x00WAVEfmt ";

    fn resolver() -> MediaSourceResolver {
        MediaSourceResolver::new(1024)
    }

    fn upload(mime: Option<&str>, data: &[u8]) -> MediaInput {
        MediaInput::File(FileUpload::new("sample.bin", mime, data.to_vec()))
    }

    #[test]
    fn test_video_file() {
        let source = resolver().resolve(upload(Some("video/mp4"), b"data")).unwrap();
        assert_eq!(source.source_type(), SourceType::Video);
        assert_eq!(source.mime_type(), Some("video/mp4"));
    }

    #[test]
    fn test_audio_file_mime_is_normalized() {
        let source = resolver()
            .resolve(upload(Some("  Audio/MPEG "), b"data"))
            .unwrap();
        assert_eq!(source.source_type(), SourceType::Audio);
        assert_eq!(source.mime_type(), Some("audio/mpeg"));
    }

    #[test]
    fn test_non_media_file_rejected() {
        let err = resolver()
            .resolve(upload(Some("application/pdf"), b"%PDF-1.4"))
            .unwrap_err();
        assert!(matches!(err, DetectionError::UnsupportedMedia(_)));
    }

    #[test]
    fn test_missing_mime_is_sniffed() {
        let source = resolver().resolve(upload(None, WAV_MAGIC)).unwrap();
        assert_eq!(source.source_type(), SourceType::Audio);
        assert!(source.mime_type().unwrap().starts_with("audio/"));

        let source = resolver()
            .resolve(upload(Some("application/octet-stream"), WAV_MAGIC))
            .unwrap();
        assert_eq!(source.source_type(), SourceType::Audio);
    }

    #[test]
    fn test_unrecognizable_content_rejected() {
        let err = resolver().resolve(upload(None, b"hello")).unwrap_err();
        assert!(matches!(err, DetectionError::UnsupportedMedia(_)));
    }

    #[test]
    fn test_empty_and_oversized_files() {
        let err = resolver().resolve(upload(Some("audio/wav"), b"")).unwrap_err();
        assert!(matches!(err, DetectionError::InvalidInput(_)));

        let big = vec![0u8; 1025];
        let err = resolver()
            .resolve(upload(Some("audio/wav"), &big))
            .unwrap_err();
        assert!(matches!(err, DetectionError::InvalidInput(_)));
    }

    #[test]
    fn test_url_is_trimmed() {
        let source = resolver()
            .resolve(MediaInput::Url("  https://example.com/v.mp4 \n".to_string()))
            .unwrap();
        match source {
            MediaSource::Url { uri } => assert_eq!(uri.as_str(), "https://example.com/v.mp4"),
            other => panic!("Expected URL source, got {:?}", other),
        }
    }

    #[test]
    fn test_blank_url_rejected() {
        for text in ["", "   ", "\t\n"] {
            let err = resolver().resolve(MediaInput::Url(text.to_string())).unwrap_err();
            assert!(matches!(err, DetectionError::InvalidInput(_)), "{:?}", text);
        }
    }

    #[test]
    fn test_malformed_urls_rejected() {
        for text in ["not a url", "ftp://example.com/v.mp4", "file:///tmp/v.mp4"] {
            let err = resolver().resolve(MediaInput::Url(text.to_string())).unwrap_err();
            assert!(matches!(err, DetectionError::InvalidInput(_)), "{:?}", text);
        }
    }

    #[test]
    fn test_recording() {
        let source = resolver()
            .resolve(MediaInput::Recording(WAV_MAGIC.to_vec()))
            .unwrap();
        assert_eq!(source.source_type(), SourceType::Audio);

        let err = resolver().resolve(MediaInput::Recording(Vec::new())).unwrap_err();
        assert!(matches!(err, DetectionError::InvalidInput(_)));
    }
}
