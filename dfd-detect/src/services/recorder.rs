//! Live recording capability
//!
//! A [`RecordingDevice`] captures audio for a fixed duration and returns it
//! as a WAV blob. The orchestrator runs the capture in a spawned task and
//! drops the future on reset, so implementations need not watch for
//! cancellation themselves.

use crate::models::DetectionError;
use hound::{SampleFormat, WavSpec, WavWriter};
use std::io::Cursor;
use std::time::Duration;

/// Default capture length
pub const DEFAULT_RECORDING_SECONDS: u64 = 5;

/// Audio capture device
#[async_trait::async_trait]
pub trait RecordingDevice: Send + Sync {
    fn name(&self) -> &'static str;

    /// Capture `duration` of audio as WAV bytes
    async fn record(&self, duration: Duration) -> Result<Vec<u8>, DetectionError>;
}

/// Simulated microphone producing silence
#[derive(Debug, Clone)]
pub struct SilentRecorder {
    sample_rate: u32,
}

impl SilentRecorder {
    pub fn new(sample_rate: u32) -> Self {
        Self { sample_rate }
    }

    /// Encode `duration` of mono 16-bit silence
    pub fn silent_wav(&self, duration: Duration) -> Result<Vec<u8>, DetectionError> {
        let spec = WavSpec {
            channels: 1,
            sample_rate: self.sample_rate,
            bits_per_sample: 16,
            sample_format: SampleFormat::Int,
        };
        let samples = (duration.as_secs_f64() * f64::from(self.sample_rate)).round() as u64;

        let mut buffer = Vec::new();
        let mut writer = WavWriter::new(Cursor::new(&mut buffer), spec)
            .map_err(|e| DetectionError::Recording(e.to_string()))?;
        for _ in 0..samples {
            writer
                .write_sample(0i16)
                .map_err(|e| DetectionError::Recording(e.to_string()))?;
        }
        writer
            .finalize()
            .map_err(|e| DetectionError::Recording(e.to_string()))?;

        Ok(buffer)
    }
}

impl Default for SilentRecorder {
    fn default() -> Self {
        Self::new(16_000)
    }
}

#[async_trait::async_trait]
impl RecordingDevice for SilentRecorder {
    fn name(&self) -> &'static str {
        "silent"
    }

    async fn record(&self, duration: Duration) -> Result<Vec<u8>, DetectionError> {
        tokio::time::sleep(duration).await;
        let audio = self.silent_wav(duration)?;
        tracing::debug!(
            duration_ms = duration.as_millis() as u64,
            bytes = audio.len(),
            "Simulated capture finished"
        );
        Ok(audio)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_silent_wav_is_valid() {
        let recorder = SilentRecorder::new(8_000);
        let bytes = recorder.silent_wav(Duration::from_millis(250)).unwrap();

        assert_eq!(&bytes[0..4], b"RIFF");
        assert_eq!(&bytes[8..12], b"WAVE");

        let reader = hound::WavReader::new(Cursor::new(bytes)).unwrap();
        assert_eq!(reader.spec().sample_rate, 8_000);
        assert_eq!(reader.spec().channels, 1);
        assert_eq!(reader.len(), 2_000);
    }

    #[test]
    fn test_recorded_audio_is_sniffed_as_audio() {
        let bytes = SilentRecorder::default()
            .silent_wav(Duration::from_millis(10))
            .unwrap();
        let kind = infer::get(&bytes).unwrap();
        assert!(kind.mime_type().starts_with("audio/"));
    }

    #[tokio::test]
    async fn test_record_waits_for_duration() {
        let recorder = SilentRecorder::default();
        let start = tokio::time::Instant::now();
        let bytes = recorder.record(Duration::from_millis(30)).await.unwrap();
        assert!(start.elapsed() >= Duration::from_millis(30));
        assert!(!bytes.is_empty());
    }
}
