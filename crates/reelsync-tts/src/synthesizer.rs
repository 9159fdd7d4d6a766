//! The speech synthesis seam.

use std::path::{Path, PathBuf};
use std::time::Instant;

use async_trait::async_trait;
use metrics::{counter, histogram};
use serde::{Deserialize, Serialize};
use tracing::debug;

use reelsync_media::MediaProbe;
use reelsync_models::RateAdjustment;

use crate::error::{TtsError, TtsResult};

/// Metric names emitted by the TTS boundary.
pub mod metric_names {
    pub const REQUESTS_TOTAL: &str = "reelsync_tts_requests_total";
    pub const FAILURES_TOTAL: &str = "reelsync_tts_failures_total";
    pub const DURATION_SECONDS: &str = "reelsync_tts_duration_seconds";
    pub const AUDIO_SECONDS: &str = "reelsync_tts_audio_seconds";
}

/// One narration line to synthesize.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpeechRequest {
    pub text: String,
    pub voice: String,
    pub rate: RateAdjustment,
}

impl SpeechRequest {
    pub fn new(text: impl Into<String>, voice: impl Into<String>, rate: RateAdjustment) -> Self {
        Self {
            text: text.into(),
            voice: voice.into(),
            rate,
        }
    }

    pub fn validate(&self) -> TtsResult<()> {
        if self.text.trim().is_empty() {
            return Err(TtsError::InvalidRequest("text is empty".to_string()));
        }
        if self.voice.trim().is_empty() {
            return Err(TtsError::InvalidRequest("voice is empty".to_string()));
        }
        Ok(())
    }
}

/// A synthesized audio asset and its measured duration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SynthesizedSpeech {
    pub audio_path: PathBuf,
    pub duration_secs: f64,
}

/// Turns text into an audio file.
///
/// Implementations write the audio to `output`, measure it and return its
/// duration. A missing or zero-length result is a failure, never a valid
/// zero-length cue. Nothing is retried.
#[async_trait]
pub trait SpeechSynthesizer: Send + Sync {
    /// Short backend name used in logs and metric labels.
    fn name(&self) -> &'static str;

    async fn synthesize(&self, request: &SpeechRequest, output: &Path) -> TtsResult<SynthesizedSpeech>;
}

/// Measure a freshly written asset, rejecting non-positive durations.
pub async fn measure_speech(probe: &dyn MediaProbe, path: &Path) -> TtsResult<SynthesizedSpeech> {
    let size = tokio::fs::metadata(path).await.map(|m| m.len()).unwrap_or(0);
    if size == 0 {
        return Err(TtsError::empty_audio(format!("{} is empty", path.display())));
    }

    let duration_secs = probe.duration(path).await?;
    if !duration_secs.is_finite() || duration_secs <= 0.0 {
        return Err(TtsError::empty_audio(format!(
            "{} measured {:.3}s",
            path.display(),
            duration_secs
        )));
    }

    debug!(path = %path.display(), duration_secs, "Measured synthesized speech");
    Ok(SynthesizedSpeech {
        audio_path: path.to_path_buf(),
        duration_secs,
    })
}

/// Record the outcome of one synthesis call.
pub(crate) fn record_outcome(backend: &'static str, started: Instant, result: &TtsResult<SynthesizedSpeech>) {
    let labels = [("backend", backend)];
    counter!(metric_names::REQUESTS_TOTAL, &labels).increment(1);
    histogram!(metric_names::DURATION_SECONDS, &labels).record(started.elapsed().as_secs_f64());
    match result {
        Ok(speech) => {
            histogram!(metric_names::AUDIO_SECONDS, &labels).record(speech.duration_secs);
        }
        Err(_) => {
            counter!(metric_names::FAILURES_TOTAL, &labels).increment(1);
        }
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use reelsync_media::{MediaInfo, MediaResult};

    /// Probe reporting a fixed duration for every file.
    pub struct FixedProbe(pub f64);

    #[async_trait]
    impl MediaProbe for FixedProbe {
        async fn probe(&self, _path: &Path) -> MediaResult<MediaInfo> {
            Ok(MediaInfo {
                duration_secs: self.0,
                width: None,
                height: None,
                fps: None,
                has_video: false,
                has_audio: true,
                size: 1,
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::testing::FixedProbe;
    use super::*;

    #[test]
    fn test_request_validation() {
        assert!(SpeechRequest::new("hello", "en-US-GuyNeural", RateAdjustment::NORMAL)
            .validate()
            .is_ok());
        assert!(matches!(
            SpeechRequest::new("  ", "en-US-GuyNeural", RateAdjustment::NORMAL).validate(),
            Err(TtsError::InvalidRequest(_))
        ));
    }

    #[tokio::test]
    async fn test_measure_rejects_zero_duration() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("n0.mp3");
        tokio::fs::write(&path, b"ID3").await.unwrap();

        let result = measure_speech(&FixedProbe(0.0), &path).await;
        assert!(matches!(result, Err(TtsError::EmptyAudio(_))));

        let speech = measure_speech(&FixedProbe(4.2), &path).await.unwrap();
        assert!((speech.duration_secs - 4.2).abs() < 1e-9);
    }

    #[tokio::test]
    async fn test_measure_rejects_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let result = measure_speech(&FixedProbe(3.0), &dir.path().join("missing.mp3")).await;
        assert!(matches!(result, Err(TtsError::EmptyAudio(_))));
    }
}
