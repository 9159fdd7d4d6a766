//! `edge-tts` command line backend.

use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use tokio::process::Command;
use tracing::{debug, info};

use reelsync_media::MediaProbe;

use crate::error::{TtsError, TtsResult};
use crate::synthesizer::{measure_speech, record_outcome, SpeechRequest, SpeechSynthesizer, SynthesizedSpeech};

/// Synthesizes speech by running `edge-tts` once per request.
pub struct EdgeTtsSynthesizer {
    binary: String,
    timeout: Duration,
    probe: Arc<dyn MediaProbe>,
}

impl EdgeTtsSynthesizer {
    pub fn new(binary: impl Into<String>, timeout: Duration, probe: Arc<dyn MediaProbe>) -> Self {
        Self {
            binary: binary.into(),
            timeout,
            probe,
        }
    }

    fn locate(&self) -> TtsResult<PathBuf> {
        which::which(&self.binary).map_err(|_| TtsError::ToolNotFound(self.binary.clone()))
    }

    async fn run(&self, request: &SpeechRequest, output: &Path) -> TtsResult<SynthesizedSpeech> {
        request.validate()?;
        let binary = self.locate()?;
        let args = edge_tts_args(request, output);
        debug!(binary = %binary.display(), voice = %request.voice, rate = %request.rate, "Running edge-tts");

        let child = Command::new(binary)
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .output();
        let out = tokio::time::timeout(self.timeout, child)
            .await
            .map_err(|_| TtsError::Timeout(self.timeout.as_secs()))??;

        if !out.status.success() {
            let stderr = String::from_utf8_lossy(&out.stderr).trim().to_string();
            return Err(TtsError::process_failed(
                format!("edge-tts exited with {}", out.status),
                (!stderr.is_empty()).then_some(stderr),
                out.status.code(),
            ));
        }

        measure_speech(self.probe.as_ref(), output).await
    }
}

#[async_trait]
impl SpeechSynthesizer for EdgeTtsSynthesizer {
    fn name(&self) -> &'static str {
        "edge-tts"
    }

    async fn synthesize(&self, request: &SpeechRequest, output: &Path) -> TtsResult<SynthesizedSpeech> {
        let started = Instant::now();
        let result = self.run(request, output).await;
        record_outcome(self.name(), started, &result);
        if let Ok(speech) = &result {
            info!(
                voice = %request.voice,
                duration_secs = speech.duration_secs,
                "Synthesized narration"
            );
        }
        result
    }
}

/// Arguments for one `edge-tts` invocation.
pub fn edge_tts_args(request: &SpeechRequest, output: &Path) -> Vec<String> {
    vec![
        "--voice".to_string(),
        request.voice.clone(),
        // `=` keeps a leading minus from being read as a flag
        format!("--rate={}", request.rate),
        "--text".to_string(),
        request.text.clone(),
        "--write-media".to_string(),
        output.to_string_lossy().to_string(),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::synthesizer::testing::FixedProbe;
    use reelsync_models::RateAdjustment;

    #[test]
    fn test_edge_tts_args() {
        let request = SpeechRequest::new("-5 degrees today", "ja-JP-NanamiNeural", RateAdjustment(-5));
        let args = edge_tts_args(&request, Path::new("/tmp/n0.mp3"));
        assert_eq!(
            args,
            vec![
                "--voice",
                "ja-JP-NanamiNeural",
                "--rate=-5%",
                "--text",
                "-5 degrees today",
                "--write-media",
                "/tmp/n0.mp3",
            ]
        );
    }

    #[tokio::test]
    async fn test_missing_binary() {
        let synth = EdgeTtsSynthesizer::new(
            "reelsync-no-such-edge-tts",
            Duration::from_secs(5),
            Arc::new(FixedProbe(1.0)),
        );
        let request = SpeechRequest::new("hello", "en-US-GuyNeural", RateAdjustment::NORMAL);
        let result = synth.synthesize(&request, Path::new("/tmp/never.mp3")).await;
        assert!(matches!(result, Err(TtsError::ToolNotFound(_))));
    }

    #[tokio::test]
    async fn test_empty_text_rejected_before_spawn() {
        let synth = EdgeTtsSynthesizer::new("edge-tts", Duration::from_secs(5), Arc::new(FixedProbe(1.0)));
        let request = SpeechRequest::new("", "en-US-GuyNeural", RateAdjustment::NORMAL);
        let result = synth.synthesize(&request, Path::new("/tmp/never.mp3")).await;
        assert!(matches!(result, Err(TtsError::InvalidRequest(_))));
    }
}
