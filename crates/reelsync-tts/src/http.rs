//! HTTP speech service backend.

use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use tracing::{debug, info};

use reelsync_media::MediaProbe;

use crate::error::{TtsError, TtsResult};
use crate::synthesizer::{measure_speech, record_outcome, SpeechRequest, SpeechSynthesizer, SynthesizedSpeech};

/// JSON body posted to `{base_url}/synthesize`.
#[derive(Debug, Serialize)]
struct SynthesizeBody<'a> {
    text: &'a str,
    voice: &'a str,
    rate: String,
    format: &'static str,
}

/// Client for a speech service that answers with raw audio bytes.
pub struct HttpSynthesizer {
    http: Client,
    base_url: String,
    timeout: Duration,
    probe: Arc<dyn MediaProbe>,
}

impl HttpSynthesizer {
    pub fn new(base_url: impl Into<String>, timeout: Duration, probe: Arc<dyn MediaProbe>) -> TtsResult<Self> {
        let http = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(TtsError::Network)?;

        Ok(Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            timeout,
            probe,
        })
    }

    async fn run(&self, request: &SpeechRequest, output: &Path) -> TtsResult<SynthesizedSpeech> {
        request.validate()?;
        let url = format!("{}/synthesize", self.base_url);
        debug!("Sending synthesis request to {}", url);

        let body = SynthesizeBody {
            text: &request.text,
            voice: &request.voice,
            rate: request.rate.to_string(),
            format: "mp3",
        };
        let response = self.http.post(&url).json(&body).send().await.map_err(|e| {
            if e.is_timeout() {
                TtsError::Timeout(self.timeout.as_secs())
            } else {
                TtsError::Network(e)
            }
        })?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(TtsError::RequestFailed(format!(
                "speech service returned {}: {}",
                status, body
            )));
        }

        let audio = response.bytes().await?;
        if audio.is_empty() {
            return Err(TtsError::empty_audio("speech service returned an empty body"));
        }
        tokio::fs::write(output, &audio).await?;

        measure_speech(self.probe.as_ref(), output).await
    }
}

#[async_trait]
impl SpeechSynthesizer for HttpSynthesizer {
    fn name(&self) -> &'static str {
        "http"
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

#[cfg(test)]
mod tests {
    use super::*;
    use crate::synthesizer::testing::FixedProbe;
    use reelsync_models::RateAdjustment;
    use serde_json::json;
    use wiremock::matchers::{body_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn request() -> SpeechRequest {
        SpeechRequest::new("안녕하세요", "ko-KR-SunHiNeural", RateAdjustment(10))
    }

    #[tokio::test]
    async fn test_synthesize_writes_audio() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/synthesize"))
            .and(body_json(json!({
                "text": "안녕하세요",
                "voice": "ko-KR-SunHiNeural",
                "rate": "+10%",
                "format": "mp3"
            })))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(b"ID3-fake-mp3".to_vec()))
            .expect(1)
            .mount(&server)
            .await;

        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("n0.mp3");
        let synth = HttpSynthesizer::new(server.uri(), Duration::from_secs(5), Arc::new(FixedProbe(2.75))).unwrap();

        let speech = synth.synthesize(&request(), &out).await.unwrap();
        assert_eq!(speech.audio_path, out);
        assert!((speech.duration_secs - 2.75).abs() < 1e-9);
        assert_eq!(std::fs::read(&out).unwrap(), b"ID3-fake-mp3");
    }

    #[tokio::test]
    async fn test_server_error_is_surfaced() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/synthesize"))
            .respond_with(ResponseTemplate::new(503).set_body_string("voice unavailable"))
            .expect(1)
            .mount(&server)
            .await;

        let dir = tempfile::tempdir().unwrap();
        let synth = HttpSynthesizer::new(server.uri(), Duration::from_secs(5), Arc::new(FixedProbe(1.0))).unwrap();
        let err = synth
            .synthesize(&request(), &dir.path().join("n0.mp3"))
            .await
            .unwrap_err();

        assert!(matches!(err, TtsError::RequestFailed(_)));
        assert!(err.diagnostic().unwrap().contains("voice unavailable"));
    }

    #[tokio::test]
    async fn test_empty_body_is_generation_failure() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/synthesize"))
            .respond_with(ResponseTemplate::new(200))
            .mount(&server)
            .await;

        let dir = tempfile::tempdir().unwrap();
        let synth = HttpSynthesizer::new(server.uri(), Duration::from_secs(5), Arc::new(FixedProbe(1.0))).unwrap();
        let result = synth.synthesize(&request(), &dir.path().join("n0.mp3")).await;
        assert!(matches!(result, Err(TtsError::EmptyAudio(_))));
    }

    #[tokio::test]
    async fn test_zero_duration_is_generation_failure() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/synthesize"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(vec![0u8; 16]))
            .mount(&server)
            .await;

        let dir = tempfile::tempdir().unwrap();
        let synth = HttpSynthesizer::new(server.uri(), Duration::from_secs(5), Arc::new(FixedProbe(0.0))).unwrap();
        let result = synth.synthesize(&request(), &dir.path().join("n0.mp3")).await;
        assert!(matches!(result, Err(TtsError::EmptyAudio(_))));
    }
}
