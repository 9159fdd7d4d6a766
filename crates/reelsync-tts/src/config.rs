//! TTS backend configuration.

use std::str::FromStr;
use std::time::Duration;

use crate::error::TtsError;

/// Voice used when neither the job nor the run overrides it.
pub const DEFAULT_VOICE: &str = "ko-KR-SunHiNeural";

/// Which synthesizer implementation to use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TtsBackend {
    /// The `edge-tts` command line tool
    #[default]
    EdgeCli,
    /// A speech service reachable over HTTP
    Http,
}

impl FromStr for TtsBackend {
    type Err = TtsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "edge" | "edge-tts" | "cli" => Ok(Self::EdgeCli),
            "http" => Ok(Self::Http),
            other => Err(TtsError::Config(format!("unknown TTS backend '{}'", other))),
        }
    }
}

/// Configuration for the TTS boundary.
#[derive(Debug, Clone)]
pub struct TtsConfig {
    pub backend: TtsBackend,
    /// Voice used when a request does not name one
    pub default_voice: String,
    /// Name or path of the edge-tts executable
    pub edge_binary: String,
    /// Base URL of the HTTP speech service
    pub base_url: String,
    /// Per-request timeout
    pub timeout: Duration,
}

impl Default for TtsConfig {
    fn default() -> Self {
        Self {
            backend: TtsBackend::EdgeCli,
            default_voice: DEFAULT_VOICE.to_string(),
            edge_binary: "edge-tts".to_string(),
            base_url: "http://localhost:5002".to_string(),
            timeout: Duration::from_secs(60),
        }
    }
}

impl TtsConfig {
    /// Create config from environment variables.
    ///
    /// An unparsable backend name falls back to the edge-tts CLI with a
    /// warning rather than failing the run.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        let backend = match std::env::var("REELSYNC_TTS_BACKEND") {
            Ok(value) => value.parse().unwrap_or_else(|e| {
                tracing::warn!("{}; using edge-tts", e);
                TtsBackend::EdgeCli
            }),
            Err(_) => defaults.backend,
        };

        Self {
            backend,
            default_voice: std::env::var("REELSYNC_TTS_VOICE").unwrap_or(defaults.default_voice),
            edge_binary: std::env::var("REELSYNC_EDGE_TTS_BIN").unwrap_or(defaults.edge_binary),
            base_url: std::env::var("REELSYNC_TTS_URL")
                .map(|url| url.trim_end_matches('/').to_string())
                .unwrap_or(defaults.base_url),
            timeout: Duration::from_secs(
                std::env::var("REELSYNC_TTS_TIMEOUT")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(60),
            ),
        }
    }

    pub fn with_voice(mut self, voice: impl Into<String>) -> Self {
        self.default_voice = voice.into();
        self
    }
}
