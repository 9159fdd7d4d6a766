//! TTS error types.

use thiserror::Error;

use reelsync_media::MediaError;

pub type TtsResult<T> = Result<T, TtsError>;

#[derive(Debug, Error)]
pub enum TtsError {
    #[error("TTS tool not found in PATH: {0}")]
    ToolNotFound(String),

    #[error("TTS process failed: {message}")]
    ProcessFailed {
        message: String,
        stderr: Option<String>,
        exit_code: Option<i32>,
    },

    #[error("TTS request failed: {0}")]
    RequestFailed(String),

    #[error("TTS produced no usable audio: {0}")]
    EmptyAudio(String),

    #[error("TTS timed out after {0} seconds")]
    Timeout(u64),

    #[error("Invalid TTS request: {0}")]
    InvalidRequest(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to measure synthesized audio: {0}")]
    Probe(#[from] MediaError),
}

impl TtsError {
    pub fn process_failed(
        message: impl Into<String>,
        stderr: Option<String>,
        exit_code: Option<i32>,
    ) -> Self {
        Self::ProcessFailed {
            message: message.into(),
            stderr,
            exit_code,
        }
    }

    pub fn empty_audio(msg: impl Into<String>) -> Self {
        Self::EmptyAudio(msg.into())
    }

    /// Diagnostic text reported by the backend, if any.
    pub fn diagnostic(&self) -> Option<&str> {
        match self {
            Self::ProcessFailed { stderr, .. } => stderr.as_deref(),
            Self::RequestFailed(body) => Some(body),
            Self::Probe(err) => err.diagnostic(),
            _ => None,
        }
    }
}
