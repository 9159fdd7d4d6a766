//! Error types for media operations.

use std::path::PathBuf;
use thiserror::Error;

use crate::engine::RenderStage;

/// Result type for media operations.
pub type MediaResult<T> = Result<T, MediaError>;

/// Errors that can occur at the media engine boundary.
#[derive(Debug, Error)]
pub enum MediaError {
    #[error("FFmpeg not found in PATH")]
    FfmpegNotFound,

    #[error("FFprobe not found in PATH")]
    FfprobeNotFound,

    #[error("FFmpeg command failed: {message}")]
    FfmpegFailed {
        message: String,
        /// Last lines of FFmpeg's diagnostic output
        stderr: Option<String>,
        exit_code: Option<i32>,
    },

    #[error("FFprobe command failed: {message}")]
    FfprobeFailed {
        message: String,
        stderr: Option<String>,
    },

    #[error("File not found: {0}")]
    FileNotFound(PathBuf),

    #[error("Operation cancelled")]
    Cancelled,

    #[error("Operation timed out after {0} seconds")]
    Timeout(u64),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON parse error: {0}")]
    JsonParse(#[from] serde_json::Error),

    #[error("Invalid media file: {0}")]
    InvalidMedia(String),

    #[error("Invalid render plan: {0}")]
    InvalidPlan(String),

    #[error("{stage} stage failed: {source}")]
    Stage {
        stage: RenderStage,
        #[source]
        source: Box<MediaError>,
    },

    #[error("Internal error: {0}")]
    Internal(String),
}

impl MediaError {
    /// Create an FFmpeg failure error.
    pub fn ffmpeg_failed(
        message: impl Into<String>,
        stderr: Option<String>,
        exit_code: Option<i32>,
    ) -> Self {
        Self::FfmpegFailed {
            message: message.into(),
            stderr,
            exit_code,
        }
    }

    /// Create an invalid plan error.
    pub fn invalid_plan(message: impl Into<String>) -> Self {
        Self::InvalidPlan(message.into())
    }

    /// Create an internal error.
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    /// Attribute this error to a render stage.
    pub fn in_stage(self, stage: RenderStage) -> Self {
        match self {
            already @ Self::Stage { .. } => already,
            other => Self::Stage {
                stage,
                source: Box::new(other),
            },
        }
    }

    /// The stage this error was attributed to, if any.
    pub fn stage(&self) -> Option<RenderStage> {
        match self {
            Self::Stage { stage, .. } => Some(*stage),
            _ => None,
        }
    }

    /// The external tool's diagnostic output, if it produced any.
    pub fn diagnostic(&self) -> Option<&str> {
        match self {
            Self::FfmpegFailed { stderr, .. } | Self::FfprobeFailed { stderr, .. } => {
                stderr.as_deref()
            }
            Self::Stage { source, .. } => source.diagnostic(),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stage_attribution_keeps_diagnostic() {
        let err = MediaError::ffmpeg_failed("exit 1", Some("No such filter: 'blurr'".into()), Some(1))
            .in_stage(RenderStage::Scale);
        assert_eq!(err.stage(), Some(RenderStage::Scale));
        assert_eq!(err.diagnostic(), Some("No such filter: 'blurr'"));
        assert!(err.to_string().starts_with("scale stage failed"));
    }

    #[test]
    fn test_stage_is_not_rewrapped() {
        let err = MediaError::Cancelled
            .in_stage(RenderStage::Retime)
            .in_stage(RenderStage::Mix);
        assert_eq!(err.stage(), Some(RenderStage::Retime));
    }
}
