//! Pipeline error types.

use std::fmt;

use serde::Serialize;
use thiserror::Error;

use reelsync_media::{MediaError, RenderStage};
use reelsync_models::JobError;
use reelsync_timeline::TimelineError;
use reelsync_tts::TtsError;

pub type PipelineResult<T> = Result<T, PipelineError>;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// The step of a run a failure is attributed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PipelineStage {
    Probe,
    Tts,
    Schedule,
    Compose,
    Retime,
    Stills,
    Scale,
    Overlay,
    Mix,
}

impl PipelineStage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Probe => "probe",
            Self::Tts => "tts",
            Self::Schedule => "schedule",
            Self::Compose => "compose",
            Self::Retime => "retime",
            Self::Stills => "stills",
            Self::Scale => "scale",
            Self::Overlay => "overlay",
            Self::Mix => "mix",
        }
    }
}

impl fmt::Display for PipelineStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<RenderStage> for PipelineStage {
    fn from(stage: RenderStage) -> Self {
        match stage {
            RenderStage::Retime => Self::Retime,
            RenderStage::Stills => Self::Stills,
            RenderStage::Scale => Self::Scale,
            RenderStage::Overlay => Self::Overlay,
            RenderStage::Mix => Self::Mix,
        }
    }
}

/// Broad failure category reported to the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    /// Rejected before any external call
    Configuration,
    /// Media engine or TTS failure, diagnostic attached
    ExternalTool,
    /// A cue could not be placed within bounds
    SchedulingConflict,
    /// A broken invariant inside the pipeline
    Internal,
}

impl FailureKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Configuration => "configuration",
            Self::ExternalTool => "external_tool",
            Self::SchedulingConflict => "scheduling_conflict",
            Self::Internal => "internal",
        }
    }
}

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("Invalid job: {0}")]
    InvalidJob(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("{stage} stage failed: {source}")]
    Stage {
        stage: PipelineStage,
        kind: FailureKind,
        #[source]
        source: BoxError,
        /// Last diagnostic fragment of the failing tool
        diagnostic: Option<String>,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl PipelineError {
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    pub fn invalid_job(msg: impl Into<String>) -> Self {
        Self::InvalidJob(msg.into())
    }

    /// Attribute a timeline error to `stage`.
    pub fn timeline(stage: PipelineStage, err: TimelineError) -> Self {
        let kind = match &err {
            TimelineError::Configuration(_) => FailureKind::Configuration,
            TimelineError::SchedulingConflict(_) => FailureKind::SchedulingConflict,
            TimelineError::InvalidNarrationDuration { .. } => FailureKind::ExternalTool,
            TimelineError::InconsistentPlan(_) => FailureKind::Internal,
        };
        Self::Stage {
            stage,
            kind,
            source: Box::new(err),
            diagnostic: None,
        }
    }

    /// Attribute a media error to the render stage it carries, or to
    /// `fallback` when it carries none.
    pub fn media(fallback: PipelineStage, err: MediaError) -> Self {
        let stage = err.stage().map(PipelineStage::from).unwrap_or(fallback);
        let diagnostic = err.diagnostic().map(str::to_string);
        let kind = match root_media_error(&err) {
            MediaError::InvalidPlan(_) | MediaError::Internal(_) => FailureKind::Internal,
            MediaError::FileNotFound(_) if stage == PipelineStage::Probe => FailureKind::Configuration,
            _ => FailureKind::ExternalTool,
        };
        Self::Stage {
            stage,
            kind,
            source: Box::new(err),
            diagnostic,
        }
    }

    /// Attribute a TTS failure for one narration cue.
    pub fn tts(cue_index: usize, err: TtsError) -> Self {
        let diagnostic = err.diagnostic().map(str::to_string);
        let kind = match &err {
            TtsError::InvalidRequest(_) | TtsError::Config(_) => FailureKind::Configuration,
            _ => FailureKind::ExternalTool,
        };
        Self::Stage {
            stage: PipelineStage::Tts,
            kind,
            source: format!("narration {}: {}", cue_index, err).into(),
            diagnostic,
        }
    }

    pub fn stage(&self) -> Option<PipelineStage> {
        match self {
            Self::Stage { stage, .. } => Some(*stage),
            _ => None,
        }
    }

    pub fn kind(&self) -> FailureKind {
        match self {
            Self::InvalidJob(_) | Self::Config(_) => FailureKind::Configuration,
            Self::Stage { kind, .. } => *kind,
            Self::Io(_) | Self::Json(_) => FailureKind::Internal,
        }
    }

    pub fn diagnostic(&self) -> Option<&str> {
        match self {
            Self::Stage { diagnostic, .. } => diagnostic.as_deref(),
            _ => None,
        }
    }
}

impl From<JobError> for PipelineError {
    fn from(err: JobError) -> Self {
        match err {
            JobError::Parse(e) => Self::InvalidJob(e.to_string()),
            JobError::Invalid(msg) => Self::InvalidJob(msg),
        }
    }
}

fn root_media_error(err: &MediaError) -> &MediaError {
    match err {
        MediaError::Stage { source, .. } => root_media_error(source),
        other => other,
    }
}
