//! The media engine seam.
//!
//! Render stages build [`FfmpegCommand`]s and hand them to a
//! [`MediaEngine`]. Production runs use [`FfmpegRunner`]; dry runs and
//! tests use [`DryRunEngine`], which records each command instead.

use std::fmt;
use std::sync::Mutex;
use std::time::Instant;

use async_trait::async_trait;
use metrics::{counter, histogram};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::command::{FfmpegCommand, FfmpegRunner};
use crate::error::{MediaError, MediaResult};

/// Metric names emitted by the media boundary.
pub mod metric_names {
    pub const STAGE_DURATION: &str = "reelsync_render_stage_duration_seconds";
    pub const COMMANDS_TOTAL: &str = "reelsync_ffmpeg_commands_total";
    pub const COMMAND_FAILURES: &str = "reelsync_ffmpeg_failures_total";
}

/// A sequential render stage. Each stage's output is the next one's input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RenderStage {
    /// Trim + retime of speed segments, concatenated
    Retime,
    /// Frame sampling, hold clips and their concatenation
    Stills,
    /// Scale and blur-fill onto the canvas
    Scale,
    /// Caption text overlay
    Overlay,
    /// Background and narration audio mix
    Mix,
}

impl RenderStage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Retime => "retime",
            Self::Stills => "stills",
            Self::Scale => "scale",
            Self::Overlay => "overlay",
            Self::Mix => "mix",
        }
    }
}

impl fmt::Display for RenderStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Executes one media command as a blocking external invocation.
#[async_trait]
pub trait MediaEngine: Send + Sync {
    async fn execute(&self, stage: RenderStage, command: &FfmpegCommand) -> MediaResult<()>;

    /// Whether commands actually produce their outputs.
    fn produces_output(&self) -> bool {
        true
    }
}

#[async_trait]
impl MediaEngine for FfmpegRunner {
    async fn execute(&self, stage: RenderStage, command: &FfmpegCommand) -> MediaResult<()> {
        let started = Instant::now();
        let labels = [("stage", stage.as_str())];
        counter!(metric_names::COMMANDS_TOTAL, &labels).increment(1);

        let result = self.run(command).await;
        histogram!(metric_names::STAGE_DURATION, &labels).record(started.elapsed().as_secs_f64());
        if result.is_err() {
            counter!(metric_names::COMMAND_FAILURES, &labels).increment(1);
        }
        result
    }
}

/// Records commands without running them.
#[derive(Debug, Default)]
pub struct DryRunEngine {
    commands: Mutex<Vec<(RenderStage, FfmpegCommand)>>,
}

impl DryRunEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Commands recorded so far, in execution order.
    pub fn commands(&self) -> Vec<(RenderStage, FfmpegCommand)> {
        self.commands
            .lock()
            .map(|commands| commands.clone())
            .unwrap_or_default()
    }

    /// Recorded commands of one stage.
    pub fn stage_commands(&self, stage: RenderStage) -> Vec<FfmpegCommand> {
        self.commands()
            .into_iter()
            .filter(|(s, _)| *s == stage)
            .map(|(_, cmd)| cmd)
            .collect()
    }
}

#[async_trait]
impl MediaEngine for DryRunEngine {
    async fn execute(&self, stage: RenderStage, command: &FfmpegCommand) -> MediaResult<()> {
        info!(stage = %stage, "[dry-run] {}", command.to_command_line());
        self.commands
            .lock()
            .map_err(|_| MediaError::internal("dry-run command log poisoned"))?
            .push((stage, command.clone()));
        Ok(())
    }

    fn produces_output(&self) -> bool {
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_dry_run_records_in_order() {
        let engine = DryRunEngine::new();
        let a = FfmpegCommand::new("in.mp4", "a.mp4");
        let b = FfmpegCommand::new("a.mp4", "b.mp4");
        engine.execute(RenderStage::Retime, &a).await.unwrap();
        engine.execute(RenderStage::Scale, &b).await.unwrap();

        let recorded = engine.commands();
        assert_eq!(recorded.len(), 2);
        assert_eq!(recorded[0].0, RenderStage::Retime);
        assert_eq!(engine.stage_commands(RenderStage::Scale), vec![b]);
        assert!(!engine.produces_output());
    }

    #[test]
    fn test_stage_names() {
        assert_eq!(RenderStage::Overlay.to_string(), "overlay");
        assert_eq!(serde_json::to_string(&RenderStage::Mix).unwrap(), "\"mix\"");
    }
}
