//! Structured run logging utilities.
//!
//! Every event of a run carries its run id and job name, so interleaved
//! output from several runs stays attributable.

use tracing::{error, info, warn, Span};
use uuid::Uuid;

use crate::error::PipelineStage;

/// Run logger for structured logging with consistent formatting.
#[derive(Debug, Clone)]
pub struct RunLogger {
    run_id: String,
    job: String,
}

impl RunLogger {
    /// Create a logger with a fresh run id.
    pub fn new(job: &str) -> Self {
        Self {
            run_id: Uuid::new_v4().to_string(),
            job: job.to_string(),
        }
    }

    /// Create a logger for an existing run id.
    pub fn with_run_id(run_id: &str, job: &str) -> Self {
        Self {
            run_id: run_id.to_string(),
            job: job.to_string(),
        }
    }

    pub fn log_start(&self, message: &str) {
        info!(run_id = %self.run_id, job = %self.job, "Run started: {}", message);
    }

    pub fn log_stage(&self, stage: PipelineStage, message: &str) {
        info!(
            run_id = %self.run_id,
            job = %self.job,
            stage = %stage,
            "{}", message
        );
    }

    pub fn log_warning(&self, message: &str) {
        warn!(run_id = %self.run_id, job = %self.job, "Run warning: {}", message);
    }

    /// Log a failure with its stage and the tool's diagnostic fragment.
    pub fn log_failure(&self, stage: Option<PipelineStage>, message: &str, diagnostic: Option<&str>) {
        error!(
            run_id = %self.run_id,
            job = %self.job,
            stage = stage.map(|s| s.as_str()).unwrap_or("setup"),
            diagnostic = diagnostic.unwrap_or(""),
            "Run failed: {}", message
        );
    }

    pub fn log_completion(&self, message: &str) {
        info!(run_id = %self.run_id, job = %self.job, "Run completed: {}", message);
    }

    pub fn run_id(&self) -> &str {
        &self.run_id
    }

    pub fn job(&self) -> &str {
        &self.job
    }

    /// Span covering the whole run.
    pub fn create_span(&self) -> Span {
        tracing::info_span!("run", run_id = %self.run_id, job = %self.job)
    }

    /// Span covering one stage, nested in the run span when entered.
    pub fn stage_span(&self, stage: PipelineStage) -> Span {
        tracing::info_span!("stage", stage = %stage)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_run_logger_creation() {
        let a = RunLogger::new("ja7");
        let b = RunLogger::new("ja7");
        assert_eq!(a.job(), "ja7");
        assert_ne!(a.run_id(), b.run_id());
        assert!(Uuid::parse_str(a.run_id()).is_ok());
    }

    #[test]
    fn test_run_logger_with_run_id() {
        let logger = RunLogger::with_run_id("run-123", "bidja1");
        assert_eq!(logger.run_id(), "run-123");
        assert_eq!(logger.job(), "bidja1");
    }
}
