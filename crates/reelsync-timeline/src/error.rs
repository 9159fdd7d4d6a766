//! Error types for timeline synchronization.

use thiserror::Error;

/// Result type for timeline operations.
pub type TimelineResult<T> = Result<T, TimelineError>;

/// Errors raised while resolving a timeline. None of them are retried.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum TimelineError {
    /// Malformed speed segments or cue declarations, caught before any
    /// external call is made.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// A cue that cannot be placed within the output bounds.
    #[error("Scheduling conflict: {0}")]
    SchedulingConflict(String),

    /// Synthesized speech reported a zero or negative length.
    #[error("Narration {index} has invalid duration {duration_secs}s")]
    InvalidNarrationDuration { index: usize, duration_secs: f64 },

    /// A composed plan broke one of its own guarantees.
    #[error("Inconsistent render plan: {0}")]
    InconsistentPlan(String),
}

impl TimelineError {
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration(message.into())
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        Self::SchedulingConflict(message.into())
    }
}
