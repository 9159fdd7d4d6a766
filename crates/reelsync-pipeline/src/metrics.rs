//! Run-level metrics.
//!
//! Only the `metrics` facade is used; a host process may install any
//! recorder it likes.

use metrics::{counter, histogram};

use crate::error::{FailureKind, PipelineStage};

/// Metric names as constants for consistency.
pub mod names {
    pub const RUNS_TOTAL: &str = "reelsync_runs_total";
    pub const RUNS_FAILED_TOTAL: &str = "reelsync_runs_failed_total";
    pub const RUN_DURATION_SECONDS: &str = "reelsync_run_duration_seconds";
    pub const OUTPUT_DURATION_SECONDS: &str = "reelsync_output_duration_seconds";
    pub const NARRATION_DRIFT_SECONDS: &str = "reelsync_narration_drift_seconds";
}

/// Record a finished run.
pub fn record_run_success(mode: &'static str, elapsed_secs: f64, output_secs: f64) {
    let labels = [("mode", mode)];
    counter!(names::RUNS_TOTAL, &labels).increment(1);
    histogram!(names::RUN_DURATION_SECONDS, &labels).record(elapsed_secs);
    histogram!(names::OUTPUT_DURATION_SECONDS, &labels).record(output_secs);
}

/// Record a failed run.
pub fn record_run_failure(mode: &'static str, stage: Option<PipelineStage>, kind: FailureKind) {
    counter!(names::RUNS_TOTAL, &[("mode", mode)]).increment(1);

    let labels = [
        ("mode", mode),
        ("stage", stage.map(|s| s.as_str()).unwrap_or("setup")),
        ("kind", kind.as_str()),
    ];
    counter!(names::RUNS_FAILED_TOTAL, &labels).increment(1);
}

/// Record how far a narration cue was pushed from its anchor.
pub fn record_narration_drift(drift_secs: f64) {
    histogram!(names::NARRATION_DRIFT_SECONDS).record(drift_secs);
}
