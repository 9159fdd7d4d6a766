//! ReelSync shorts pipeline.
//!
//! Collapses the per-video scripts into one parameterized run:
//! `source × speed segments × captions × narration -> RenderPlan -> file`.

pub mod config;
pub mod error;
pub mod logging;
pub mod metrics;
pub mod narration;
pub mod pipeline;
pub mod planner;

pub use config::{load_job, RunConfig};
pub use error::{FailureKind, PipelineError, PipelineResult, PipelineStage};
pub use logging::RunLogger;
pub use narration::{synthesize_all, NarrationLine};
pub use pipeline::{subtitle_entries, RunReport, ShortsPipeline};
pub use planner::{PlanDraft, Planner};
