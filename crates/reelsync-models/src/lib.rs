//! Shared data models for the ReelSync shorts pipeline.
//!
//! This crate provides Serde-serializable types for:
//! - Job manifests (speed segments, captions, narration, slides)
//! - Caption styles and the output canvas
//! - Encoding configuration
//! - The resolved render plan handed to the media engine

pub mod cue;
pub mod encoding;
pub mod job;
pub mod plan;
pub mod segment;
pub mod style;
pub mod timestamp;

// Re-export common types
pub use cue::{CallToAction, CaptionCue, CtaLine, NarrationCue, RateAdjustment, SlideCue, TimeRef};
pub use encoding::EncodingConfig;
pub use job::{JobError, MixSettings, ShortsJob, VideoMode};
pub use plan::{
    BackgroundAudio, CaptionContent, NarrationAsset, NarrationPlacement, RenderPlan,
    RetimeInstruction, ScheduledEvent, StillFrame, VideoTrack, PLAN_TOLERANCE_SECS,
};
pub use segment::SpeedSegment;
pub use style::{Canvas, CaptionPosition, CaptionStyle, FontWeight};
pub use timestamp::{format_srt_timestamp, parse_timestamp, TimestampError};
