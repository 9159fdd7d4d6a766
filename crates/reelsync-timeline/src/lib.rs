//! Timeline synchronization engine.
//!
//! Reconciles three timelines into one collision-free schedule:
//! - the source's wall-clock time
//! - the piecewise speed-adjusted output time ([`TimeMapping`])
//! - the variable-length synthesized narration ([`NarrationScheduler`])
//!
//! Everything here is pure and performs no IO; TTS durations and probed
//! source lengths are passed in by the caller.

pub mod compositor;
pub mod cues;
pub mod error;
pub mod mapping;
pub mod reconcile;
pub mod scheduler;
pub mod subtitles;
pub mod tempo;

pub use compositor::{retimed_track, stills_track, verify_plan, CompositionInput, TimelineCompositor};
pub use error::{TimelineError, TimelineResult};
pub use mapping::{ResolvedSegment, TimeMapping};
pub use reconcile::{
    anchor_before_end, reconcile, DurationReconciler, Window, WindowLayout, WindowRequest,
};
pub use scheduler::{NarrationRequest, NarrationScheduler, Placement};
pub use subtitles::{to_srt, SubtitleEntry};
pub use tempo::tempo_chain;
