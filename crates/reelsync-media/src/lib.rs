//! FFmpeg CLI boundary for ReelSync.
//!
//! This crate provides:
//! - A command builder and runner with timeout, cancellation and a
//!   diagnostic tail on failure
//! - FFprobe-based media probing
//! - A typed filter graph serialized to FFmpeg syntax at the last moment
//! - The sequential render stages that turn a `RenderPlan` into a file

pub mod command;
pub mod concat;
pub mod engine;
pub mod error;
pub mod filter_graph;
pub mod filters;
pub mod frame;
pub mod probe;
pub mod progress;
pub mod render;

pub use command::{check_ffmpeg, check_ffprobe, FfmpegCommand, FfmpegRunner};
pub use engine::{DryRunEngine, MediaEngine, RenderStage};
pub use error::{MediaError, MediaResult};
pub use filter_graph::{Filter, FilterChain, FilterGraph};
pub use probe::{FfprobeProbe, MediaInfo, MediaProbe};
pub use progress::FfmpegProgress;
pub use render::{FontSet, RenderOutcome, Renderer, StageReport};
