//! Resolved render plan types.
//!
//! A [`RenderPlan`] is the collision-free description of one run's output.
//! It is built once, checked with [`RenderPlan::validate`], handed to the
//! media engine and then dropped.

use std::path::PathBuf;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::encoding::EncodingConfig;
use crate::style::{CaptionStyle, Canvas};

/// Tolerance used when comparing output-timeline instants.
pub const PLAN_TOLERANCE_SECS: f64 = 1e-3;

/// A payload placed on the output timeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ScheduledEvent<P> {
    pub output_start: f64,
    pub output_end: f64,
    pub payload: P,
}

impl<P> ScheduledEvent<P> {
    pub fn new(output_start: f64, output_end: f64, payload: P) -> Self {
        Self {
            output_start,
            output_end,
            payload,
        }
    }

    pub fn duration(&self) -> f64 {
        self.output_end - self.output_start
    }

    /// Whether `other` starts before this event ends plus `gap`.
    pub fn collides_with(&self, other: &ScheduledEvent<P>, gap: f64) -> bool {
        let (first, second) = if self.output_start <= other.output_start {
            (self, other)
        } else {
            (other, self)
        };
        first.output_end + gap > second.output_start + PLAN_TOLERANCE_SECS
    }
}

/// Synthesized speech for one narration cue. Immutable once measured.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct NarrationAsset {
    /// Index of the cue in declaration order
    pub cue_index: usize,
    pub text: String,
    pub audio_path: PathBuf,
    pub duration_secs: f64,
}

/// Static content of an overlaid caption.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct CaptionContent {
    pub text: String,
    pub style: CaptionStyle,
}

/// Trim + retime of one speed segment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct RetimeInstruction {
    pub source_start: f64,
    pub source_end: f64,
    pub speed: f64,
    /// Audio tempo factors whose product is `speed`, each within `[0.5, 2.0]`
    pub tempo_chain: Vec<f64>,
}

/// A frame sampled from the source and held for the event's window.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct StillFrame {
    pub frame_at_secs: f64,
}

/// The visual track of the output.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum VideoTrack {
    /// Source footage cut into speed segments, concatenated in source order
    Retimed {
        source: PathBuf,
        has_audio: bool,
        segments: Vec<ScheduledEvent<RetimeInstruction>>,
    },
    /// Still frames held end to end
    Stills {
        source: PathBuf,
        clips: Vec<ScheduledEvent<StillFrame>>,
    },
}

impl VideoTrack {
    pub fn source(&self) -> &PathBuf {
        match self {
            Self::Retimed { source, .. } | Self::Stills { source, .. } => source,
        }
    }

    /// Output windows of the track's clips, in order.
    pub fn windows(&self) -> Vec<(f64, f64)> {
        match self {
            Self::Retimed { segments, .. } => segments
                .iter()
                .map(|e| (e.output_start, e.output_end))
                .collect(),
            Self::Stills { clips, .. } => clips
                .iter()
                .map(|e| (e.output_start, e.output_end))
                .collect(),
        }
    }

    /// Sum of clip window lengths.
    pub fn duration(&self) -> f64 {
        self.windows().iter().map(|(s, e)| e - s).sum()
    }
}

/// One entry of the audio mix.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct NarrationPlacement {
    pub cue_index: usize,
    pub text: String,
    pub audio_path: PathBuf,
    /// Channel delay applied before mixing
    pub delay_ms: u64,
    pub gain: f32,
}

/// Audio mixed under all narration for the whole output.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum BackgroundAudio {
    /// The retimed source soundtrack, attenuated
    SourceTrack { gain: f32 },
    /// Generated silence (stills mode, or a source without audio)
    Silence,
}

/// Fully resolved description of what to render.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct RenderPlan {
    pub total_duration_secs: f64,
    pub video: VideoTrack,
    /// Visual overlays; layering is permitted
    pub captions: Vec<ScheduledEvent<CaptionContent>>,
    /// The single narration channel
    pub narration: Vec<ScheduledEvent<NarrationPlacement>>,
    pub background: BackgroundAudio,
    /// Minimum silence between narration events
    pub min_gap_secs: f64,
    #[serde(default)]
    pub canvas: Option<Canvas>,
    #[serde(default)]
    pub encoding: EncodingConfig,
}

impl RenderPlan {
    /// Check the plan's internal consistency.
    ///
    /// - video clips are contiguous from 0 and sum to the declared total
    /// - captions and narration lie within `[0, total]`
    /// - narration events keep `min_gap_secs` between each other
    pub fn validate(&self) -> Result<(), String> {
        let total = self.total_duration_secs;
        if !total.is_finite() || total <= 0.0 {
            return Err(format!("total duration must be positive, got {}", total));
        }

        let windows = self.video.windows();
        if windows.is_empty() {
            return Err("video track has no clips".to_string());
        }
        let mut cursor = 0.0;
        for (i, (start, end)) in windows.iter().enumerate() {
            if (start - cursor).abs() > PLAN_TOLERANCE_SECS {
                return Err(format!(
                    "video clip {} starts at {:.3}s, expected {:.3}s",
                    i, start, cursor
                ));
            }
            if end <= start {
                return Err(format!("video clip {} has an empty window", i));
            }
            cursor = *end;
        }
        let video_duration = self.video.duration();
        if (video_duration - total).abs() > PLAN_TOLERANCE_SECS {
            return Err(format!(
                "video track lasts {:.3}s but plan declares {:.3}s",
                video_duration, total
            ));
        }

        for (i, caption) in self.captions.iter().enumerate() {
            if caption.output_start < 0.0
                || caption.output_end > total + PLAN_TOLERANCE_SECS
                || caption.output_end < caption.output_start
            {
                return Err(format!(
                    "caption {} [{:.3}, {:.3}] lies outside [0, {:.3}]",
                    i, caption.output_start, caption.output_end, total
                ));
            }
        }

        for (i, event) in self.narration.iter().enumerate() {
            if event.output_start < 0.0
                || event.output_end > total + PLAN_TOLERANCE_SECS
                || event.output_end <= event.output_start
            {
                return Err(format!(
                    "narration {} [{:.3}, {:.3}] lies outside [0, {:.3}]",
                    i, event.output_start, event.output_end, total
                ));
            }
        }
        for (i, pair) in self.narration.windows(2).enumerate() {
            if pair[0].collides_with(&pair[1], self.min_gap_secs) {
                return Err(format!(
                    "narration {} and {} overlap or are closer than {:.3}s",
                    i,
                    i + 1,
                    self.min_gap_secs
                ));
            }
        }

        Ok(())
    }

    pub fn caption_count(&self) -> usize {
        self.captions.len()
    }
}
