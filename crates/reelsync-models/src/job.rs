//! Shorts job manifest.

use std::path::PathBuf;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::cue::{CallToAction, CaptionCue, NarrationCue, SlideCue, TimeRef};
use crate::encoding::EncodingConfig;
use crate::segment::SpeedSegment;
use crate::style::{CaptionPosition, CaptionStyle, Canvas};

/// Manifest loading errors.
#[derive(Debug, Error)]
pub enum JobError {
    #[error("Failed to parse job manifest: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Invalid job manifest: {0}")]
    Invalid(String),
}

/// How the visual track is produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VideoMode {
    /// Source footage cut into speed segments
    Retimed,
    /// Sampled still frames held for reconciled windows
    Stills,
}

impl VideoMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Retimed => "retimed",
            Self::Stills => "stills",
        }
    }
}

/// Audio mixing and timing knobs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct MixSettings {
    /// Gain of the source soundtrack; defaults to 0.3 for retimed footage
    /// and 0.0 for still frames
    #[serde(default)]
    pub background_gain: Option<f32>,
    #[serde(default = "default_narration_gain")]
    pub narration_gain: f32,
    /// Minimum silence between narration events
    #[serde(default = "default_min_gap")]
    pub min_gap_secs: f64,
    /// Tail added after each narration when reconciling windows
    #[serde(default = "default_safety_margin")]
    pub safety_margin_secs: f64,
    /// Delay between a slide's start and its narration
    #[serde(default = "default_lead_in")]
    pub narration_lead_in_secs: f64,
    /// Caption inset from each slide edge
    #[serde(default = "default_caption_inset")]
    pub caption_inset_secs: f64,
    /// Fixed buffer inserted between reconciled windows
    #[serde(default)]
    pub window_buffer_secs: f64,
    /// Narration pushed later than this from its anchor is reported
    #[serde(default = "default_drift_warning")]
    pub drift_warning_secs: f64,
}

fn default_narration_gain() -> f32 {
    1.5
}
fn default_min_gap() -> f64 {
    0.3
}
fn default_safety_margin() -> f64 {
    0.5
}
fn default_lead_in() -> f64 {
    0.3
}
fn default_caption_inset() -> f64 {
    0.2
}
fn default_drift_warning() -> f64 {
    2.0
}

impl Default for MixSettings {
    fn default() -> Self {
        Self {
            background_gain: None,
            narration_gain: default_narration_gain(),
            min_gap_secs: default_min_gap(),
            safety_margin_secs: default_safety_margin(),
            narration_lead_in_secs: default_lead_in(),
            caption_inset_secs: default_caption_inset(),
            window_buffer_secs: 0.0,
            drift_warning_secs: default_drift_warning(),
        }
    }
}

impl MixSettings {
    /// Background gain for the given mode.
    pub fn background_gain_for(&self, mode: VideoMode) -> f32 {
        self.background_gain.unwrap_or(match mode {
            VideoMode::Retimed => 0.3,
            VideoMode::Stills => 0.0,
        })
    }

    pub fn validate(&self) -> Result<(), String> {
        let non_negative = [
            ("min_gap_secs", self.min_gap_secs),
            ("safety_margin_secs", self.safety_margin_secs),
            ("narration_lead_in_secs", self.narration_lead_in_secs),
            ("caption_inset_secs", self.caption_inset_secs),
            ("window_buffer_secs", self.window_buffer_secs),
            ("drift_warning_secs", self.drift_warning_secs),
        ];
        for (name, value) in non_negative {
            if !value.is_finite() || value < 0.0 {
                return Err(format!("{} must be a non-negative number, got {}", name, value));
            }
        }
        if let Some(gain) = self.background_gain {
            if !gain.is_finite() || gain < 0.0 {
                return Err(format!("background_gain must be non-negative, got {}", gain));
            }
        }
        if !self.narration_gain.is_finite() || self.narration_gain < 0.0 {
            return Err(format!(
                "narration_gain must be non-negative, got {}",
                self.narration_gain
            ));
        }
        Ok(())
    }
}

fn default_slide_caption_style() -> CaptionStyle {
    CaptionStyle {
        size: 48,
        position: CaptionPosition::Bottom { margin: 160 },
        ..CaptionStyle::default()
    }
}

/// One shorts video: `source × speed_segments × captions × narration`, or
/// a sequence of still-frame slides sampled from the source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ShortsJob {
    /// Output base name (`<name>.mp4`)
    pub name: String,
    /// Source media asset
    pub source: PathBuf,
    /// TTS voice; falls back to the configured default
    #[serde(default)]
    pub voice: Option<String>,
    /// Piecewise playback rates; empty means the whole source at 1.0x
    #[serde(default)]
    pub speed_segments: Vec<SpeedSegment>,
    #[serde(default)]
    pub captions: Vec<CaptionCue>,
    #[serde(default)]
    pub narration: Vec<NarrationCue>,
    /// Non-empty selects still-frame mode
    #[serde(default)]
    pub slides: Vec<SlideCue>,
    #[serde(default = "default_slide_caption_style")]
    pub slide_caption_style: CaptionStyle,
    #[serde(default)]
    pub cta: Option<CallToAction>,
    /// Vertical blur-fill layout; `None` keeps the source framing
    #[serde(default)]
    pub canvas: Option<Canvas>,
    #[serde(default)]
    pub mix: MixSettings,
    #[serde(default)]
    pub encoding: EncodingConfig,
    /// Also write `<name>.srt`
    #[serde(default)]
    pub subtitles: bool,
}

impl ShortsJob {
    /// Parse and validate a JSON manifest.
    pub fn from_json(json: &str) -> Result<Self, JobError> {
        let job: Self = serde_json::from_str(json)?;
        job.validate().map_err(JobError::Invalid)?;
        Ok(job)
    }

    pub fn mode(&self) -> VideoMode {
        if self.slides.is_empty() {
            VideoMode::Retimed
        } else {
            VideoMode::Stills
        }
    }

    /// Structural checks that need no media probing.
    ///
    /// Speed segment coverage is checked once the source duration is known.
    pub fn validate(&self) -> Result<(), String> {
        if self.name.trim().is_empty() {
            return Err("name cannot be empty".to_string());
        }
        if self
            .name
            .chars()
            .any(|c| matches!(c, '/' | '\\' | ':' | '\0'))
        {
            return Err(format!("name '{}' contains path characters", self.name));
        }
        if self.source.as_os_str().is_empty() {
            return Err("source cannot be empty".to_string());
        }

        self.mix.validate()?;
        self.encoding.validate()?;

        for (i, caption) in self.captions.iter().enumerate() {
            if caption.text.trim().is_empty() {
                return Err(format!("caption {} has empty text", i));
            }
            check_time_ref(&caption.start, "caption", i)?;
            if let Some(end) = &caption.end {
                check_time_ref(end, "caption", i)?;
            }
        }
        for (i, cue) in self.narration.iter().enumerate() {
            if cue.text.trim().is_empty() {
                return Err(format!("narration {} has empty text", i));
            }
            check_time_ref(&cue.at, "narration", i)?;
        }
        if let Some(cta) = &self.cta {
            if cta.lines.is_empty() {
                return Err("cta must have at least one line".to_string());
            }
            if !cta.lead_secs.is_finite() || cta.lead_secs <= 0.0 {
                return Err(format!("cta lead_secs must be positive, got {}", cta.lead_secs));
            }
        }

        match self.mode() {
            VideoMode::Retimed => Ok(()),
            VideoMode::Stills => self.validate_stills(),
        }
    }

    fn validate_stills(&self) -> Result<(), String> {
        if !self.speed_segments.is_empty() {
            return Err("speed_segments and slides are mutually exclusive".to_string());
        }
        if !self.narration.is_empty() {
            return Err("still-frame jobs take narration from their slides".to_string());
        }
        if let Some(i) = self.captions.iter().position(|c| {
            c.start.is_source() || c.end.map(|e| e.is_source()).unwrap_or(false)
        }) {
            return Err(format!(
                "caption {} references the source timeline, which still-frame jobs do not play",
                i
            ));
        }
        for (i, slide) in self.slides.iter().enumerate() {
            if !slide.frame_at_secs.is_finite() || slide.frame_at_secs < 0.0 {
                return Err(format!("slide {} has an invalid frame timestamp", i));
            }
            if !slide.nominal_secs.is_finite() || slide.nominal_secs < 0.0 {
                return Err(format!("slide {} has a negative nominal window", i));
            }
            if !slide.min_hold_secs.is_finite() || slide.min_hold_secs < 0.0 {
                return Err(format!("slide {} has a negative minimum hold", i));
            }
            if slide.nominal_secs.max(slide.min_hold_secs) <= 0.0 && slide.narration.is_none() {
                return Err(format!("slide {} would be held for zero seconds", i));
            }
        }
        Ok(())
    }
}

fn check_time_ref(time: &TimeRef, kind: &str, index: usize) -> Result<(), String> {
    let t = time.secs();
    if !t.is_finite() || t < 0.0 {
        return Err(format!("{} {} has invalid time {}", kind, index, time));
    }
    Ok(())
}
