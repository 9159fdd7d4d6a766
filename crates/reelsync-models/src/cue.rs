//! Caption, narration and slide cues as declared in a job manifest.

use std::fmt;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::style::CaptionStyle;

/// An instant on either the source or the output timeline.
///
/// Source instants are mapped through the speed segments before use;
/// output instants are taken as-is.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum TimeRef {
    Source(f64),
    Output(f64),
}

impl TimeRef {
    /// Raw seconds value, regardless of timeline.
    pub fn secs(&self) -> f64 {
        match *self {
            Self::Source(t) | Self::Output(t) => t,
        }
    }

    pub fn is_source(&self) -> bool {
        matches!(self, Self::Source(_))
    }
}

impl fmt::Display for TimeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Source(t) => write!(f, "source@{:.3}s", t),
            Self::Output(t) => write!(f, "output@{:.3}s", t),
        }
    }
}

/// Speaking-rate modifier in whole percent (`+10%`, `-5%`).
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, JsonSchema,
)]
#[serde(transparent)]
pub struct RateAdjustment(pub i32);

impl RateAdjustment {
    pub const NORMAL: Self = Self(0);

    pub fn percent(self) -> i32 {
        self.0
    }
}

impl fmt::Display for RateAdjustment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:+}%", self.0)
    }
}

/// A caption shown over a window of the output.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct CaptionCue {
    pub start: TimeRef,
    /// `None` keeps the caption visible until the end of the video
    #[serde(default)]
    pub end: Option<TimeRef>,
    pub text: String,
    #[serde(default)]
    pub style: CaptionStyle,
}

impl CaptionCue {
    pub fn new(start: TimeRef, end: Option<TimeRef>, text: impl Into<String>) -> Self {
        Self {
            start,
            end,
            text: text.into(),
            style: CaptionStyle::default(),
        }
    }

    pub fn with_style(mut self, style: CaptionStyle) -> Self {
        self.style = style;
        self
    }
}

/// A line of narration anchored to an instant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct NarrationCue {
    pub at: TimeRef,
    pub text: String,
    #[serde(default)]
    pub rate: RateAdjustment,
}

impl NarrationCue {
    pub fn new(at: TimeRef, text: impl Into<String>) -> Self {
        Self {
            at,
            text: text.into(),
            rate: RateAdjustment::NORMAL,
        }
    }
}

/// A still frame sampled from the source and held on screen.
///
/// The hold is reconciled against the narration length once it is known.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct SlideCue {
    /// Source timestamp of the frame to sample
    pub frame_at_secs: f64,
    /// Requested window length before reconciliation
    #[serde(default)]
    pub nominal_secs: f64,
    /// Shortest acceptable window
    #[serde(default = "default_min_hold")]
    pub min_hold_secs: f64,
    /// Caption shown for the whole window
    #[serde(default)]
    pub caption: Option<String>,
    /// Narration spoken over the window
    #[serde(default)]
    pub narration: Option<String>,
    #[serde(default)]
    pub rate: RateAdjustment,
    /// Overrides the job's default slide caption style
    #[serde(default)]
    pub style: Option<CaptionStyle>,
}

fn default_min_hold() -> f64 {
    3.0
}

impl SlideCue {
    pub fn new(frame_at_secs: f64) -> Self {
        Self {
            frame_at_secs,
            nominal_secs: 0.0,
            min_hold_secs: default_min_hold(),
            caption: None,
            narration: None,
            rate: RateAdjustment::NORMAL,
            style: None,
        }
    }

    pub fn with_caption(mut self, caption: impl Into<String>) -> Self {
        self.caption = Some(caption.into());
        self
    }

    pub fn with_narration(mut self, narration: impl Into<String>) -> Self {
        self.narration = Some(narration.into());
        self
    }
}

/// One line of the closing call to action.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct CtaLine {
    pub text: String,
    #[serde(default = "CaptionStyle::call_to_action")]
    pub style: CaptionStyle,
}

/// Closing captions anchored to "total output duration minus `lead_secs`".
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct CallToAction {
    pub lines: Vec<CtaLine>,
    #[serde(default = "default_cta_lead")]
    pub lead_secs: f64,
}

fn default_cta_lead() -> f64 {
    5.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_time_ref_json() {
        let r: TimeRef = serde_json::from_str(r#"{"source": 18.0}"#).unwrap();
        assert_eq!(r, TimeRef::Source(18.0));
        assert!(r.is_source());
        let r: TimeRef = serde_json::from_str(r#"{"output": 2.5}"#).unwrap();
        assert_eq!(r.secs(), 2.5);
    }

    #[test]
    fn test_rate_display() {
        assert_eq!(RateAdjustment(10).to_string(), "+10%");
        assert_eq!(RateAdjustment(-5).to_string(), "-5%");
        assert_eq!(RateAdjustment::NORMAL.to_string(), "+0%");
    }

    #[test]
    fn test_rate_is_transparent() {
        let cue: NarrationCue =
            serde_json::from_str(r#"{"at": {"output": 1.0}, "text": "hi", "rate": 15}"#).unwrap();
        assert_eq!(cue.rate, RateAdjustment(15));
    }

    #[test]
    fn test_cta_defaults() {
        let cta: CallToAction =
            serde_json::from_str(r#"{"lines": [{"text": "Follow for more"}]}"#).unwrap();
        assert_eq!(cta.lead_secs, 5.0);
        assert_eq!(cta.lines[0].style, CaptionStyle::call_to_action());
    }

    #[test]
    fn test_slide_defaults() {
        let slide: SlideCue = serde_json::from_str(r#"{"frame_at_secs": 12.0}"#).unwrap();
        assert_eq!(slide.min_hold_secs, 3.0);
        assert_eq!(slide.nominal_secs, 0.0);
        assert!(slide.narration.is_none());
    }
}
