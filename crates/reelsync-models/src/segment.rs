//! Speed segment definitions.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// A sub-interval of the source timeline played back at a fixed rate.
///
/// `end_secs: None` runs the segment to the end of the source; it is
/// resolved lazily once the source duration has been probed.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct SpeedSegment {
    /// Start on the source timeline (seconds)
    pub start_secs: f64,
    /// End on the source timeline (seconds), `None` for end of stream
    #[serde(default)]
    pub end_secs: Option<f64>,
    /// Playback rate multiplier (2.0 plays twice as fast)
    pub speed: f64,
}

impl SpeedSegment {
    /// Create a segment with an explicit end.
    pub fn new(start_secs: f64, end_secs: f64, speed: f64) -> Self {
        Self {
            start_secs,
            end_secs: Some(end_secs),
            speed,
        }
    }

    /// Create a segment that runs to the end of the source.
    pub fn to_end(start_secs: f64, speed: f64) -> Self {
        Self {
            start_secs,
            end_secs: None,
            speed,
        }
    }

    /// Resolve the end against the probed source duration.
    ///
    /// Explicit ends past the source are truncated to it.
    pub fn resolved_end(&self, source_duration_secs: f64) -> f64 {
        match self.end_secs {
            Some(end) => end.min(source_duration_secs),
            None => source_duration_secs,
        }
    }

    /// Whether this segment plays at the original rate.
    pub fn is_identity(&self) -> bool {
        (self.speed - 1.0).abs() < f64::EPSILON
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolved_end() {
        assert_eq!(SpeedSegment::new(0.0, 5.0, 2.0).resolved_end(9.0), 5.0);
        assert_eq!(SpeedSegment::new(5.0, 12.0, 1.0).resolved_end(9.0), 9.0);
        assert_eq!(SpeedSegment::to_end(5.0, 1.0).resolved_end(9.0), 9.0);
    }

    #[test]
    fn test_open_end_deserializes() {
        let seg: SpeedSegment =
            serde_json::from_str(r#"{"start_secs": 48.0, "speed": 1.0}"#).unwrap();
        assert_eq!(seg.end_secs, None);
        assert!(seg.is_identity());
    }
}
