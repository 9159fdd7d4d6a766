//! Source-to-output time mapping over piecewise speed segments.

use reelsync_models::{SpeedSegment, TimeRef};

use crate::error::{TimelineError, TimelineResult};

/// Tolerance for segment boundary comparisons.
const BOUNDARY_EPSILON: f64 = 1e-6;

/// A speed segment with its end resolved against the source duration.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ResolvedSegment {
    pub start: f64,
    pub end: f64,
    pub speed: f64,
}

impl ResolvedSegment {
    /// Length of the segment on the output timeline.
    pub fn output_len(&self) -> f64 {
        (self.end - self.start) / self.speed
    }
}

/// Maps source instants to the piecewise speed-adjusted output timeline.
///
/// Built once per run. Every query is a pure walk over the segments, so
/// repeated calls with the same input return identical results.
#[derive(Debug, Clone, PartialEq)]
pub struct TimeMapping {
    segments: Vec<ResolvedSegment>,
    source_duration: f64,
    output_duration: f64,
}

impl TimeMapping {
    /// Build a mapping, rejecting segment sets that do not tile
    /// `[0, source_duration)` exactly once.
    pub fn new(segments: &[SpeedSegment], source_duration: f64) -> TimelineResult<Self> {
        if !source_duration.is_finite() || source_duration <= 0.0 {
            return Err(TimelineError::configuration(format!(
                "source duration must be positive, got {}",
                source_duration
            )));
        }
        if segments.is_empty() {
            return Err(TimelineError::configuration("no speed segments given"));
        }

        let mut resolved = Vec::with_capacity(segments.len());
        let mut expected_start = 0.0;
        let last = segments.len() - 1;

        for (i, seg) in segments.iter().enumerate() {
            if !seg.speed.is_finite() || seg.speed <= 0.0 {
                return Err(TimelineError::configuration(format!(
                    "segment {} has non-positive speed {}",
                    i, seg.speed
                )));
            }
            if !seg.start_secs.is_finite() {
                return Err(TimelineError::configuration(format!(
                    "segment {} has an invalid start",
                    i
                )));
            }
            if seg.end_secs.is_none() && i != last {
                return Err(TimelineError::configuration(format!(
                    "only the last segment may run to the end of the source (segment {})",
                    i
                )));
            }
            if let Some(end) = seg.end_secs {
                if !end.is_finite() || end <= seg.start_secs + BOUNDARY_EPSILON {
                    return Err(TimelineError::configuration(format!(
                        "segment {} is empty or reversed ({} -> {})",
                        i, seg.start_secs, end
                    )));
                }
            }

            let delta = seg.start_secs - expected_start;
            if delta > BOUNDARY_EPSILON {
                return Err(TimelineError::configuration(format!(
                    "gap in speed segments between {:.3}s and {:.3}s",
                    expected_start, seg.start_secs
                )));
            }
            if delta < -BOUNDARY_EPSILON {
                return Err(TimelineError::configuration(format!(
                    "segment {} starting at {:.3}s overlaps the previous one ending at {:.3}s",
                    i, seg.start_secs, expected_start
                )));
            }
            if seg.start_secs >= source_duration - BOUNDARY_EPSILON {
                return Err(TimelineError::configuration(format!(
                    "segment {} starts at {:.3}s, at or beyond the source end {:.3}s",
                    i, seg.start_secs, source_duration
                )));
            }

            let end = seg.resolved_end(source_duration);
            resolved.push(ResolvedSegment {
                start: expected_start,
                end,
                speed: seg.speed,
            });
            expected_start = end;
        }

        if expected_start < source_duration - BOUNDARY_EPSILON {
            return Err(TimelineError::configuration(format!(
                "speed segments stop at {:.3}s but the source lasts {:.3}s",
                expected_start, source_duration
            )));
        }

        let output_duration = resolved.iter().map(ResolvedSegment::output_len).sum();
        Ok(Self {
            segments: resolved,
            source_duration,
            output_duration,
        })
    }

    /// Mapping that plays the whole source at its original rate.
    pub fn identity(source_duration: f64) -> TimelineResult<Self> {
        Self::new(&[SpeedSegment::to_end(0.0, 1.0)], source_duration)
    }

    /// Map a source instant to the output timeline.
    ///
    /// Instants before the first segment map to 0; instants at or past the
    /// source end map to the output duration.
    pub fn map(&self, t: f64) -> f64 {
        let mut accumulated = 0.0;
        for seg in &self.segments {
            if t <= seg.start {
                return accumulated;
            }
            if t < seg.end {
                return accumulated + (t - seg.start) / seg.speed;
            }
            accumulated += seg.output_len();
        }
        self.output_duration
    }

    /// Map a source instant, rejecting instants outside `[0, source_duration]`.
    pub fn try_map(&self, t: f64) -> TimelineResult<f64> {
        if !t.is_finite() || t < -BOUNDARY_EPSILON || t > self.source_duration + BOUNDARY_EPSILON
        {
            return Err(TimelineError::conflict(format!(
                "source time {}s lies outside the source [0, {:.3}]",
                t, self.source_duration
            )));
        }
        Ok(self.map(t))
    }

    /// Resolve a cue anchor to an output instant within `[0, output_duration]`.
    pub fn resolve(&self, time: &TimeRef) -> TimelineResult<f64> {
        match *time {
            TimeRef::Source(t) => self.try_map(t),
            TimeRef::Output(t) => {
                if !t.is_finite() || t < 0.0 || t > self.output_duration + BOUNDARY_EPSILON {
                    return Err(TimelineError::conflict(format!(
                        "output time {}s lies outside the output [0, {:.3}]",
                        t, self.output_duration
                    )));
                }
                Ok(t)
            }
        }
    }

    /// Resolve a cue anchor without bounds checks; source instants are
    /// clamped by [`TimeMapping::map`], output instants are returned as-is.
    pub fn resolve_lenient(&self, time: &TimeRef) -> f64 {
        match *time {
            TimeRef::Source(t) => self.map(t),
            TimeRef::Output(t) => t,
        }
    }

    pub fn segments(&self) -> &[ResolvedSegment] {
        &self.segments
    }

    pub fn source_duration(&self) -> f64 {
        self.source_duration
    }

    pub fn output_duration(&self) -> f64 {
        self.output_duration
    }

    /// Output windows of each segment, in source order.
    pub fn output_windows(&self) -> Vec<(f64, f64)> {
        let mut start = 0.0;
        self.segments
            .iter()
            .map(|seg| {
                let end = start + seg.output_len();
                let window = (start, end);
                start = end;
                window
            })
            .collect()
    }

    pub fn is_identity(&self) -> bool {
        self.segments
            .iter()
            .all(|seg| (seg.speed - 1.0).abs() < f64::EPSILON)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn two_speed() -> TimeMapping {
        TimeMapping::new(
            &[SpeedSegment::new(0.0, 5.0, 2.0), SpeedSegment::new(5.0, 9.0, 1.0)],
            9.0,
        )
        .unwrap()
    }

    #[test]
    fn test_map_within_segments() {
        let m = two_speed();
        assert_eq!(m.map(0.0), 0.0);
        assert_eq!(m.map(2.0), 1.0);
        assert_eq!(m.map(5.0), 2.5);
        assert_eq!(m.map(7.0), 4.5);
        assert_eq!(m.map(9.0), 6.5);
        assert_eq!(m.map(100.0), 6.5);
        assert_eq!(m.output_duration(), 6.5);
    }

    #[test]
    fn test_open_end_resolved() {
        let m = TimeMapping::new(
            &[SpeedSegment::new(0.0, 18.0, 2.0), SpeedSegment::to_end(18.0, 1.0)],
            30.0,
        )
        .unwrap();
        assert_eq!(m.segments()[1].end, 30.0);
        assert_eq!(m.map(18.0), 9.0);
        assert_eq!(m.output_duration(), 21.0);
    }

    #[test]
    fn test_explicit_end_truncated() {
        let m = TimeMapping::new(&[SpeedSegment::new(0.0, 12.0, 1.0)], 10.0).unwrap();
        assert_eq!(m.output_duration(), 10.0);
    }

    #[test]
    fn test_rejects_bad_segments() {
        let cases: Vec<(Vec<SpeedSegment>, f64)> = vec![
            (vec![], 10.0),
            (vec![SpeedSegment::new(1.0, 10.0, 1.0)], 10.0),
            (vec![SpeedSegment::new(0.0, 10.0, 0.0)], 10.0),
            (vec![SpeedSegment::new(0.0, 10.0, -1.0)], 10.0),
            (vec![SpeedSegment::new(0.0, 0.0, 1.0)], 10.0),
            (vec![SpeedSegment::new(0.0, 8.0, 1.0)], 10.0),
            (
                vec![SpeedSegment::to_end(0.0, 1.0), SpeedSegment::to_end(5.0, 1.0)],
                10.0,
            ),
            (
                vec![SpeedSegment::new(0.0, 6.0, 1.0), SpeedSegment::new(5.0, 10.0, 1.0)],
                10.0,
            ),
            (
                vec![SpeedSegment::new(0.0, 12.0, 1.0), SpeedSegment::to_end(12.0, 1.0)],
                10.0,
            ),
            (vec![SpeedSegment::to_end(0.0, 1.0)], 0.0),
        ];
        for (segments, duration) in cases {
            let result = TimeMapping::new(&segments, duration);
            assert!(
                matches!(result, Err(TimelineError::Configuration(_))),
                "expected rejection for {:?} over {}",
                segments,
                duration
            );
        }
    }

    #[test]
    fn test_try_map_bounds() {
        let m = two_speed();
        assert!(m.try_map(9.0).is_ok());
        assert!(matches!(
            m.try_map(9.5),
            Err(TimelineError::SchedulingConflict(_))
        ));
        assert!(m.try_map(-1.0).is_err());
        assert!(m.try_map(f64::NAN).is_err());
    }

    #[test]
    fn test_resolve_time_refs() {
        let m = two_speed();
        assert_eq!(m.resolve(&TimeRef::Source(5.0)).unwrap(), 2.5);
        assert_eq!(m.resolve(&TimeRef::Output(5.0)).unwrap(), 5.0);
        assert!(m.resolve(&TimeRef::Output(7.0)).is_err());
        assert_eq!(m.resolve_lenient(&TimeRef::Output(7.0)), 7.0);
    }

    #[test]
    fn test_output_windows_tile_output() {
        let m = two_speed();
        assert_eq!(m.output_windows(), vec![(0.0, 2.5), (2.5, 6.5)]);
        assert!(!m.is_identity());
        assert!(TimeMapping::identity(4.0).unwrap().is_identity());
    }
}
