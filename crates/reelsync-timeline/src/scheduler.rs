//! Greedy narration scheduling on the single narration channel.
//!
//! Cues are processed in ascending desired start. Each cue starts at
//! `max(desired_start, previous_end + min_gap)` and is never revisited, so a
//! long early narration pushes every later one back. The push is reported
//! as drift and logged once it exceeds the warning threshold.

use reelsync_models::ScheduledEvent;
use tracing::{debug, warn};

use crate::error::{TimelineError, TimelineResult};

/// A narration cue waiting to be placed.
#[derive(Debug, Clone, PartialEq)]
pub struct NarrationRequest<P> {
    /// Desired start on the output timeline
    pub desired_start: f64,
    /// Measured length of the synthesized speech
    pub duration_secs: f64,
    pub payload: P,
}

/// Where a request ended up.
#[derive(Debug, Clone, PartialEq)]
pub struct Placement<P> {
    /// Position of the request in the input sequence
    pub index: usize,
    pub desired_start: f64,
    pub event: ScheduledEvent<P>,
}

impl<P> Placement<P> {
    /// How far the cue was pushed past its desired start.
    pub fn drift_secs(&self) -> f64 {
        self.event.output_start - self.desired_start
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NarrationScheduler {
    pub min_gap_secs: f64,
    pub drift_warning_secs: f64,
}

impl NarrationScheduler {
    pub fn new(min_gap_secs: f64, drift_warning_secs: f64) -> Self {
        Self {
            min_gap_secs,
            drift_warning_secs,
        }
    }

    /// Place every request within `[0, total_secs]` without overlap.
    ///
    /// Placements are returned in start order. Speech that runs past the
    /// end is cut at `total_secs`; a cue that cannot start before the end is
    /// a scheduling conflict.
    pub fn schedule<P>(
        &self,
        requests: Vec<NarrationRequest<P>>,
        total_secs: f64,
    ) -> TimelineResult<Vec<Placement<P>>> {
        for (i, req) in requests.iter().enumerate() {
            if !req.duration_secs.is_finite() || req.duration_secs <= 0.0 {
                return Err(TimelineError::InvalidNarrationDuration {
                    index: i,
                    duration_secs: req.duration_secs,
                });
            }
            if !req.desired_start.is_finite()
                || req.desired_start < 0.0
                || req.desired_start > total_secs
            {
                return Err(TimelineError::conflict(format!(
                    "narration {} wants to start at {}s, outside [0, {:.3}]",
                    i, req.desired_start, total_secs
                )));
            }
        }

        let mut ordered: Vec<(usize, NarrationRequest<P>)> =
            requests.into_iter().enumerate().collect();
        ordered.sort_by(|a, b| a.1.desired_start.total_cmp(&b.1.desired_start));

        let mut placements = Vec::with_capacity(ordered.len());
        let mut previous_end: Option<f64> = None;

        for (index, req) in ordered {
            let start = match previous_end {
                Some(end) => req.desired_start.max(end + self.min_gap_secs),
                None => req.desired_start,
            };
            if start >= total_secs {
                return Err(TimelineError::conflict(format!(
                    "narration {} pushed to {:.3}s, past the end of the output ({:.3}s)",
                    index, start, total_secs
                )));
            }

            let natural_end = start + req.duration_secs;
            let end = if natural_end > total_secs {
                warn!(
                    narration = index,
                    end_secs = natural_end,
                    total_secs,
                    "Narration runs past the end of the output and will be cut"
                );
                total_secs
            } else {
                natural_end
            };

            let drift = start - req.desired_start;
            if drift > self.drift_warning_secs {
                warn!(
                    narration = index,
                    desired_start = req.desired_start,
                    actual_start = start,
                    drift_secs = drift,
                    "Narration drifted from its anchor"
                );
            } else {
                debug!(narration = index, start_secs = start, end_secs = end, "Narration placed");
            }

            previous_end = Some(natural_end);
            placements.push(Placement {
                index,
                desired_start: req.desired_start,
                event: ScheduledEvent::new(start, end, req.payload),
            });
        }

        Ok(placements)
    }
}
