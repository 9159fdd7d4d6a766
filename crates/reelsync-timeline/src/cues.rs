//! Resolution of manifest cues onto the output timeline.

use reelsync_models::{
    CallToAction, CaptionContent, CaptionCue, CaptionStyle, NarrationCue, ScheduledEvent,
    SlideCue,
};

use crate::error::{TimelineError, TimelineResult};
use crate::mapping::TimeMapping;
use crate::reconcile::{anchor_before_end, WindowLayout};

/// Resolve caption windows through the mapping.
///
/// Captions without an end run to the output duration. Bounds are left to
/// the compositor, which clamps them.
pub fn resolve_captions(
    captions: &[CaptionCue],
    mapping: &TimeMapping,
) -> TimelineResult<Vec<ScheduledEvent<CaptionContent>>> {
    captions
        .iter()
        .enumerate()
        .map(|(i, cue)| {
            let start = mapping.resolve_lenient(&cue.start);
            let end = cue
                .end
                .as_ref()
                .map(|end| mapping.resolve_lenient(end))
                .unwrap_or_else(|| mapping.output_duration());
            if end < start {
                return Err(TimelineError::configuration(format!(
                    "caption {} ends ({:.3}s) before it starts ({:.3}s)",
                    i, end, start
                )));
            }
            Ok(ScheduledEvent::new(
                start,
                end,
                CaptionContent {
                    text: cue.text.clone(),
                    style: cue.style.clone(),
                },
            ))
        })
        .collect()
}

/// Desired output starts of narration cues. Anchors outside the source or
/// output range are rejected before anything is scheduled.
pub fn narration_anchors(cues: &[NarrationCue], mapping: &TimeMapping) -> TimelineResult<Vec<f64>> {
    cues.iter()
        .enumerate()
        .map(|(i, cue)| {
            mapping.resolve(&cue.at).map_err(|err| {
                TimelineError::conflict(format!("narration {} at {}: {}", i, cue.at, err))
            })
        })
        .collect()
}

/// Closing call-to-action lines, anchored `lead_secs` before `total_secs`.
pub fn cta_captions(cta: &CallToAction, total_secs: f64) -> Vec<ScheduledEvent<CaptionContent>> {
    let start = anchor_before_end(total_secs, cta.lead_secs);
    cta.lines
        .iter()
        .map(|line| {
            ScheduledEvent::new(
                start,
                total_secs,
                CaptionContent {
                    text: line.text.clone(),
                    style: line.style.clone(),
                },
            )
        })
        .collect()
}

/// Captions of still-frame slides, inset from each end of their span.
///
/// Spans too short for the inset keep the full span.
pub fn slide_captions(
    slides: &[SlideCue],
    layout: &WindowLayout,
    inset_secs: f64,
    default_style: &CaptionStyle,
) -> Vec<ScheduledEvent<CaptionContent>> {
    slides
        .iter()
        .zip(layout.spans())
        .filter_map(|(slide, span)| {
            let text = slide.caption.as_ref()?;
            let (start, end) = if span.len() > 2.0 * inset_secs {
                (span.start + inset_secs, span.end - inset_secs)
            } else {
                (span.start, span.end)
            };
            Some(ScheduledEvent::new(
                start,
                end,
                CaptionContent {
                    text: text.clone(),
                    style: slide.style.clone().unwrap_or_else(|| default_style.clone()),
                },
            ))
        })
        .collect()
}

/// Desired narration starts of slides: each window's start plus the lead-in.
pub fn slide_narration_anchors(layout: &WindowLayout, lead_in_secs: f64) -> Vec<f64> {
    layout
        .windows
        .iter()
        .map(|w| w.start + lead_in_secs)
        .collect()
}
