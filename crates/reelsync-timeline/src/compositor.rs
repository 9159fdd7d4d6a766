//! Assembly of resolved timelines into a [`RenderPlan`].

use std::path::PathBuf;

use reelsync_models::{
    timestamp::to_millis, BackgroundAudio, CaptionContent, Canvas, EncodingConfig,
    NarrationAsset, NarrationPlacement, RenderPlan, RetimeInstruction, ScheduledEvent,
    StillFrame, VideoTrack, PLAN_TOLERANCE_SECS,
};
use tracing::{debug, info};

use crate::error::{TimelineError, TimelineResult};
use crate::mapping::TimeMapping;
use crate::reconcile::WindowLayout;
use crate::tempo::tempo_chain;

/// Visual track of retimed footage: one trim + retime per speed segment,
/// concatenated in source order.
pub fn retimed_track(mapping: &TimeMapping, source: PathBuf, has_audio: bool) -> VideoTrack {
    let segments = mapping
        .segments()
        .iter()
        .zip(mapping.output_windows())
        .map(|(seg, (start, end))| {
            ScheduledEvent::new(
                start,
                end,
                RetimeInstruction {
                    source_start: seg.start,
                    source_end: seg.end,
                    speed: seg.speed,
                    tempo_chain: tempo_chain(seg.speed),
                },
            )
        })
        .collect();
    VideoTrack::Retimed {
        source,
        has_audio,
        segments,
    }
}

/// Visual track of still frames, one per laid-out window.
pub fn stills_track(
    source: PathBuf,
    frames_at: &[f64],
    layout: &WindowLayout,
) -> TimelineResult<VideoTrack> {
    if frames_at.len() != layout.windows.len() {
        return Err(TimelineError::configuration(format!(
            "{} frames for {} windows",
            frames_at.len(),
            layout.windows.len()
        )));
    }
    let clips = frames_at
        .iter()
        .zip(layout.spans())
        .map(|(&frame_at_secs, span)| {
            ScheduledEvent::new(span.start, span.end, StillFrame { frame_at_secs })
        })
        .collect();
    Ok(VideoTrack::Stills { source, clips })
}

/// Everything resolved for one run, before composition.
#[derive(Debug, Clone)]
pub struct CompositionInput {
    pub video: VideoTrack,
    pub captions: Vec<ScheduledEvent<CaptionContent>>,
    pub narration: Vec<ScheduledEvent<NarrationAsset>>,
    pub background: BackgroundAudio,
    pub canvas: Option<Canvas>,
    pub encoding: EncodingConfig,
}

/// Combines the video track, caption windows and narration placements.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TimelineCompositor {
    pub min_gap_secs: f64,
    pub narration_gain: f32,
}

impl TimelineCompositor {
    pub fn new(min_gap_secs: f64, narration_gain: f32) -> Self {
        Self {
            min_gap_secs,
            narration_gain,
        }
    }

    /// Build and verify the plan.
    ///
    /// The total duration is taken from the video track as laid out, never
    /// from the source. Captions are clamped to `[0, total]` and dropped
    /// when nothing of them remains; narration must already lie within it.
    pub fn compose(&self, input: CompositionInput) -> TimelineResult<RenderPlan> {
        let total = input.video.duration();
        if !total.is_finite() || total <= 0.0 {
            return Err(TimelineError::InconsistentPlan(format!(
                "video track has no duration ({})",
                total
            )));
        }

        let mut captions: Vec<_> = input
            .captions
            .into_iter()
            .filter_map(|caption| clamp_caption(caption, total))
            .collect();
        captions.sort_by(|a, b| a.output_start.total_cmp(&b.output_start));

        let mut narration = Vec::with_capacity(input.narration.len());
        for event in input.narration {
            if event.output_start < 0.0
                || event.output_start >= total
                || event.output_end > total + PLAN_TOLERANCE_SECS
            {
                return Err(TimelineError::conflict(format!(
                    "narration {} [{:.3}, {:.3}] does not fit the {:.3}s output",
                    event.payload.cue_index, event.output_start, event.output_end, total
                )));
            }
            let asset = event.payload;
            narration.push(ScheduledEvent::new(
                event.output_start,
                event.output_end,
                NarrationPlacement {
                    cue_index: asset.cue_index,
                    text: asset.text,
                    audio_path: asset.audio_path,
                    delay_ms: to_millis(event.output_start),
                    gain: self.narration_gain,
                },
            ));
        }
        narration.sort_by(|a, b| a.output_start.total_cmp(&b.output_start));

        let plan = RenderPlan {
            total_duration_secs: total,
            video: input.video,
            captions,
            narration,
            background: input.background,
            min_gap_secs: self.min_gap_secs,
            canvas: input.canvas,
            encoding: input.encoding,
        };
        verify_plan(&plan)?;

        info!(
            total_secs = total,
            captions = plan.captions.len(),
            narration = plan.narration.len(),
            "Render plan composed"
        );
        Ok(plan)
    }
}

fn clamp_caption(
    mut caption: ScheduledEvent<CaptionContent>,
    total: f64,
) -> Option<ScheduledEvent<CaptionContent>> {
    let start = caption.output_start.max(0.0);
    let end = caption.output_end.min(total);
    if end <= start || end.is_nan() || start.is_nan() {
        debug!(
            text = %caption.payload.text,
            start_secs = caption.output_start,
            end_secs = caption.output_end,
            "Caption falls outside the output, dropped"
        );
        return None;
    }
    caption.output_start = start;
    caption.output_end = end;
    Some(caption)
}

/// Check a plan's guarantees: duration conservation, bounds and
/// narration channel spacing.
pub fn verify_plan(plan: &RenderPlan) -> TimelineResult<()> {
    plan.validate().map_err(TimelineError::InconsistentPlan)
}

#[cfg(test)]
mod tests {
    use super::*;
    use reelsync_models::{CaptionStyle, SpeedSegment};

    fn caption(start: f64, end: f64, text: &str) -> ScheduledEvent<CaptionContent> {
        ScheduledEvent::new(
            start,
            end,
            CaptionContent {
                text: text.to_string(),
                style: CaptionStyle::default(),
            },
        )
    }

    fn asset(index: usize, start: f64, end: f64) -> ScheduledEvent<NarrationAsset> {
        ScheduledEvent::new(
            start,
            end,
            NarrationAsset {
                cue_index: index,
                text: format!("line {}", index),
                audio_path: PathBuf::from(format!("n{}.mp3", index)),
                duration_secs: end - start,
            },
        )
    }

    fn input(mapping: &TimeMapping) -> CompositionInput {
        CompositionInput {
            video: retimed_track(mapping, PathBuf::from("in.mp4"), true),
            captions: Vec::new(),
            narration: Vec::new(),
            background: BackgroundAudio::SourceTrack { gain: 0.3 },
            canvas: None,
            encoding: EncodingConfig::default(),
        }
    }

    #[test]
    fn test_retimed_track_follows_mapping() {
        let mapping = TimeMapping::new(
            &[SpeedSegment::new(0.0, 5.0, 2.0), SpeedSegment::to_end(5.0, 1.0)],
            9.0,
        )
        .unwrap();
        match retimed_track(&mapping, PathBuf::from("in.mp4"), true) {
            VideoTrack::Retimed { segments, .. } => {
                assert_eq!(segments.len(), 2);
                assert_eq!(segments[0].output_end, 2.5);
                assert_eq!(segments[1].output_start, 2.5);
                assert_eq!(segments[1].output_end, 6.5);
                assert_eq!(segments[0].payload.tempo_chain, vec![2.0]);
            }
            other => panic!("unexpected track {:?}", other),
        }
    }

    #[test]
    fn test_compose_clamps_and_drops_captions() {
        let mapping = TimeMapping::identity(10.0).unwrap();
        let mut inp = input(&mapping);
        inp.captions = vec![
            caption(8.0, 14.0, "tail"),
            caption(-1.0, 2.0, "head"),
            caption(11.0, 12.0, "gone"),
        ];
        let plan = TimelineCompositor::new(0.3, 1.5).compose(inp).unwrap();
        assert_eq!(plan.captions.len(), 2);
        assert_eq!(plan.captions[0].payload.text, "head");
        assert_eq!(plan.captions[0].output_start, 0.0);
        assert_eq!(plan.captions[1].output_end, 10.0);
    }

    #[test]
    fn test_compose_sets_delay_and_gain() {
        let mapping = TimeMapping::identity(10.0).unwrap();
        let mut inp = input(&mapping);
        inp.narration = vec![asset(1, 4.3, 6.0), asset(0, 0.25, 4.0)];
        let plan = TimelineCompositor::new(0.3, 1.5).compose(inp).unwrap();
        assert_eq!(plan.narration[0].payload.delay_ms, 250);
        assert_eq!(plan.narration[1].payload.delay_ms, 4300);
        assert_eq!(plan.narration[1].payload.gain, 1.5);
    }

    #[test]
    fn test_compose_rejects_narration_outside_output() {
        let mapping = TimeMapping::identity(10.0).unwrap();
        let mut inp = input(&mapping);
        inp.narration = vec![asset(0, 9.0, 11.0)];
        assert!(matches!(
            TimelineCompositor::new(0.3, 1.5).compose(inp),
            Err(TimelineError::SchedulingConflict(_))
        ));
    }

    #[test]
    fn test_compose_rejects_channel_overlap() {
        let mapping = TimeMapping::identity(10.0).unwrap();
        let mut inp = input(&mapping);
        inp.narration = vec![asset(0, 0.0, 4.0), asset(1, 3.0, 5.0)];
        assert!(matches!(
            TimelineCompositor::new(0.3, 1.5).compose(inp),
            Err(TimelineError::InconsistentPlan(_))
        ));
    }

    #[test]
    fn test_stills_track_length_mismatch() {
        let layout = WindowLayout {
            windows: vec![],
            total_secs: 0.0,
        };
        assert!(stills_track(PathBuf::from("in.mp4"), &[1.0], &layout).is_err());
    }
}
