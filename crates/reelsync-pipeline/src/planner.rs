//! Turns a job manifest into a [`RenderPlan`].
//!
//! Planning runs in two phases around TTS. [`Planner::prepare`] validates
//! everything that can be checked before any speech is synthesized (speed
//! segment coverage, narration anchors, caption windows) and lists the
//! lines to synthesize. [`Planner::build`] takes the measured narration and
//! reconciles, schedules and composes the final plan.

use std::collections::HashMap;
use std::path::PathBuf;

use tracing::{debug, info};

use reelsync_media::MediaInfo;
use reelsync_models::{
    BackgroundAudio, CaptionContent, NarrationAsset, RenderPlan, ScheduledEvent, ShortsJob,
    VideoMode,
};
use reelsync_timeline::{
    cues, retimed_track, stills_track, CompositionInput, DurationReconciler, NarrationRequest,
    NarrationScheduler, Placement, TimeMapping, TimelineCompositor, TimelineError, WindowRequest,
};

use crate::error::{PipelineError, PipelineResult, PipelineStage};
use crate::metrics::record_narration_drift;
use crate::narration::NarrationLine;

/// Everything resolved before narration is synthesized.
#[derive(Debug, Clone)]
pub struct PlanDraft {
    lines: Vec<NarrationLine>,
    kind: DraftKind,
}

#[derive(Debug, Clone)]
enum DraftKind {
    Retimed {
        mapping: TimeMapping,
        anchors: Vec<f64>,
        captions: Vec<ScheduledEvent<CaptionContent>>,
    },
    Stills,
}

impl PlanDraft {
    /// Narration to synthesize, in cue order.
    pub fn lines(&self) -> &[NarrationLine] {
        &self.lines
    }

    /// Output duration before reconciliation; `None` for still frames,
    /// whose length depends on the narration.
    pub fn nominal_duration(&self) -> Option<f64> {
        match &self.kind {
            DraftKind::Retimed { mapping, .. } => Some(mapping.output_duration()),
            DraftKind::Stills => None,
        }
    }
}

/// Plans one job against its probed source.
pub struct Planner<'a> {
    job: &'a ShortsJob,
    source: PathBuf,
    info: &'a MediaInfo,
}

impl<'a> Planner<'a> {
    pub fn new(job: &'a ShortsJob, source: PathBuf, info: &'a MediaInfo) -> Self {
        Self { job, source, info }
    }

    /// Validate the job against the source and list the narration lines.
    pub fn prepare(&self) -> PipelineResult<PlanDraft> {
        if !self.info.has_video {
            return Err(PipelineError::invalid_job(format!(
                "source {} has no video stream",
                self.source.display()
            )));
        }

        match self.job.mode() {
            VideoMode::Retimed => self.prepare_retimed(),
            VideoMode::Stills => self.prepare_stills(),
        }
    }

    fn prepare_retimed(&self) -> PipelineResult<PlanDraft> {
        let schedule_err = |e: TimelineError| PipelineError::timeline(PipelineStage::Schedule, e);

        let mapping = if self.job.speed_segments.is_empty() {
            TimeMapping::identity(self.info.duration_secs)
        } else {
            TimeMapping::new(&self.job.speed_segments, self.info.duration_secs)
        }
        .map_err(schedule_err)?;

        let anchors = cues::narration_anchors(&self.job.narration, &mapping).map_err(schedule_err)?;
        let captions = cues::resolve_captions(&self.job.captions, &mapping).map_err(schedule_err)?;

        let lines = self
            .job
            .narration
            .iter()
            .enumerate()
            .map(|(i, cue)| NarrationLine {
                cue_index: i,
                text: cue.text.clone(),
                rate: cue.rate,
            })
            .collect();

        debug!(
            source_secs = mapping.source_duration(),
            output_secs = mapping.output_duration(),
            segments = mapping.segments().len(),
            "Speed mapping resolved"
        );
        Ok(PlanDraft {
            lines,
            kind: DraftKind::Retimed {
                mapping,
                anchors,
                captions,
            },
        })
    }

    fn prepare_stills(&self) -> PipelineResult<PlanDraft> {
        if let Some((i, slide)) = self
            .job
            .slides
            .iter()
            .enumerate()
            .find(|(_, slide)| slide.frame_at_secs >= self.info.duration_secs)
        {
            return Err(PipelineError::timeline(
                PipelineStage::Schedule,
                TimelineError::configuration(format!(
                    "slide {} samples {:.3}s of a {:.3}s source",
                    i, slide.frame_at_secs, self.info.duration_secs
                )),
            ));
        }

        let lines = self
            .job
            .slides
            .iter()
            .enumerate()
            .filter_map(|(i, slide)| {
                slide.narration.as_ref().map(|text| NarrationLine {
                    cue_index: i,
                    text: text.clone(),
                    rate: slide.rate,
                })
            })
            .collect();
        Ok(PlanDraft {
            lines,
            kind: DraftKind::Stills,
        })
    }

    /// Reconcile, schedule and compose with the measured narration.
    pub fn build(&self, draft: PlanDraft, assets: Vec<NarrationAsset>) -> PipelineResult<RenderPlan> {
        if assets.len() != draft.lines.len() {
            return Err(PipelineError::timeline(
                PipelineStage::Schedule,
                TimelineError::InconsistentPlan(format!(
                    "{} narration assets for {} lines",
                    assets.len(),
                    draft.lines.len()
                )),
            ));
        }

        let plan = match draft.kind {
            DraftKind::Retimed {
                mapping,
                anchors,
                captions,
            } => self.build_retimed(mapping, anchors, captions, assets)?,
            DraftKind::Stills => self.build_stills(assets)?,
        };

        info!(
            mode = self.job.mode().as_str(),
            total_secs = plan.total_duration_secs,
            captions = plan.captions.len(),
            narration = plan.narration.len(),
            "Plan ready"
        );
        Ok(plan)
    }

    fn build_retimed(
        &self,
        mapping: TimeMapping,
        anchors: Vec<f64>,
        mut captions: Vec<ScheduledEvent<CaptionContent>>,
        assets: Vec<NarrationAsset>,
    ) -> PipelineResult<RenderPlan> {
        let total = mapping.output_duration();
        let requests = anchors
            .into_iter()
            .zip(assets)
            .map(|(desired_start, asset)| NarrationRequest {
                desired_start,
                duration_secs: asset.duration_secs,
                payload: asset,
            })
            .collect();
        let narration = self.schedule(requests, total)?;

        if let Some(cta) = &self.job.cta {
            captions.extend(cues::cta_captions(cta, total));
        }

        let gain = self.job.mix.background_gain_for(VideoMode::Retimed);
        let background = if self.info.has_audio && gain > 0.0 {
            BackgroundAudio::SourceTrack { gain }
        } else {
            BackgroundAudio::Silence
        };

        self.compose(CompositionInput {
            video: retimed_track(&mapping, self.source.clone(), self.info.has_audio),
            captions,
            narration,
            background,
            canvas: self.job.canvas.clone(),
            encoding: self.job.encoding.clone(),
        })
    }

    fn build_stills(&self, assets: Vec<NarrationAsset>) -> PipelineResult<RenderPlan> {
        let mix = &self.job.mix;
        // the window has to hold the lead-in as well as the speech
        let measured: HashMap<usize, f64> = assets
            .iter()
            .map(|a| (a.cue_index, a.duration_secs + mix.narration_lead_in_secs))
            .collect();

        let requests: Vec<WindowRequest> = self
            .job
            .slides
            .iter()
            .enumerate()
            .map(|(i, slide)| WindowRequest {
                nominal_secs: slide.nominal_secs,
                min_hold_secs: slide.min_hold_secs,
                measured_secs: measured.get(&i).copied(),
            })
            .collect();
        let layout = DurationReconciler::new(mix.safety_margin_secs)
            .with_buffer(mix.window_buffer_secs)
            .lay_out(&requests)
            .map_err(|e| PipelineError::timeline(PipelineStage::Schedule, e))?;
        let total = layout.total_secs;

        let anchors = cues::slide_narration_anchors(&layout, mix.narration_lead_in_secs);
        let narration_requests = assets
            .into_iter()
            .map(|asset| {
                let desired_start = anchors.get(asset.cue_index).copied().ok_or_else(|| {
                    PipelineError::timeline(
                        PipelineStage::Schedule,
                        TimelineError::InconsistentPlan(format!(
                            "narration for slide {} but the job has {} slides",
                            asset.cue_index,
                            anchors.len()
                        )),
                    )
                })?;
                Ok(NarrationRequest {
                    desired_start,
                    duration_secs: asset.duration_secs,
                    payload: asset,
                })
            })
            .collect::<PipelineResult<Vec<_>>>()?;
        let narration = self.schedule(narration_requests, total)?;

        let output_timeline = TimeMapping::identity(total)
            .map_err(|e| PipelineError::timeline(PipelineStage::Compose, e))?;
        let mut captions = cues::resolve_captions(&self.job.captions, &output_timeline)
            .map_err(|e| PipelineError::timeline(PipelineStage::Compose, e))?;
        captions.extend(cues::slide_captions(
            &self.job.slides,
            &layout,
            mix.caption_inset_secs,
            &self.job.slide_caption_style,
        ));
        if let Some(cta) = &self.job.cta {
            captions.extend(cues::cta_captions(cta, total));
        }

        let frames: Vec<f64> = self.job.slides.iter().map(|s| s.frame_at_secs).collect();
        let video = stills_track(self.source.clone(), &frames, &layout)
            .map_err(|e| PipelineError::timeline(PipelineStage::Compose, e))?;

        self.compose(CompositionInput {
            video,
            captions,
            narration,
            background: BackgroundAudio::Silence,
            canvas: self.job.canvas.clone(),
            encoding: self.job.encoding.clone(),
        })
    }

    fn schedule(
        &self,
        requests: Vec<NarrationRequest<NarrationAsset>>,
        total: f64,
    ) -> PipelineResult<Vec<ScheduledEvent<NarrationAsset>>> {
        let mix = &self.job.mix;
        let placements: Vec<Placement<NarrationAsset>> =
            NarrationScheduler::new(mix.min_gap_secs, mix.drift_warning_secs)
                .schedule(requests, total)
                .map_err(|e| PipelineError::timeline(PipelineStage::Schedule, e))?;

        Ok(placements
            .into_iter()
            .map(|placement| {
                record_narration_drift(placement.drift_secs());
                placement.event
            })
            .collect())
    }

    fn compose(&self, input: CompositionInput) -> PipelineResult<RenderPlan> {
        TimelineCompositor::new(self.job.mix.min_gap_secs, self.job.mix.narration_gain)
            .compose(input)
            .map_err(|e| PipelineError::timeline(PipelineStage::Compose, e))
    }
}
