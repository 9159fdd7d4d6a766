//! One parameterized shorts run.
//!
//! ```text
//! probe -> plan (mapping, anchors) -> tts -> reconcile + schedule + compose -> render -> probe
//! ```
//!
//! A run either yields a complete output or fails with the stage that
//! broke; there is no partial success.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{warn, Instrument};

use reelsync_media::{
    DryRunEngine, FfmpegRunner, FfprobeProbe, MediaEngine, MediaProbe, Renderer, StageReport,
};
use reelsync_models::{RenderPlan, ShortsJob};
use reelsync_timeline::{to_srt, SubtitleEntry};
use reelsync_tts::{build_synthesizer, SpeechSynthesizer};

use crate::config::RunConfig;
use crate::error::{PipelineError, PipelineResult, PipelineStage};
use crate::logging::RunLogger;
use crate::metrics::{record_run_failure, record_run_success};
use crate::narration::synthesize_all;
use crate::planner::Planner;

/// Rendered length may differ from the plan by this much before warning.
const DURATION_DRIFT_WARN_SECS: f64 = 0.5;

/// Summary of a finished run.
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub run_id: String,
    pub job: String,
    pub mode: &'static str,
    pub started_at: DateTime<Utc>,
    pub elapsed_ms: u64,
    pub output: PathBuf,
    pub subtitles: Option<PathBuf>,
    pub planned_secs: f64,
    /// Probed length of the output; `None` on dry runs
    pub rendered_secs: Option<f64>,
    pub size_bytes: Option<u64>,
    pub captions: usize,
    pub narration: usize,
    pub stages: Vec<StageReport>,
    /// Intermediate directory, when kept
    pub work_dir: Option<PathBuf>,
    pub dry_run: bool,
}

/// Runs jobs against injected probe, TTS and media collaborators.
pub struct ShortsPipeline {
    config: RunConfig,
    probe: Arc<dyn MediaProbe>,
    synthesizer: Arc<dyn SpeechSynthesizer>,
    engine: Arc<dyn MediaEngine>,
}

impl ShortsPipeline {
    pub fn new(
        config: RunConfig,
        probe: Arc<dyn MediaProbe>,
        synthesizer: Arc<dyn SpeechSynthesizer>,
        engine: Arc<dyn MediaEngine>,
    ) -> Self {
        Self {
            config,
            probe,
            synthesizer,
            engine,
        }
    }

    /// Wire the production collaborators: ffprobe, the configured TTS
    /// backend and FFmpeg (or a dry-run recorder).
    pub fn from_config(config: RunConfig) -> PipelineResult<Self> {
        config.validate()?;
        let probe: Arc<dyn MediaProbe> = Arc::new(FfprobeProbe);
        let synthesizer: Arc<dyn SpeechSynthesizer> = Arc::from(
            build_synthesizer(&config.tts, probe.clone())
                .map_err(|e| PipelineError::config(format!("TTS backend: {}", e)))?,
        );
        let engine: Arc<dyn MediaEngine> = if config.dry_run {
            Arc::new(DryRunEngine::new())
        } else {
            Arc::new(FfmpegRunner::new().with_timeout(config.ffmpeg_timeout.as_secs()))
        };
        Ok(Self::new(config, probe, synthesizer, engine))
    }

    pub fn config(&self) -> &RunConfig {
        &self.config
    }

    /// Render `job` and write its outputs.
    pub async fn run(&self, job: &ShortsJob) -> PipelineResult<RunReport> {
        let logger = RunLogger::new(&job.name);
        let span = logger.create_span();
        let mode = job.mode().as_str();
        let started = Instant::now();

        let result = self.execute(job, &logger, started).instrument(span).await;
        match &result {
            Ok(report) => {
                record_run_success(
                    mode,
                    started.elapsed().as_secs_f64(),
                    report.rendered_secs.unwrap_or(report.planned_secs),
                );
                logger.log_completion(&format!(
                    "{} ({:.2}s planned) in {} ms",
                    report.output.display(),
                    report.planned_secs,
                    report.elapsed_ms
                ));
            }
            Err(err) => {
                record_run_failure(mode, err.stage(), err.kind());
                logger.log_failure(err.stage(), &err.to_string(), err.diagnostic());
            }
        }
        result
    }

    /// Resolve the plan only: probes the source and synthesizes narration,
    /// renders nothing. The narration files are kept so the plan's paths
    /// stay valid.
    pub async fn plan_only(&self, job: &ShortsJob) -> PipelineResult<(RenderPlan, PathBuf)> {
        let logger = RunLogger::new(&job.name);
        let span = logger.create_span();
        async {
            self.config.validate()?;
            let work = self.config.create_work_dir(job)?;
            let plan = self.plan(job, work.path(), &logger).await?;
            Ok((plan, work.into_path()))
        }
        .instrument(span)
        .await
    }

    async fn execute(&self, job: &ShortsJob, logger: &RunLogger, started: Instant) -> PipelineResult<RunReport> {
        let started_at = Utc::now();
        self.config.validate()?;
        logger.log_start(&format!(
            "{} mode, source {}{}",
            job.mode().as_str(),
            job.source.display(),
            if self.config.dry_run { " (dry run)" } else { "" }
        ));

        let work = self.config.create_work_dir(job)?;
        let plan = self.plan(job, work.path(), logger).await?;

        tokio::fs::create_dir_all(&self.config.out_dir).await?;
        let output = self.config.output_path(job);
        let renderer = Renderer::new(
            self.engine.as_ref(),
            work.path().join("render"),
            self.config.fonts.clone(),
        );
        let outcome = renderer
            .render(&plan, &output)
            .await
            .map_err(|e| PipelineError::media(PipelineStage::Compose, e))?;

        let subtitles = if job.subtitles {
            let path = self.config.subtitle_path(job);
            write_subtitles(&plan, &path).await?;
            logger.log_stage(PipelineStage::Compose, &format!("Subtitles written to {}", path.display()));
            Some(path)
        } else {
            None
        };

        let (rendered_secs, size_bytes) = if self.engine.produces_output() {
            let info = self
                .probe
                .probe(&output)
                .await
                .map_err(|e| PipelineError::media(PipelineStage::Probe, e))?;
            if (info.duration_secs - plan.total_duration_secs).abs() > DURATION_DRIFT_WARN_SECS {
                warn!(
                    planned_secs = plan.total_duration_secs,
                    rendered_secs = info.duration_secs,
                    "Rendered duration differs from the plan"
                );
            }
            (Some(info.duration_secs), Some(info.size))
        } else {
            (None, None)
        };

        let work_dir = if self.config.keep_intermediates {
            Some(work.into_path())
        } else {
            None
        };

        Ok(RunReport {
            run_id: logger.run_id().to_string(),
            job: job.name.clone(),
            mode: job.mode().as_str(),
            started_at,
            elapsed_ms: started.elapsed().as_millis() as u64,
            output: outcome.output,
            subtitles,
            planned_secs: plan.total_duration_secs,
            rendered_secs,
            size_bytes,
            captions: plan.captions.len(),
            narration: plan.narration.len(),
            stages: outcome.stages,
            work_dir,
            dry_run: self.config.dry_run,
        })
    }

    /// Probe the source, synthesize narration into `work_dir` and build
    /// the plan.
    async fn plan(&self, job: &ShortsJob, work_dir: &Path, logger: &RunLogger) -> PipelineResult<RenderPlan> {
        let info = self
            .probe
            .probe(&job.source)
            .instrument(logger.stage_span(PipelineStage::Probe))
            .await
            .map_err(|e| PipelineError::media(PipelineStage::Probe, e))?;
        logger.log_stage(
            PipelineStage::Probe,
            &format!("Source is {:.2}s (audio: {})", info.duration_secs, info.has_audio),
        );

        let planner = Planner::new(job, job.source.clone(), &info);
        let draft = planner.prepare()?;

        let voice = self.config.voice_for(job);
        let assets = synthesize_all(
            self.synthesizer.as_ref(),
            draft.lines(),
            voice,
            &work_dir.join("narration"),
            logger,
        )
        .instrument(logger.stage_span(PipelineStage::Tts))
        .await?;

        logger
            .stage_span(PipelineStage::Compose)
            .in_scope(|| planner.build(draft, assets))
    }
}

/// Subtitles follow the spoken narration; jobs without narration export
/// their captions instead.
pub fn subtitle_entries(plan: &RenderPlan) -> Vec<SubtitleEntry> {
    if plan.narration.is_empty() {
        plan.captions.iter().map(SubtitleEntry::from).collect()
    } else {
        plan.narration.iter().map(SubtitleEntry::from).collect()
    }
}

async fn write_subtitles(plan: &RenderPlan, path: &Path) -> PipelineResult<()> {
    tokio::fs::write(path, to_srt(subtitle_entries(plan))).await?;
    Ok(())
}
