//! Sequential render of a [`RenderPlan`].
//!
//! Stages run strictly in order, each consuming the previous stage's file:
//!
//! ```text
//! retime | stills  ->  scale  ->  overlay  ->  mix
//! ```
//!
//! Any stage failure aborts the render. Intermediate files stay in the
//! work directory, which the caller owns.

use std::path::{Path, PathBuf};
use std::time::Instant;

use reelsync_models::{
    BackgroundAudio, FontWeight, RenderPlan, ScheduledEvent, StillFrame, VideoTrack,
};
use serde::Serialize;
use tracing::{debug, info};

use crate::command::FfmpegCommand;
use crate::concat::{concat_command, concat_list};
use crate::engine::{MediaEngine, RenderStage};
use crate::error::{MediaError, MediaResult};
use crate::filters::{
    blur_fill_graph, drawtext_filter, mix_graph, overlay_chain, retime_graph, AUDIO_OUT,
    VIDEO_OUT,
};
use crate::frame::{hold_clip_command, sample_frame_command, SILENT_AUDIO_SOURCE};

/// Font files used by caption overlays.
#[derive(Debug, Clone, PartialEq)]
pub struct FontSet {
    pub bold: PathBuf,
    pub regular: PathBuf,
}

impl FontSet {
    pub fn path_for(&self, weight: FontWeight) -> &Path {
        match weight {
            FontWeight::Bold => &self.bold,
            FontWeight::Regular => &self.regular,
        }
    }

    /// Check that both font files exist.
    pub fn validate(&self) -> MediaResult<()> {
        for path in [&self.bold, &self.regular] {
            if !path.is_file() {
                return Err(MediaError::FileNotFound(path.clone()));
            }
        }
        Ok(())
    }
}

/// What a finished stage produced.
#[derive(Debug, Clone, Serialize)]
pub struct StageReport {
    pub stage: RenderStage,
    pub output: PathBuf,
    pub commands: usize,
    pub elapsed_ms: u64,
}

/// Result of a complete render.
#[derive(Debug, Clone, Serialize)]
pub struct RenderOutcome {
    pub output: PathBuf,
    pub stages: Vec<StageReport>,
}

/// Drives the render stages through a [`MediaEngine`].
pub struct Renderer<'a> {
    engine: &'a dyn MediaEngine,
    work_dir: PathBuf,
    fonts: FontSet,
}

impl<'a> Renderer<'a> {
    pub fn new(engine: &'a dyn MediaEngine, work_dir: impl Into<PathBuf>, fonts: FontSet) -> Self {
        Self {
            engine,
            work_dir: work_dir.into(),
            fonts,
        }
    }

    pub fn work_dir(&self) -> &Path {
        &self.work_dir
    }

    /// Render `plan` into `output`.
    pub async fn render(&self, plan: &RenderPlan, output: &Path) -> MediaResult<RenderOutcome> {
        plan.validate().map_err(MediaError::invalid_plan)?;
        tokio::fs::create_dir_all(&self.work_dir).await?;

        let mut stages = Vec::new();

        let (video_stage, mut current) = match &plan.video {
            VideoTrack::Retimed {
                source,
                has_audio,
                segments,
            } => {
                let started = Instant::now();
                let out = self.work_path("01_retimed.mp4");
                let mut cmd = FfmpegCommand::new(source, &out)
                    .filter_complex(retime_graph(segments, *has_audio).to_string())
                    .map(format!("[{}]", VIDEO_OUT));
                if *has_audio {
                    cmd = cmd.map(format!("[{}]", AUDIO_OUT));
                }
                let cmd = cmd.output_args(plan.encoding.to_ffmpeg_args());
                self.execute(RenderStage::Retime, &cmd).await?;
                stages.push(report(RenderStage::Retime, &out, 1, started));
                (RenderStage::Retime, out)
            }
            VideoTrack::Stills { source, clips } => {
                let started = Instant::now();
                let out = self.work_path("01_stills.mp4");
                let commands = self.render_stills(plan, source, clips, &out).await?;
                stages.push(report(RenderStage::Stills, &out, commands, started));
                (RenderStage::Stills, out)
            }
        };
        debug!(stage = %video_stage, output = %current.display(), "Video track rendered");

        if let Some(canvas) = &plan.canvas {
            let started = Instant::now();
            let out = self.work_path("02_scaled.mp4");
            let cmd = FfmpegCommand::new(&current, &out)
                .filter_complex(blur_fill_graph(canvas).to_string())
                .map(format!("[{}]", VIDEO_OUT))
                .map("0:a?")
                .output_args(plan.encoding.video_args())
                .output_args(["-c:a", "copy"]);
            self.execute(RenderStage::Scale, &cmd).await?;
            stages.push(report(RenderStage::Scale, &out, 1, started));
            current = out;
        } else {
            debug!("No canvas configured, keeping source framing");
        }

        if !plan.captions.is_empty() {
            let started = Instant::now();
            let out = self.work_path("03_overlay.mp4");
            let script = self
                .write_overlay_script(plan)
                .await
                .map_err(|e| e.in_stage(RenderStage::Overlay))?;
            let cmd = FfmpegCommand::new(&current, &out)
                .video_filter_script(&script)
                .output_args(plan.encoding.video_args())
                .output_args(["-c:a", "copy"]);
            self.execute(RenderStage::Overlay, &cmd).await?;
            stages.push(report(RenderStage::Overlay, &out, 1, started));
            current = out;
        }

        let started = Instant::now();
        let cmd = self.mix_command(plan, &current, output);
        self.execute(RenderStage::Mix, &cmd).await?;
        stages.push(report(RenderStage::Mix, output, 1, started));

        info!(
            output = %output.display(),
            stages = stages.len(),
            total_secs = plan.total_duration_secs,
            "Render complete"
        );
        Ok(RenderOutcome {
            output: output.to_path_buf(),
            stages,
        })
    }

    async fn render_stills(
        &self,
        plan: &RenderPlan,
        source: &Path,
        clips: &[ScheduledEvent<StillFrame>],
        out: &Path,
    ) -> MediaResult<usize> {
        let mut clip_paths = Vec::with_capacity(clips.len());
        let mut commands = 0;
        for (i, clip) in clips.iter().enumerate() {
            let frame = self.work_path(&format!("frame_{:03}.jpg", i));
            let held = self.work_path(&format!("clip_{:03}.mp4", i));

            let sample = sample_frame_command(source, clip.payload.frame_at_secs, &frame);
            self.execute(RenderStage::Stills, &sample).await?;
            let hold = hold_clip_command(&frame, clip.duration(), &plan.encoding, &held);
            self.execute(RenderStage::Stills, &hold).await?;

            commands += 2;
            clip_paths.push(held);
        }

        let list = self.work_path("stills_concat.txt");
        tokio::fs::write(&list, concat_list(&clip_paths))
            .await
            .map_err(|e| MediaError::from(e).in_stage(RenderStage::Stills))?;
        self.execute(RenderStage::Stills, &concat_command(&list, out)).await?;
        Ok(commands + 1)
    }

    /// Write one text file per caption and the drawtext filter script.
    ///
    /// Caption text never enters the filter syntax; drawtext reads it from
    /// its file with expansion disabled.
    async fn write_overlay_script(&self, plan: &RenderPlan) -> MediaResult<PathBuf> {
        let mut filters = Vec::with_capacity(plan.captions.len());
        for (i, caption) in plan.captions.iter().enumerate() {
            let textfile = self.work_path(&format!("caption_{:03}.txt", i));
            tokio::fs::write(&textfile, &caption.payload.text).await?;
            let font = self.fonts.path_for(caption.payload.style.font);
            filters.push(drawtext_filter(caption, &textfile, font));
        }

        let script = self.work_path("overlay_filter.txt");
        tokio::fs::write(&script, overlay_chain(filters).to_string()).await?;
        Ok(script)
    }

    fn mix_command(&self, plan: &RenderPlan, video: &Path, output: &Path) -> FfmpegCommand {
        let mut cmd = FfmpegCommand::new(video, output);
        for event in &plan.narration {
            cmd = cmd.add_input(&event.payload.audio_path);
        }
        let background_input = match plan.background {
            BackgroundAudio::SourceTrack { .. } => 0,
            BackgroundAudio::Silence => {
                let index = cmd.input_count();
                cmd = cmd.add_lavfi_input(SILENT_AUDIO_SOURCE);
                index
            }
        };
        let graph = mix_graph(&plan.background, background_input, &plan.narration, 1);

        cmd.filter_complex(graph.to_string())
            .map("0:v")
            .map(format!("[{}]", AUDIO_OUT))
            .output_args(["-c:v", "copy"])
            .output_args(plan.encoding.audio_args())
            .output_duration(plan.total_duration_secs)
            .output_args(["-movflags", "+faststart"])
    }

    async fn execute(&self, stage: RenderStage, cmd: &FfmpegCommand) -> MediaResult<()> {
        self.engine
            .execute(stage, cmd)
            .await
            .map_err(|e| e.in_stage(stage))
    }

    fn work_path(&self, name: &str) -> PathBuf {
        self.work_dir.join(name)
    }
}

fn report(stage: RenderStage, output: &Path, commands: usize, started: Instant) -> StageReport {
    StageReport {
        stage,
        output: output.to_path_buf(),
        commands,
        elapsed_ms: started.elapsed().as_millis() as u64,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::DryRunEngine;
    use reelsync_models::{
        CaptionContent, CaptionStyle, Canvas, EncodingConfig, NarrationPlacement,
        RetimeInstruction,
    };

    fn fonts() -> FontSet {
        FontSet {
            bold: PathBuf::from("/fonts/bold.ttf"),
            regular: PathBuf::from("/fonts/regular.ttf"),
        }
    }

    fn retimed_plan() -> RenderPlan {
        RenderPlan {
            total_duration_secs: 6.5,
            video: VideoTrack::Retimed {
                source: PathBuf::from("in.mp4"),
                has_audio: true,
                segments: vec![
                    ScheduledEvent::new(
                        0.0,
                        2.5,
                        RetimeInstruction {
                            source_start: 0.0,
                            source_end: 5.0,
                            speed: 2.0,
                            tempo_chain: vec![2.0],
                        },
                    ),
                    ScheduledEvent::new(
                        2.5,
                        6.5,
                        RetimeInstruction {
                            source_start: 5.0,
                            source_end: 9.0,
                            speed: 1.0,
                            tempo_chain: vec![1.0],
                        },
                    ),
                ],
            },
            captions: vec![ScheduledEvent::new(
                0.0,
                3.0,
                CaptionContent {
                    text: "Day 1: it's on".to_string(),
                    style: CaptionStyle::title(),
                },
            )],
            narration: vec![ScheduledEvent::new(
                2.5,
                5.0,
                NarrationPlacement {
                    cue_index: 0,
                    text: "go".to_string(),
                    audio_path: PathBuf::from("n0.mp3"),
                    delay_ms: 2500,
                    gain: 1.5,
                },
            )],
            background: BackgroundAudio::SourceTrack { gain: 0.3 },
            min_gap_secs: 0.3,
            canvas: Some(Canvas::default()),
            encoding: EncodingConfig::default(),
        }
    }

    #[tokio::test]
    async fn test_retimed_stage_order() {
        let dir = tempfile::tempdir().unwrap();
        let engine = DryRunEngine::new();
        let renderer = Renderer::new(&engine, dir.path(), fonts());
        let outcome = renderer
            .render(&retimed_plan(), &dir.path().join("final.mp4"))
            .await
            .unwrap();

        let stages: Vec<RenderStage> = outcome.stages.iter().map(|s| s.stage).collect();
        assert_eq!(
            stages,
            vec![
                RenderStage::Retime,
                RenderStage::Scale,
                RenderStage::Overlay,
                RenderStage::Mix
            ]
        );

        // Each stage consumes the previous stage's output.
        let commands = engine.commands();
        for pair in commands.windows(2) {
            let produced = pair[0].1.output_path().to_string_lossy().to_string();
            assert!(pair[1].1.build_args().contains(&produced));
        }

        let caption = std::fs::read_to_string(dir.path().join("caption_000.txt")).unwrap();
        assert_eq!(caption, "Day 1: it's on");
        let script = std::fs::read_to_string(dir.path().join("overlay_filter.txt")).unwrap();
        assert!(script.starts_with("drawtext="));
        assert!(!script.contains("Day 1"));

        let mix = engine.stage_commands(RenderStage::Mix).remove(0).build_args();
        assert!(mix.contains(&"n0.mp3".to_string()));
        assert!(mix.windows(2).any(|w| w == ["-t", "6.500"]));
    }

    #[tokio::test]
    async fn test_stills_render_without_canvas_or_captions() {
        let dir = tempfile::tempdir().unwrap();
        let engine = DryRunEngine::new();
        let plan = RenderPlan {
            total_duration_secs: 7.5,
            video: VideoTrack::Stills {
                source: PathBuf::from("in.mp4"),
                clips: vec![
                    ScheduledEvent::new(0.0, 4.5, StillFrame { frame_at_secs: 1.0 }),
                    ScheduledEvent::new(4.5, 7.5, StillFrame { frame_at_secs: 8.0 }),
                ],
            },
            captions: Vec::new(),
            narration: Vec::new(),
            background: BackgroundAudio::Silence,
            min_gap_secs: 0.3,
            canvas: None,
            encoding: EncodingConfig::default(),
        };
        let outcome = Renderer::new(&engine, dir.path(), fonts())
            .render(&plan, &dir.path().join("final.mp4"))
            .await
            .unwrap();

        assert_eq!(outcome.stages.len(), 2);
        assert_eq!(outcome.stages[0].commands, 5);
        let list = std::fs::read_to_string(dir.path().join("stills_concat.txt")).unwrap();
        assert_eq!(list.lines().count(), 2);

        let mix = engine.stage_commands(RenderStage::Mix).remove(0).build_args();
        assert!(mix.contains(&SILENT_AUDIO_SOURCE.to_string()));
    }

    #[tokio::test]
    async fn test_invalid_plan_is_rejected_before_any_command() {
        let dir = tempfile::tempdir().unwrap();
        let engine = DryRunEngine::new();
        let mut plan = retimed_plan();
        plan.total_duration_secs = 10.0;
        let result = Renderer::new(&engine, dir.path(), fonts())
            .render(&plan, &dir.path().join("final.mp4"))
            .await;
        assert!(matches!(result, Err(MediaError::InvalidPlan(_))));
        assert!(engine.commands().is_empty());
    }
}
