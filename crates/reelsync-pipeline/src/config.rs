//! Run configuration.
//!
//! Built once per run from the environment and CLI flags, then passed by
//! reference into every stage. Nothing below this point reads ambient
//! process state.

use std::path::{Path, PathBuf};
use std::time::Duration;

use reelsync_media::FontSet;
use reelsync_models::ShortsJob;
use reelsync_tts::TtsConfig;

use crate::error::{PipelineError, PipelineResult};

const DEFAULT_FONT_BOLD: &str = "/usr/share/fonts/truetype/dejavu/DejaVuSans-Bold.ttf";
const DEFAULT_FONT_REGULAR: &str = "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf";

/// Configuration for one pipeline run.
#[derive(Debug, Clone)]
pub struct RunConfig {
    /// Directory receiving `<name>.mp4` and `<name>.srt`
    pub out_dir: PathBuf,
    /// Parent of the per-run intermediate directory; system temp if unset
    pub work_dir: Option<PathBuf>,
    /// Voice forced for every cue, overriding the manifest
    pub voice_override: Option<String>,
    pub fonts: FontSet,
    /// Timeout of a single FFmpeg invocation
    pub ffmpeg_timeout: Duration,
    /// Keep the intermediate directory after the run
    pub keep_intermediates: bool,
    /// Build and log every command without running FFmpeg
    pub dry_run: bool,
    pub tts: TtsConfig,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            out_dir: PathBuf::from("."),
            work_dir: None,
            voice_override: None,
            fonts: FontSet {
                bold: PathBuf::from(DEFAULT_FONT_BOLD),
                regular: PathBuf::from(DEFAULT_FONT_REGULAR),
            },
            ffmpeg_timeout: Duration::from_secs(1800),
            keep_intermediates: false,
            dry_run: false,
            tts: TtsConfig::default(),
        }
    }
}

impl RunConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            out_dir: std::env::var("REELSYNC_OUT_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.out_dir),
            work_dir: std::env::var("REELSYNC_WORK_DIR").ok().map(PathBuf::from),
            voice_override: None,
            fonts: FontSet {
                bold: std::env::var("REELSYNC_FONT_BOLD")
                    .map(PathBuf::from)
                    .unwrap_or(defaults.fonts.bold),
                regular: std::env::var("REELSYNC_FONT_REGULAR")
                    .map(PathBuf::from)
                    .unwrap_or(defaults.fonts.regular),
            },
            ffmpeg_timeout: Duration::from_secs(
                std::env::var("REELSYNC_FFMPEG_TIMEOUT")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(1800),
            ),
            keep_intermediates: std::env::var("REELSYNC_KEEP_INTERMEDIATES")
                .map(|v| matches!(v.to_lowercase().as_str(), "1" | "true" | "yes"))
                .unwrap_or(false),
            dry_run: false,
            tts: TtsConfig::from_env(),
        }
    }

    pub fn with_out_dir(mut self, out_dir: impl Into<PathBuf>) -> Self {
        self.out_dir = out_dir.into();
        self
    }

    pub fn with_voice(mut self, voice: impl Into<String>) -> Self {
        self.voice_override = Some(voice.into());
        self
    }

    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    /// Checks that do not depend on the job.
    ///
    /// Fonts are only required when FFmpeg will actually read them.
    pub fn validate(&self) -> PipelineResult<()> {
        if self.ffmpeg_timeout.is_zero() {
            return Err(PipelineError::config("ffmpeg timeout must be positive"));
        }
        if self.tts.default_voice.trim().is_empty() {
            return Err(PipelineError::config("default TTS voice is empty"));
        }
        if !self.dry_run {
            self.fonts
                .validate()
                .map_err(|e| PipelineError::config(format!("font set: {}", e)))?;
        }
        Ok(())
    }

    /// Voice for `job`: CLI override, then manifest, then the TTS default.
    pub fn voice_for<'a>(&'a self, job: &'a ShortsJob) -> &'a str {
        self.voice_override
            .as_deref()
            .or(job.voice.as_deref())
            .unwrap_or(&self.tts.default_voice)
    }

    pub fn output_path(&self, job: &ShortsJob) -> PathBuf {
        self.out_dir.join(format!("{}.mp4", job.name))
    }

    pub fn subtitle_path(&self, job: &ShortsJob) -> PathBuf {
        self.out_dir.join(format!("{}.srt", job.name))
    }

    /// Create the per-run intermediate directory.
    pub fn create_work_dir(&self, job: &ShortsJob) -> PipelineResult<tempfile::TempDir> {
        let prefix = format!("reelsync-{}-", job.name);
        let dir = match &self.work_dir {
            Some(parent) => {
                std::fs::create_dir_all(parent)?;
                tempfile::Builder::new().prefix(&prefix).tempdir_in(parent)?
            }
            None => tempfile::Builder::new().prefix(&prefix).tempdir()?,
        };
        Ok(dir)
    }

    /// Resolve the job's source against `base` when it is relative.
    pub fn resolve_source(job: &ShortsJob, base: &Path) -> PathBuf {
        if job.source.is_absolute() {
            job.source.clone()
        } else {
            base.join(&job.source)
        }
    }
}

/// Load a job manifest, resolving a relative source against the
/// manifest's directory.
pub fn load_job(path: &Path) -> PipelineResult<ShortsJob> {
    let json = std::fs::read_to_string(path)
        .map_err(|e| PipelineError::invalid_job(format!("cannot read {}: {}", path.display(), e)))?;
    let mut job = ShortsJob::from_json(&json)?;
    let base = path.parent().unwrap_or_else(|| Path::new("."));
    job.source = RunConfig::resolve_source(&job, base);
    Ok(job)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_job_resolves_source() {
        let dir = tempfile::tempdir().unwrap();
        let manifest = dir.path().join("ja7.json");
        std::fs::write(&manifest, r#"{"name": "ja7", "source": "clips/ja7.mp4"}"#).unwrap();

        let job = load_job(&manifest).unwrap();
        assert_eq!(job.source, dir.path().join("clips/ja7.mp4"));
    }

    #[test]
    fn test_load_job_reports_invalid_manifest() {
        let dir = tempfile::tempdir().unwrap();
        let manifest = dir.path().join("bad.json");
        std::fs::write(&manifest, r#"{"name": "", "source": "a.mp4"}"#).unwrap();
        assert!(matches!(load_job(&manifest), Err(PipelineError::InvalidJob(_))));
        assert!(matches!(
            load_job(&dir.path().join("missing.json")),
            Err(PipelineError::InvalidJob(_))
        ));
    }

    fn job(voice: Option<&str>) -> ShortsJob {
        let mut job = ShortsJob::from_json(r#"{"name": "ja7", "source": "ja7.mp4"}"#).unwrap();
        job.voice = voice.map(str::to_string);
        job
    }

    #[test]
    fn test_voice_precedence() {
        let config = RunConfig::default();
        assert_eq!(config.voice_for(&job(None)), reelsync_tts::DEFAULT_VOICE);
        assert_eq!(config.voice_for(&job(Some("ja-JP-NanamiNeural"))), "ja-JP-NanamiNeural");

        let config = config.with_voice("zh-CN-XiaoxiaoNeural");
        assert_eq!(config.voice_for(&job(Some("ja-JP-NanamiNeural"))), "zh-CN-XiaoxiaoNeural");
    }

    #[test]
    fn test_output_paths() {
        let config = RunConfig::default().with_out_dir("/out");
        assert_eq!(config.output_path(&job(None)), PathBuf::from("/out/ja7.mp4"));
        assert_eq!(config.subtitle_path(&job(None)), PathBuf::from("/out/ja7.srt"));
    }

    #[test]
    fn test_dry_run_skips_font_check() {
        let mut config = RunConfig::default().with_dry_run(true);
        config.fonts.bold = PathBuf::from("/nonexistent/bold.ttf");
        assert!(config.validate().is_ok());

        config.dry_run = false;
        assert!(matches!(config.validate(), Err(PipelineError::Config(_))));
    }

    #[test]
    fn test_resolve_source() {
        let job = job(None);
        assert_eq!(
            RunConfig::resolve_source(&job, Path::new("/jobs")),
            PathBuf::from("/jobs/ja7.mp4")
        );
    }
}
