//! FFprobe media information.

use std::path::Path;
use std::process::Stdio;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::process::Command;
use tracing::debug;

use crate::command::check_ffprobe;
use crate::error::{MediaError, MediaResult};

/// Media file information.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MediaInfo {
    /// Duration in seconds
    pub duration_secs: f64,
    /// Width of the first video stream
    pub width: Option<u32>,
    /// Height of the first video stream
    pub height: Option<u32>,
    /// Frame rate of the first video stream
    pub fps: Option<f64>,
    pub has_video: bool,
    pub has_audio: bool,
    /// File size in bytes
    pub size: u64,
}

/// Measures media assets: the source, synthesized narration and rendered
/// intermediates.
#[async_trait]
pub trait MediaProbe: Send + Sync {
    async fn probe(&self, path: &Path) -> MediaResult<MediaInfo>;

    /// Duration in seconds.
    async fn duration(&self, path: &Path) -> MediaResult<f64> {
        Ok(self.probe(path).await?.duration_secs)
    }
}

/// [`MediaProbe`] backed by the `ffprobe` binary.
#[derive(Debug, Clone, Default)]
pub struct FfprobeProbe;

#[async_trait]
impl MediaProbe for FfprobeProbe {
    async fn probe(&self, path: &Path) -> MediaResult<MediaInfo> {
        if !path.exists() {
            return Err(MediaError::FileNotFound(path.to_path_buf()));
        }
        let ffprobe = check_ffprobe()?;

        let output = Command::new(ffprobe)
            .args([
                "-v",
                "error",
                "-print_format",
                "json",
                "-show_format",
                "-show_streams",
            ])
            .arg(path)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .await?;

        if !output.status.success() {
            return Err(MediaError::FfprobeFailed {
                message: format!("FFprobe failed on {}", path.display()),
                stderr: Some(String::from_utf8_lossy(&output.stderr).trim().to_string()),
            });
        }

        let info = parse_ffprobe_output(&output.stdout)?;
        debug!(
            path = %path.display(),
            duration_secs = info.duration_secs,
            has_audio = info.has_audio,
            "Probed media"
        );
        Ok(info)
    }
}

/// FFprobe JSON output format.
#[derive(Debug, Deserialize)]
struct FfprobeOutput {
    format: FfprobeFormat,
    #[serde(default)]
    streams: Vec<FfprobeStream>,
}

#[derive(Debug, Deserialize)]
struct FfprobeFormat {
    duration: Option<String>,
    size: Option<String>,
}

#[derive(Debug, Deserialize)]
struct FfprobeStream {
    codec_type: String,
    width: Option<u32>,
    height: Option<u32>,
    avg_frame_rate: Option<String>,
    r_frame_rate: Option<String>,
    duration: Option<String>,
}

/// Parse `ffprobe -show_format -show_streams` JSON.
///
/// The container duration wins; the longest stream duration is the
/// fallback for containers that do not report one.
pub fn parse_ffprobe_output(json: &[u8]) -> MediaResult<MediaInfo> {
    let probe: FfprobeOutput = serde_json::from_slice(json)?;

    let stream_duration = probe
        .streams
        .iter()
        .filter_map(|s| s.duration.as_deref().and_then(|d| d.parse::<f64>().ok()))
        .fold(None, |max: Option<f64>, d| Some(max.map_or(d, |m| m.max(d))));
    let duration_secs = probe
        .format
        .duration
        .as_deref()
        .and_then(|d| d.parse::<f64>().ok())
        .or(stream_duration)
        .ok_or_else(|| MediaError::InvalidMedia("no duration reported".to_string()))?;

    let video = probe.streams.iter().find(|s| s.codec_type == "video");
    let fps = video.and_then(|s| {
        s.avg_frame_rate
            .as_deref()
            .and_then(parse_frame_rate)
            .or_else(|| s.r_frame_rate.as_deref().and_then(parse_frame_rate))
    });

    Ok(MediaInfo {
        duration_secs,
        width: video.and_then(|s| s.width),
        height: video.and_then(|s| s.height),
        fps,
        has_video: video.is_some(),
        has_audio: probe.streams.iter().any(|s| s.codec_type == "audio"),
        size: probe
            .format
            .size
            .as_deref()
            .and_then(|s| s.parse().ok())
            .unwrap_or(0),
    })
}

/// Parse frame rate string (e.g., "30/1" or "29.97").
fn parse_frame_rate(s: &str) -> Option<f64> {
    if let Some((num, den)) = s.split_once('/') {
        let num: f64 = num.parse().ok()?;
        let den: f64 = den.parse().ok()?;
        return (den > 0.0 && num > 0.0).then(|| num / den);
    }
    s.parse().ok().filter(|fps: &f64| *fps > 0.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    const VIDEO_JSON: &str = r#"{
        "streams": [
            {"codec_type": "video", "width": 1920, "height": 1080,
             "avg_frame_rate": "30000/1001", "r_frame_rate": "30000/1001", "duration": "48.048"},
            {"codec_type": "audio", "duration": "48.000"}
        ],
        "format": {"duration": "48.048000", "size": "1048576"}
    }"#;

    #[test]
    fn test_parse_video() {
        let info = parse_ffprobe_output(VIDEO_JSON.as_bytes()).unwrap();
        assert!((info.duration_secs - 48.048).abs() < 1e-9);
        assert_eq!(info.width, Some(1920));
        assert_eq!(info.height, Some(1080));
        assert!((info.fps.unwrap() - 29.97).abs() < 0.01);
        assert!(info.has_video && info.has_audio);
        assert_eq!(info.size, 1048576);
    }

    #[test]
    fn test_parse_audio_only_uses_stream_duration() {
        let json = r#"{"streams": [{"codec_type": "audio", "duration": "4.224"}], "format": {}}"#;
        let info = parse_ffprobe_output(json.as_bytes()).unwrap();
        assert!((info.duration_secs - 4.224).abs() < 1e-9);
        assert!(!info.has_video);
        assert_eq!(info.width, None);
    }

    #[test]
    fn test_missing_duration_is_invalid() {
        let json = r#"{"streams": [], "format": {}}"#;
        assert!(matches!(
            parse_ffprobe_output(json.as_bytes()),
            Err(MediaError::InvalidMedia(_))
        ));
    }

    #[test]
    fn test_parse_frame_rate() {
        assert!((parse_frame_rate("30/1").unwrap() - 30.0).abs() < 0.01);
        assert!((parse_frame_rate("29.97").unwrap() - 29.97).abs() < 0.01);
        assert_eq!(parse_frame_rate("0/0"), None);
    }

    #[test]
    fn test_probe_missing_file() {
        let result = tokio_test::block_on(FfprobeProbe.probe(Path::new("/nonexistent/clip.mp4")));
        assert!(matches!(result, Err(MediaError::FileNotFound(_))));
    }
}
