//! Still-frame sampling and hold clips.

use std::path::Path;

use reelsync_models::EncodingConfig;

use crate::command::FfmpegCommand;

/// Generated silent stereo track, so hold clips concatenate with a uniform
/// stream layout.
pub const SILENT_AUDIO_SOURCE: &str = "anullsrc=r=44100:cl=stereo";

/// Sample the frame at `at_secs` into a high-quality JPEG.
pub fn sample_frame_command(source: &Path, at_secs: f64, output: &Path) -> FfmpegCommand {
    FfmpegCommand::new(source, output)
        .seek(at_secs)
        .single_frame()
        .output_args(["-q:v", "2"])
}

/// Hold a still image for `duration_secs` with a silent audio track.
pub fn hold_clip_command(
    frame: &Path,
    duration_secs: f64,
    encoding: &EncodingConfig,
    output: &Path,
) -> FfmpegCommand {
    FfmpegCommand::new(frame, output)
        .input_args(["-loop", "1", "-framerate"])
        .input_arg(encoding.frame_rate.to_string())
        .duration(duration_secs)
        .add_lavfi_input(SILENT_AUDIO_SOURCE)
        .duration(duration_secs)
        .map("0:v")
        .map("1:a")
        // yuv420p needs even dimensions
        .output_args(["-vf", "scale=trunc(iw/2)*2:trunc(ih/2)*2"])
        .output_args(encoding.to_ffmpeg_args())
        .output_arg("-shortest")
}
