//! Concatenation through the concat demuxer with stream copy.

use std::path::{Path, PathBuf};

use crate::command::FfmpegCommand;

/// Contents of a concat demuxer list file.
pub fn concat_list(paths: &[PathBuf]) -> String {
    paths
        .iter()
        .map(|p| format!("file '{}'\n", p.display().to_string().replace('\'', r"'\''")))
        .collect()
}

/// Concatenate the clips listed in `list_path` without re-encoding.
pub fn concat_command(list_path: &Path, output: &Path) -> FfmpegCommand {
    FfmpegCommand::new(list_path, output)
        .input_args(["-f", "concat", "-safe", "0"])
        .output_args(["-c", "copy", "-movflags", "+faststart"])
}
