//! Sequential narration synthesis.

use std::path::Path;

use tracing::Instrument;

use reelsync_models::{NarrationAsset, RateAdjustment};
use reelsync_tts::{SpeechRequest, SpeechSynthesizer};

use crate::error::{PipelineError, PipelineResult, PipelineStage};
use crate::logging::RunLogger;

/// One line of narration to synthesize, in cue order.
#[derive(Debug, Clone, PartialEq)]
pub struct NarrationLine {
    /// Index of the cue (or slide) this line belongs to
    pub cue_index: usize,
    pub text: String,
    pub rate: RateAdjustment,
}

/// Synthesize every line, one request at a time, in the given order.
///
/// Each request completes before the next is issued. The first failure
/// aborts the run; nothing is retried.
pub async fn synthesize_all(
    synthesizer: &dyn SpeechSynthesizer,
    lines: &[NarrationLine],
    voice: &str,
    dir: &Path,
    logger: &RunLogger,
) -> PipelineResult<Vec<NarrationAsset>> {
    if lines.is_empty() {
        return Ok(Vec::new());
    }
    tokio::fs::create_dir_all(dir).await?;
    logger.log_stage(
        PipelineStage::Tts,
        &format!("Synthesizing {} narration lines with {} ({})", lines.len(), voice, synthesizer.name()),
    );

    let mut assets = Vec::with_capacity(lines.len());
    for line in lines {
        let output = dir.join(format!("narration_{:03}.mp3", line.cue_index));
        let request = SpeechRequest::new(line.text.clone(), voice, line.rate);
        let span = tracing::info_span!("tts", cue = line.cue_index, rate = %line.rate);

        let speech = synthesizer
            .synthesize(&request, &output)
            .instrument(span)
            .await
            .map_err(|e| PipelineError::tts(line.cue_index, e))?;

        tracing::debug!(
            cue = line.cue_index,
            duration_secs = speech.duration_secs,
            "Narration measured"
        );
        assets.push(NarrationAsset {
            cue_index: line.cue_index,
            text: line.text.clone(),
            audio_path: speech.audio_path,
            duration_secs: speech.duration_secs,
        });
    }
    Ok(assets)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;
    use std::sync::Mutex;

    use async_trait::async_trait;
    use reelsync_tts::{SynthesizedSpeech, TtsError, TtsResult};

    /// Records request order; fails on a chosen text.
    struct Recording {
        seen: Mutex<Vec<String>>,
        fail_on: Option<&'static str>,
    }

    #[async_trait]
    impl SpeechSynthesizer for Recording {
        fn name(&self) -> &'static str {
            "recording"
        }

        async fn synthesize(&self, request: &SpeechRequest, output: &Path) -> TtsResult<SynthesizedSpeech> {
            self.seen.lock().unwrap().push(request.text.clone());
            if self.fail_on == Some(request.text.as_str()) {
                return Err(TtsError::process_failed("exit 1", Some("403 Forbidden".into()), Some(1)));
            }
            Ok(SynthesizedSpeech {
                audio_path: output.to_path_buf(),
                duration_secs: request.text.len() as f64 * 0.1,
            })
        }
    }

    fn lines() -> Vec<NarrationLine> {
        ["first line", "second", "third one"]
            .iter()
            .enumerate()
            .map(|(i, text)| NarrationLine {
                cue_index: i,
                text: text.to_string(),
                rate: RateAdjustment(10),
            })
            .collect()
    }

    #[tokio::test]
    async fn test_lines_synthesized_in_order() {
        let dir = tempfile::tempdir().unwrap();
        let synth = Recording {
            seen: Mutex::new(Vec::new()),
            fail_on: None,
        };
        let assets = synthesize_all(&synth, &lines(), "ko-KR-SunHiNeural", dir.path(), &RunLogger::new("t"))
            .await
            .unwrap();

        assert_eq!(*synth.seen.lock().unwrap(), vec!["first line", "second", "third one"]);
        assert_eq!(assets.len(), 3);
        assert_eq!(assets[1].audio_path, dir.path().join("narration_001.mp3"));
        assert!((assets[0].duration_secs - 1.0).abs() < 1e-9);
    }

    #[tokio::test]
    async fn test_first_failure_aborts() {
        let dir = tempfile::tempdir().unwrap();
        let synth = Recording {
            seen: Mutex::new(Vec::new()),
            fail_on: Some("second"),
        };
        let err = synthesize_all(&synth, &lines(), "v", dir.path(), &RunLogger::new("t"))
            .await
            .unwrap_err();

        assert_eq!(err.stage(), Some(PipelineStage::Tts));
        assert_eq!(err.diagnostic(), Some("403 Forbidden"));
        assert_eq!(synth.seen.lock().unwrap().len(), 2);
    }

    #[test]
    fn test_no_lines_needs_no_directory() {
        let synth = Recording {
            seen: Mutex::new(Vec::new()),
            fail_on: None,
        };
        let assets = tokio_test::block_on(synthesize_all(
            &synth,
            &[],
            "v",
            &PathBuf::from("/nonexistent/narration"),
            &RunLogger::new("t"),
        ))
        .unwrap();
        assert!(assets.is_empty());
    }
}
