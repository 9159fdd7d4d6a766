//! Text-to-speech boundary for ReelSync.
//!
//! Narration is synthesized one cue at a time through a
//! [`SpeechSynthesizer`]. Every backend measures what it produced, so the
//! scheduler only ever sees real durations.

pub mod config;
pub mod edge;
pub mod error;
pub mod http;
pub mod synthesizer;

use std::sync::Arc;

use reelsync_media::MediaProbe;

pub use config::{TtsBackend, TtsConfig, DEFAULT_VOICE};
pub use edge::EdgeTtsSynthesizer;
pub use error::{TtsError, TtsResult};
pub use http::HttpSynthesizer;
pub use synthesizer::{measure_speech, SpeechRequest, SpeechSynthesizer, SynthesizedSpeech};

/// Build the synthesizer selected by `config`.
pub fn build_synthesizer(
    config: &TtsConfig,
    probe: Arc<dyn MediaProbe>,
) -> TtsResult<Box<dyn SpeechSynthesizer>> {
    Ok(match config.backend {
        TtsBackend::EdgeCli => Box::new(EdgeTtsSynthesizer::new(
            config.edge_binary.clone(),
            config.timeout,
            probe,
        )),
        TtsBackend::Http => Box::new(HttpSynthesizer::new(
            config.base_url.clone(),
            config.timeout,
            probe,
        )?),
    })
}
