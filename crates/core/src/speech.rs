//! Speech output port.
//!
//! The platform text-to-speech engine is an external collaborator; the core
//! only sees this trait. Implementations must resolve on playback end *or*
//! on any engine error, so callers never need an error path. The port is a
//! single logical channel: starting a new utterance cancels one already
//! playing.

use crate::voices::Lang;
use async_trait::async_trait;

/// Speaking rate per language. Korean runs slightly slower, which sounds
/// more natural with the synthetic voices children hear.
pub const TTS_RATE_EN: f32 = 0.88;
pub const TTS_RATE_KO: f32 = 0.82;

pub fn speech_rate(lang: Lang) -> f32 {
    match lang {
        Lang::En => TTS_RATE_EN,
        Lang::Ko => TTS_RATE_KO,
    }
}

#[async_trait]
pub trait SpeechOutput: Send {
    /// Plays `text` and resolves when playback finishes. When `lang` is
    /// `None` the implementation auto-detects it from the text. Never
    /// fails: an absent or broken engine resolves immediately.
    async fn speak(&mut self, text: &str, lang: Option<Lang>);

    /// Cancels any in-flight utterance.
    fn stop(&mut self);
}

/// Output port for environments with no speech engine at all. Resolves
/// immediately, which degrades every screen to silent auto-advance.
#[derive(Debug, Default)]
pub struct NullSpeechOutput;

#[async_trait]
impl SpeechOutput for NullSpeechOutput {
    async fn speak(&mut self, _text: &str, _lang: Option<Lang>) {}

    fn stop(&mut self) {}
}
