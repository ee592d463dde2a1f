//! Speech input port.
//!
//! The platform recognizer is consumed through [`SpeechRecognizer`], which
//! exposes the raw event stream of a single recognition session. The
//! [`listen`] wrapper turns that stream into the one promise the engines
//! rely on: a trimmed transcript, empty when nothing usable was heard, never
//! earlier than `min_duration` and never later than `max_duration`.

use async_trait::async_trait;
#[cfg(test)]
use mockall::automock;
use std::time::Duration;
use tokio::time::{Instant, sleep, sleep_until};

#[derive(Debug, Clone)]
pub struct ListenOptions {
    pub lang: String,
    pub continuous: bool,
    /// Hard ceiling. A hung platform session resolves empty at this point
    /// rather than blocking forever.
    pub max_duration: Duration,
    /// The capture stays active at least this long, even when a result
    /// arrives earlier.
    pub min_duration: Duration,
}

impl Default for ListenOptions {
    fn default() -> Self {
        Self {
            lang: "en-US".to_string(),
            continuous: false,
            max_duration: Duration::from_millis(10_000),
            min_duration: Duration::from_millis(5_000),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum RecognizerEvent {
    /// A final transcript for the session so far.
    Result(String),
    /// Transient "no speech yet". Ignored while the window is still open
    /// and nothing has been recognized.
    NoSpeech,
    /// The platform session ended on its own.
    Ended,
    /// Hard engine error. The session resolves with whatever partial
    /// transcript was captured.
    Error(String),
}

/// One platform recognition session. `next_event` must be cancel-safe: the
/// wrapper polls it inside a `select!` against its deadline.
#[async_trait]
#[cfg_attr(test, automock)]
pub trait SpeechRecognizer: Send {
    fn is_supported(&self) -> bool;

    fn start(&mut self, lang: &str, continuous: bool);

    async fn next_event(&mut self) -> RecognizerEvent;

    fn abort(&mut self);
}

/// Records until a usable result, session end, or `max_duration`, then
/// resolves with the trimmed transcript once `min_duration` has elapsed.
/// Resolves empty when recognition is unsupported.
pub async fn listen<R>(recognizer: &mut R, options: ListenOptions) -> String
where
    R: SpeechRecognizer + ?Sized,
{
    if !recognizer.is_supported() {
        return String::new();
    }

    let started = Instant::now();
    let deadline = started + options.max_duration;
    recognizer.start(&options.lang, options.continuous);

    let mut transcript = String::new();
    loop {
        tokio::select! {
            event = recognizer.next_event() => match event {
                RecognizerEvent::Result(text) => {
                    transcript = text.trim().to_string();
                }
                RecognizerEvent::NoSpeech if transcript.is_empty() => {
                    // Still within the window and nothing heard yet.
                }
                RecognizerEvent::NoSpeech => break,
                RecognizerEvent::Ended => {
                    if !transcript.is_empty() {
                        break;
                    }
                    // Session ended without a result: hold the window open
                    // until the ceiling, mirroring a restartable platform
                    // session that simply stayed silent.
                    sleep_until(deadline).await;
                    break;
                }
                RecognizerEvent::Error(reason) => {
                    tracing::debug!("recognizer error, resolving with partial: {reason}");
                    break;
                }
            },
            _ = sleep_until(deadline) => break,
        }
    }

    let elapsed = started.elapsed();
    if elapsed < options.min_duration {
        sleep(options.min_duration - elapsed).await;
    }
    recognizer.abort();
    transcript
}
