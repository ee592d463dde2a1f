//! Terminal ports: speech out as printed lines with simulated playback
//! timing, speech in as typed lines.

use async_trait::async_trait;
use selfit_core::listen::{RecognizerEvent, SpeechRecognizer};
use selfit_core::speech::{SpeechOutput, speech_rate};
use selfit_core::voices::{Lang, VoiceCatalog, VoiceInfo, detect_lang};
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, BufReader, Lines, Stdin};

/// Per-character playback pacing at rate 1.0. Rough average for the short
/// utterances in a lesson; the point is ordering, not realism.
const MS_PER_CHAR: u64 = 45;

/// The fixed voice list a terminal "platform" reports. Shaped like real
/// browser voice names so the catalog's preference chains have something
/// to chew on.
pub fn console_voices() -> Vec<VoiceInfo> {
    vec![
        VoiceInfo::new("Google US English", "en-US"),
        VoiceInfo::new("Samantha", "en-US"),
        VoiceInfo::new("Google 한국어", "ko-KR"),
        VoiceInfo::new("Yuna", "ko-KR"),
    ]
}

pub struct ConsolePlayback {
    catalog: VoiceCatalog,
    /// When false, playback resolves immediately instead of sleeping.
    simulate_timing: bool,
}

impl ConsolePlayback {
    pub fn new(simulate_timing: bool) -> Self {
        Self {
            catalog: VoiceCatalog::new(console_voices()),
            simulate_timing,
        }
    }

    fn playback_duration(text: &str, lang: Lang) -> Duration {
        let base = text.chars().count() as u64 * MS_PER_CHAR;
        Duration::from_millis((base as f32 / speech_rate(lang)) as u64)
    }
}

#[async_trait]
impl SpeechOutput for ConsolePlayback {
    async fn speak(&mut self, text: &str, lang: Option<Lang>) {
        let lang = lang.unwrap_or_else(|| detect_lang(text));
        let voice = self
            .catalog
            .preferred(lang)
            .map(|v| v.name.clone())
            .unwrap_or_else(|| "default".to_string());
        println!("🔊 [{voice}] {text}");
        if self.simulate_timing {
            tokio::time::sleep(Self::playback_duration(text, lang)).await;
        }
    }

    fn stop(&mut self) {}
}

/// Recognizer over typed terminal lines. Each capture window delivers at
/// most one line, then reports the stream as ended so the listen wrapper
/// returns without waiting out its ceiling.
pub struct LineRecognizer {
    lines: Lines<BufReader<Stdin>>,
    supported: bool,
    delivered: bool,
}

impl LineRecognizer {
    pub fn new(supported: bool) -> Self {
        Self {
            lines: BufReader::new(tokio::io::stdin()).lines(),
            supported,
            delivered: false,
        }
    }

    /// Direct line access for tap-style affordances (choice and hint
    /// buttons) that bypass the capture window.
    pub async fn read_line(&mut self) -> Option<String> {
        self.lines.next_line().await.ok().flatten()
    }
}

#[async_trait]
impl SpeechRecognizer for LineRecognizer {
    fn is_supported(&self) -> bool {
        self.supported
    }

    fn start(&mut self, lang: &str, continuous: bool) {
        self.delivered = false;
        tracing::debug!("capture window opened (lang={lang}, continuous={continuous})");
        println!("🎤 (type your answer, empty line to stay silent)");
    }

    async fn next_event(&mut self) -> RecognizerEvent {
        if self.delivered {
            return RecognizerEvent::Ended;
        }
        match self.lines.next_line().await {
            Ok(Some(line)) => {
                self.delivered = true;
                if line.trim().is_empty() {
                    RecognizerEvent::NoSpeech
                } else {
                    RecognizerEvent::Result(line)
                }
            }
            Ok(None) => RecognizerEvent::Ended,
            Err(e) => RecognizerEvent::Error(e.to_string()),
        }
    }

    fn abort(&mut self) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn korean_playback_runs_slower_than_english() {
        let text = "hello there";
        assert!(
            ConsolePlayback::playback_duration(text, Lang::Ko)
                > ConsolePlayback::playback_duration(text, Lang::En)
        );
    }

    #[tokio::test]
    async fn playback_without_timing_resolves_immediately() {
        let mut playback = ConsolePlayback::new(false);
        playback.speak("Nice to meet you!", None).await;
        playback.speak("만나서 반가워요", Some(Lang::Ko)).await;
    }
}
