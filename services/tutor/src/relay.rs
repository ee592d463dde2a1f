//! Client for the TTS relay service and the output port built on it.

use async_trait::async_trait;
use selfit_core::speech::{SpeechOutput, speech_rate};
use selfit_core::voices::{Lang, detect_lang};
use std::collections::HashMap;
use std::time::Duration;

#[derive(Debug, thiserror::Error)]
pub enum RelayError {
    /// The relay reached OpenAI but the synthesis call failed. Carries the
    /// upstream status so the caller can log it; never retried.
    #[error("TTS relay upstream error ({status}): {detail}")]
    Upstream { status: u16, detail: String },
    #[error("TTS relay transport error: {0}")]
    Transport(#[from] reqwest::Error),
}

#[derive(serde::Serialize)]
struct TtsRequest<'a> {
    text: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    voice: Option<&'a str>,
}

pub struct RelayClient {
    http: reqwest::Client,
    base_url: String,
}

impl RelayClient {
    pub fn new(base_url: String) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url,
        }
    }

    /// Synthesizes `text` into MP3 bytes via `POST /api/tts`.
    pub async fn synthesize(&self, text: &str, voice: Option<&str>) -> Result<Vec<u8>, RelayError> {
        let url = format!("{}/api/tts", self.base_url.trim_end_matches('/'));
        let response = self
            .http
            .post(&url)
            .json(&TtsRequest { text, voice })
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            return Err(RelayError::Upstream {
                status: status.as_u16(),
                detail,
            });
        }

        Ok(response.bytes().await?.to_vec())
    }
}

/// Per-language relay voice. The relay exposes OpenAI's voice roster, so
/// the platform-voice preference chains don't apply here.
fn relay_voice(lang: Lang) -> &'static str {
    match lang {
        Lang::En => "nova",
        Lang::Ko => "shimmer",
    }
}

/// Output port that synthesizes through the relay. Audio bytes are cached
/// per utterance so repeated lines (model replays, praise) hit the relay
/// once, and playback is simulated from the payload size since the terminal
/// has no audio device.
pub struct RelayPlayback {
    client: RelayClient,
    cache: HashMap<String, Vec<u8>>,
}

impl RelayPlayback {
    pub fn new(client: RelayClient) -> Self {
        Self {
            client,
            cache: HashMap::new(),
        }
    }

    /// Rough MP3 duration at the relay's bitrate, scaled by speaking rate.
    fn playback_duration(bytes: usize, lang: Lang) -> Duration {
        let seconds = bytes as f32 / 4_000.0 / speech_rate(lang);
        Duration::from_secs_f32(seconds)
    }
}

#[async_trait]
impl SpeechOutput for RelayPlayback {
    async fn speak(&mut self, text: &str, lang: Option<Lang>) {
        let lang = lang.unwrap_or_else(|| detect_lang(text));
        let cache_key = format!("{}:{text}", lang.bcp47());

        let audio = match self.cache.get(&cache_key) {
            Some(audio) => audio.clone(),
            None => match self.client.synthesize(text, Some(relay_voice(lang))).await {
                Ok(audio) => {
                    self.cache.insert(cache_key, audio.clone());
                    audio
                }
                Err(e) => {
                    // The port never fails; a broken relay degrades to
                    // silent immediate resolution.
                    tracing::warn!("TTS synthesis failed, skipping playback: {e}");
                    return;
                }
            },
        };

        println!("🔊 {text}");
        tokio::time::sleep(Self::playback_duration(audio.len(), lang)).await;
    }

    fn stop(&mut self) {}
}
