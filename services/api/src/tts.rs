//! The `/api/tts` synthesis endpoint.
//!
//! Relays a text snippet to OpenAI's speech API and streams the MP3 bytes
//! back. The server key never reaches the client; a missing key degrades
//! to 503 per request instead of refusing to start.

use crate::state::AppState;
use axum::Json;
use axum::extract::State;
use axum::http::{HeaderValue, StatusCode, header};
use axum::response::{IntoResponse, Response};
use secrecy::ExposeSecret;
use serde_json::json;

const OPENAI_SPEECH_URL: &str = "https://api.openai.com/v1/audio/speech";

/// OpenAI's speech voice roster. Requests naming anything else fall back
/// to the default rather than erroring.
const VALID_VOICES: &[&str] = &[
    "alloy", "ash", "ballad", "coral", "echo", "fable", "onyx", "nova", "sage", "shimmer", "verse",
    "marin", "cedar",
];

const DEFAULT_VOICE: &str = "nova";

/// Child-friendly pacing, applied to every utterance.
const SPEECH_SPEED: f32 = 0.9;

#[derive(Debug, serde::Deserialize)]
pub struct TtsRequest {
    #[serde(default)]
    pub text: String,
    pub voice: Option<String>,
}

pub fn resolve_voice(requested: Option<&str>) -> &str {
    match requested {
        Some(v) if VALID_VOICES.contains(&v) => v,
        _ => DEFAULT_VOICE,
    }
}

fn error_response(status: StatusCode, error: &str, details: Option<String>) -> Response {
    let body = match details {
        Some(details) => json!({ "error": error, "details": details }),
        None => json!({ "error": error }),
    };
    (status, Json(body)).into_response()
}

pub async fn synthesize(State(state): State<AppState>, Json(request): Json<TtsRequest>) -> Response {
    let text = request.text.trim();
    if text.is_empty() {
        return error_response(StatusCode::BAD_REQUEST, "Text is required", None);
    }

    let Some(api_key) = state.openai_api_key.as_ref() else {
        tracing::warn!("TTS request received but no OPENAI_API_KEY is configured");
        return error_response(StatusCode::SERVICE_UNAVAILABLE, "TTS service not configured", None);
    };

    let voice = resolve_voice(request.voice.as_deref());
    tracing::debug!("synthesizing {} chars with voice '{voice}'", text.len());

    let upstream = state
        .http
        .post(OPENAI_SPEECH_URL)
        .bearer_auth(api_key.expose_secret())
        .json(&json!({
            "model": state.tts_model,
            "input": text,
            "voice": voice,
            "speed": SPEECH_SPEED,
            "response_format": "mp3",
        }))
        .send()
        .await;

    let response = match upstream {
        Ok(response) => response,
        Err(e) => {
            tracing::error!("TTS upstream request failed: {e}");
            return error_response(
                StatusCode::BAD_GATEWAY,
                "TTS generation failed",
                Some(e.to_string()),
            );
        }
    };

    let status = response.status();
    if !status.is_success() {
        let details = response.text().await.unwrap_or_default();
        tracing::error!("TTS upstream returned {status}: {details}");
        let status =
            StatusCode::from_u16(status.as_u16()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        return error_response(status, "TTS generation failed", Some(details));
    }

    let audio = match response.bytes().await {
        Ok(audio) => audio,
        Err(e) => {
            tracing::error!("Failed to read TTS audio body: {e}");
            return error_response(
                StatusCode::BAD_GATEWAY,
                "TTS generation failed",
                Some(e.to_string()),
            );
        }
    };

    (
        [
            (header::CONTENT_TYPE, HeaderValue::from_static("audio/mpeg")),
            (header::CACHE_CONTROL, HeaderValue::from_static("no-store")),
        ],
        audio,
    )
        .into_response()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_voices_pass_through() {
        assert_eq!(resolve_voice(Some("shimmer")), "shimmer");
        assert_eq!(resolve_voice(Some("cedar")), "cedar");
    }

    #[test]
    fn unknown_or_missing_voice_falls_back_to_the_default() {
        assert_eq!(resolve_voice(Some("hal9000")), "nova");
        assert_eq!(resolve_voice(Some("")), "nova");
        assert_eq!(resolve_voice(None), "nova");
    }

    #[test]
    fn request_body_tolerates_a_missing_voice_field() {
        let request: TtsRequest = serde_json::from_str(r#"{"text":"Nice to meet you!"}"#).unwrap();
        assert_eq!(request.text, "Nice to meet you!");
        assert!(request.voice.is_none());
    }
}
