//! Configuration for the tutor runtime.
//!
//! Settings come from environment variables (with a `.env` file honored for
//! local development); everything interactive comes from the CLI instead.

use std::env;
use std::path::PathBuf;
use tracing::Level;

#[derive(Debug, Clone, PartialEq)]
pub enum SpeechProvider {
    /// Print utterances to the terminal and simulate playback timing.
    Console,
    /// Synthesize through the TTS relay service.
    Relay,
}

/// Holds all configuration loaded from the environment.
#[derive(Debug, Clone)]
pub struct Config {
    pub provider: SpeechProvider,
    pub tts_relay_url: String,
    pub data_dir: PathBuf,
    pub log_level: Level,
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for {var}: {value}")]
    InvalidValue { var: String, value: String },
    #[error("Invalid log level provided for RUST_LOG: {0}")]
    InvalidLogLevel(String),
}

impl Config {
    /// Loads configuration from environment variables.
    ///
    // *   `SPEECH_PROVIDER`: "console" or "relay". Defaults to "console".
    // *   `TTS_RELAY_URL`: (Optional) Base URL of the TTS relay service. Defaults to "http://localhost:3000".
    // *   `DATA_DIR`: (Optional) Directory for recap data. Defaults to "data".
    // *   `RUST_LOG`: (Optional) The logging level. Defaults to "INFO".
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let provider_str = env::var("SPEECH_PROVIDER").unwrap_or_else(|_| "console".to_string());
        let provider = match provider_str.to_lowercase().as_str() {
            "console" => SpeechProvider::Console,
            "relay" => SpeechProvider::Relay,
            _ => {
                return Err(ConfigError::InvalidValue {
                    var: "SPEECH_PROVIDER".to_string(),
                    value: provider_str,
                });
            }
        };

        let tts_relay_url =
            env::var("TTS_RELAY_URL").unwrap_or_else(|_| "http://localhost:3000".to_string());

        let data_dir = PathBuf::from(env::var("DATA_DIR").unwrap_or_else(|_| "data".to_string()));

        let log_level_str = env::var("RUST_LOG").unwrap_or_else(|_| "INFO".to_string());
        let log_level = log_level_str
            .parse::<Level>()
            .map_err(|_| ConfigError::InvalidLogLevel(log_level_str))?;

        Ok(Self {
            provider,
            tts_relay_url,
            data_dir,
            log_level,
        })
    }
}
