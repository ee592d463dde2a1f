use secrecy::SecretString;

/// Shared handler state: one reqwest client for the process plus the
/// upstream credentials and model choice.
#[derive(Clone)]
pub struct AppState {
    pub http: reqwest::Client,
    pub openai_api_key: Option<SecretString>,
    pub tts_model: String,
}
