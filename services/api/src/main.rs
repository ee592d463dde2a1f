mod config;
mod state;
mod tts;

use crate::config::Config;
use crate::state::AppState;
use anyhow::Context;
use axum::Router;
use axum::routing::post;
use tower_http::cors::{Any, CorsLayer};
use tracing::info;
use tracing_subscriber::fmt::time::ChronoLocal;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::from_env().context("Failed to load application configuration")?;

    tracing_subscriber::fmt()
        .with_max_level(config.log_level)
        .with_timer(ChronoLocal::rfc_3339())
        .init();

    if config.openai_api_key.is_none() {
        tracing::warn!("OPENAI_API_KEY is not set; /api/tts will answer 503");
    }

    // Permissive CORS so the lesson frontend can call the relay from any
    // origin during development.
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(tower_http::cors::Any)
        .allow_headers(tower_http::cors::Any);

    let state = AppState {
        http: reqwest::Client::new(),
        openai_api_key: config.openai_api_key.clone(),
        tts_model: config.tts_model.clone(),
    };

    let app = Router::new()
        .route("/api/tts", post(tts::synthesize))
        .layer(cors)
        .with_state(state);

    info!("Starting TTS relay, listening on {}", config.bind_address);

    let listener = tokio::net::TcpListener::bind(config.bind_address).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
