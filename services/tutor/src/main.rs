mod config;
mod console;
mod relay;
mod runner;
mod script_loader;
mod storage;

use crate::config::{Config, SpeechProvider};
use crate::console::{ConsolePlayback, LineRecognizer};
use crate::relay::{RelayClient, RelayPlayback};
use crate::runner::ScreenPorts;
use crate::storage::JsonFileRecapStore;
use anyhow::{Context, Result};
use clap::Parser;
use rand::SeedableRng;
use rand::rngs::StdRng;
use selfit_core::recap::RecapStore;
use selfit_core::speech::SpeechOutput;
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::fmt::time::ChronoLocal;

#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
enum Screen {
    Lecture,
    Warmup,
    Roleplay,
    Freetalk,
    Recap,
    All,
}

#[derive(Parser)]
struct Cli {
    /// Which screen to run
    #[arg(value_enum, default_value = "all")]
    screen: Screen,
    /// Directory holding lesson.json (builtin lesson when absent)
    #[arg(long, default_value = "scripts")]
    scripts: PathBuf,
    /// Disable speech recognition; taps drive every screen
    #[arg(long)]
    no_stt: bool,
    /// Seed for the roleplay draws, for reproducible runs
    #[arg(long)]
    seed: Option<u64>,
}

#[tokio::main]
async fn main() -> Result<()> {
    // --- 1. Load Configuration ---
    let config = Config::from_env().context("Failed to load application configuration")?;

    // --- 2. Initialize Logging ---
    tracing_subscriber::fmt()
        .with_max_level(config.log_level)
        .with_timer(ChronoLocal::rfc_3339())
        .init();

    tracing::info!("Configuration loaded successfully. Starting tutor...");

    // --- 3. Parse Command-Line Arguments ---
    let args = Cli::parse();

    // --- 4. Load the Lesson ---
    let lesson = script_loader::load_lesson(&args.scripts).context("Failed to load lesson")?;
    tracing::info!("Loaded lesson '{}' ({})", lesson.course, lesson.topic);

    // --- 5. Wire the Ports ---
    let output: Box<dyn SpeechOutput> = match config.provider {
        SpeechProvider::Console => Box::new(ConsolePlayback::new(true)),
        SpeechProvider::Relay => Box::new(RelayPlayback::new(RelayClient::new(
            config.tts_relay_url.clone(),
        ))),
    };
    let store: Arc<dyn RecapStore> = Arc::new(JsonFileRecapStore::new(&config.data_dir));
    let mut ports = ScreenPorts {
        output,
        recognizer: LineRecognizer::new(!args.no_stt),
        store,
        no_stt: args.no_stt,
    };

    let rng = match args.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_os_rng(),
    };

    // --- 6. Run the Flow ---
    match args.screen {
        Screen::Lecture => runner::run_lecture(&mut ports, &lesson).await?,
        Screen::Warmup => runner::run_warmup(&mut ports, &lesson).await?,
        Screen::Roleplay => runner::run_roleplay(&mut ports, &lesson, rng).await?,
        Screen::Freetalk => runner::run_freetalk(&mut ports, &lesson).await?,
        Screen::Recap => runner::print_recap(&ports.store)?,
        Screen::All => {
            runner::run_lecture(&mut ports, &lesson).await?;
            runner::run_warmup(&mut ports, &lesson).await?;
            runner::run_roleplay(&mut ports, &lesson, rng).await?;
            runner::run_freetalk(&mut ports, &lesson).await?;
            runner::print_recap(&ports.store)?;
        }
    }

    tracing::info!("Lesson flow finished.");
    Ok(())
}
