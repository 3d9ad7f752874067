//! uigen Replay - Headless Session Player
//!
//! Plays a recorded session through the transcript core and prints what a chat
//! panel would show: user prompts, assistant text, one badge per tool call,
//! and how each turn ended.
//!
//! # Usage
//!
//! ```bash
//! # Replay a session with the default config
//! uigen-replay --script session.json
//!
//! # Custom config file and model
//! uigen-replay --script session.json --config ./uigen.toml --model claude-sonnet
//!
//! # Verbose logging (stderr)
//! RUST_LOG=debug uigen-replay --script session.json
//! ```
//!
//! # Session Format
//!
//! ```json
//! {"turns": [{"prompt": "create a button", "events": [
//!     {"tool_call_delta": {"call_id": "1", "tool_name": "str_replace_editor",
//!                          "args_delta": {"command": "create", "path": "/components/Button.jsx"}}},
//!     {"tool_result": {"call_id": "1", "result": {"success": true}}},
//!     "turn_complete"
//! ]}]}
//! ```

mod render;

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tokio::sync::mpsc;
use tracing::{info, warn};

use uigen_core::{
    load_config, load_config_from_path, ConfigOverrides, Coordinator, SessionScript,
    TranscriptUpdate,
};

use render::SurfaceStats;

/// uigen Replay - play a recorded session through the transcript core
#[derive(Parser, Debug)]
#[command(name = "uigen-replay")]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Recorded session (JSON)
    #[arg(short = 's', long, env = "UIGEN_SCRIPT", value_name = "FILE")]
    script: PathBuf,

    /// Configuration file path
    #[arg(short = 'c', long, env = "UIGEN_CONFIG", value_name = "FILE")]
    config: Option<PathBuf>,

    /// Model name sent with each turn
    #[arg(short = 'm', long, value_name = "NAME")]
    model: Option<String>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short = 'l', long, env = "UIGEN_LOG_LEVEL", default_value = "warn")]
    log_level: String,
}

fn init_logging(level: &str) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        tracing_subscriber::EnvFilter::new(format!("uigen_replay={level},uigen_core={level}"))
    });

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    init_logging(&args.log_level);

    info!("Version: {}", env!("CARGO_PKG_VERSION"));

    let mut config = match args.config {
        Some(ref path) => load_config_from_path(Some(path.clone())),
        None => load_config(),
    }
    .context("Failed to load configuration")?;

    let mut overrides = ConfigOverrides::new();
    if let Some(model) = args.model.clone() {
        overrides = overrides.with_model(model);
    }
    overrides
        .apply(&mut config)
        .context("Invalid command-line override")?;

    info!(model = %config.model, source = %config.source(), "Configuration loaded");

    let system_prompt = match config.system_prompt_file {
        Some(ref path) => Some(
            tokio::fs::read_to_string(path)
                .await
                .with_context(|| format!("Failed to read system prompt {}", path.display()))?,
        ),
        None => None,
    };

    let script_text = tokio::fs::read_to_string(&args.script)
        .await
        .with_context(|| format!("Failed to read session script {}", args.script.display()))?;
    let script = SessionScript::from_json(&script_text)
        .with_context(|| format!("Failed to parse session script {}", args.script.display()))?;

    info!(turns = script.turns.len(), "Session loaded");

    let (tx, rx) = mpsc::channel(config.channel_capacity);
    let surface = tokio::spawn(run_surface(rx));

    let mut coordinator =
        Coordinator::new(script.transport(), config.coordinator_config(system_prompt), tx);

    for turn in &script.turns {
        let start = coordinator.current_entries().len();

        if let Err(e) = coordinator.submit(&turn.prompt).await {
            warn!(prompt = %turn.prompt, error = %e, "Skipping turn");
            continue;
        }
        let state = coordinator.run_turn().await;

        for entry in &coordinator.current_entries()[start..] {
            println!("{}", render::entry_line(entry));
        }
        match coordinator.last_error() {
            Some(reason) => println!("-- {state}: {reason}"),
            None => println!("-- {state}"),
        }
        println!();
    }

    // Closing the update channel lets the surface task finish.
    drop(coordinator);
    let stats = surface.await.context("Surface task panicked")?;

    info!(
        updates = stats.updates,
        scrolls = stats.scrolls,
        "Session replayed"
    );

    Ok(())
}

/// Stand-in rendering layer: drains updates until the coordinator goes away
async fn run_surface(mut rx: mpsc::Receiver<TranscriptUpdate>) -> SurfaceStats {
    let mut stats = SurfaceStats::default();
    while let Some(update) = rx.recv().await {
        tracing::debug!(
            state = ?update.state(),
            growth = update.is_growth(),
            "Surface received update"
        );
        stats.record(&update);
    }
    stats
}
