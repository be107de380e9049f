//! Chime application binary - composition root.
//!
//! 1. Parse CLI arguments and load configuration from TOML
//! 2. Initialize tracing
//! 3. Either interpret a single command (`parse`), write a default config
//!    (`init`), or
//! 4. Build the scheduler, start its sweep loop, and serve the HTTP API
//!    until Ctrl+C, then drain pending entries

mod cli;
mod logging;

use std::sync::Arc;

use clap::Parser;

use chime_api::routes;
use chime_api::state::AppState;
use chime_core::config::ChimeConfig;
use chime_engine::{CommandInterpreter, SystemClock};

use cli::{CliArgs, Command};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = CliArgs::parse();
    let bootstrap_level = args.resolve_log_level("info");
    let mut config = logging::with_bootstrap(
        logging::env_filter(&bootstrap_level),
        std::io::stdout,
        || args.load_config(),
    )?;
    config.general.port = args.resolve_port(config.general.port);

    logging::init(&args.resolve_log_level(&config.general.log_level));

    match args.command() {
        Command::Parse { text } => parse(config, &text.join(" ")).map_err(Into::into),
        Command::Init { force } => {
            let path = args.resolve_config_path();
            cli::write_default_config(&path, force)?;
            println!("Wrote default configuration to {}", path.display());
            Ok(())
        }
        Command::Serve => serve(config, &args).await,
    }
}

/// Interpret one command and print the action without scheduling it.
fn parse(config: ChimeConfig, text: &str) -> chime_core::Result<()> {
    let interpreter = CommandInterpreter::new(config.interpreter, Arc::new(SystemClock));
    let action = interpreter.process_command(text);

    let mut value = serde_json::to_value(&action)?;
    if let Some(obj) = value.as_object_mut() {
        obj.insert("message".to_string(), action.describe().into());
    }
    println!("{}", serde_json::to_string_pretty(&value)?);
    Ok(())
}

async fn serve(config: ChimeConfig, args: &CliArgs) -> Result<(), Box<dyn std::error::Error>> {
    tracing::info!("Starting Chime v{}", env!("CARGO_PKG_VERSION"));
    tracing::info!(path = %args.resolve_config_path().display(), "Configuration resolved");

    let state = AppState::from_config(config.clone());
    let scheduler = state.scheduler.clone();

    let janitor = {
        let scheduler = scheduler.clone();
        tokio::spawn(async move { scheduler.run().await })
    };
    tracing::info!(
        interval_secs = config.scheduler.sweep_interval_secs,
        "Stale entry sweep started"
    );

    let served = routes::start_server(&config, state, shutdown_signal()).await;

    let drained = scheduler.shutdown();
    janitor.await?;
    tracing::info!(drained, "Chime stopped");

    served.map_err(Into::into)
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for Ctrl+C");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
