//! # Stocktake CLI Entry Point
//!
//! Command-line front end for one stock-take session.
//!
//! ## Startup Sequence
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        CLI Startup                                      │
//! │                                                                         │
//! │  1. Initialize Logging ───────────────────────────────────────────────► │
//! │     • tracing-subscriber with env filter, written to stderr             │
//! │     • Default: info,stocktake=debug; override with RUST_LOG             │
//! │                                                                         │
//! │  2. Load Configuration ───────────────────────────────────────────────► │
//! │     • --config FILE, else the platform config directory                 │
//! │     • STOCKTAKE_* environment overrides                                 │
//! │                                                                         │
//! │  3. Wire Capabilities ────────────────────────────────────────────────► │
//! │     • HttpBackend (reqwest)                                             │
//! │     • ConsoleNotifier                                                   │
//! │     • StdinConfirmer, or AutoConfirm with --yes                         │
//! │                                                                         │
//! │  4. Open Session & Run Subcommand ────────────────────────────────────► │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Exit status is non-zero when the operation failed or was not confirmed.

mod cli;
mod commands;
mod console;

use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use stocktake_client::{
    AutoConfirm, ClientConfig, ClientResult, Confirmer, HttpBackend, SessionDeps,
    StockTakeSessionController,
};

use crate::cli::Cli;
use crate::console::{ConsoleNotifier, StdinConfirmer};

#[tokio::main]
async fn main() -> ExitCode {
    init_tracing();

    let cli = Cli::parse();

    let config_path = cli.config.clone().or_else(ClientConfig::default_config_path);

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(error = %e, "Command failed");
            eprintln!("{}", e.user_message());
            if e.is_config_error() {
                if let Some(path) = config_path {
                    eprintln!("Check the configuration in {}", path.display());
                }
            }
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> ClientResult<()> {
    let config = ClientConfig::load(cli.config.clone())?;
    info!(backend = %config.backend.base_url, "Configuration loaded");

    let backend = Arc::new(HttpBackend::new(&config.backend)?);
    let confirmer: Arc<dyn Confirmer> = if cli.yes {
        Arc::new(AutoConfirm)
    } else {
        Arc::new(StdinConfirmer::new())
    };

    let deps = SessionDeps {
        notifier: Arc::new(ConsoleNotifier),
        confirmer,
        settings: config.session.clone(),
        context: config.context.clone(),
    };

    let controller =
        StockTakeSessionController::open(backend.clone(), backend, deps, &cli.session_id).await?;

    commands::run(&controller, cli.command).await
}

/// Initializes the tracing subscriber for structured logging.
///
/// ## Log Levels
/// - `RUST_LOG=debug` - Show debug messages
/// - `RUST_LOG=stocktake_client=trace` - Trace the client crate only
/// - Default: `info,stocktake=debug`
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,stocktake=debug"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
