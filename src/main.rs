//! wallet-glance - the connected wallet account and its balance, in a terminal.

use std::sync::Arc;

use tracing::{error, info};
use wallet_glance::cli::Cli;
use wallet_glance::config::Config;
use wallet_glance::connection::ConnectionManager;
use wallet_glance::error::Result;
use wallet_glance::{logging, tui};

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    let cli = Cli::parse_args();

    // The TUI owns stdout, so logs go to a file there
    if cli.is_headless() {
        logging::init_stderr_logging();
    } else {
        logging::init_file_logging();
    }

    match run(cli).await {
        Ok(code) => std::process::exit(code),
        Err(e) => {
            error!("{}: {}", e.category(), e);
            eprintln!("{}: {}", e.category(), e);
            std::process::exit(1);
        }
    }
}

async fn run(cli: Cli) -> Result<i32> {
    let config_path = cli.config_path();
    info!("Loading config from: {}", config_path.display());
    let config = Config::load_from_file(&config_path)?;

    if cli.is_headless() {
        return tui::headless::run_headless(&cli, &config).await;
    }

    let source = cli.wallet_source(&config)?;
    let manager = Arc::new(ConnectionManager::from_config(&source, &config)?);
    info!("Using {}", manager.describe());

    let startup = manager.start();
    let result = tui::run(manager, &config).await;
    startup.abort();
    result?;

    Ok(0)
}
