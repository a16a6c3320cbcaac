//! DappStore CLI
//!
//! Runs the marketplace ledger in-process:
//! - demo: walk through listing, purchase, retrieval and transfer
//! - run: replay a JSON script of operations against a fresh store
//!
//! # Usage
//!
//! ```bash
//! dappstore demo
//! dappstore run demos/scenario.json
//! DAPPSTORE__STORE__TREASURY=0xfee dappstore --log-format json run scenario.json
//! ```

mod config;
mod script;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use dappstore_marketplace::DappStore;

use crate::config::{AppConfig, LoggingConfig};

/// DappStore - application marketplace ledger
#[derive(Parser, Debug)]
#[command(name = "dappstore")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to configuration file (TOML, JSON, or YAML)
    #[arg(short, long, env = "DAPPSTORE_CONFIG")]
    config: Option<String>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "DAPPSTORE_LOG_LEVEL")]
    log_level: Option<String>,

    /// Log format (json, pretty)
    #[arg(long, env = "DAPPSTORE_LOG_FORMAT")]
    log_format: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run the built-in listing/purchase/transfer walkthrough
    Demo,
    /// Replay a JSON script of operations
    Run {
        /// Path to the script file
        file: String,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut app_config = AppConfig::load(cli.config.as_deref())?;
    if let Some(level) = cli.log_level {
        app_config.logging.level = level;
    }
    if let Some(format) = cli.log_format {
        app_config.logging.format = format;
    }

    init_logging(&app_config.logging)?;

    tracing::info!(version = env!("CARGO_PKG_VERSION"), "Starting DappStore");

    let store = DappStore::new(app_config.store_config());

    let ops = match cli.command {
        Commands::Demo => script::demo_script(store.administrator()),
        Commands::Run { file } => {
            let text = std::fs::read_to_string(&file)
                .with_context(|| format!("failed to read script {file}"))?;
            script::parse_script(&text)?
        }
    };

    tracing::info!(operations = ops.len(), "Running script");
    for line in script::run_script(&store, ops).await {
        println!("{}", serde_json::to_string(&line)?);
    }

    Ok(())
}

/// Initialize tracing/logging
///
/// Logs go to stderr so stdout carries only result lines.
fn init_logging(config: &LoggingConfig) -> anyhow::Result<()> {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.level));

    let subscriber = tracing_subscriber::registry().with(env_filter);

    match config.format.as_str() {
        "json" => {
            subscriber
                .with(fmt::layer().json().with_target(true).with_writer(std::io::stderr))
                .try_init()?;
        }
        "pretty" => {
            subscriber
                .with(fmt::layer().pretty().with_target(false).with_writer(std::io::stderr))
                .try_init()?;
        }
        other => anyhow::bail!("unknown log format '{other}' (expected json or pretty)"),
    }

    Ok(())
}
