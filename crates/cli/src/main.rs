//! SimpleChat CLI: the main entry point.
//!
//! Commands:
//! - `serve`: Start the HTTP gateway (and the console bot when `application.cli` is set)
//! - `chat`: Console chat bot only
//! - `config`: Print the effective configuration

use clap::{Parser, Subcommand};
use simplechat::LogSink;
use simplechat_config::AppConfig;
use std::path::PathBuf;

mod commands;

#[derive(Parser)]
#[command(
    name = "simplechat",
    about = "SimpleChat: HTTP chat facade with conversation memory",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Config file (default: ~/.simplechat/config.toml)
    #[arg(short, long, global = true, env = "SIMPLECHAT_CONFIG")]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the HTTP gateway
    Serve {
        /// Override the port
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Chat in the terminal
    Chat,

    /// Print the effective configuration (API key redacted)
    Config,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => AppConfig::load_with_env(path),
        None => AppConfig::load(),
    }
    .map_err(|e| format!("Failed to load config: {e}"))?;

    let runner_owns_console = match cli.command {
        Commands::Serve { .. } => config.application.cli,
        Commands::Chat => true,
        Commands::Config => false,
    };
    simplechat::logging::init(
        LogSink::for_console(runner_owns_console),
        &simplechat::logging::directives(&config.logging.level, cli.verbose),
    )
    .map_err(|e| format!("Failed to initialize logging: {e}"))?;

    match cli.command {
        Commands::Serve { port } => commands::serve::run(config, port).await?,
        Commands::Chat => commands::chat::run(config).await?,
        Commands::Config => commands::config_cmd::show(&config, cli.config.as_deref()),
    }

    Ok(())
}
