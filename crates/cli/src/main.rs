//! Hearth CLI - hearth command

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

mod cmd;
mod daemon;
mod util;

/// Hearth - file watching and remote configuration sync for home-assistant devices
#[derive(Parser)]
#[command(name = "hearth")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print debounced changes of the given files until Ctrl-C
    Watch {
        /// Files to watch
        #[arg(required = true)]
        paths: Vec<PathBuf>,
        /// Minimum interval between two notifications for one file
        #[arg(long, default_value = "300")]
        debounce_ms: u64,
        /// Pause before notifying, letting the writer finish
        #[arg(long, default_value = "100")]
        settle_ms: u64,
    },
    /// Fetch the remote device configuration once
    Sync {
        /// Settings file (default: $HEARTH_CONFIG or ~/.config/hearth/hearth.toml)
        #[arg(short, long)]
        config: Option<PathBuf>,
        /// Print the fetched configuration
        #[arg(short, long)]
        print: bool,
    },
    /// Run the daemon: scheduled sync, file watching and settings reload
    Run {
        /// Settings file (default: $HEARTH_CONFIG or ~/.config/hearth/hearth.toml)
        #[arg(short, long)]
        config: Option<PathBuf>,
    },
    /// Inspect settings
    #[command(subcommand)]
    Config(ConfigCommands),
}

#[derive(Subcommand)]
enum ConfigCommands {
    /// Print an example settings file
    Example,
    /// Validate a settings file
    Check {
        #[arg(short, long)]
        config: Option<PathBuf>,
    },
    /// Show the settings file path
    Path {
        /// Create the file with defaults if missing
        #[arg(long)]
        create: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Watch { paths, debounce_ms, settle_ms } => {
            cmd::watch::run(paths, debounce_ms, settle_ms).await
        }
        Commands::Sync { config, print } => cmd::sync::run(config, print).await,
        Commands::Run { config } => daemon::run(config).await,
        Commands::Config(config_cmd) => match config_cmd {
            ConfigCommands::Example => cmd::config::run_example().await,
            ConfigCommands::Check { config } => cmd::config::run_check(config).await,
            ConfigCommands::Path { create } => cmd::config::run_path(create).await,
        },
    }
}
