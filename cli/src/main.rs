//! `vanish`: host process and shell front-end for the share store.

mod commands;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use std::net::IpAddr;
use std::path::PathBuf;
use tracing::warn;
use tracing_subscriber::EnvFilter;
use vanish_core::types::AppConfig;

#[derive(Debug, Parser)]
#[command(name = "vanish", version, about = "Expiring text and file share store")]
struct Cli {
    /// Path to the TOML configuration file.
    #[arg(long, global = true, default_value = "vanish.toml")]
    config: PathBuf,

    /// Overrides `storage.data_dir` from the configuration file.
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    /// Used when `RUST_LOG` is not set.
    #[arg(long, global = true, env = "VANISH_LOG_LEVEL", default_value = "info")]
    log_level: String,

    #[arg(long, global = true, value_enum, default_value_t = LogFormat::Text)]
    log_format: LogFormat,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum LogFormat {
    Text,
    Json,
}

#[derive(Debug, Subcommand)]
pub(crate) enum Command {
    /// Run the background sweeper until Ctrl-C.
    Serve,
    /// Create an entry from text and/or a file.
    Add {
        id: String,
        #[arg(long)]
        text: Option<String>,
        #[arg(long)]
        file: Option<PathBuf>,
        /// One of 1m, 10m, 1h, 1d, 1w, or -1 for instant expire.
        #[arg(long, default_value = "1h", allow_hyphen_values = true)]
        ttl: String,
        #[arg(long)]
        instant_expire: bool,
        #[arg(long)]
        origin_ip: Option<IpAddr>,
    },
    /// Print an entry's metadata as JSON.
    Info { id: String },
    /// Copy an entry's file to `dest`.
    Download { id: String, dest: PathBuf },
    Delete { id: String },
    /// Run one reclamation pass now.
    Sweep,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(&cli.log_level, cli.log_format)?;

    let config = AppConfig::load(&cli.config)
        .with_context(|| format!("Failed to load {}", cli.config.display()))?;
    for problem in config.validate() {
        warn!(problem = %problem, "Invalid configuration value, using the default");
    }
    let mut config = config.with_defaults_for_invalid();
    if let Some(data_dir) = cli.data_dir {
        config.storage.data_dir = data_dir;
    }

    commands::run(cli.command, &config)
}

fn init_tracing(level: &str, format: LogFormat) -> Result<()> {
    let env_filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(format!("vanish_core={level},vanish={level}"))
            .with_context(|| format!("Invalid log level: {level}"))?,
    };

    // Logs go to stderr; stdout carries command output.
    let builder = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr);
    match format {
        LogFormat::Json => builder.json().init(),
        LogFormat::Text => builder.init(),
    }

    Ok(())
}
