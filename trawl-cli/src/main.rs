//! Trawl CLI - Command-line interface
//!
//! Provides non-interactive access to torrent search aggregation.

mod commands;

use std::path::PathBuf;

use clap::Parser;
use trawl_core::tracing_setup::{self, CliLogLevel, init_tracing};

#[derive(Parser)]
#[command(name = "trawl")]
#[command(about = "Search many torrent sites at once")]
struct Cli {
    /// Console log level
    #[arg(long, global = true, default_value_t = CliLogLevel::Warn)]
    log_level: CliLogLevel,

    /// Path to the JSON configuration file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: commands::Commands,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let (config, file) = commands::load_config(cli.config.as_deref())?;
    let log_level = commands::console_level(cli.log_level, file.as_ref());
    init_tracing(log_level, &tracing_setup::logs_dir(&config.cache))?;

    commands::handle_command(cli.command, config).await?;

    Ok(())
}
