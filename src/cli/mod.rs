//! CLI parser and entry point.

mod rebuild;

use std::path::PathBuf;

use chrono::{DateTime, Utc};
use clap::Parser;

use crate::config::{load_settings_with_options, LoadOptions};
use crate::models::timestamp::parse_timestamp;

#[derive(Parser, Debug)]
#[command(name = "rcrebuild")]
#[command(about = "Rebuild the recent changes feed from revision, log and user-group history")]
#[command(version)]
pub struct Cli {
    /// Config file path (overrides auto-discovery)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Database URL or SQLite path (overrides config and DATABASE_URL)
    #[arg(short, long)]
    database: Option<String>,

    /// Create missing tables before rebuilding
    #[arg(long)]
    init_schema: bool,

    /// Evaluate the lookback window relative to this YYYYMMDDHHMMSS timestamp
    #[arg(long, value_parser = parse_now)]
    now: Option<DateTime<Utc>>,

    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,
}

/// Check if verbose mode is enabled (for early logging setup).
pub fn is_verbose() -> bool {
    std::env::args().any(|arg| arg == "-v" || arg == "--verbose")
}

fn parse_now(value: &str) -> Result<DateTime<Utc>, String> {
    parse_timestamp(value)
        .ok_or_else(|| format!("expected a 14-digit YYYYMMDDHHMMSS timestamp, got '{}'", value))
}

/// Run the CLI.
pub async fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let (settings, config) = load_settings_with_options(LoadOptions {
        config_path: cli.config,
        database: cli.database,
    })
    .await
    .map_err(|e| anyhow::anyhow!(e))?;

    rebuild::cmd_rebuild(&settings, &config, cli.init_schema, cli.now).await
}
