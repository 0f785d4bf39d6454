//! Jobdeck CLI
//!
//! Command-line console for running automation actions on the job API and
//! following their output.

mod commands;
mod config;
mod context;
mod render;

use std::path::PathBuf;

use anyhow::{Context as _, Result};
use clap::Parser;
use commands::{Commands, handle_command};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::context::Console;

#[derive(Parser)]
#[command(name = "jobdeck")]
#[command(about = "Run automation actions and follow their logs", long_about = None)]
struct Cli {
    /// Job API URL
    #[arg(long, env = "JOBDECK_API_URL")]
    api_url: Option<String>,

    /// Directory holding persisted console state
    #[arg(long, env = "JOBDECK_STATE_DIR")]
    state_dir: Option<PathBuf>,

    /// Keep state in memory only; nothing survives the process
    #[arg(long)]
    ephemeral: bool,

    #[command(subcommand)]
    command: Commands,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "jobdeck_cli=info,jobdeck_engine=info,jobdeck_client=info".into()
            }),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let config = config::load(cli.api_url, cli.state_dir)?;

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("Failed to start async runtime")?;

    runtime.block_on(async {
        let console = Console::open(config, cli.ephemeral);
        handle_command(cli.command, &console).await
    })
}
