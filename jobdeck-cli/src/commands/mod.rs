//! Commands module
//!
//! Defines all CLI commands and their handlers.

mod actions;
mod job;
mod owners;

pub use actions::ActionCommands;
pub use job::JobCommands;
pub use owners::OwnerCommands;

use anyhow::Result;
use clap::Subcommand;

use crate::context::Console;

/// Top-level CLI commands
#[derive(Subcommand)]
pub enum Commands {
    /// Action and option selection
    Actions {
        #[command(subcommand)]
        command: ActionCommands,
    },
    /// Story owner selection
    Owners {
        #[command(subcommand)]
        command: OwnerCommands,
    },
    /// Job submission and tracking
    Job {
        #[command(subcommand)]
        command: JobCommands,
    },
}

/// Handle a CLI command
///
/// Routes the command to the appropriate handler module.
///
/// # Arguments
/// * `command` - The command to execute
/// * `console` - Shared client, store and configuration
pub async fn handle_command(command: Commands, console: &Console) -> Result<()> {
    match command {
        Commands::Actions { command } => actions::handle_action_command(command, console).await,
        Commands::Owners { command } => owners::handle_owner_command(command, console).await,
        Commands::Job { command } => job::handle_job_command(command, console).await,
    }
}
