//! Action command handlers
//!
//! Lists the actions the job API offers and manages which one is selected
//! and which of its options are toggled on.

use anyhow::{Result, bail};
use clap::Subcommand;
use colored::*;

use crate::context::Console;
use crate::render::{action_badge, checkbox};

/// Action subcommands
#[derive(Subcommand)]
pub enum ActionCommands {
    /// List actions and their options
    List,
    /// Select the action `job run` uses by default
    Select {
        /// Action ID
        id: String,
    },
    /// Toggle an option of an action
    Option {
        /// Action ID
        action: String,

        /// Option ID
        option: String,
    },
}

/// Handle action commands
pub async fn handle_action_command(command: ActionCommands, console: &Console) -> Result<()> {
    match command {
        ActionCommands::List => list_actions(console).await,
        ActionCommands::Select { id } => select_action(console, &id).await,
        ActionCommands::Option { action, option } => toggle_option(console, &action, &option).await,
    }
}

/// List all actions
async fn list_actions(console: &Console) -> Result<()> {
    let mut selections = console.selections();
    let actions = console.actions(&mut selections).await?;
    let view = console.controller().view();

    if actions.is_empty() {
        println!("{}", "No actions offered.".yellow());
        return Ok(());
    }

    println!("{}", format!("Found {} action(s):", actions.len()).bold());
    println!();

    for action in &actions {
        let selected = selections.selected_action() == Some(action.id.as_str());
        let marker = if selected { "▸".cyan() } else { " ".normal() };

        println!(
            "{} {} {} {}",
            marker,
            action.title.bold(),
            format!("({})", action.id).dimmed(),
            action_badge(view.action_state(&action.id))
        );
        if !action.description.is_empty() {
            println!("    {}", action.description);
        }
        if let Some(hint) = &action.hint {
            println!("    {}", hint.dimmed());
        }
        if !action.command_preview.is_empty() {
            println!("    {} {}", "$".dimmed(), action.command_preview.dimmed());
        }

        let chosen = selections.options(&action.id);
        for option in &action.options {
            println!(
                "    {} {} {} {}",
                checkbox(chosen.contains(&option.id)),
                option.label,
                format!("({})", option.id).dimmed(),
                option.args.join(" ").dimmed()
            );
        }
        println!();
    }

    Ok(())
}

/// Select an action
async fn select_action(console: &Console, action_id: &str) -> Result<()> {
    let mut selections = console.selections();
    let action = console.action(&mut selections, action_id).await?;

    selections.select_action(&action.id);
    println!("{} Selected {}", "✓".green(), action.title.bold());

    Ok(())
}

/// Toggle one option of an action
async fn toggle_option(console: &Console, action_id: &str, option_id: &str) -> Result<()> {
    let mut selections = console.selections();
    let action = console.action(&mut selections, action_id).await?;

    let Some(option) = action.option(option_id) else {
        bail!("Action {} has no option {}", action.id, option_id);
    };

    let enabled = selections.toggle_option(&action.id, &option.id);
    println!(
        "{} {} for {}",
        option.label.bold(),
        if enabled { "enabled".green() } else { "disabled".yellow() },
        action.title
    );

    Ok(())
}
