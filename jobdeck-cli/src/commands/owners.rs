//! Owner command handlers
//!
//! Story owners decide which stories an action works on and gate job
//! submission.

use anyhow::{Result, bail};
use clap::Subcommand;
use colored::*;
use jobdeck_engine::stories;

use crate::context::Console;
use crate::render::checkbox;

/// Owner subcommands
#[derive(Subcommand)]
pub enum OwnerCommands {
    /// List owners, quick owner shortcuts and matching stories
    List,
    /// Toggle an owner
    Toggle {
        /// Owner name
        name: String,

        /// Treat the name as a quick owner shortcut
        #[arg(short, long)]
        quick: bool,
    },
    /// Deselect every owner
    Clear,
    /// Select every known owner
    All,
}

/// Handle owner commands
pub async fn handle_owner_command(command: OwnerCommands, console: &Console) -> Result<()> {
    match command {
        OwnerCommands::List => list_owners(console).await,
        OwnerCommands::Toggle { name, quick } => toggle_owner(console, &name, quick).await,
        OwnerCommands::Clear => clear_owners(console),
        OwnerCommands::All => select_all_owners(console).await,
    }
}

/// List owners and the stories the selection matches
async fn list_owners(console: &Console) -> Result<()> {
    let mut selections = console.selections();
    let collection = console.stories(&mut selections).await?;
    let selected = selections.owners();
    let matching = stories::filter_by_owners(&collection.stories, selected);

    if collection.owners.is_empty() {
        println!("{}", "No owners found.".yellow());
    } else {
        println!("{}", "Owners:".bold());
        for owner in &collection.owners {
            println!(
                "  {} {} {}",
                checkbox(selected.contains(&owner.name)),
                owner.name,
                format!("({})", owner.count).dimmed()
            );
        }
    }

    if !collection.quick_owners.is_empty() {
        println!();
        println!("{}", "Quick owners:".bold());
        for quick in &collection.quick_owners {
            let status = stories::quick_owner_status(quick, selected, &matching);
            println!(
                "  {} {} {}",
                checkbox(status.active),
                status.name,
                format!("({}/{})", status.selected_count, status.count).dimmed()
            );
        }
    }

    println!();
    match stories::gate(selected, &matching) {
        Ok(()) => {
            println!(
                "{}",
                format!("{} of {} story(ies) selected:", matching.len(), collection.total).bold()
            );
            for story in &matching {
                println!("  {} {} {}", "▸".cyan(), story.title, story.id.dimmed());
            }
            if collection.truncated {
                println!("  {}", "(listing truncated)".dimmed());
            }
        }
        Err(e) => println!("{}", e.to_string().yellow()),
    }

    Ok(())
}

/// Toggle an owner or a quick owner shortcut
async fn toggle_owner(console: &Console, name: &str, quick: bool) -> Result<()> {
    let mut selections = console.selections();

    if quick {
        let collection = console.stories(&mut selections).await?;
        let Some(shortcut) = collection.quick_owners.iter().find(|q| q.name == name) else {
            bail!("Unknown quick owner: {}", name);
        };
        selections.toggle_quick_owner(shortcut);
    } else {
        selections.toggle_owner(name);
    }

    if selections.owners().is_empty() {
        println!("{}", "No owners selected.".yellow());
    } else {
        println!("Selected owners: {}", selections.owners().join(", ").bold());
    }

    Ok(())
}

/// Deselect every owner
fn clear_owners(console: &Console) -> Result<()> {
    console.selections().clear_owners();
    println!("{} Cleared owner selection", "✓".green());
    Ok(())
}

/// Select every owner the story listing knows
async fn select_all_owners(console: &Console) -> Result<()> {
    let mut selections = console.selections();
    let collection = console.stories(&mut selections).await?;

    let names: Vec<String> = collection.owners.iter().map(|o| o.name.clone()).collect();
    let count = names.len();
    selections.set_owners(names);
    println!("{} Selected {} owner(s)", "✓".green(), count);

    Ok(())
}
