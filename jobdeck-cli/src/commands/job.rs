//! Job command handlers
//!
//! Submits actions, follows running jobs and manages the persisted job.

use std::collections::HashSet;

use anyhow::{Result, bail};
use clap::Subcommand;
use colored::*;
use jobdeck_core::domain::job::JobStatus;
use jobdeck_engine::{Dispatch, JobController};

use crate::context::Console;
use crate::render::{print_job_details, print_log_entry, print_notice};

/// Job subcommands
#[derive(Subcommand)]
pub enum JobCommands {
    /// Submit an action and follow its logs
    Run {
        /// Action ID (defaults to the selected action)
        action: Option<String>,
    },
    /// Reattach to the persisted job and follow its logs
    Attach,
    /// Show the persisted job and its buffered logs
    Show,
    /// Request termination of the persisted job
    Terminate,
    /// Forget the persisted job
    Clear,
}

/// Handle job commands
pub async fn handle_job_command(command: JobCommands, console: &Console) -> Result<()> {
    match command {
        JobCommands::Run { action } => run_job(console, action).await,
        JobCommands::Attach => attach_job(console).await,
        JobCommands::Show => show_job(console),
        JobCommands::Terminate => terminate_job(console).await,
        JobCommands::Clear => clear_job(console),
    }
}

/// Submit an action and follow the job until it ends
async fn run_job(console: &Console, action_id: Option<String>) -> Result<()> {
    let mut selections = console.selections();
    let Some(action_id) = action_id.or_else(|| selections.selected_action().map(str::to_string))
    else {
        bail!("No action selected; pass one or use `jobdeck actions select <id>`");
    };

    let action = console.action(&mut selections, &action_id).await?;
    let stories = console.stories(&mut selections).await?;
    let job_args = selections.prepare(&action, &stories)?;
    selections.select_action(&action.id);
    selections.flush();

    let controller = console.controller();
    println!("{} {}", "Running".bold(), action.title.cyan());

    match controller
        .submit(&action.id, job_args.args, job_args.story_ids)
        .await?
    {
        Dispatch::Applied => follow(&controller).await,
        Dispatch::Ignored => {
            let active = controller.snapshot().map(|job| job.id).unwrap_or_default();
            bail!(
                "Job {} is still active; use `jobdeck job attach` or `jobdeck job terminate`",
                active
            )
        }
    }
}

/// Resume polling the persisted job and follow it
async fn attach_job(console: &Console) -> Result<()> {
    let controller = console.controller();

    let Some(job) = controller.snapshot() else {
        println!("{}", "No job to attach to.".yellow());
        return Ok(());
    };

    if controller.resume() == Dispatch::Ignored {
        println!("Job {} already ended.", job.id.cyan());
        print_job_details(&job);
        return Ok(());
    }

    println!("{} {}", "Attached to".bold(), job.id.cyan());
    follow(&controller).await
}

/// Print the persisted job
fn show_job(console: &Console) -> Result<()> {
    let view = console.controller().view();

    let Some(job) = &view.snapshot else {
        println!("{}", "No job recorded.".yellow());
        return Ok(());
    };

    print_job_details(job);
    if view.terminate_pending() {
        println!("{}", "Termination requested; waiting for the job to stop.".yellow());
    }

    if view.logs.is_empty() {
        println!("\n{}", "No logs buffered for this job.".yellow());
    } else {
        println!("\n{}", format!("Logs (cursor {}):", view.cursor).bold());
        println!("{}", "─".repeat(80).dimmed());
        for entry in &view.logs {
            print_log_entry(entry);
        }
        println!("{}", "─".repeat(80).dimmed());
    }

    Ok(())
}

/// Ask the job API to terminate the persisted job
async fn terminate_job(console: &Console) -> Result<()> {
    let controller = console.controller();

    let Some(job) = controller.snapshot() else {
        println!("{}", "No job to terminate.".yellow());
        return Ok(());
    };

    match controller.terminate(&job.id).await? {
        Dispatch::Applied => {
            println!("{} Termination requested for {}", "✓".green(), job.id.cyan());
        }
        Dispatch::Ignored => {
            println!(
                "Job {} is {} and cannot be terminated.",
                job.id.cyan(),
                if job.cancel_requested { "already terminating".to_string() } else { job.status.to_string() }
            );
        }
    }

    Ok(())
}

/// Wipe the persisted job
fn clear_job(console: &Console) -> Result<()> {
    console.controller().clear();
    println!("{} Cleared job state", "✓".green());
    Ok(())
}

/// Print logs as they arrive until the job stops being polled
///
/// The first Ctrl-C requests termination, a second one detaches and leaves
/// the job running.
async fn follow(controller: &JobController) -> Result<()> {
    let mut changes = controller.subscribe();
    let mut printed = HashSet::new();
    let mut interrupted = false;

    loop {
        let view = controller.view();
        for entry in &view.logs {
            if printed.insert(entry.seq) {
                print_log_entry(entry);
            }
        }

        if !view.polling && !view.terminating {
            break;
        }

        tokio::select! {
            changed = changes.changed() => {
                if changed.is_err() {
                    break;
                }
            }
            _ = tokio::signal::ctrl_c() => {
                if interrupted {
                    println!();
                    println!("{}", "Detached; the job keeps running. Use `jobdeck job attach` to follow it again.".yellow());
                    return Ok(());
                }
                interrupted = true;

                let Some(job) = view.snapshot else { continue };
                println!();
                println!("{}", "Requesting termination (Ctrl-C again to detach)...".yellow());
                if let Err(e) = controller.terminate(&job.id).await {
                    tracing::warn!("Termination request failed: {}", e);
                }
            }
        }
    }

    let view = controller.view();
    if let Some(notice) = &view.notice {
        print_notice(notice);
    }

    match view.snapshot {
        Some(job) => {
            println!();
            print_job_details(&job);
            if job.status == JobStatus::Error {
                bail!("Job {} failed", job.id);
            }
            Ok(())
        }
        None => Ok(()),
    }
}
