//! Terminal rendering of jobs, logs and actions

use colored::*;
use jobdeck_core::domain::job::{JobSnapshot, JobStatus};
use jobdeck_core::domain::log::{LogEntry, LogStream};
use jobdeck_engine::{ActionState, JobNotice};

/// Print a log entry
pub fn print_log_entry(log: &LogEntry) {
    let stream_str = log.stream.to_string().to_uppercase();
    let stream_colored = match log.stream {
        LogStream::Stdout => stream_str.cyan(),
        LogStream::Stderr => stream_str.red(),
        LogStream::System => stream_str.dimmed(),
    };

    println!(
        "{} [{}] {}",
        log.timestamp.format("%H:%M:%S").to_string().dimmed(),
        stream_colored,
        log.text
    );
}

/// Print detailed job information
pub fn print_job_details(job: &JobSnapshot) {
    println!("{}", "Job Details:".bold());
    println!("  ID:        {}", job.id.cyan());
    println!("  Action:    {}", job.action_id);
    if !job.title.is_empty() {
        println!("  Title:     {}", job.title);
    }
    println!("  Status:    {}", colorize_status(job.status));
    if job.cancel_requested && job.status.is_active() {
        println!("  {}", "Termination requested".yellow());
    }
    if !job.display_command.is_empty() {
        println!("  Command:   {}", job.display_command.dimmed());
    }
    println!(
        "  Created:   {}",
        job.created_at.format("%Y-%m-%d %H:%M:%S")
    );

    if let Some(started) = job.started_at {
        println!("  Started:   {}", started.format("%Y-%m-%d %H:%M:%S"));
    }

    if let Some(finished) = job.finished_at {
        println!("  Finished:  {}", finished.format("%Y-%m-%d %H:%M:%S"));

        if let Some(started) = job.started_at {
            let duration = finished.signed_duration_since(started);
            println!("  Duration:  {}s", duration.num_seconds());
        }
    }

    if let Some(exit_code) = job.exit_code {
        println!("  Exit Code: {}", exit_code);
    }
}

/// Print the user-visible job notice
pub fn print_notice(notice: &JobNotice) {
    match notice {
        JobNotice::Failed(message) => println!("{} {}", "✗".red(), message.red()),
        JobNotice::JobMissing(message) => println!("{} {}", "⚠".yellow(), message.yellow()),
    }
}

/// Colorize job status for display
pub fn colorize_status(status: JobStatus) -> ColoredString {
    let status_str = status.to_string();
    match status {
        JobStatus::Pending => status_str.yellow(),
        JobStatus::Running => status_str.cyan(),
        JobStatus::Success => status_str.green(),
        JobStatus::Error => status_str.red(),
    }
}

/// Badge for an action's state, empty when idle
pub fn action_badge(state: ActionState) -> ColoredString {
    match state {
        ActionState::Idle => "".normal(),
        ActionState::Running => "running".cyan(),
        ActionState::Success => "success".green(),
        ActionState::Error => "error".red(),
    }
}

/// Checkbox marker
pub fn checkbox(checked: bool) -> ColoredString {
    if checked { "[x]".green() } else { "[ ]".dimmed() }
}
