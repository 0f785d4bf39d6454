//! Job domain types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Job execution status as reported by the job runner
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    Pending,
    Running,
    Success,
    Error,
}

impl JobStatus {
    /// Whether the job can no longer change status
    pub fn is_terminal(self) -> bool {
        matches!(self, JobStatus::Success | JobStatus::Error)
    }

    /// Whether the job is still queued or executing
    pub fn is_active(self) -> bool {
        !self.is_terminal()
    }
}

impl std::fmt::Display for JobStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            JobStatus::Pending => write!(f, "pending"),
            JobStatus::Running => write!(f, "running"),
            JobStatus::Success => write!(f, "success"),
            JobStatus::Error => write!(f, "error"),
        }
    }
}

/// Locally held view of a remote job
///
/// Only ever updated by merging a [`JobPatch`] reported by the server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobSnapshot {
    pub id: String,
    pub action_id: String,
    #[serde(default)]
    pub title: String,
    pub status: JobStatus,
    #[serde(default)]
    pub command: Vec<String>,
    #[serde(default)]
    pub display_command: String,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub started_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub finished_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub exit_code: Option<i32>,
    #[serde(default)]
    pub cancel_requested: bool,
}

/// Partial job update reported by a poll or terminate call
///
/// Every field is optional. An absent key and an explicit `null` both mean
/// "unchanged"; the server never clears a field it has already reported.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub action_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<JobStatus>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub command: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_command: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub started_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub finished_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exit_code: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cancel_requested: Option<bool>,
}

impl JobSnapshot {
    /// Merge a partial update into this snapshot, field by field
    ///
    /// Fields missing from `patch` are left as they are. Once the snapshot is
    /// terminal its status is frozen, but the remaining fields still merge so a
    /// late `finishedAt` or `exitCode` is not lost.
    ///
    /// # Returns
    /// `true` if any field changed
    pub fn apply(&mut self, patch: &JobPatch) -> bool {
        let before = self.clone();

        if let Some(id) = &patch.id {
            self.id.clone_from(id);
        }
        if let Some(action_id) = &patch.action_id {
            self.action_id.clone_from(action_id);
        }
        if let Some(title) = &patch.title {
            self.title.clone_from(title);
        }
        if let Some(status) = patch.status
            && !self.status.is_terminal()
        {
            self.status = status;
        }
        if let Some(command) = &patch.command {
            self.command.clone_from(command);
        }
        if let Some(display_command) = &patch.display_command {
            self.display_command.clone_from(display_command);
        }
        if let Some(created_at) = patch.created_at {
            self.created_at = created_at;
        }
        if let Some(started_at) = patch.started_at {
            self.started_at = Some(started_at);
        }
        if let Some(finished_at) = patch.finished_at {
            self.finished_at = Some(finished_at);
        }
        if let Some(exit_code) = patch.exit_code {
            self.exit_code = Some(exit_code);
        }
        if let Some(cancel_requested) = patch.cancel_requested {
            self.cancel_requested = cancel_requested;
        }

        *self != before
    }

    /// Whether a terminate request is allowed for this job
    pub fn can_terminate(&self) -> bool {
        self.status.is_active() && !self.cancel_requested
    }
}
