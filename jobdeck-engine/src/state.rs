//! Job state as exposed to front ends

use std::collections::HashMap;
use std::fmt;

use jobdeck_core::domain::job::{JobSnapshot, JobStatus};
use jobdeck_core::domain::log::LogEntry;

/// Message shown when a poll finds the job gone
pub const POLL_MISSING_MESSAGE: &str = "job not found; it may have finished or been cleaned up";

/// Message shown when a terminate request finds the job gone
pub const TERMINATE_MISSING_MESSAGE: &str = "job no longer exists; local state has been cleared";

/// User-visible job error slot
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobNotice {
    /// A request failed; existing state is untouched
    Failed(String),
    /// The job vanished remotely and local job state was wiped
    JobMissing(String),
}

impl JobNotice {
    /// Whether this is the "job missing" variant
    pub fn is_job_missing(&self) -> bool {
        matches!(self, JobNotice::JobMissing(_))
    }

    /// Message to display
    pub fn message(&self) -> &str {
        match self {
            JobNotice::Failed(message) | JobNotice::JobMissing(message) => message,
        }
    }
}

impl fmt::Display for JobNotice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.message())
    }
}

/// Badge state of an action
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ActionState {
    #[default]
    Idle,
    Running,
    Success,
    Error,
}

impl From<JobStatus> for ActionState {
    fn from(status: JobStatus) -> Self {
        match status {
            JobStatus::Pending | JobStatus::Running => ActionState::Running,
            JobStatus::Success => ActionState::Success,
            JobStatus::Error => ActionState::Error,
        }
    }
}

/// Outcome of a guarded operation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dispatch {
    /// The operation ran and its result was applied
    Applied,
    /// A guard rejected the call; nothing was requested or changed
    Ignored,
}

/// Point-in-time copy of everything the controller holds
#[derive(Debug, Clone, Default)]
pub struct JobView {
    pub snapshot: Option<JobSnapshot>,
    pub logs: Vec<LogEntry>,
    pub cursor: u64,
    pub notice: Option<JobNotice>,
    pub terminating: bool,
    pub polling: bool,
    pub actions: HashMap<String, ActionState>,
}

impl JobView {
    /// Whether a job is pending or running
    pub fn busy(&self) -> bool {
        self.snapshot
            .as_ref()
            .is_some_and(|job| job.status.is_active())
    }

    /// Whether a terminate request would be sent
    pub fn can_terminate(&self) -> bool {
        !self.terminating && self.snapshot.as_ref().is_some_and(JobSnapshot::can_terminate)
    }

    /// Whether termination has been asked for but the job is still active
    pub fn terminate_pending(&self) -> bool {
        self.terminating
            || self
                .snapshot
                .as_ref()
                .is_some_and(|job| job.cancel_requested && job.status.is_active())
    }

    /// Badge state of an action
    pub fn action_state(&self, action_id: &str) -> ActionState {
        self.actions.get(action_id).copied().unwrap_or_default()
    }
}
