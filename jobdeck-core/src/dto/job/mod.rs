//! Job DTOs for communication with the job API

use serde::{Deserialize, Serialize};

use crate::domain::job::{JobPatch, JobSnapshot};
use crate::domain::log::LogEntry;

/// Request to start a new job for an action
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateJob {
    pub action_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub args: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub story_ids: Option<Vec<String>>,
}

impl CreateJob {
    /// Create a request with no arguments
    pub fn new(action_id: impl Into<String>) -> Self {
        Self {
            action_id: action_id.into(),
            ..Default::default()
        }
    }

    /// Set the argument list
    pub fn with_args(mut self, args: Vec<String>) -> Self {
        self.args = Some(args);
        self
    }

    /// Set the story ids the job should operate on
    pub fn with_story_ids(mut self, story_ids: Vec<String>) -> Self {
        self.story_ids = Some(story_ids);
        self
    }
}

/// Job state plus an incremental log batch
///
/// Every job endpoint answers with this envelope. `logs` only contains
/// entries at or after the cursor that was requested and `next_cursor` is
/// where the following poll should resume.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobResponse<T> {
    #[serde(flatten)]
    pub job: T,
    #[serde(default)]
    pub logs: Vec<LogEntry>,
    pub next_cursor: u64,
}

/// Response to job creation, carrying the full initial snapshot
pub type CreatedJob = JobResponse<JobSnapshot>;

/// Response to a poll or terminate call, carrying a partial snapshot
pub type JobUpdate = JobResponse<JobPatch>;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::job::JobStatus;

    #[test]
    fn test_create_job_omits_unset_fields() {
        let req = CreateJob::new("sync").with_args(vec!["--dry-run".to_string()]);
        let json = serde_json::to_value(&req).unwrap();

        assert_eq!(
            json,
            serde_json::json!({ "actionId": "sync", "args": ["--dry-run"] })
        );
    }

    #[test]
    fn test_create_job_with_story_ids() {
        let req = CreateJob::new("pull")
            .with_args(Vec::new())
            .with_story_ids(vec!["s-1".to_string(), "s-2".to_string()]);
        let json = serde_json::to_value(&req).unwrap();

        assert_eq!(
            json,
            serde_json::json!({ "actionId": "pull", "args": [], "storyIds": ["s-1", "s-2"] })
        );
    }

    #[test]
    fn test_update_envelope_flattens_patch() {
        let json = r#"{
            "status": "running",
            "cancelRequested": true,
            "logs": [
                {"seq": 3, "timestamp": "2024-05-01T08:00:02Z", "stream": "stdout", "text": "hi"}
            ],
            "nextCursor": 4
        }"#;

        let update: JobUpdate = serde_json::from_str(json).unwrap();
        assert_eq!(update.job.status, Some(JobStatus::Running));
        assert_eq!(update.job.cancel_requested, Some(true));
        assert!(update.job.exit_code.is_none());
        assert_eq!(update.logs.len(), 1);
        assert_eq!(update.next_cursor, 4);
    }
}
