//! Scripted job API for tests

use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use jobdeck_client::{ClientError, JobApi, Result};
use jobdeck_core::domain::action::{ActionMeta, ActionOption};
use jobdeck_core::domain::job::{JobPatch, JobSnapshot, JobStatus};
use jobdeck_core::domain::log::{LogEntry, LogStream};
use jobdeck_core::domain::story::StoryCollection;
use jobdeck_core::dto::job::{CreateJob, CreatedJob, JobResponse, JobUpdate};
use jobdeck_core::dto::story::StoryQuery;
use tokio::time::Instant;

pub(crate) enum Reply<T> {
    Ok(T),
    Err(u16, String),
    Delayed(Duration, T),
}

impl<T> Reply<T> {
    async fn resolve(self) -> Result<T> {
        match self {
            Reply::Ok(value) => Ok(value),
            Reply::Err(status, message) => Err(ClientError::api_error(status, message)),
            Reply::Delayed(delay, value) => {
                tokio::time::sleep(delay).await;
                Ok(value)
            }
        }
    }
}

/// Job API answering from queues of scripted replies
///
/// Polls with nothing queued answer "still running, no new output" at the
/// requested cursor.
#[derive(Default)]
pub(crate) struct ScriptedApi {
    creates: Mutex<VecDeque<Reply<CreatedJob>>>,
    polls: Mutex<VecDeque<Reply<JobUpdate>>>,
    terminates: Mutex<VecDeque<Reply<JobUpdate>>>,
    pub(crate) created: Mutex<Vec<CreateJob>>,
    polled: Mutex<Vec<(Instant, u64)>>,
    pub(crate) terminated: Mutex<Vec<(String, u64)>>,
    pub(crate) actions: Vec<ActionMeta>,
    pub(crate) stories: StoryCollection,
}

impl ScriptedApi {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn push_create(&self, created: CreatedJob) {
        self.creates.lock().unwrap().push_back(Reply::Ok(created));
    }

    pub(crate) fn push_create_error(&self, status: u16, message: &str) {
        self.creates
            .lock()
            .unwrap()
            .push_back(Reply::Err(status, message.to_string()));
    }

    pub(crate) fn push_poll(&self, update: JobUpdate) {
        self.polls.lock().unwrap().push_back(Reply::Ok(update));
    }

    pub(crate) fn push_poll_delayed(&self, delay: Duration, update: JobUpdate) {
        self.polls
            .lock()
            .unwrap()
            .push_back(Reply::Delayed(delay, update));
    }

    pub(crate) fn push_poll_error(&self, status: u16, message: &str) {
        self.polls
            .lock()
            .unwrap()
            .push_back(Reply::Err(status, message.to_string()));
    }

    pub(crate) fn push_terminate(&self, update: JobUpdate) {
        self.terminates.lock().unwrap().push_back(Reply::Ok(update));
    }

    pub(crate) fn push_terminate_delayed(&self, delay: Duration, update: JobUpdate) {
        self.terminates
            .lock()
            .unwrap()
            .push_back(Reply::Delayed(delay, update));
    }

    pub(crate) fn push_terminate_error(&self, status: u16, message: &str) {
        self.terminates
            .lock()
            .unwrap()
            .push_back(Reply::Err(status, message.to_string()));
    }

    pub(crate) fn poll_times(&self) -> Vec<Instant> {
        self.polled.lock().unwrap().iter().map(|(at, _)| *at).collect()
    }

    pub(crate) fn poll_cursors(&self) -> Vec<u64> {
        self.polled.lock().unwrap().iter().map(|(_, c)| *c).collect()
    }

    pub(crate) fn terminate_count(&self) -> usize {
        self.terminated.lock().unwrap().len()
    }
}

#[async_trait]
impl JobApi for ScriptedApi {
    async fn create_job(&self, req: &CreateJob) -> Result<CreatedJob> {
        self.created.lock().unwrap().push(req.clone());
        let reply = self.creates.lock().unwrap().pop_front();
        match reply {
            Some(reply) => reply.resolve().await,
            None => Err(ClientError::api_error(500, "no scripted create")),
        }
    }

    async fn poll_job(&self, _job_id: &str, cursor: u64) -> Result<JobUpdate> {
        self.polled.lock().unwrap().push((Instant::now(), cursor));
        let reply = self.polls.lock().unwrap().pop_front();
        match reply {
            Some(reply) => reply.resolve().await,
            None => Ok(running_update(Vec::new(), cursor)),
        }
    }

    async fn terminate_job(&self, job_id: &str, cursor: u64) -> Result<JobUpdate> {
        self.terminated
            .lock()
            .unwrap()
            .push((job_id.to_string(), cursor));
        let reply = self.terminates.lock().unwrap().pop_front();
        match reply {
            Some(reply) => reply.resolve().await,
            None => Err(ClientError::api_error(500, "no scripted terminate")),
        }
    }

    async fn list_actions(&self) -> Result<Vec<ActionMeta>> {
        Ok(self.actions.clone())
    }

    async fn list_stories(&self, _query: &StoryQuery) -> Result<StoryCollection> {
        Ok(self.stories.clone())
    }
}

pub(crate) fn log_entry(seq: u64) -> LogEntry {
    LogEntry {
        seq,
        timestamp: chrono::DateTime::from_timestamp(1_700_000_000 + seq as i64, 0)
            .unwrap_or_default(),
        stream: LogStream::Stdout,
        text: format!("line {}", seq),
    }
}

pub(crate) fn log_entries(range: std::ops::Range<u64>) -> Vec<LogEntry> {
    range.map(log_entry).collect()
}

pub(crate) fn running_update(logs: Vec<LogEntry>, next_cursor: u64) -> JobUpdate {
    JobResponse {
        job: JobPatch {
            status: Some(JobStatus::Running),
            ..Default::default()
        },
        logs,
        next_cursor,
    }
}

pub(crate) fn status_update(status: JobStatus, next_cursor: u64) -> JobUpdate {
    JobResponse {
        job: JobPatch {
            status: Some(status),
            ..Default::default()
        },
        logs: Vec::new(),
        next_cursor,
    }
}

pub(crate) fn snapshot(id: &str, action_id: &str, status: JobStatus) -> JobSnapshot {
    JobSnapshot {
        id: id.to_string(),
        action_id: action_id.to_string(),
        title: action_id.to_string(),
        status,
        command: vec!["run".to_string(), action_id.to_string()],
        display_command: format!("run {}", action_id),
        created_at: chrono::DateTime::from_timestamp(1_700_000_000, 0).unwrap_or_default(),
        started_at: None,
        finished_at: None,
        exit_code: None,
        cancel_requested: false,
    }
}

pub(crate) fn created(id: &str, action_id: &str, logs: Vec<LogEntry>, next_cursor: u64) -> CreatedJob {
    JobResponse {
        job: snapshot(id, action_id, JobStatus::Pending),
        logs,
        next_cursor,
    }
}

pub(crate) fn action(id: &str, options: &[(&str, &[&str], bool)]) -> ActionMeta {
    ActionMeta {
        id: id.to_string(),
        title: id.to_string(),
        description: String::new(),
        hint: None,
        default_args: vec![format!("--{}", id)],
        command_preview: String::new(),
        options: options
            .iter()
            .map(|(option_id, args, default_selected)| ActionOption {
                id: option_id.to_string(),
                label: option_id.to_string(),
                args: args.iter().map(|a| a.to_string()).collect(),
                description: String::new(),
                default_selected: *default_selected,
            })
            .collect(),
    }
}
