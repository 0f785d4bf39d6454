//! Job controller
//!
//! Owns the lifecycle of the one job a console tracks: submitting it,
//! terminating it and keeping the local snapshot, log buffer and cursor in
//! line with what the job API reports. It is the only component front ends
//! talk to.
//!
//! All job state sits behind a single mutex shared with the poll loop's sink.
//! Every reaction (a finished request or a fired timer) takes the lock,
//! applies its change in full and releases it, so no two mutations
//! interleave. Poll loops are started, replaced and cancelled while holding
//! the same lock, which is what makes discarding late poll results sound.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, Weak};
use std::time::Duration;

use jobdeck_client::{ClientError, JobApi};
use jobdeck_core::domain::job::{JobPatch, JobSnapshot, JobStatus};
use jobdeck_core::domain::log::LogEntry;
use jobdeck_core::dto::job::{CreateJob, JobResponse, JobUpdate};
use jobdeck_core::reconcile::{self, LogBuffer};
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::error::{EngineError, Result};
use crate::scheduler::{PollHandle, PollScheduler, PollSink};
use crate::state::{
    ActionState, Dispatch, JobNotice, JobView, POLL_MISSING_MESSAGE, TERMINATE_MISSING_MESSAGE,
};
use crate::store::{PersistentSlot, StateStore, keys};

/// Front-end facing job controller
pub struct JobController {
    api: Arc<dyn JobApi>,
    scheduler: PollScheduler,
    shared: Arc<Shared>,
}

struct Shared {
    this: Weak<Shared>,
    state: Mutex<JobState>,
    slots: JobSlots,
    revision: watch::Sender<u64>,
    status_reset_delay: Duration,
}

struct JobState {
    snapshot: Option<JobSnapshot>,
    logs: LogBuffer,
    cursor: u64,
    /// Job whose terminate request is in flight
    terminating: Option<String>,
    submitting: bool,
    notice: Option<JobNotice>,
    actions: HashMap<String, ActionState>,
    poll: Option<PollHandle>,
}

struct JobSlots {
    snapshot: PersistentSlot<Option<JobSnapshot>>,
    logs: PersistentSlot<Vec<LogEntry>>,
    cursor: PersistentSlot<u64>,
}

impl JobSlots {
    fn new(store: Arc<dyn StateStore>, log_write_delay: Duration) -> Self {
        Self {
            snapshot: PersistentSlot::new(Arc::clone(&store), keys::JOB_SNAPSHOT, None),
            logs: PersistentSlot::new(Arc::clone(&store), keys::JOB_LOGS, Vec::new())
                .with_write_delay(log_write_delay)
                .with_reducer(reconcile::normalize),
            cursor: PersistentSlot::new(store, keys::JOB_CURSOR, 0),
        }
    }

    fn flush(&self) {
        self.snapshot.flush();
        self.logs.flush();
        self.cursor.flush();
    }

    fn clear(&self) {
        self.snapshot.clear();
        self.logs.clear();
        self.cursor.clear();
    }
}

impl JobController {
    /// Creates a controller, restoring any job persisted in `store`
    ///
    /// A restored active job is not polled until [`JobController::resume`]
    /// is called.
    pub fn new(api: Arc<dyn JobApi>, store: Arc<dyn StateStore>, config: &Config) -> Self {
        let slots = JobSlots::new(store, config.log_write_delay);

        let snapshot = slots.snapshot.load();
        let logs = LogBuffer::from_entries(slots.logs.load());
        let cursor = slots.cursor.load();

        let mut actions = HashMap::new();
        if let Some(job) = &snapshot
            && job.status.is_active()
        {
            actions.insert(job.action_id.clone(), ActionState::Running);
        }

        if let Some(job) = &snapshot {
            info!(
                "Restored job {} ({}, {} log line(s), cursor {})",
                job.id,
                job.status,
                logs.len(),
                cursor
            );
        }

        let (revision, _) = watch::channel(0);
        let shared = Arc::new_cyclic(|this| Shared {
            this: this.clone(),
            state: Mutex::new(JobState {
                snapshot,
                logs,
                cursor,
                terminating: None,
                submitting: false,
                notice: None,
                actions,
                poll: None,
            }),
            slots,
            revision,
            status_reset_delay: config.status_reset_delay,
        });

        Self {
            scheduler: PollScheduler::new(Arc::clone(&api), config.poll),
            api,
            shared,
        }
    }

    /// Start a job for `action_id`
    ///
    /// Ignored while another job is pending or running. On success the log
    /// buffer and cursor restart from the job's initial batch and polling
    /// begins. On failure the previous job state is left as it was, the error
    /// goes to the notice slot and the action is flagged as errored for a
    /// short while.
    pub async fn submit(
        &self,
        action_id: &str,
        args: Vec<String>,
        story_ids: Option<Vec<String>>,
    ) -> Result<Dispatch> {
        {
            let mut state = self.shared.lock();
            let busy = state
                .snapshot
                .as_ref()
                .is_some_and(|job| job.status.is_active());
            if busy || state.submitting {
                debug!("Ignoring submit of {}: a job is already active", action_id);
                return Ok(Dispatch::Ignored);
            }
            state.submitting = true;
            state.notice = None;
            state
                .actions
                .insert(action_id.to_string(), ActionState::Running);
        }
        self.shared.bump();

        let mut req = CreateJob::new(action_id).with_args(args);
        if let Some(story_ids) = story_ids {
            req = req.with_story_ids(story_ids);
        }

        info!("Submitting action {}", action_id);
        let result = self.api.create_job(&req).await;

        let mut state = self.shared.lock();
        state.submitting = false;

        let outcome = match result {
            Ok(created) => {
                let JobResponse {
                    job,
                    logs,
                    next_cursor,
                } = created;
                info!("Job {} started for action {}", job.id, job.action_id);

                let job_id = job.id.clone();
                let job_action = job.action_id.clone();
                let status = job.status;

                state.poll = None;
                state.terminating = None;
                state.logs = LogBuffer::from_entries(logs);
                state.cursor = next_cursor;
                state.snapshot = Some(job);
                self.shared.set_action(&mut state, &job_action, status.into());

                if status.is_active() {
                    let first_tick = self.scheduler.timing().base;
                    state.poll = Some(self.scheduler.spawn(job_id, self.sink(), first_tick));
                }

                self.shared.persist(&state);
                Ok(Dispatch::Applied)
            }
            Err(e) => {
                warn!("Failed to submit action {}: {}", action_id, e);
                state.notice = Some(JobNotice::Failed(e.to_string()));
                self.shared
                    .set_action(&mut state, action_id, ActionState::Error);
                Err(e.into())
            }
        };

        drop(state);
        self.shared.bump();
        outcome
    }

    /// Ask the job API to terminate `job_id`
    ///
    /// Ignored when `job_id` is not the held job, when termination was
    /// already requested (or is in flight) and when the job is terminal. The
    /// request carries the cursor as it is at call time.
    pub async fn terminate(&self, job_id: &str) -> Result<Dispatch> {
        let cursor = {
            let mut state = self.shared.lock();
            let allowed = state.terminating.is_none()
                && state
                    .snapshot
                    .as_ref()
                    .is_some_and(|job| job.id == job_id && job.can_terminate());
            if !allowed {
                debug!("Ignoring terminate of {}", job_id);
                return Ok(Dispatch::Ignored);
            }
            state.terminating = Some(job_id.to_string());
            state.cursor
        };
        self.shared.bump();

        info!("Requesting termination of job {}", job_id);
        let result = self.api.terminate_job(job_id, cursor).await;

        let mut state = self.shared.lock();
        if state.terminating.as_deref() == Some(job_id) {
            state.terminating = None;
        }

        let still_held = state.snapshot.as_ref().is_some_and(|job| job.id == job_id);
        let outcome = if !still_held {
            debug!("Job {} was replaced while terminating", job_id);
            Ok(Dispatch::Ignored)
        } else {
            match result {
                Ok(update) => {
                    state.notice = None;
                    if let Some(poll) = &state.poll {
                        poll.reset_backoff();
                    }
                    self.shared.apply_update(&mut state, update);
                    Ok(Dispatch::Applied)
                }
                Err(e) if e.is_not_found() => {
                    warn!("Job {} no longer exists; clearing local state", job_id);
                    self.shared.wipe_job(&mut state);
                    state.notice = Some(JobNotice::JobMissing(TERMINATE_MISSING_MESSAGE.to_string()));
                    Err(EngineError::JobMissing(TERMINATE_MISSING_MESSAGE.to_string()))
                }
                Err(e) => {
                    warn!("Failed to terminate job {}: {}", job_id, e);
                    state.notice = Some(JobNotice::Failed(e.to_string()));
                    Err(e.into())
                }
            }
        };

        drop(state);
        self.shared.bump();
        outcome
    }

    /// Merge a server-reported partial update into the held snapshot
    ///
    /// Fields absent from `patch` are left unchanged.
    ///
    /// # Returns
    /// The status after merging, or `None` when no job is held
    pub fn reconcile_snapshot(&self, patch: &JobPatch) -> Option<JobStatus> {
        let mut state = self.shared.lock();
        let status = self.shared.merge_patch(&mut state, patch);
        if status.is_some() {
            self.shared.persist(&state);
        }
        drop(state);
        self.shared.bump();
        status
    }

    /// Reattach to a restored job that is still pending or running
    ///
    /// Polls immediately rather than after the base interval.
    pub fn resume(&self) -> Dispatch {
        let mut state = self.shared.lock();
        if state.poll.is_some() {
            return Dispatch::Ignored;
        }
        let Some(job) = state.snapshot.as_ref().filter(|job| job.status.is_active()) else {
            return Dispatch::Ignored;
        };

        let job_id = job.id.clone();
        let action_id = job.action_id.clone();
        info!("Resuming job {} from cursor {}", job_id, state.cursor);

        state.actions.insert(action_id, ActionState::Running);
        state.poll = Some(self.scheduler.spawn(job_id, self.sink(), Duration::ZERO));

        drop(state);
        self.shared.bump();
        Dispatch::Applied
    }

    /// Stop polling and wipe all job-scoped state
    pub fn clear(&self) {
        let mut state = self.shared.lock();
        self.shared.wipe_job(&mut state);
        state.notice = None;
        drop(state);
        self.shared.bump();
    }

    /// Stop polling and flush every pending write
    pub fn shutdown(&self) {
        let mut state = self.shared.lock();
        state.poll = None;
        drop(state);
        self.shared.slots.flush();
    }

    /// Copy of everything the controller holds
    pub fn view(&self) -> JobView {
        let state = self.shared.lock();
        JobView {
            snapshot: state.snapshot.clone(),
            logs: state.logs.entries().to_vec(),
            cursor: state.cursor,
            notice: state.notice.clone(),
            terminating: state.terminating.is_some(),
            polling: state.poll.is_some(),
            actions: state.actions.clone(),
        }
    }

    /// Held snapshot, if any
    pub fn snapshot(&self) -> Option<JobSnapshot> {
        self.shared.lock().snapshot.clone()
    }

    /// Whether a poll loop is live
    pub fn is_polling(&self) -> bool {
        self.shared.lock().poll.is_some()
    }

    /// Revision counter bumped after every applied change
    pub fn subscribe(&self) -> watch::Receiver<u64> {
        self.shared.revision.subscribe()
    }

    /// Wait until no poll loop or request is in flight
    pub async fn settled(&self) {
        loop {
            let mut changes = self.subscribe();
            {
                let state = self.shared.lock();
                if state.poll.is_none() && state.terminating.is_none() && !state.submitting {
                    return;
                }
            }
            if changes.changed().await.is_err() {
                return;
            }
        }
    }

    fn sink(&self) -> Arc<dyn PollSink> {
        Arc::clone(&self.shared) as Arc<dyn PollSink>
    }
}

impl Drop for JobController {
    fn drop(&mut self) {
        self.shutdown();
    }
}

impl Shared {
    fn lock(&self) -> MutexGuard<'_, JobState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn bump(&self) {
        self.revision.send_modify(|revision| *revision += 1);
    }

    fn persist(&self, state: &JobState) {
        self.slots.snapshot.stage(state.snapshot.clone());
        self.slots.logs.stage(state.logs.entries().to_vec());
        self.slots.cursor.stage(state.cursor);
    }

    fn wipe_job(&self, state: &mut JobState) {
        state.poll = None;
        if let Some(job) = state.snapshot.take() {
            state.actions.insert(job.action_id, ActionState::Idle);
        }
        state.logs.clear();
        state.cursor = 0;
        state.terminating = None;
        self.slots.clear();
    }

    fn merge_patch(&self, state: &mut JobState, patch: &JobPatch) -> Option<JobStatus> {
        let job = state.snapshot.as_mut()?;
        let before = job.status;
        job.apply(patch);
        let status = job.status;
        let action_id = job.action_id.clone();

        if status != before {
            debug!("Job {} moved from {} to {}", job.id, before, status);
            self.set_action(state, &action_id, status.into());
        }

        if status.is_terminal() {
            state.poll = None;
            state.terminating = None;
        }

        Some(status)
    }

    fn apply_update(&self, state: &mut JobState, update: JobUpdate) -> Option<JobStatus> {
        let JobResponse {
            job: patch,
            logs,
            next_cursor,
        } = update;

        let status = self.merge_patch(state, &patch)?;
        state.logs.merge(logs);
        state.cursor = state.cursor.max(next_cursor);
        self.persist(state);
        Some(status)
    }

    fn set_action(&self, state: &mut JobState, action_id: &str, action_state: ActionState) {
        state
            .actions
            .insert(action_id.to_string(), action_state);
        if matches!(action_state, ActionState::Success | ActionState::Error) {
            self.schedule_idle(action_id, action_state);
        }
    }

    /// Revert `action_id` to idle after the reset delay unless it changed meanwhile
    fn schedule_idle(&self, action_id: &str, expected: ActionState) {
        let Ok(runtime) = tokio::runtime::Handle::try_current() else {
            return;
        };

        let this = self.this.clone();
        let action_id = action_id.to_string();
        let delay = self.status_reset_delay;

        runtime.spawn(async move {
            tokio::time::sleep(delay).await;
            let Some(shared) = this.upgrade() else {
                return;
            };

            let reverted = {
                let mut state = shared.lock();
                match state.actions.get_mut(&action_id) {
                    Some(current) if *current == expected => {
                        *current = ActionState::Idle;
                        true
                    }
                    _ => false,
                }
            };

            if reverted {
                shared.bump();
            }
        });
    }
}

impl PollSink for Shared {
    fn cursor(&self) -> u64 {
        self.lock().cursor
    }

    fn apply_batch(&self, token: &CancellationToken, update: JobUpdate) -> Option<JobStatus> {
        let mut state = self.lock();
        if token.is_cancelled() {
            debug!("Discarding poll result that arrived after cancellation");
            return None;
        }
        let status = self.apply_update(&mut state, update);
        drop(state);
        self.bump();
        status
    }

    fn job_missing(&self, token: &CancellationToken) {
        let mut state = self.lock();
        if token.is_cancelled() {
            return;
        }
        self.wipe_job(&mut state);
        state.notice = Some(JobNotice::JobMissing(POLL_MISSING_MESSAGE.to_string()));
        drop(state);
        self.bump();
    }

    fn poll_failed(&self, token: &CancellationToken, error: ClientError) {
        let mut state = self.lock();
        if token.is_cancelled() {
            return;
        }
        state.poll = None;
        state.notice = Some(JobNotice::Failed(error.to_string()));
        drop(state);
        self.bump();
    }
}
