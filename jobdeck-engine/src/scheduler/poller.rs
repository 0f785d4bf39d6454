//! Job poller
//!
//! Runs one sequential poll loop per active job in its own task. Each tick
//! issues a single request from the sink's current cursor and waits for it
//! to finish before anything else happens, so there is never more than one
//! request outstanding per job.
//!
//! The loop stops for good when the job turns terminal, when the job API no
//! longer knows the job, on the first failed poll (no retries), or when its
//! cancellation token fires.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use jobdeck_client::{ClientError, JobApi};
use jobdeck_core::domain::job::JobStatus;
use jobdeck_core::dto::job::JobUpdate;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use super::backoff::{Backoff, PollTiming};

/// Receiver of poll results
///
/// Every callback gets the loop's cancellation token and must re-check it
/// under the same lock that guards job state before applying anything, so a
/// result that lands after cancellation is discarded rather than applied.
pub trait PollSink: Send + Sync + 'static {
    /// Cursor the next poll should start from
    fn cursor(&self) -> u64;

    /// Apply a successful poll
    ///
    /// # Returns
    /// The job status after applying, or `None` if the result was discarded
    fn apply_batch(&self, token: &CancellationToken, update: JobUpdate) -> Option<JobStatus>;

    /// The job API no longer knows the job
    fn job_missing(&self, token: &CancellationToken);

    /// A poll failed; polling stops after this call
    fn poll_failed(&self, token: &CancellationToken, error: ClientError);
}

/// Why a poll loop ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    /// The job reached a terminal status
    Terminal(JobStatus),
    /// The job API reported the job as not found
    JobMissing,
    /// A poll failed
    Failed,
    /// The loop was cancelled from outside
    Cancelled,
}

/// Launches poll loops
#[derive(Clone)]
pub struct PollScheduler {
    api: Arc<dyn JobApi>,
    timing: PollTiming,
}

impl PollScheduler {
    /// Creates a scheduler polling `api` with the given pacing
    pub fn new(api: Arc<dyn JobApi>, timing: PollTiming) -> Self {
        Self { api, timing }
    }

    /// Pacing used by spawned loops
    pub fn timing(&self) -> PollTiming {
        self.timing
    }

    /// Start polling `job_id`
    ///
    /// The first poll fires after `initial_delay`. Must be called from within
    /// a tokio runtime.
    ///
    /// # Returns
    /// A handle owning the loop; dropping it cancels the loop
    pub fn spawn(
        &self,
        job_id: impl Into<String>,
        sink: Arc<dyn PollSink>,
        initial_delay: Duration,
    ) -> PollHandle {
        let job_id = job_id.into();
        let token = CancellationToken::new();
        let reset = Arc::new(AtomicBool::new(false));

        let poll_loop = PollLoop {
            api: Arc::clone(&self.api),
            sink,
            job_id: job_id.clone(),
            token: token.clone(),
            reset: Arc::clone(&reset),
            backoff: Backoff::new(self.timing),
        };

        info!("Starting poll loop for job {}", job_id);
        let task = tokio::spawn(poll_loop.run(initial_delay));

        PollHandle {
            job_id,
            token,
            reset,
            task: Some(task),
            reason: None,
        }
    }
}

/// Handle to a running poll loop
///
/// Dropping the handle cancels the loop.
#[derive(Debug)]
pub struct PollHandle {
    job_id: String,
    token: CancellationToken,
    reset: Arc<AtomicBool>,
    task: Option<JoinHandle<StopReason>>,
    reason: Option<StopReason>,
}

impl PollHandle {
    /// Abort any in-flight request and stop the loop
    pub fn cancel(&self) {
        self.token.cancel();
    }

    /// Whether the loop task is still alive
    pub fn is_running(&self) -> bool {
        self.task.as_ref().is_some_and(|task| !task.is_finished())
    }

    /// Snap the loop's interval back to base when it schedules its next tick
    pub fn reset_backoff(&self) {
        self.reset.store(true, Ordering::SeqCst);
    }

    /// Wait for the loop to end
    pub async fn stopped(&mut self) -> StopReason {
        if let Some(task) = self.task.take() {
            let reason = task.await.unwrap_or_else(|e| {
                warn!("Poll task for job {} ended abnormally: {}", self.job_id, e);
                StopReason::Cancelled
            });
            self.reason = Some(reason);
        }
        self.reason.unwrap_or(StopReason::Cancelled)
    }
}

impl Drop for PollHandle {
    fn drop(&mut self) {
        self.token.cancel();
    }
}

struct PollLoop {
    api: Arc<dyn JobApi>,
    sink: Arc<dyn PollSink>,
    job_id: String,
    token: CancellationToken,
    reset: Arc<AtomicBool>,
    backoff: Backoff,
}

impl PollLoop {
    async fn run(mut self, initial_delay: Duration) -> StopReason {
        let mut delay = initial_delay;

        loop {
            if !delay.is_zero() {
                tokio::select! {
                    biased;
                    _ = self.token.cancelled() => return self.cancelled(),
                    _ = tokio::time::sleep(delay) => {}
                }
            }

            let cursor = self.sink.cursor();
            debug!("Polling job {} from cursor {}", self.job_id, cursor);

            let result = tokio::select! {
                biased;
                _ = self.token.cancelled() => return self.cancelled(),
                result = self.api.poll_job(&self.job_id, cursor) => result,
            };

            match result {
                Ok(update) => {
                    let received = update.logs.len();
                    let Some(status) = self.sink.apply_batch(&self.token, update) else {
                        return self.cancelled();
                    };

                    if status.is_terminal() {
                        info!("Job {} finished with status {}", self.job_id, status);
                        return StopReason::Terminal(status);
                    }

                    if self.reset.swap(false, Ordering::SeqCst) {
                        self.backoff.reset();
                    }

                    delay = if received > 0 {
                        self.backoff.reset()
                    } else {
                        self.backoff.grow()
                    };
                    debug!(
                        "Job {}: {} new line(s), next poll in {:?}",
                        self.job_id, received, delay
                    );
                }
                Err(e) if e.is_not_found() => {
                    warn!("Job {} no longer exists", self.job_id);
                    self.sink.job_missing(&self.token);
                    return StopReason::JobMissing;
                }
                Err(e) => {
                    error!("Polling job {} failed: {}", self.job_id, e);
                    self.sink.poll_failed(&self.token, e);
                    return StopReason::Failed;
                }
            }
        }
    }

    fn cancelled(&self) -> StopReason {
        debug!("Poll loop for job {} cancelled", self.job_id);
        StopReason::Cancelled
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{ScriptedApi, log_entries, running_update};
    use std::sync::Mutex;
    use tokio::time::Instant;

    /// Sink recording what it receives, with a cursor that follows updates
    #[derive(Default)]
    struct RecordingSink {
        cursor: Mutex<u64>,
        batches: Mutex<Vec<JobUpdate>>,
        missing: AtomicBool,
        failures: Mutex<Vec<String>>,
    }

    impl PollSink for RecordingSink {
        fn cursor(&self) -> u64 {
            *self.cursor.lock().unwrap()
        }

        fn apply_batch(&self, token: &CancellationToken, update: JobUpdate) -> Option<JobStatus> {
            if token.is_cancelled() {
                return None;
            }
            *self.cursor.lock().unwrap() = update.next_cursor;
            let status = update.job.status.unwrap_or(JobStatus::Running);
            self.batches.lock().unwrap().push(update);
            Some(status)
        }

        fn job_missing(&self, _token: &CancellationToken) {
            self.missing.store(true, Ordering::SeqCst);
        }

        fn poll_failed(&self, _token: &CancellationToken, error: ClientError) {
            self.failures.lock().unwrap().push(error.to_string());
        }
    }

    fn scheduler(api: &Arc<ScriptedApi>) -> PollScheduler {
        PollScheduler::new(api.clone(), PollTiming::default())
    }

    fn gaps(api: &ScriptedApi, start: Instant) -> Vec<u64> {
        let mut previous = start;
        api.poll_times()
            .into_iter()
            .map(|at| {
                let gap = at.duration_since(previous).as_millis() as u64;
                previous = at;
                gap
            })
            .collect()
    }

    #[tokio::test(start_paused = true)]
    async fn test_empty_polls_back_off_to_cap() {
        let api = Arc::new(ScriptedApi::new());
        let sink = Arc::new(RecordingSink::default());
        let start = Instant::now();

        let mut handle = scheduler(&api).spawn("job-1", sink, Duration::from_millis(1500));
        tokio::time::sleep(Duration::from_millis(60_000)).await;
        handle.cancel();
        assert_eq!(handle.stopped().await, StopReason::Cancelled);

        let gaps = gaps(&api, start);
        assert_eq!(
            &gaps[..8],
            &[1500, 3000, 4500, 6000, 7500, 9000, 10_000, 10_000]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_output_resets_interval() {
        let api = Arc::new(ScriptedApi::new());
        api.push_poll(running_update(Vec::new(), 0));
        api.push_poll(running_update(Vec::new(), 0));
        api.push_poll(running_update(Vec::new(), 0));
        api.push_poll(running_update(log_entries(0..2), 2));
        let sink = Arc::new(RecordingSink::default());
        let start = Instant::now();

        let _handle = scheduler(&api).spawn("job-1", sink, Duration::from_millis(1500));
        tokio::time::sleep(Duration::from_millis(20_000)).await;

        let gaps = gaps(&api, start);
        assert_eq!(&gaps[..6], &[1500, 3000, 4500, 6000, 1500, 3000]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_polls_carry_advancing_cursor() {
        let api = Arc::new(ScriptedApi::new());
        api.push_poll(running_update(log_entries(0..3), 3));
        api.push_poll(running_update(log_entries(3..5), 5));
        let sink = Arc::new(RecordingSink::default());

        let _handle = scheduler(&api).spawn("job-1", sink.clone(), Duration::ZERO);
        tokio::time::sleep(Duration::from_millis(5000)).await;

        assert_eq!(&api.poll_cursors()[..3], &[0, 3, 5]);
        assert_eq!(sink.batches.lock().unwrap().len(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_terminal_status_stops_loop() {
        let api = Arc::new(ScriptedApi::new());
        let mut done = running_update(log_entries(0..1), 1);
        done.job.status = Some(JobStatus::Success);
        api.push_poll(done);
        let sink = Arc::new(RecordingSink::default());

        let mut handle = scheduler(&api).spawn("job-1", sink, Duration::ZERO);
        assert_eq!(
            handle.stopped().await,
            StopReason::Terminal(JobStatus::Success)
        );

        tokio::time::sleep(Duration::from_millis(30_000)).await;
        assert_eq!(api.poll_times().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_not_found_stops_and_reports_missing() {
        let api = Arc::new(ScriptedApi::new());
        api.push_poll_error(404, "no such job");
        let sink = Arc::new(RecordingSink::default());

        let mut handle = scheduler(&api).spawn("job-1", sink.clone(), Duration::ZERO);

        assert_eq!(handle.stopped().await, StopReason::JobMissing);
        assert!(sink.missing.load(Ordering::SeqCst));
        assert!(sink.failures.lock().unwrap().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_failure_is_not_retried() {
        let api = Arc::new(ScriptedApi::new());
        api.push_poll_error(500, "exploded");
        let sink = Arc::new(RecordingSink::default());

        let mut handle = scheduler(&api).spawn("job-1", sink.clone(), Duration::ZERO);

        assert_eq!(handle.stopped().await, StopReason::Failed);
        tokio::time::sleep(Duration::from_millis(30_000)).await;
        assert_eq!(api.poll_times().len(), 1);
        assert_eq!(
            sink.failures.lock().unwrap().as_slice(),
            &["API error (status 500): exploded".to_string()]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_discards_in_flight_result() {
        let api = Arc::new(ScriptedApi::new());
        api.push_poll_delayed(Duration::from_millis(5000), running_update(log_entries(0..4), 4));
        let sink = Arc::new(RecordingSink::default());

        let mut handle = scheduler(&api).spawn("job-1", sink.clone(), Duration::ZERO);
        tokio::time::sleep(Duration::from_millis(1000)).await;
        assert!(handle.is_running());

        handle.cancel();
        assert_eq!(handle.stopped().await, StopReason::Cancelled);

        tokio::time::sleep(Duration::from_millis(10_000)).await;
        assert!(sink.batches.lock().unwrap().is_empty());
        assert_eq!(sink.cursor(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_dropping_handle_cancels() {
        let api = Arc::new(ScriptedApi::new());
        let sink = Arc::new(RecordingSink::default());

        let handle = scheduler(&api).spawn("job-1", sink, Duration::from_millis(1500));
        drop(handle);
        tokio::time::sleep(Duration::from_millis(30_000)).await;

        assert!(api.poll_times().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_reset_backoff_applies_to_next_schedule() {
        let api = Arc::new(ScriptedApi::new());
        let sink = Arc::new(RecordingSink::default());
        let start = Instant::now();

        let handle = scheduler(&api).spawn("job-1", sink, Duration::from_millis(1500));
        // polls at 1500, 4500, 9000; reset requested while waiting for the third
        tokio::time::sleep(Duration::from_millis(6000)).await;
        handle.reset_backoff();
        tokio::time::sleep(Duration::from_millis(10_000)).await;

        let gaps = gaps(&api, start);
        assert_eq!(&gaps[..4], &[1500, 3000, 4500, 3000]);
    }
}
