//! Scheduler layer
//!
//! Drives the incremental poll loop for the one job a controller tracks.
//! The loop never holds job state itself: it fetches batches from the job
//! API and hands them to a [`PollSink`], which owns the snapshot, the log
//! buffer and the cursor.

pub mod backoff;
pub mod poller;

pub use backoff::{Backoff, PollTiming};
pub use poller::{PollHandle, PollScheduler, PollSink, StopReason};
