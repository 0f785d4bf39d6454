//! Jobdeck Engine
//!
//! Client-side job sync engine for the Jobdeck console.
//!
//! This crate contains:
//! - Controller: Submits and terminates jobs and keeps the local snapshot,
//!   log buffer and cursor in line with the job API
//! - Scheduler: The adaptive-backoff poll loop feeding the controller
//! - Selections: Persisted action, option and owner choices, and the
//!   arguments they produce
//! - Store: Durable key/value state with debounced typed slots

pub mod config;
pub mod controller;
pub mod error;
pub mod scheduler;
pub mod selections;
pub mod state;
pub mod stories;
pub mod store;

#[cfg(test)]
mod testing;

pub use config::Config;
pub use controller::JobController;
pub use error::{EngineError, Result};
pub use selections::{JobArgs, Selections};
pub use state::{ActionState, Dispatch, JobNotice, JobView};
