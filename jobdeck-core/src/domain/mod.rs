//! Core domain types
//!
//! This module contains the core domain structures used across Jobdeck crates.
//! These types mirror what the remote job runner reports and are shared between
//! the HTTP client (decodes them) and the engine (persists and reconciles them).

pub mod action;
pub mod job;
pub mod log;
pub mod story;
