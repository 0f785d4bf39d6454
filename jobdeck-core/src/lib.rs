//! Jobdeck Core
//!
//! Core types and abstractions for the Jobdeck job console.
//!
//! This crate contains:
//! - Domain types: Jobs, log entries, actions and stories as the job API reports them
//! - DTOs: Request and response envelopes exchanged with the job API
//! - Reconciliation: The pure merge/dedup/trim logic behind the local log buffer

pub mod domain;
pub mod dto;
pub mod reconcile;
