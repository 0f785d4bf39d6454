//! Data Transfer Objects for the job API
//!
//! Request bodies and response envelopes exchanged with the remote job
//! runner. Domain payloads are flattened into the envelopes exactly as the
//! server lays them out on the wire.

pub mod job;
pub mod story;
