//! Engine error types

use jobdeck_client::ClientError;
use thiserror::Error;

use crate::stories::GateError;

/// Result type alias for engine operations
pub type Result<T> = std::result::Result<T, EngineError>;

/// Errors surfaced by engine operations
///
/// Guard violations (submitting while busy, terminating twice) are not
/// errors; operations report them as [`crate::Dispatch::Ignored`].
#[derive(Debug, Error)]
pub enum EngineError {
    /// The job API rejected or failed the request
    #[error(transparent)]
    Client(#[from] ClientError),

    /// The job API no longer knows the job; local job state was wiped
    #[error("{0}")]
    JobMissing(String),

    /// Submission is not allowed with the current owner/story selection
    #[error(transparent)]
    Gate(#[from] GateError),

    /// No action with this id is offered
    #[error("unknown action: {0}")]
    UnknownAction(String),
}
