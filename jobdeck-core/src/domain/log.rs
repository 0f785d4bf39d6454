//! Log domain types

use serde::{Deserialize, Serialize};

/// A log line emitted by a remote job
///
/// `seq` is assigned by the job runner. It is unique per job but the same
/// entry may be delivered more than once, so it is the deduplication key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogEntry {
    pub seq: u64,
    pub timestamp: chrono::DateTime<chrono::Utc>,
    pub stream: LogStream,
    pub text: String,
}

/// Output stream a log line was captured from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogStream {
    Stdout,
    Stderr,
    /// Lines produced by the job runner itself (start, exit, termination notes)
    System,
}

impl std::fmt::Display for LogStream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LogStream::Stdout => write!(f, "stdout"),
            LogStream::Stderr => write!(f, "stderr"),
            LogStream::System => write!(f, "system"),
        }
    }
}
