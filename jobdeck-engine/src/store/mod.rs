//! Persistent state store
//!
//! A small key/value abstraction over durable storage. One store instance is
//! created per process and shared as `Arc<dyn StateStore>` by everything that
//! persists state; nothing reaches for an ambient global.
//!
//! Values are JSON strings. Typed access, defaults and write debouncing live
//! in [`PersistentSlot`].

mod file;
mod slot;

pub use file::FileStore;
pub use slot::PersistentSlot;

use std::collections::HashMap;
use std::sync::Mutex;

use thiserror::Error;

/// Result type alias for store operations
pub type Result<T> = std::result::Result<T, StoreError>;

/// Errors raised by a store backend
#[derive(Debug, Error)]
pub enum StoreError {
    /// Reading or writing the backing medium failed
    #[error("store I/O failed: {0}")]
    Io(#[from] std::io::Error),

    /// A value could not be encoded
    #[error("failed to serialize value: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Durable key/value storage
pub trait StateStore: Send + Sync {
    /// Read the raw value stored under `key`
    fn get(&self, key: &str) -> Result<Option<String>>;

    /// Store `value` under `key`, replacing any previous value
    fn set(&self, key: &str, value: &str) -> Result<()>;

    /// Remove `key`; removing an absent key is not an error
    fn remove(&self, key: &str) -> Result<()>;
}

/// In-memory store for tests and ephemeral sessions
#[derive(Debug, Default)]
pub struct MemoryStore {
    values: Mutex<HashMap<String, String>>,
}

impl MemoryStore {
    /// Creates an empty store
    pub fn new() -> Self {
        Self::default()
    }

    fn values(&self) -> std::sync::MutexGuard<'_, HashMap<String, String>> {
        self.values.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl StateStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.values().get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        self.values().insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        self.values().remove(key);
        Ok(())
    }
}

/// Keys of the persisted slots
pub mod keys {
    pub const SELECTED_ACTION: &str = "workflow:selectedAction";
    pub const OPTION_SELECTIONS: &str = "workflow:optionSelections";
    pub const SELECTED_OWNERS: &str = "workflow:selectedOwners";
    pub const JOB_SNAPSHOT: &str = "workflow:jobSnapshot";
    pub const JOB_LOGS: &str = "workflow:jobLogs";
    pub const JOB_CURSOR: &str = "workflow:jobCursor";
}
