//! Typed, debounced persistence for a single key
//!
//! A slot loads its value once (falling back to a default when the key is
//! absent or unparsable) and writes staged values back to the store. With a
//! zero write delay every stage is written immediately; otherwise writes are
//! debounced on a tokio timer that is re-armed on every stage. Pending writes
//! are flushed on [`PersistentSlot::flush`] and when the slot is dropped, so
//! no exit path leaks a timer or loses the last value.
//!
//! Store failures never propagate: they are logged and the in-memory state
//! carries on unaffected.

use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use serde::Serialize;
use serde::de::DeserializeOwned;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use super::StateStore;

/// Transformation applied to a value right before it is written
pub type Reducer<T> = fn(T) -> T;

/// Persisted storage for one key
pub struct PersistentSlot<T: Serialize> {
    key: String,
    store: Arc<dyn StateStore>,
    default: T,
    write_delay: Duration,
    reduce: Option<Reducer<T>>,
    pending: Arc<Mutex<Pending<T>>>,
}

struct Pending<T> {
    value: Option<T>,
    timer: Option<JoinHandle<()>>,
    /// Bumped whenever the armed timer is replaced or disarmed
    generation: u64,
}

impl<T> Pending<T> {
    fn disarm(&mut self) {
        if let Some(timer) = self.timer.take() {
            timer.abort();
        }
        self.generation += 1;
    }

    /// Staged value, if the timer armed at `generation` is still the current one
    fn take_due(&mut self, generation: u64) -> Option<T> {
        if self.generation != generation {
            return None;
        }
        self.timer = None;
        self.value.take()
    }
}

impl<T> PersistentSlot<T>
where
    T: Serialize + DeserializeOwned + Clone + Send + 'static,
{
    /// Creates a slot that writes immediately
    pub fn new(store: Arc<dyn StateStore>, key: impl Into<String>, default: T) -> Self {
        Self {
            key: key.into(),
            store,
            default,
            write_delay: Duration::ZERO,
            reduce: None,
            pending: Arc::new(Mutex::new(Pending {
                value: None,
                timer: None,
                generation: 0,
            })),
        }
    }

    /// Debounce writes by `delay`
    pub fn with_write_delay(mut self, delay: Duration) -> Self {
        self.write_delay = delay;
        self
    }

    /// Transform values right before they are written
    pub fn with_reducer(mut self, reduce: Reducer<T>) -> Self {
        self.reduce = Some(reduce);
        self
    }

    /// Read the persisted value
    ///
    /// Returns the default when the key is absent, unreadable or fails to
    /// parse. Never errors.
    pub fn load(&self) -> T {
        match self.store.get(&self.key) {
            Ok(Some(raw)) => match serde_json::from_str(&raw) {
                Ok(value) => value,
                Err(e) => {
                    debug!("Discarding unparsable value for {}: {}", self.key, e);
                    self.default.clone()
                }
            },
            Ok(None) => self.default.clone(),
            Err(e) => {
                warn!("Failed to read {}: {}", self.key, e);
                self.default.clone()
            }
        }
    }

    /// Schedule `value` to be written
    pub fn stage(&self, value: T) {
        if self.write_delay.is_zero() {
            write_value(self.store.as_ref(), &self.key, self.reduce, value);
            return;
        }

        let Ok(runtime) = tokio::runtime::Handle::try_current() else {
            write_value(self.store.as_ref(), &self.key, self.reduce, value);
            return;
        };

        let mut pending = lock(&self.pending);
        pending.disarm();
        pending.value = Some(value);
        let generation = pending.generation;

        let shared = Arc::clone(&self.pending);
        let store = Arc::clone(&self.store);
        let key = self.key.clone();
        let reduce = self.reduce;
        let delay = self.write_delay;

        pending.timer = Some(runtime.spawn(async move {
            tokio::time::sleep(delay).await;
            let mut pending = lock(&shared);
            if let Some(value) = pending.take_due(generation) {
                write_value(store.as_ref(), &key, reduce, value);
            }
        }));
    }

    /// Write any staged value now
    pub fn flush(&self) {
        let mut pending = lock(&self.pending);
        pending.disarm();
        if let Some(value) = pending.value.take() {
            write_value(self.store.as_ref(), &self.key, self.reduce, value);
        }
    }

    /// Drop any staged value and remove the key from the store
    pub fn clear(&self) {
        let mut pending = lock(&self.pending);
        pending.disarm();
        pending.value = None;

        if let Err(e) = self.store.remove(&self.key) {
            warn!("Failed to remove {}: {}", self.key, e);
        }
    }
}

impl<T: Serialize> Drop for PersistentSlot<T> {
    fn drop(&mut self) {
        let mut pending = lock(&self.pending);
        pending.disarm();
        if let Some(value) = pending.value.take() {
            write_value(self.store.as_ref(), &self.key, self.reduce, value);
        }
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|e| e.into_inner())
}

fn write_value<T: Serialize>(
    store: &dyn StateStore,
    key: &str,
    reduce: Option<Reducer<T>>,
    value: T,
) {
    let value = match reduce {
        Some(reduce) => reduce(value),
        None => value,
    };

    let result = serde_json::to_string(&value)
        .map_err(super::StoreError::from)
        .and_then(|raw| store.set(key, &raw));

    if let Err(e) = result {
        warn!("Failed to persist {}: {}", key, e);
    }
}
