//! Log reconciliation
//!
//! Folds incremental log batches into a bounded, deduplicated local view.
//!
//! The job API may resend entries (retries, reconnects), so the same `seq`
//! can arrive more than once. The local view keeps every `seq` exactly once,
//! keeps arrival order (the server's emission order, not a numeric sort) and
//! never holds more than [`MAX_ENTRIES`] entries, dropping the oldest first.
//!
//! Among duplicates, the most recently arrived occurrence wins and keeps its
//! own position. All functions here are deterministic and free of I/O.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::domain::log::LogEntry;

/// Upper bound on locally retained log entries
pub const MAX_ENTRIES: usize = 2000;

/// Cheap pre-check: does `entries` break the size bound or repeat a `seq`?
pub fn needs_normalize(entries: &[LogEntry]) -> bool {
    if entries.len() > MAX_ENTRIES {
        return true;
    }

    let mut seen = HashSet::with_capacity(entries.len());
    entries.iter().any(|entry| !seen.insert(entry.seq))
}

/// Remove duplicate `seq` values and enforce the size bound
///
/// Scans from the newest entry backwards, keeping the first occurrence of
/// each `seq` it meets, until [`MAX_ENTRIES`] entries are collected, then
/// restores arrival order. Clean input is returned as is.
pub fn normalize(entries: Vec<LogEntry>) -> Vec<LogEntry> {
    if !needs_normalize(&entries) {
        return entries;
    }

    let mut seen = HashSet::with_capacity(MAX_ENTRIES);
    let mut kept = Vec::with_capacity(entries.len().min(MAX_ENTRIES));

    for entry in entries.into_iter().rev() {
        if !seen.insert(entry.seq) {
            continue;
        }
        kept.push(entry);
        if kept.len() == MAX_ENTRIES {
            break;
        }
    }

    kept.reverse();
    kept
}

/// Merge a newly received batch into `current`
///
/// Appends directly when `incoming` is clean against `current` and fits the
/// bound; otherwise concatenates and normalizes. An empty batch leaves
/// `current` alone unless it is already oversized.
pub fn merge(current: Vec<LogEntry>, incoming: Vec<LogEntry>) -> Vec<LogEntry> {
    let mut buffer = LogBuffer::from_raw(current);
    buffer.merge(incoming);
    buffer.into_entries()
}

/// Canonical local log view
///
/// Invariant: entries are unique by `seq` and at most [`MAX_ENTRIES`] long.
/// A seq index is kept beside the entries so appending a clean batch costs
/// O(batch) rather than O(buffer).
///
/// Serializes as a plain array of entries. Deserializing normalizes, so a
/// corrupted or oversized persisted buffer heals on load.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(from = "Vec<LogEntry>", into = "Vec<LogEntry>")]
pub struct LogBuffer {
    entries: Vec<LogEntry>,
    seqs: HashSet<u64>,
}

impl LogBuffer {
    /// Create an empty buffer
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a buffer from raw entries, normalizing them
    pub fn from_entries(entries: Vec<LogEntry>) -> Self {
        Self::index(normalize(entries))
    }

    // Keeps the input verbatim, even if it breaks the invariant, so that
    // `merge` can apply the empty-batch rule to an oversized buffer.
    fn from_raw(entries: Vec<LogEntry>) -> Self {
        Self::index(entries)
    }

    fn index(entries: Vec<LogEntry>) -> Self {
        let seqs = entries.iter().map(|entry| entry.seq).collect();
        Self { entries, seqs }
    }

    /// Merge a batch as received from the server
    ///
    /// # Returns
    /// `true` if the buffer changed
    pub fn merge(&mut self, incoming: Vec<LogEntry>) -> bool {
        if incoming.is_empty() {
            if self.entries.len() > MAX_ENTRIES {
                self.renormalize();
                return true;
            }
            return false;
        }

        if self.is_clean_append(&incoming) {
            self.seqs.extend(incoming.iter().map(|entry| entry.seq));
            self.entries.extend(incoming);
            return true;
        }

        let mut combined = std::mem::take(&mut self.entries);
        combined.extend(incoming);
        *self = Self::from_entries(combined);
        true
    }

    fn is_clean_append(&self, incoming: &[LogEntry]) -> bool {
        if self.seqs.len() != self.entries.len() {
            return false;
        }
        if self.entries.len() + incoming.len() > MAX_ENTRIES {
            return false;
        }

        let mut batch = HashSet::with_capacity(incoming.len());
        incoming
            .iter()
            .all(|entry| !self.seqs.contains(&entry.seq) && batch.insert(entry.seq))
    }

    fn renormalize(&mut self) {
        let entries = std::mem::take(&mut self.entries);
        *self = Self::from_entries(entries);
    }

    /// Entries in arrival order
    pub fn entries(&self) -> &[LogEntry] {
        &self.entries
    }

    /// Consume the buffer, returning its entries
    pub fn into_entries(self) -> Vec<LogEntry> {
        self.entries
    }

    /// Number of entries held
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the buffer is empty
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Drop every entry
    pub fn clear(&mut self) {
        self.entries.clear();
        self.seqs.clear();
    }
}

impl PartialEq for LogBuffer {
    fn eq(&self, other: &Self) -> bool {
        self.entries == other.entries
    }
}

impl Eq for LogBuffer {}

impl From<Vec<LogEntry>> for LogBuffer {
    fn from(entries: Vec<LogEntry>) -> Self {
        Self::from_entries(entries)
    }
}

impl From<LogBuffer> for Vec<LogEntry> {
    fn from(buffer: LogBuffer) -> Self {
        buffer.entries
    }
}
