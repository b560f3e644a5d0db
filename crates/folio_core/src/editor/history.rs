//! Bounded snapshot history for undo/redo.
//!
//! # Responsibility
//! - Record serialized snapshots of the body block list.
//! - Move a pointer back and forth for undo/redo.
//!
//! # Invariants
//! - `len() <= limit` at all times; overflow evicts the oldest entry.
//! - The pointer addresses the current state, or is `None` when empty.
//! - Recording a snapshot equal to the current entry is a no-op.
//! - Recording after an undo discards the redo future.

/// Default number of retained snapshots.
pub const DEFAULT_HISTORY_LIMIT: usize = 50;

/// Linear snapshot history.
#[derive(Debug, Clone)]
pub struct HistoryStack {
    entries: Vec<String>,
    pointer: Option<usize>,
    limit: usize,
}

impl Default for HistoryStack {
    fn default() -> Self {
        Self::new()
    }
}

impl HistoryStack {
    pub fn new() -> Self {
        Self::with_limit(DEFAULT_HISTORY_LIMIT)
    }

    /// History retaining at most `limit` entries (at least one).
    pub fn with_limit(limit: usize) -> Self {
        Self {
            entries: Vec::new(),
            pointer: None,
            limit: limit.max(1),
        }
    }

    /// Records `snapshot` as the new current state.
    ///
    /// Returns `false` when it equals the current entry and nothing changed.
    pub fn record(&mut self, snapshot: String) -> bool {
        if let Some(pointer) = self.pointer {
            if self.entries[pointer] == snapshot {
                return false;
            }
            self.entries.truncate(pointer + 1);
        }

        self.entries.push(snapshot);
        if self.entries.len() > self.limit {
            self.entries.remove(0);
        }
        self.pointer = Some(self.entries.len() - 1);
        true
    }

    /// Steps back one entry and returns the snapshot to restore.
    pub fn undo(&mut self) -> Option<&str> {
        let pointer = self.pointer.filter(|p| *p > 0)? - 1;
        self.pointer = Some(pointer);
        Some(self.entries[pointer].as_str())
    }

    /// Steps forward one entry and returns the snapshot to restore.
    pub fn redo(&mut self) -> Option<&str> {
        let pointer = self.pointer? + 1;
        if pointer >= self.entries.len() {
            return None;
        }
        self.pointer = Some(pointer);
        Some(self.entries[pointer].as_str())
    }

    pub fn can_undo(&self) -> bool {
        matches!(self.pointer, Some(p) if p > 0)
    }

    pub fn can_redo(&self) -> bool {
        matches!(self.pointer, Some(p) if p + 1 < self.entries.len())
    }

    pub fn current(&self) -> Option<&str> {
        self.pointer.map(|p| self.entries[p].as_str())
    }

    pub fn pointer(&self) -> Option<usize> {
        self.pointer
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn limit(&self) -> usize {
        self.limit
    }
}
