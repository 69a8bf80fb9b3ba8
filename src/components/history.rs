use std::collections::VecDeque;

use crate::canvas::Bitmap;

// ============================================================================
// HISTORY MANAGER - Linear undo/redo over full-bitmap snapshots
// ============================================================================

/// Undo/redo history of whole-bitmap snapshots.
///
/// `entries[index]` is always the snapshot matching the live bitmap. Committing
/// after an undo discards the redo branch. When `max_history_size` is non-zero
/// the oldest entries are dropped to stay within it; the current entry is
/// never dropped.
pub struct HistoryManager {
    entries: VecDeque<Bitmap>,
    index: usize,
    max_history_size: usize,
    /// Running memory total across all entries.
    total_memory: usize,
}

impl Default for HistoryManager {
    fn default() -> Self {
        Self::new(Bitmap::new(0, 0), 50)
    }
}

impl HistoryManager {
    /// Start a history whose single entry is `initial`. `max_history_size == 0`
    /// keeps every entry.
    pub fn new(initial: Bitmap, max_history_size: usize) -> Self {
        let total_memory = initial.memory_bytes();
        let mut entries = VecDeque::new();
        entries.push_back(initial);
        Self {
            entries,
            index: 0,
            max_history_size,
            total_memory,
        }
    }

    /// Record `bitmap` as the newest state.
    pub fn commit(&mut self, bitmap: &Bitmap) {
        // Drop the redo branch
        while self.entries.len() > self.index + 1 {
            if let Some(removed) = self.entries.pop_back() {
                self.total_memory = self.total_memory.saturating_sub(removed.memory_bytes());
            }
        }

        self.total_memory += bitmap.memory_bytes();
        self.entries.push_back(bitmap.clone());
        self.index = self.entries.len() - 1;

        self.prune();
    }

    /// Step back one entry and return a copy of it, or `None` at the oldest entry.
    pub fn undo(&mut self) -> Option<Bitmap> {
        if self.index == 0 {
            return None;
        }
        self.index -= 1;
        self.entries.get(self.index).cloned()
    }

    /// Step forward one entry and return a copy of it, or `None` at the newest entry.
    pub fn redo(&mut self) -> Option<Bitmap> {
        if self.index + 1 >= self.entries.len() {
            return None;
        }
        self.index += 1;
        self.entries.get(self.index).cloned()
    }

    /// Forget everything and restart from `blank`.
    pub fn clear(&mut self, blank: &Bitmap) {
        self.entries.clear();
        self.entries.push_back(blank.clone());
        self.index = 0;
        self.total_memory = blank.memory_bytes();
    }

    pub fn can_undo(&self) -> bool {
        self.index > 0
    }

    pub fn can_redo(&self) -> bool {
        self.index + 1 < self.entries.len()
    }

    pub fn undo_count(&self) -> usize {
        self.index
    }

    pub fn redo_count(&self) -> usize {
        self.entries.len() - self.index - 1
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Get the current memory usage of the history (O(1) via cached total)
    pub fn memory_usage(&self) -> usize {
        self.total_memory
    }

    /// Prune old entries to stay within the count limit
    fn prune(&mut self) {
        if self.max_history_size == 0 {
            return;
        }
        while self.entries.len() > self.max_history_size && self.index > 0 {
            if let Some(removed) = self.entries.pop_front() {
                self.total_memory = self.total_memory.saturating_sub(removed.memory_bytes());
                self.index -= 1;
            }
        }
    }
}
