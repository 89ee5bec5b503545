//! Linear undo/redo history of full snapshots.
//!
//! The history holds at most `cap` snapshots and a cursor pointing at the
//! snapshot that matches the current state. Pushing while the cursor is not
//! at the end discards the redo branch; pushing past the cap evicts the
//! oldest snapshot.

#[cfg(test)]
#[path = "history_test.rs"]
mod history_test;

use std::collections::VecDeque;

use crate::consts::HISTORY_CAP;

#[derive(Debug, Clone)]
pub struct History<T> {
    entries: VecDeque<T>,
    cursor: usize,
    cap: usize,
}

impl<T: Clone> History<T> {
    /// History seeded with `initial` as its only entry, capped at [`HISTORY_CAP`].
    #[must_use]
    pub fn new(initial: T) -> Self {
        Self::with_cap(initial, HISTORY_CAP)
    }

    /// History seeded with `initial`, keeping at most `cap` entries (minimum 1).
    #[must_use]
    pub fn with_cap(initial: T, cap: usize) -> Self {
        let mut entries = VecDeque::with_capacity(cap.max(1));
        entries.push_back(initial);
        Self { entries, cursor: 0, cap: cap.max(1) }
    }

    /// Record a committed state.
    pub fn push(&mut self, snapshot: T) {
        self.entries.truncate(self.cursor + 1);
        self.entries.push_back(snapshot);
        while self.entries.len() > self.cap {
            self.entries.pop_front();
        }
        self.cursor = self.entries.len() - 1;
    }

    /// Step back one entry and return it, or `None` at the oldest entry.
    pub fn undo(&mut self) -> Option<&T> {
        if self.cursor == 0 {
            return None;
        }
        self.cursor -= 1;
        self.entries.get(self.cursor)
    }

    /// Step forward one entry and return it, or `None` at the newest entry.
    pub fn redo(&mut self) -> Option<&T> {
        if self.cursor + 1 >= self.entries.len() {
            return None;
        }
        self.cursor += 1;
        self.entries.get(self.cursor)
    }

    /// Drop every entry and start over from `initial`.
    pub fn reset(&mut self, initial: T) {
        self.entries.clear();
        self.entries.push_back(initial);
        self.cursor = 0;
    }

    #[must_use]
    pub fn current(&self) -> Option<&T> {
        self.entries.get(self.cursor)
    }

    #[must_use]
    pub fn can_undo(&self) -> bool {
        self.cursor > 0
    }

    #[must_use]
    pub fn can_redo(&self) -> bool {
        self.cursor + 1 < self.entries.len()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    #[must_use]
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    #[must_use]
    pub fn cap(&self) -> usize {
        self.cap
    }
}
