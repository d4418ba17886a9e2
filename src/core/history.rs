//! Undo/redo history over full collection snapshots.
//!
//! The timeline is a single linear list with a cursor. The entry at the cursor is
//! the current collection, entries before it can be undone to and entries after it
//! can be redone. Pushing a snapshot drops every redo entry; there is no branching.

use super::snapshot::Snapshot;
use std::collections::VecDeque;
use tracing::trace;

/// Default number of snapshots kept in the timeline.
pub const DEFAULT_HISTORY_LIMIT: usize = 50;

/// One point in the timeline.
#[derive(Debug, Clone, PartialEq)]
pub struct HistoryEntry {
    /// Monotonic revision assigned when the entry was pushed
    pub revision: u64,
    /// Collection at this point
    pub snapshot: Snapshot,
}

/// Bounded linear undo/redo log.
#[derive(Debug, Clone)]
pub struct HistoryManager {
    entries: VecDeque<HistoryEntry>,
    cursor: usize,
    max_entries: usize,
    next_revision: u64,
}

impl HistoryManager {
    /// Starts a timeline holding only `initial`. `max_entries` is at least 1.
    #[must_use]
    pub fn new(initial: Snapshot, max_entries: usize) -> Self {
        let mut entries = VecDeque::new();
        entries.push_back(HistoryEntry {
            revision: 0,
            snapshot: initial,
        });
        Self {
            entries,
            cursor: 0,
            max_entries: max_entries.max(1),
            next_revision: 1,
        }
    }

    /// Pushes `snapshot` after the cursor, discarding redo entries and evicting the
    /// oldest entries beyond the limit. Returns the revision of the new entry.
    pub fn add_to_history(&mut self, snapshot: Snapshot) -> u64 {
        self.entries.truncate(self.cursor + 1);

        let revision = self.next_revision;
        self.next_revision += 1;
        self.entries.push_back(HistoryEntry { revision, snapshot });

        while self.entries.len() > self.max_entries {
            self.entries.pop_front();
        }
        self.cursor = self.entries.len() - 1;

        trace!(revision, size = self.entries.len(), "history entry added");
        revision
    }

    /// Steps back one entry. At the earliest entry this is a no-op.
    pub fn undo(&mut self) -> Snapshot {
        if self.can_undo() {
            self.cursor -= 1;
        }
        self.current()
    }

    /// Steps forward one entry. At the latest entry this is a no-op.
    pub fn redo(&mut self) -> Snapshot {
        if self.can_redo() {
            self.cursor += 1;
        }
        self.current()
    }

    /// True when an earlier entry exists.
    #[must_use]
    pub const fn can_undo(&self) -> bool {
        self.cursor > 0
    }

    /// True when a later entry exists.
    #[must_use]
    pub fn can_redo(&self) -> bool {
        self.cursor + 1 < self.entries.len()
    }

    /// Number of retained entries.
    #[must_use]
    pub fn history_size(&self) -> usize {
        self.entries.len()
    }

    /// Configured maximum number of entries.
    #[must_use]
    pub const fn max_entries(&self) -> usize {
        self.max_entries
    }

    /// Snapshot at the cursor.
    #[must_use]
    pub fn current(&self) -> Snapshot {
        self.entries
            .get(self.cursor)
            .map(|entry| entry.snapshot.clone())
            .unwrap_or_default()
    }

    /// Revision of the entry at the cursor.
    #[must_use]
    pub fn current_revision(&self) -> u64 {
        self.entries
            .get(self.cursor)
            .map_or(0, |entry| entry.revision)
    }

    /// Drops the newest entry when it sits at the cursor and carries `revision`.
    ///
    /// Used to take back an optimistic entry whose mutation failed. Returns `false`
    /// and leaves the timeline alone if anything was pushed or undone since.
    pub fn retract(&mut self, revision: u64) -> bool {
        let at_tip = self.cursor + 1 == self.entries.len();
        let matches = self
            .entries
            .back()
            .is_some_and(|entry| entry.revision == revision);

        if at_tip && matches && self.entries.len() > 1 {
            self.entries.pop_back();
            self.cursor -= 1;
            trace!(revision, "history entry retracted");
            true
        } else {
            false
        }
    }

    /// Replaces the whole timeline with a single entry.
    pub fn reset(&mut self, snapshot: Snapshot) {
        let revision = self.next_revision;
        self.next_revision += 1;
        self.entries.clear();
        self.entries.push_back(HistoryEntry { revision, snapshot });
        self.cursor = 0;
    }
}

impl Default for HistoryManager {
    fn default() -> Self {
        Self::new(Snapshot::default(), DEFAULT_HISTORY_LIMIT)
    }
}
