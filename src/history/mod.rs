//! Snapshot timeline for time travel.
//!
//! When time travel is enabled, the machine records a snapshot after
//! `start` and after every step that changes configuration or context.
//! The timeline owns the snapshots and a cursor; restoring runtime state
//! from a snapshot is the machine's job.

use crate::snapshot::Snapshot;

/// An append-only snapshot log with a movable cursor.
///
/// Sending an event while the cursor is not at the end discards everything
/// strictly after the cursor first (branching): the rewound-to snapshot
/// becomes the new tail and history diverges from there.
#[derive(Clone, Debug, Default)]
pub struct Timeline {
    snapshots: Vec<Snapshot>,
    cursor: usize,
}

impl Timeline {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.snapshots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.snapshots.is_empty()
    }

    /// Position of the cursor, 0-based. 0 for an empty timeline.
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    /// All recorded snapshots, oldest first.
    pub fn snapshots(&self) -> &[Snapshot] {
        &self.snapshots
    }

    /// Append a snapshot and move the cursor onto it.
    pub(crate) fn record(&mut self, snapshot: Snapshot) {
        self.snapshots.push(snapshot);
        self.cursor = self.snapshots.len() - 1;
    }

    /// Discard everything strictly after the cursor.
    pub(crate) fn branch(&mut self) {
        if !self.snapshots.is_empty() {
            self.snapshots.truncate(self.cursor + 1);
        }
    }

    /// Move back `n` snapshots (clamped) and return the one at the cursor.
    pub(crate) fn rewind(&mut self, n: usize) -> Option<&Snapshot> {
        if self.snapshots.is_empty() {
            return None;
        }
        self.cursor -= n.min(self.cursor);
        self.snapshots.get(self.cursor)
    }

    /// Move forward `n` snapshots (clamped) and return the one at the cursor.
    pub(crate) fn forward(&mut self, n: usize) -> Option<&Snapshot> {
        if self.snapshots.is_empty() {
            return None;
        }
        let room = self.snapshots.len() - 1 - self.cursor;
        self.cursor += n.min(room);
        self.snapshots.get(self.cursor)
    }
}
