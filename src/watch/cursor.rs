use tracing::warn;

use crate::Snapshot;

/// A change observed on the watched key.
///
/// Reads that do not change the key produce no event; callers receive
/// `None` from [`CursorTracker::observe`] instead.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WatchEvent {
    /// New value of the key, `None` once it is deleted
    Value(Option<String>),
}

/// Change-index cursor for one watched key.
///
/// `last_index` starts at 0 so the first blocking read returns immediately,
/// and never moves backwards. The tracker also remembers the last value it
/// reported; an index bump that carries the same value is not a change.
/// The key is considered absent before the first read, so a watch on a key
/// that does not exist stays silent until the key is written.
#[derive(Debug, Default)]
pub struct CursorTracker {
    last_index: u64,
    last_value: Option<String>,
}

impl CursorTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Index to pass as the wait condition of the next read.
    pub fn last_index(&self) -> u64 {
        self.last_index
    }

    pub fn last_value(&self) -> Option<&str> {
        self.last_value.as_deref()
    }

    /// Moves the cursor to `new_index` if it is strictly ahead.
    ///
    /// Returns `false` for a repeated index (long poll timed out) and for a
    /// regressed one; the cursor is left where it was in both cases.
    ///
    /// A reported index of 0 counts as 1: waiting on 0 never blocks.
    pub fn advance(
        &mut self,
        new_index: u64,
    ) -> bool {
        let new_index = new_index.max(1);
        if new_index > self.last_index {
            self.last_index = new_index;
            return true;
        }

        if new_index < self.last_index {
            warn!(
                last_index = self.last_index,
                new_index, "store returned an older change index, keeping cursor"
            );
        }
        false
    }

    /// Feeds one read result through the tracker.
    pub fn observe(
        &mut self,
        snapshot: Snapshot,
    ) -> Option<WatchEvent> {
        if !self.advance(snapshot.index) {
            return None;
        }

        if snapshot.value == self.last_value {
            return None;
        }

        self.last_value = snapshot.value.clone();
        Some(WatchEvent::Value(snapshot.value))
    }
}
