//! Snapshot publication
//!
//! The publisher owns the one visible `EntrySnapshot` and is written only
//! from the session actor, so readers never observe a half-replaced list.
//! Each accepted snapshot is announced to the single presentation listener
//! exactly once per refresh cycle, together with its entry count.

use probe::EntrySnapshot;
use tracing::{debug, warn};

/// The presentation layer's view of the device list.
pub trait SnapshotListener: Send {
    fn on_snapshot_changed(&self, snapshot: &EntrySnapshot, count: usize);
}

pub struct ResultPublisher {
    current: EntrySnapshot,
    listener: Box<dyn SnapshotListener>,
}

impl ResultPublisher {
    pub fn new(listener: Box<dyn SnapshotListener>) -> Self {
        Self {
            // Sequence 0 so any real pass (stamped from 1) replaces it.
            current: EntrySnapshot::empty(0),
            listener,
        }
    }

    /// Atomically replace the visible snapshot and notify the listener.
    ///
    /// A snapshot stamped older than the visible one is the result of an
    /// enumeration pass that was overtaken; it is dropped and `false` is
    /// returned so the old list stays in place.
    pub fn publish(&mut self, snapshot: EntrySnapshot) -> bool {
        if snapshot.seq() < self.current.seq() {
            warn!(
                "dropping stale enumeration result {} (showing {})",
                snapshot.seq(),
                self.current.seq()
            );
            return false;
        }

        debug!(
            "publishing snapshot {} with {} entries",
            snapshot.seq(),
            snapshot.len()
        );
        self.current = snapshot;
        self.listener
            .on_snapshot_changed(&self.current, self.current.len());
        true
    }

    /// The currently visible snapshot.
    pub fn current(&self) -> &EntrySnapshot {
        &self.current
    }
}
