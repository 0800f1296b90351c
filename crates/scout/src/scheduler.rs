//! Refresh pacing
//!
//! Pure decision logic for when an enumeration pass may start: at most one
//! pass in flight, periodic ticks only while active, explicit refreshes at
//! any time. Each started pass gets the next sequence number, which ends up
//! stamped on its snapshot. The session actor supplies the actual timer and
//! asks this state machine whether to act on each trigger.

use tracing::debug;

#[derive(Debug, Default)]
pub struct RefreshScheduler {
    active: bool,
    in_flight: bool,
    next_seq: u64,
}

impl RefreshScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Enter the active state; returns the sequence of the immediate pass to
    /// start, if no pass is already running.
    pub fn activate(&mut self) -> Option<u64> {
        self.active = true;
        self.claim_slot()
    }

    /// Leave the active state. Future ticks are ignored; an in-flight pass is
    /// not aborted and will still deliver its result.
    pub fn deactivate(&mut self) {
        self.active = false;
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn is_in_flight(&self) -> bool {
        self.in_flight
    }

    /// Explicit user refresh; works regardless of schedule phase. Returns the
    /// sequence of the pass to start, or `None` when an already-running pass
    /// will satisfy the request.
    pub fn request(&mut self) -> Option<u64> {
        self.claim_slot()
    }

    /// Periodic trigger; only acts while active.
    pub fn tick(&mut self) -> Option<u64> {
        if !self.active {
            return None;
        }
        self.claim_slot()
    }

    /// A pass finished (or could not be started after all).
    pub fn completed(&mut self) {
        self.in_flight = false;
    }

    fn claim_slot(&mut self) -> Option<u64> {
        if self.in_flight {
            debug!("enumeration already in flight, coalescing");
            return None;
        }
        self.in_flight = true;
        self.next_seq += 1;
        Some(self.next_seq)
    }
}
