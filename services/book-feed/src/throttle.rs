//! Throttle and coalescing gate
//!
//! Limits reconciliation passes to one per interval. An update arriving
//! while the gate is closed is parked in a single pending slot, replacing
//! any older parked update. It is released as soon as the interval since
//! the last admission has elapsed ([`ThrottleGate::next_release`]). So at
//! most one pass runs per interval and the newest update is applied at
//! most one interval after it arrives.
//!
//! The gate has no timers of its own. Callers pass the current `Instant`,
//! which keeps the coalescing rules testable without a runtime.

use std::time::Duration;

use tokio::time::Instant;
use tracing::debug;

use crate::events::BookUpdate;

/// What the gate did with an offered update.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Admission {
    /// Process this update now.
    Ready(BookUpdate),
    /// Update parked in the pending slot until the gate reopens.
    Parked {
        /// An older parked update was discarded in its favour.
        replaced: bool,
    },
    /// A newer update is already parked; this one was discarded.
    Superseded,
}

/// Depth-one coalescing queue with a minimum spacing between releases.
#[derive(Debug)]
pub struct ThrottleGate {
    interval: Duration,
    last_admitted: Option<Instant>,
    pending: Option<BookUpdate>,
    coalesced: u64,
}

impl ThrottleGate {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            last_admitted: None,
            pending: None,
            coalesced: 0,
        }
    }

    /// Offer an inbound update at time `now`.
    pub fn offer(&mut self, update: BookUpdate, now: Instant) -> Admission {
        if self.is_open(now) {
            // Of the parked and arriving updates, only the newer one runs.
            let admitted = match self.pending.take() {
                Some(parked) => {
                    self.coalesced += 1;
                    debug!(
                        parked = parked.sequence,
                        received = update.sequence,
                        "Gate open with an update still parked"
                    );
                    if parked.sequence > update.sequence {
                        parked
                    } else {
                        update
                    }
                }
                None => update,
            };
            self.last_admitted = Some(now);
            return Admission::Ready(admitted);
        }

        match &self.pending {
            Some(parked) if parked.sequence >= update.sequence => {
                self.coalesced += 1;
                debug!(
                    parked = parked.sequence,
                    received = update.sequence,
                    "Discarding update older than parked update"
                );
                Admission::Superseded
            }
            _ => {
                let replaced = self.pending.replace(update).is_some();
                if replaced {
                    self.coalesced += 1;
                }
                Admission::Parked { replaced }
            }
        }
    }

    /// Release the parked update if the interval has elapsed.
    ///
    /// Called once [`ThrottleGate::next_release`] has passed.
    pub fn poll_pending(&mut self, now: Instant) -> Option<BookUpdate> {
        if self.pending.is_none() || !self.is_open(now) {
            return None;
        }
        self.last_admitted = Some(now);
        self.pending.take()
    }

    /// Take the parked update regardless of timing (used on shutdown).
    pub fn take_pending(&mut self) -> Option<BookUpdate> {
        self.pending.take()
    }

    /// Whether an update released at `now` would respect the interval.
    pub fn is_open(&self, now: Instant) -> bool {
        match self.last_admitted {
            None => true,
            Some(last) => now.saturating_duration_since(last) >= self.interval,
        }
    }

    /// Earliest instant the parked update may be released, if one is
    /// parked. Never later than one interval after it arrived.
    pub fn next_release(&self) -> Option<Instant> {
        // A parked update implies an earlier admission closed the gate.
        self.pending
            .as_ref()
            .and(self.last_admitted)
            .map(|last| last + self.interval)
    }

    /// Sequence of the parked update, if any.
    pub fn pending_sequence(&self) -> Option<u64> {
        self.pending.as_ref().map(|update| update.sequence)
    }

    /// Updates discarded in favour of a newer one since creation.
    pub fn coalesced(&self) -> u64 {
        self.coalesced
    }
}
