//! Bounded history of level changes
//!
//! Most recent first. Recording past capacity evicts the oldest entries.

use std::collections::VecDeque;

use types::change::{LevelChange, ValueChange};

/// Rolling, newest-first log of recorded level changes.
#[derive(Debug, Clone)]
pub struct ChangeHistory {
    /// Newest at the front.
    entries: VecDeque<ValueChange>,
    /// Maximum number of entries kept.
    capacity: usize,
    /// Total changes recorded since creation, including evicted ones.
    recorded: u64,
}

impl ChangeHistory {
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: VecDeque::with_capacity(capacity),
            capacity,
            recorded: 0,
        }
    }

    /// Record a change stamped with `timestamp` (Unix millis).
    pub fn record(&mut self, change: LevelChange, timestamp: i64) {
        self.entries.push_front(change.stamped(timestamp));
        self.entries.truncate(self.capacity);
        self.recorded += 1;
    }

    /// Record a batch of changes in order, all with the same timestamp.
    ///
    /// The last change of the batch ends up newest.
    pub fn record_all(&mut self, changes: impl IntoIterator<Item = LevelChange>, timestamp: i64) {
        for change in changes {
            self.record(change, timestamp);
        }
    }

    /// Copy of the current history, newest first.
    pub fn snapshot(&self) -> Vec<ValueChange> {
        self.entries.iter().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Total changes recorded since creation.
    pub fn recorded(&self) -> u64 {
        self.recorded
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use types::side::Side;

    fn change(price: usize) -> LevelChange {
        LevelChange {
            side: Side::Ask,
            price: price.to_string(),
            old_size: "1".to_string(),
            new_size: "2".to_string(),
        }
    }

    #[test]
    fn test_newest_first() {
        let mut history = ChangeHistory::new(50);
        history.record(change(1), 1_000);
        history.record(change(2), 2_000);

        let snapshot = history.snapshot();
        assert_eq!(snapshot[0].price, "2");
        assert_eq!(snapshot[0].timestamp, 2_000);
        assert_eq!(snapshot[1].price, "1");
    }

    #[test]
    fn test_capacity_evicts_oldest() {
        let mut history = ChangeHistory::new(50);
        history.record_all((0..60).map(change), 1_000);

        assert_eq!(history.len(), 50);
        assert_eq!(history.recorded(), 60);
        let snapshot = history.snapshot();
        assert_eq!(snapshot[0].price, "59");
        assert_eq!(snapshot[49].price, "10");
    }

    #[test]
    fn test_empty() {
        let history = ChangeHistory::new(5);
        assert!(history.is_empty());
        assert!(history.snapshot().is_empty());
        assert_eq!(history.recorded(), 0);
    }
}
