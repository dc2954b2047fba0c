//! Counters for the feed
//!
//! Written by the reconciliation task, readable from anywhere through an
//! `Arc<FeedMetrics>`. Relaxed atomics: counts are diagnostics, not
//! synchronization.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};

/// Outcome counters for every message that reached the engine.
#[derive(Debug, Default)]
pub struct FeedMetrics {
    messages_received: AtomicU64,
    messages_malformed: AtomicU64,
    updates_coalesced: AtomicU64,
    updates_stale: AtomicU64,
    updates_empty: AtomicU64,
    updates_published: AtomicU64,
    updates_failed: AtomicU64,
    changes_recorded: AtomicU64,
}

impl FeedMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_received(&self) {
        self.messages_received.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_malformed(&self) {
        self.messages_malformed.fetch_add(1, Ordering::Relaxed);
    }

    /// Updates discarded by the throttle gate in favour of newer ones.
    pub fn record_coalesced(&self, count: u64) {
        self.updates_coalesced.fetch_add(count, Ordering::Relaxed);
    }

    pub fn record_stale(&self) {
        self.updates_stale.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_empty(&self) {
        self.updates_empty.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_published(&self) {
        self.updates_published.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_failed(&self) {
        self.updates_failed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_changes(&self, count: usize) {
        self.changes_recorded.fetch_add(count as u64, Ordering::Relaxed);
    }

    pub fn messages_received(&self) -> u64 {
        self.messages_received.load(Ordering::Relaxed)
    }

    pub fn messages_malformed(&self) -> u64 {
        self.messages_malformed.load(Ordering::Relaxed)
    }

    pub fn updates_coalesced(&self) -> u64 {
        self.updates_coalesced.load(Ordering::Relaxed)
    }

    pub fn updates_stale(&self) -> u64 {
        self.updates_stale.load(Ordering::Relaxed)
    }

    pub fn updates_empty(&self) -> u64 {
        self.updates_empty.load(Ordering::Relaxed)
    }

    pub fn updates_published(&self) -> u64 {
        self.updates_published.load(Ordering::Relaxed)
    }

    pub fn updates_failed(&self) -> u64 {
        self.updates_failed.load(Ordering::Relaxed)
    }

    pub fn changes_recorded(&self) -> u64 {
        self.changes_recorded.load(Ordering::Relaxed)
    }

    /// Export all counters by name.
    pub fn export(&self) -> BTreeMap<String, u64> {
        let mut m = BTreeMap::new();
        m.insert("messages_received".to_string(), self.messages_received());
        m.insert("messages_malformed".to_string(), self.messages_malformed());
        m.insert("updates_coalesced".to_string(), self.updates_coalesced());
        m.insert("updates_stale".to_string(), self.updates_stale());
        m.insert("updates_empty".to_string(), self.updates_empty());
        m.insert("updates_published".to_string(), self.updates_published());
        m.insert("updates_failed".to_string(), self.updates_failed());
        m.insert("changes_recorded".to_string(), self.changes_recorded());
        m
    }
}
