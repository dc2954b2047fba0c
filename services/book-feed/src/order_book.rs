//! Reconciliation state machine
//!
//! Owns the authoritative sequence number, the full level map of each side
//! and the change history, and turns accepted updates into a new published
//! [`OrderBookState`].
//!
//! An update goes through:
//! - sequence gate: `sequence <= current` is stale and changes nothing
//! - diff of both sides against their previous level maps
//! - if both ladders come out empty: maps and change history are committed
//!   but nothing is published and the sequence does not move
//! - otherwise totals, ladder checks, then a whole new state replaces the
//!   published one
//!
//! A pass that fails commits nothing, change events included; the previous
//! state stays visible and the update is discarded as a whole.

use std::sync::Arc;

use tracing::{debug, error, info};
use types::book::{BookView, OrderBookState};
use types::change::{now_millis, ValueChange};
use types::errors::BookError;
use types::level::{LevelMap, PriceLevel};
use types::numeric::is_positive;
use types::side::Side;

use crate::config::FeedConfig;
use crate::delta::{diff_side, DiffParams, SideDiff};
use crate::events::BookUpdate;
use crate::history::ChangeHistory;
use crate::metrics::FeedMetrics;
use crate::totals::with_totals;

/// What happened to an update handed to the state machine.
#[derive(Debug, Clone, PartialEq)]
pub enum ApplyOutcome {
    /// A new state was published at the update's sequence.
    Published,
    /// The update was not newer than the current sequence.
    Stale { current: u64 },
    /// Both ladders came out empty; state left unpublished.
    Empty,
    /// Processing failed; nothing was committed.
    Failed(BookError),
}

/// Single-owner reconciliation engine for one book.
#[derive(Debug)]
pub struct BookReconciler {
    symbol: String,
    params: DiffParams,
    sequence: u64,
    bid_map: LevelMap,
    ask_map: LevelMap,
    published: Arc<OrderBookState>,
    history: ChangeHistory,
    metrics: Arc<FeedMetrics>,
}

impl BookReconciler {
    pub fn new(config: &FeedConfig, metrics: Arc<FeedMetrics>) -> Self {
        info!(
            symbol = %config.symbol,
            max_depth = config.max_depth,
            max_changes = config.max_changes,
            epsilon = %config.change_epsilon,
            "BookReconciler initialized"
        );

        Self {
            symbol: config.symbol.clone(),
            params: DiffParams::from(config),
            sequence: 0,
            bid_map: LevelMap::new(),
            ask_map: LevelMap::new(),
            published: Arc::new(OrderBookState::empty()),
            history: ChangeHistory::new(config.max_changes),
            metrics,
        }
    }

    /// Create a reconciler with default configuration.
    pub fn with_defaults() -> Self {
        Self::new(&FeedConfig::default(), Arc::new(FeedMetrics::new()))
    }

    /// Apply an update, stamping detected changes with the current time.
    pub fn apply_update(&mut self, update: &BookUpdate) -> ApplyOutcome {
        self.apply_update_at(update, now_millis())
    }

    /// Apply an update, stamping detected changes with `timestamp`
    /// (Unix millis).
    pub fn apply_update_at(&mut self, update: &BookUpdate, timestamp: i64) -> ApplyOutcome {
        if update.sequence <= self.sequence {
            debug!(
                symbol = %self.symbol,
                current = self.sequence,
                received = update.sequence,
                "Ignoring stale update"
            );
            self.metrics.record_stale();
            return ApplyOutcome::Stale {
                current: self.sequence,
            };
        }

        let bids = diff_side(Side::Bid, update.side(Side::Bid), &self.bid_map, self.params);
        let asks = diff_side(Side::Ask, update.side(Side::Ask), &self.ask_map, self.params);

        if bids.is_empty() && asks.is_empty() {
            self.commit(bids, asks, timestamp);
            debug!(
                symbol = %self.symbol,
                sequence = update.sequence,
                "Update left both ladders empty; state not published"
            );
            self.metrics.record_empty();
            return ApplyOutcome::Empty;
        }

        match self.build_state(&bids, &asks, update.sequence) {
            Ok(state) => {
                let removals = bids
                    .changes
                    .iter()
                    .chain(&asks.changes)
                    .filter(|change| change.is_removal())
                    .count();
                debug!(
                    symbol = %self.symbol,
                    sequence = update.sequence,
                    bid_levels = state.bids.len(),
                    ask_levels = state.asks.len(),
                    changes = bids.changes.len() + asks.changes.len(),
                    removals,
                    "Publishing book state"
                );
                self.commit(bids, asks, timestamp);
                self.sequence = update.sequence;
                self.published = Arc::new(state);
                self.metrics.record_published();
                ApplyOutcome::Published
            }
            Err(err) => {
                error!(
                    symbol = %self.symbol,
                    sequence = update.sequence,
                    error = %err,
                    "Discarding update; previous state retained"
                );
                self.metrics.record_failed();
                ApplyOutcome::Failed(err)
            }
        }
    }

    /// Latest published state.
    pub fn state(&self) -> Arc<OrderBookState> {
        Arc::clone(&self.published)
    }

    /// Recent changes, newest first.
    pub fn changes(&self) -> Vec<ValueChange> {
        self.history.snapshot()
    }

    /// Published state and change history together.
    pub fn view(&self) -> BookView {
        BookView {
            book: self.published.as_ref().clone(),
            changes: self.history.snapshot(),
        }
    }

    /// Sequence of the latest published state.
    pub fn sequence(&self) -> u64 {
        self.sequence
    }

    /// Full level map retained for one side.
    pub fn level_map(&self, side: Side) -> &LevelMap {
        match side {
            Side::Bid => &self.bid_map,
            Side::Ask => &self.ask_map,
        }
    }

    fn build_state(
        &self,
        bids: &SideDiff,
        asks: &SideDiff,
        sequence: u64,
    ) -> Result<OrderBookState, BookError> {
        let bids = with_totals(bids.levels.clone())?;
        let asks = with_totals(asks.levels.clone())?;
        verify_ladder(Side::Bid, &bids, self.params.max_depth)?;
        verify_ladder(Side::Ask, &asks, self.params.max_depth)?;

        Ok(OrderBookState {
            bids,
            asks,
            sequence,
        })
    }

    /// Keep both sides' new level maps and record their changes.
    fn commit(&mut self, bids: SideDiff, asks: SideDiff, timestamp: i64) {
        let change_count = bids.changes.len() + asks.changes.len();
        self.history
            .record_all(bids.changes.into_iter().chain(asks.changes), timestamp);
        self.metrics.record_changes(change_count);
        if change_count > 0 {
            debug!(
                symbol = %self.symbol,
                changes = change_count,
                retained = self.history.len(),
                recorded_total = self.history.recorded(),
                "Recorded level changes"
            );
        }

        self.bid_map = bids.level_map;
        self.ask_map = asks.level_map;
    }
}

/// Check a ladder is bounded, strictly best-first and has only positive
/// sizes.
fn verify_ladder(side: Side, levels: &[PriceLevel], max_depth: usize) -> Result<(), BookError> {
    let violation = |reason: String| BookError::LadderInvariant {
        side: side.to_string(),
        reason,
    };

    if levels.len() > max_depth {
        return Err(violation(format!(
            "depth {} exceeds {}",
            levels.len(),
            max_depth
        )));
    }

    if let Some(level) = levels.iter().find(|level| !is_positive(&level.size)) {
        return Err(violation(format!(
            "non-positive size {} at {}",
            level.size, level.price
        )));
    }

    for pair in levels.windows(2) {
        if side.ladder_order(&pair[0].price, &pair[1].price) != std::cmp::Ordering::Less {
            return Err(violation(format!(
                "{} is not ahead of {}",
                pair[0].price, pair[1].price
            )));
        }
    }

    Ok(())
}
