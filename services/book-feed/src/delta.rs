//! Level diff processor
//!
//! Compares one side's incoming batch against the level map from the
//! previous accepted batch, reports level size changes, and builds the
//! bounded best-first ladder for display.
//!
//! Diff flow for one side:
//! 1. Build the new level map from the batch (last pair per price wins)
//! 2. Report prices in both maps whose size moved by more than epsilon
//! 3. Report prices that vanished from the batch as a change to `"0"`
//! 4. The new map replaces the previous one wholesale
//! 5. Keep strictly positive sizes, sort best-first, truncate to depth
//!
//! Nothing here mutates the previous map; the caller commits the returned
//! map only once both sides have been diffed.

use rust_decimal::Decimal;
use types::change::LevelChange;
use types::level::{LevelMap, PriceLevel};
use types::numeric::{differs_by_more_than, is_positive};
use types::side::Side;

use crate::config::FeedConfig;
use crate::events::RawLevel;

/// Bounds applied while diffing a side.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DiffParams {
    /// Maximum ladder length.
    pub max_depth: usize,
    /// Smallest size movement that counts as a change (exclusive).
    pub epsilon: Decimal,
}

impl From<&FeedConfig> for DiffParams {
    fn from(config: &FeedConfig) -> Self {
        Self {
            max_depth: config.max_depth,
            epsilon: config.change_epsilon,
        }
    }
}

impl Default for DiffParams {
    fn default() -> Self {
        Self::from(&FeedConfig::default())
    }
}

/// Result of diffing one side.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SideDiff {
    /// Best-first, depth-bounded ladder; totals not yet computed.
    pub levels: Vec<PriceLevel>,
    /// Changes relative to the previous level map.
    pub changes: Vec<LevelChange>,
    /// Level map to keep for the next diff.
    pub level_map: LevelMap,
}

impl SideDiff {
    /// Whether the batch left nothing to display on this side.
    pub fn is_empty(&self) -> bool {
        self.levels.is_empty()
    }
}

/// Diff one side's batch against its previous level map.
///
/// Changes are reported in price-text order: moved levels first, then
/// removed levels.
pub fn diff_side(
    side: Side,
    incoming: &[RawLevel],
    previous: &LevelMap,
    params: DiffParams,
) -> SideDiff {
    let level_map: LevelMap = incoming
        .iter()
        .map(|level| (level.price.clone(), level.size.clone()))
        .collect();

    let mut changes = Vec::new();

    for (price, new_size) in &level_map {
        if let Some(old_size) = previous.get(price) {
            if old_size != new_size && differs_by_more_than(old_size, new_size, params.epsilon) {
                changes.push(LevelChange {
                    side,
                    price: price.clone(),
                    old_size: old_size.clone(),
                    new_size: new_size.clone(),
                });
            }
        }
    }

    for (price, old_size) in previous {
        if !level_map.contains_key(price) && differs_by_more_than(old_size, "0", params.epsilon) {
            changes.push(LevelChange {
                side,
                price: price.clone(),
                old_size: old_size.clone(),
                new_size: "0".to_string(),
            });
        }
    }

    let mut levels: Vec<PriceLevel> = level_map
        .iter()
        .filter(|(_, size)| is_positive(size))
        .map(|(price, size)| PriceLevel::new(price.clone(), size.clone()))
        .collect();
    levels.sort_by(|a, b| side.ladder_order(&a.price, &b.price));
    levels.truncate(params.max_depth);

    SideDiff {
        levels,
        changes,
        level_map,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn batch(pairs: &[(&str, &str)]) -> Vec<RawLevel> {
        pairs.iter().map(|(p, s)| RawLevel::new(*p, *s)).collect()
    }

    fn map(pairs: &[(&str, &str)]) -> LevelMap {
        pairs
            .iter()
            .map(|(p, s)| (p.to_string(), s.to_string()))
            .collect()
    }

    fn prices(levels: &[PriceLevel]) -> Vec<&str> {
        levels.iter().map(|l| l.price.as_str()).collect()
    }

    #[test]
    fn test_first_batch_has_no_changes() {
        let diff = diff_side(
            Side::Bid,
            &batch(&[("100.0", "5"), ("99.5", "3")]),
            &LevelMap::new(),
            DiffParams::default(),
        );
        assert!(diff.changes.is_empty());
        assert_eq!(prices(&diff.levels), vec!["100.0", "99.5"]);
        assert_eq!(diff.level_map.len(), 2);
    }

    #[test]
    fn test_zero_size_removal_reported() {
        let previous = map(&[("100.0", "5"), ("99.5", "3")]);
        let diff = diff_side(
            Side::Bid,
            &batch(&[("100.0", "5"), ("99.5", "0"), ("99.0", "2")]),
            &previous,
            DiffParams::default(),
        );

        assert_eq!(prices(&diff.levels), vec!["100.0", "99.0"]);
        assert_eq!(
            diff.changes,
            vec![LevelChange {
                side: Side::Bid,
                price: "99.5".to_string(),
                old_size: "3".to_string(),
                new_size: "0".to_string(),
            }]
        );
        // Zero-size entries stay in the map so the next diff sees them.
        assert_eq!(diff.level_map.get("99.5").map(String::as_str), Some("0"));
    }

    #[test]
    fn test_omitted_price_reported_as_removed() {
        let previous = map(&[("101", "1.5"), ("102", "2")]);
        let diff = diff_side(
            Side::Ask,
            &batch(&[("102", "2")]),
            &previous,
            DiffParams::default(),
        );

        assert_eq!(diff.changes.len(), 1);
        assert_eq!(diff.changes[0].price, "101");
        assert_eq!(diff.changes[0].new_size, "0");
        assert!(!diff.level_map.contains_key("101"));
    }

    #[test]
    fn test_epsilon_suppresses_small_moves() {
        let previous = map(&[("100", "1.0"), ("101", "1.0")]);
        let diff = diff_side(
            Side::Ask,
            &batch(&[("100", "1.0001"), ("101", "1.0002")]),
            &previous,
            DiffParams::default(),
        );
        assert_eq!(diff.changes.len(), 1);
        assert_eq!(diff.changes[0].price, "101");
    }

    #[test]
    fn test_textual_size_change_without_value_change() {
        let previous = map(&[("100", "5")]);
        let diff = diff_side(Side::Bid, &batch(&[("100", "5.00")]), &previous, DiffParams::default());
        assert!(diff.changes.is_empty());
    }

    #[test]
    fn test_vanished_zero_level_not_reported_twice() {
        let previous = map(&[("99.5", "0")]);
        let diff = diff_side(Side::Bid, &batch(&[("100", "1")]), &previous, DiffParams::default());
        assert!(diff.changes.is_empty());
    }

    #[test]
    fn test_duplicate_price_last_wins() {
        let diff = diff_side(
            Side::Bid,
            &batch(&[("100", "1"), ("100", "4")]),
            &LevelMap::new(),
            DiffParams::default(),
        );
        assert_eq!(diff.levels.len(), 1);
        assert_eq!(diff.levels[0].size, "4");
    }

    #[test]
    fn test_sort_and_truncate() {
        let pairs: Vec<(String, String)> =
            (1..=30).map(|i| (format!("{}.5", i), "1".to_string())).collect();
        let incoming: Vec<RawLevel> = pairs.iter().map(|(p, s)| RawLevel::new(p, s)).collect();

        let bids = diff_side(Side::Bid, &incoming, &LevelMap::new(), DiffParams::default());
        assert_eq!(bids.levels.len(), 25);
        assert_eq!(bids.levels[0].price, "30.5");
        assert_eq!(bids.levels[24].price, "6.5");

        let asks = diff_side(Side::Ask, &incoming, &LevelMap::new(), DiffParams::default());
        assert_eq!(asks.levels.len(), 25);
        assert_eq!(asks.levels[0].price, "1.5");
        assert_eq!(asks.levels[24].price, "25.5");
        // The full map is retained beyond the displayed depth.
        assert_eq!(asks.level_map.len(), 30);
    }

    #[test]
    fn test_negative_and_malformed_sizes_filtered() {
        let diff = diff_side(
            Side::Ask,
            &batch(&[("100", "-1"), ("101", "abc"), ("102", "0.5")]),
            &LevelMap::new(),
            DiffParams::default(),
        );
        assert_eq!(prices(&diff.levels), vec!["102"]);
    }
}
