//! Feed configuration
//!
//! Named options for the bounds and timings of the engine. Every field has a
//! default, so a config file only needs to name what it overrides.

use std::path::Path;
use std::time::Duration;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Configuration for the order book feed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FeedConfig {
    /// Display label for the trading pair (logging only).
    pub symbol: String,
    /// Maximum displayed levels per side.
    pub max_depth: usize,
    /// Maximum number of change events kept in history.
    pub max_changes: usize,
    /// Minimum spacing between reconciliation passes, in milliseconds.
    pub throttle_interval_ms: u64,
    /// Size differences at or below this are not reported as changes.
    pub change_epsilon: Decimal,
    /// Capacity of the inbound message channel.
    pub channel_capacity: usize,
}

impl FeedConfig {
    /// Throttle interval as a `Duration`.
    pub fn throttle_interval(&self) -> Duration {
        Duration::from_millis(self.throttle_interval_ms)
    }

    /// Load a configuration from a JSON file.
    pub fn from_json_file(path: &Path) -> anyhow::Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        let config = serde_json::from_str(&raw)?;
        Ok(config)
    }
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            symbol: "SOL-USD".to_string(),
            max_depth: 25,
            max_changes: 50,
            throttle_interval_ms: 500,
            change_epsilon: Decimal::new(1, 4),
            channel_capacity: 1024,
        }
    }
}
