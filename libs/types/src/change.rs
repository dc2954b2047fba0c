//! Level size-change events

use serde::{Deserialize, Serialize};

use crate::side::Side;

/// A size transition detected while diffing one side.
///
/// Not yet stamped; becomes a [`ValueChange`] when recorded in history.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LevelChange {
    pub side: Side,
    pub price: String,
    pub old_size: String,
    pub new_size: String,
}

impl LevelChange {
    /// Whether the level disappeared.
    pub fn is_removal(&self) -> bool {
        self.new_size == "0"
    }

    /// Stamp the change with a Unix-millisecond timestamp.
    pub fn stamped(self, timestamp: i64) -> ValueChange {
        ValueChange {
            side: self.side,
            price: self.price,
            old_size: self.old_size,
            new_size: self.new_size,
            timestamp,
        }
    }
}

/// A recorded level size change, as shown in the recent-activity feed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValueChange {
    pub side: Side,
    pub price: String,
    pub old_size: String,
    pub new_size: String,
    /// Unix milliseconds when the change was recorded.
    pub timestamp: i64,
}

/// Current wall-clock time in Unix milliseconds.
pub fn now_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_value_change_wire_shape() {
        let change = LevelChange {
            side: Side::Bid,
            price: "99.5".to_string(),
            old_size: "3".to_string(),
            new_size: "0".to_string(),
        };
        assert!(change.is_removal());

        let json = serde_json::to_value(change.stamped(1_700_000_000_000)).unwrap();
        assert_eq!(json["side"], "bid");
        assert_eq!(json["oldSize"], "3");
        assert_eq!(json["newSize"], "0");
        assert_eq!(json["timestamp"], 1_700_000_000_000i64);
    }
}
