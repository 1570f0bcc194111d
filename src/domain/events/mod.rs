//! Activity log entries
//!
//! Append-only audit trail of mutating catalog operations. Entries are
//! persisted alongside items and sales and never mutated or deleted.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ActivityKind {
    ItemAdded,
    ItemUpdated,
    ItemRemoved,
    StockUpdated,
    SaleCompleted,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ActivityEntry {
    pub id: Uuid,
    pub timestamp: DateTime<Utc>,
    pub kind: ActivityKind,
    pub description: String,
    pub details: serde_json::Value,
}

impl ActivityEntry {
    pub fn new(kind: ActivityKind, description: impl Into<String>, details: serde_json::Value) -> Self {
        Self {
            id: Uuid::new_v4(),
            timestamp: Utc::now(),
            kind,
            description: description.into(),
            details,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_serializes_screaming_snake() {
        let tag = serde_json::to_string(&ActivityKind::SaleCompleted).unwrap();
        assert_eq!(tag, "\"SALE_COMPLETED\"");
        let tag = serde_json::to_string(&ActivityKind::ItemAdded).unwrap();
        assert_eq!(tag, "\"ITEM_ADDED\"");
    }
}
