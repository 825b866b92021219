//! Recent activity feed entries

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::inventory::{InventoryConsumption, InventoryPurchase};
use super::remittance::Remittance;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ActivityKind {
    Remittance,
    Purchase,
    Consumption,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ActivityEntry {
    pub id: Uuid,
    pub kind: ActivityKind,
    pub title: String,
    pub date: DateTime<Utc>,
}

impl ActivityEntry {
    pub fn from_remittance(r: &Remittance) -> Self {
        Self {
            id: r.id,
            kind: ActivityKind::Remittance,
            title: format!("Sent INR {} ({})", r.amount_inr.normalize(), r.purpose),
            date: r.date,
        }
    }

    pub fn from_purchase(p: &InventoryPurchase, item_name: &str) -> Self {
        Self {
            id: p.id,
            kind: ActivityKind::Purchase,
            title: format!("Bought {} for {} RUB", item_name, p.price_rub.normalize()),
            date: p.date,
        }
    }

    pub fn from_consumption(c: &InventoryConsumption, item_name: &str) -> Self {
        Self {
            id: c.id,
            kind: ActivityKind::Consumption,
            title: format!("Used {} of {}", c.quantity_used.normalize(), item_name),
            date: c.date,
        }
    }
}

/// Newest first, capped at `limit`
pub fn merge_recent(mut entries: Vec<ActivityEntry>, limit: usize) -> Vec<ActivityEntry> {
    entries.sort_by(|a, b| b.date.cmp(&a.date));
    entries.truncate(limit);
    entries
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn entry(kind: ActivityKind, minutes_ago: i64) -> ActivityEntry {
        ActivityEntry {
            id: Uuid::new_v4(),
            kind,
            title: String::new(),
            date: Utc::now() - Duration::minutes(minutes_ago),
        }
    }

    #[test]
    fn test_merge_sorts_and_caps() {
        let entries = vec![
            entry(ActivityKind::Remittance, 30),
            entry(ActivityKind::Purchase, 5),
            entry(ActivityKind::Consumption, 10),
        ];
        let merged = merge_recent(entries, 2);
        assert_eq!(merged.len(), 2);
        assert_eq!(merged[0].kind, ActivityKind::Purchase);
        assert_eq!(merged[1].kind, ActivityKind::Consumption);
    }
}
