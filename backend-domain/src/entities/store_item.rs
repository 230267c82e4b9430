// Store item entity

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::value_objects::{CurrencyKind, ItemCategory, ItemId, ItemStatus};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreItem {
    pub id: ItemId,
    pub name: String,
    pub price: i64,
    pub stock: i64,
    pub cost_kind: CurrencyKind,
    pub status: ItemStatus,
    pub category: ItemCategory,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl StoreItem {
    pub fn is_on_sale(&self) -> bool {
        self.status == ItemStatus::Active
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewStoreItem {
    pub name: String,
    pub price: i64,
    pub stock: i64,
    pub cost_kind: CurrencyKind,
    #[serde(default = "default_status")]
    pub status: ItemStatus,
    #[serde(default = "default_category")]
    pub category: ItemCategory,
}

fn default_status() -> ItemStatus {
    ItemStatus::Active
}

fn default_category() -> ItemCategory {
    ItemCategory::Normal
}
