// Wallet and currency-flow entities

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::value_objects::{CurrencyKind, ItemId, Uid};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Wallet {
    pub id: i64,
    pub uid: Uid,
    pub kind: CurrencyKind,
    pub balance: i64,
    pub updated_at: DateTime<Utc>,
}

/// Append-only audit row, one per wallet balance change.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CurrencyFlow {
    pub id: i64,
    pub uid: Uid,
    pub kind: CurrencyKind,
    pub amount: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub store_item_id: Option<ItemId>,
    pub description: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewCurrencyFlow {
    pub uid: Uid,
    pub kind: CurrencyKind,
    pub amount: i64,
    pub store_item_id: Option<ItemId>,
    pub description: String,
}
