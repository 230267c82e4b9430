// Reward package, reward record and reward flow entities

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::value_objects::{CurrencyKind, PackageId, Uid};

pub const REWARD_ITEM_TYPE_GOODS: i32 = 0;
pub const REWARD_ITEM_TYPE_CURRENCY: i32 = 1;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RewardPackage {
    pub id: PackageId,
    pub name: String,
    pub description: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// One line of a package. `item_type` is kept raw: package data is edited
/// outside the engine and may carry codes the engine does not understand.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RewardPackageItem {
    pub id: i64,
    pub package_id: PackageId,
    pub item_type: i32,
    pub item_id: i64,
    pub quantity: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewRewardPackageItem {
    pub item_type: i32,
    pub item_id: i64,
    pub quantity: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewRewardPackage {
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub items: Vec<NewRewardPackageItem>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RewardPackageDetail {
    #[serde(flatten)]
    pub package: RewardPackage,
    pub items: Vec<RewardPackageItem>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RewardRecord {
    pub id: i64,
    pub uid: Uid,
    pub package_id: PackageId,
    pub source: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RewardFlowKind {
    Item,
    Coin,
    Diamond,
}

impl RewardFlowKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            RewardFlowKind::Item => "item",
            RewardFlowKind::Coin => "coin",
            RewardFlowKind::Diamond => "diamond",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "item" => Some(RewardFlowKind::Item),
            "coin" => Some(RewardFlowKind::Coin),
            "diamond" => Some(RewardFlowKind::Diamond),
            _ => None,
        }
    }
}

impl From<CurrencyKind> for RewardFlowKind {
    fn from(kind: CurrencyKind) -> Self {
        match kind {
            CurrencyKind::Coin => RewardFlowKind::Coin,
            CurrencyKind::Diamond => RewardFlowKind::Diamond,
        }
    }
}

impl fmt::Display for RewardFlowKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Audit row for anything granted to a user: items and reward currency.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RewardFlow {
    pub id: i64,
    pub uid: Uid,
    pub kind: RewardFlowKind,
    pub item_id: i64,
    pub quantity: i64,
    pub source: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewRewardFlow {
    pub uid: Uid,
    pub kind: RewardFlowKind,
    pub item_id: i64,
    pub quantity: i64,
    pub source: String,
}
