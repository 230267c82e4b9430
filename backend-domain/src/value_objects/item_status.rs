// Store item status and category

use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::errors::EconomyError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ItemStatus {
    Active,
    Inactive,
}

impl ItemStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ItemStatus::Active => "active",
            ItemStatus::Inactive => "inactive",
        }
    }
}

impl FromStr for ItemStatus {
    type Err = EconomyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "active" => Ok(ItemStatus::Active),
            "inactive" => Ok(ItemStatus::Inactive),
            other => Err(EconomyError::InvalidInput(format!(
                "unknown item status '{}'",
                other
            ))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ItemCategory {
    Normal,
    Clothes,
    Weapon,
    Artifact,
    Consumable,
}

impl ItemCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            ItemCategory::Normal => "normal",
            ItemCategory::Clothes => "clothes",
            ItemCategory::Weapon => "weapon",
            ItemCategory::Artifact => "artifact",
            ItemCategory::Consumable => "consumable",
        }
    }
}

impl FromStr for ItemCategory {
    type Err = EconomyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "normal" => Ok(ItemCategory::Normal),
            "clothes" => Ok(ItemCategory::Clothes),
            "weapon" => Ok(ItemCategory::Weapon),
            "artifact" => Ok(ItemCategory::Artifact),
            "consumable" => Ok(ItemCategory::Consumable),
            other => Err(EconomyError::InvalidInput(format!(
                "unknown item category '{}'",
                other
            ))),
        }
    }
}
