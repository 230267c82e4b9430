// Backpack (inventory) entities

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::value_objects::{ItemId, Uid};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BackpackEntry {
    pub id: i64,
    pub uid: Uid,
    pub item_id: ItemId,
    pub quantity: i64,
}

/// Backpack row joined with the store item's display name.
#[derive(Debug, Clone)]
pub struct BackpackLine {
    pub item_id: ItemId,
    pub name: String,
    pub quantity: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BackpackSlot {
    pub quantity: i64,
    pub name: String,
}

/// Read view of everything a user holds with quantity > 0.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BackpackSnapshot {
    pub uid: Uid,
    pub total_items: usize,
    pub items: BTreeMap<ItemId, BackpackSlot>,
}

impl BackpackSnapshot {
    pub fn from_lines(uid: Uid, lines: Vec<BackpackLine>) -> Self {
        let items = lines
            .into_iter()
            .filter(|line| line.quantity > 0)
            .map(|line| {
                (
                    line.item_id,
                    BackpackSlot {
                        quantity: line.quantity,
                        name: line.name,
                    },
                )
            })
            .collect::<BTreeMap<_, _>>();
        Self {
            uid,
            total_items: items.len(),
            items,
        }
    }

    pub fn quantity_of(&self, item: ItemId) -> i64 {
        self.items.get(&item).map(|slot| slot.quantity).unwrap_or(0)
    }
}
