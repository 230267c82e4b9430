// Reward package item classification

use crate::entities::{RewardPackageItem, REWARD_ITEM_TYPE_CURRENCY, REWARD_ITEM_TYPE_GOODS};
use crate::errors::{ensure_positive, EconomyError, EconomyResult};
use crate::value_objects::{CurrencyKind, ItemId};

const CURRENCY_ID_DIAMOND: i64 = 0;
const CURRENCY_ID_COIN: i64 = 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RewardGrant {
    Goods { item: ItemId, quantity: i64 },
    Currency { kind: CurrencyKind, amount: i64 },
}

impl RewardGrant {
    /// Goods are `item_type` 0; currency is `item_type` 1 with `item_id` 0 for
    /// diamond and 1 for coin. Anything else is refused.
    pub fn classify(item_type: i32, item_id: i64, quantity: i64) -> EconomyResult<Self> {
        let unsupported = || EconomyError::UnsupportedRewardKind { item_type, item_id };
        let grant = match item_type {
            REWARD_ITEM_TYPE_GOODS => RewardGrant::Goods {
                item: ItemId(item_id),
                quantity,
            },
            REWARD_ITEM_TYPE_CURRENCY => {
                let kind = match item_id {
                    CURRENCY_ID_DIAMOND => CurrencyKind::Diamond,
                    CURRENCY_ID_COIN => CurrencyKind::Coin,
                    _ => return Err(unsupported()),
                };
                RewardGrant::Currency {
                    kind,
                    amount: quantity,
                }
            }
            _ => return Err(unsupported()),
        };
        ensure_positive(quantity)?;
        Ok(grant)
    }

    pub fn from_package_item(item: &RewardPackageItem) -> EconomyResult<Self> {
        Self::classify(item.item_type, item.item_id, item.quantity)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn currency_ids_map_to_kinds() {
        assert_eq!(
            RewardGrant::classify(1, 0, 50).unwrap(),
            RewardGrant::Currency {
                kind: CurrencyKind::Diamond,
                amount: 50
            }
        );
        assert_eq!(
            RewardGrant::classify(1, 1, 20).unwrap(),
            RewardGrant::Currency {
                kind: CurrencyKind::Coin,
                amount: 20
            }
        );
    }

    #[test]
    fn goods_keep_item_id() {
        assert_eq!(
            RewardGrant::classify(0, 7, 2).unwrap(),
            RewardGrant::Goods {
                item: ItemId(7),
                quantity: 2
            }
        );
    }

    #[test]
    fn unknown_codes_are_rejected() {
        assert!(matches!(
            RewardGrant::classify(1, 9, 5),
            Err(EconomyError::UnsupportedRewardKind {
                item_type: 1,
                item_id: 9
            })
        ));
        assert!(matches!(
            RewardGrant::classify(4, 0, 5),
            Err(EconomyError::UnsupportedRewardKind { .. })
        ));
        assert!(matches!(
            RewardGrant::classify(0, 7, 0),
            Err(EconomyError::NonPositiveQuantity(0))
        ));
    }
}
