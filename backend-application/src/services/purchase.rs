// Purchase pipeline

use backend_domain::{
    ensure_positive, line_total, CurrencyKind, EconomyError, EconomyResult, ItemId, LevelHistory,
    Uid,
};
use serde::Serialize;
use tracing::info;

use super::inventory::InventoryService;
use super::leveling::LevelingService;
use super::wallet_ledger::{lock_active_user, WalletLedger};
use crate::unit_of_work::UnitOfWork;

#[derive(Debug, Clone, Serialize)]
pub struct PurchaseReceipt {
    pub uid: Uid,
    pub item_id: ItemId,
    pub count: i64,
    pub cost_kind: CurrencyKind,
    pub list_price: i64,
    pub charged: i64,
    pub balance_after: i64,
    pub stock_after: i64,
    pub backpack_quantity: i64,
    pub level: LevelHistory,
}

#[derive(Clone)]
pub struct PurchaseEngine {
    wallets: WalletLedger,
    leveling: LevelingService,
    inventory: InventoryService,
}

impl PurchaseEngine {
    pub fn new(wallets: WalletLedger, leveling: LevelingService, inventory: InventoryService) -> Self {
        Self {
            wallets,
            leveling,
            inventory,
        }
    }

    /// Runs the whole purchase inside `uow`. Nothing is validated after the
    /// first write, so any error leaves the transaction safe to roll back.
    pub async fn buy_goods(
        &self,
        uow: &mut UnitOfWork,
        uid: Uid,
        item_id: ItemId,
        count: i64,
    ) -> EconomyResult<PurchaseReceipt> {
        ensure_positive(count)?;

        let user = lock_active_user(uow, uid).await?;

        let item = uow
            .tx()?
            .lock_store_item(item_id)
            .await?
            .ok_or(EconomyError::ItemNotFound(item_id))?;
        if !item.is_on_sale() {
            return Err(EconomyError::ItemInactive(item_id));
        }

        if item.stock < count {
            return Err(EconomyError::InsufficientStock {
                item: item_id,
                requested: count,
                available: item.stock,
            });
        }

        let wallet = self.wallets.lock_wallet(uow, uid, item.cost_kind).await?;

        let list_price = line_total(item.price, count)?;
        let charged = self
            .leveling
            .discounted_price(uow, &user, list_price)
            .await?;

        if wallet.balance < charged {
            return Err(EconomyError::InsufficientFunds {
                kind: item.cost_kind,
                required: charged,
                available: wallet.balance,
            });
        }

        let description = format!("buy {} x{}", item.name, count);
        let wallet = self
            .wallets
            .apply_delta(uow, uid, item.cost_kind, -charged, &description, Some(item_id))
            .await?;

        let stock_after = item.stock - count;
        uow.tx()?.save_store_stock(item_id, stock_after).await?;

        let backpack_quantity = self.inventory.increment(uow, uid, item_id, count).await?;

        uow.tx()?.add_total_spent(uid, charged).await?;

        let exp = item.cost_kind.experience_for(list_price);
        let level = self
            .leveling
            .add_experience(uow, uid, exp, &description)
            .await?;

        info!(
            %uid,
            item_id = %item_id,
            count,
            kind = %item.cost_kind,
            charged,
            exp,
            "purchase applied"
        );

        Ok(PurchaseReceipt {
            uid,
            item_id,
            count,
            cost_kind: item.cost_kind,
            list_price,
            charged,
            balance_after: wallet.balance,
            stock_after,
            backpack_quantity,
            level,
        })
    }
}
