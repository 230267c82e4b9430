// Backpack service

use std::sync::Arc;
use std::time::Duration;

use backend_domain::ports::{CachedView, ViewCache};
use backend_domain::{
    ensure_positive, BackpackSnapshot, EconomyError, EconomyResult, ItemId, NewRewardFlow,
    RewardFlowKind, Uid,
};
use tracing::info;

use super::views::{read_view, ViewRead};
use super::wallet_ledger::{lock_active_user, lock_active_users, require_user};
use crate::unit_of_work::UnitOfWork;

#[derive(Clone)]
pub struct InventoryService {
    cache: Arc<dyn ViewCache>,
    view_ttl: Duration,
}

impl InventoryService {
    pub fn new(cache: Arc<dyn ViewCache>, view_ttl: Duration) -> Self {
        Self { cache, view_ttl }
    }

    pub async fn snapshot(&self, uow: &mut UnitOfWork, uid: Uid) -> EconomyResult<BackpackSnapshot> {
        require_user(uow, uid).await?;
        let generation = match read_view(self.cache.as_ref(), uid, CachedView::Backpack).await {
            ViewRead::Hit(snapshot) => return Ok(snapshot),
            ViewRead::Miss(generation) => generation,
        };
        let lines = uow.tx()?.list_backpack(uid).await?;
        let snapshot = BackpackSnapshot::from_lines(uid, lines);
        uow.fill_view(uid, CachedView::Backpack, &snapshot, generation, self.view_ttl);
        Ok(snapshot)
    }

    /// Grants `quantity` of a store item and records it in the reward flow.
    pub async fn add(
        &self,
        uow: &mut UnitOfWork,
        uid: Uid,
        item: ItemId,
        quantity: i64,
        source: &str,
    ) -> EconomyResult<i64> {
        ensure_positive(quantity)?;
        require_user(uow, uid).await?;
        if uow.tx()?.find_store_item(item).await?.is_none() {
            return Err(EconomyError::ItemNotFound(item));
        }
        let held = self.increment(uow, uid, item, quantity).await?;
        uow.tx()?
            .insert_reward_flow(&NewRewardFlow {
                uid,
                kind: RewardFlowKind::Item,
                item_id: item.0,
                quantity,
                source: source.to_string(),
            })
            .await?;
        Ok(held)
    }

    pub async fn consume(
        &self,
        uow: &mut UnitOfWork,
        uid: Uid,
        item: ItemId,
        quantity: i64,
    ) -> EconomyResult<i64> {
        ensure_positive(quantity)?;
        lock_active_user(uow, uid).await?;
        self.decrement(uow, uid, item, quantity).await
    }

    /// Moves items between two users; both sides land or neither does.
    pub async fn transfer(
        &self,
        uow: &mut UnitOfWork,
        from: Uid,
        to: Uid,
        item: ItemId,
        quantity: i64,
    ) -> EconomyResult<(i64, i64)> {
        ensure_positive(quantity)?;
        if from == to {
            return Err(EconomyError::InvalidInput(
                "cannot transfer items to the same user".to_string(),
            ));
        }
        lock_active_users(uow, from, to).await?;
        let source_left = self.decrement(uow, from, item, quantity).await?;
        let target_held = self.increment(uow, to, item, quantity).await?;
        info!(%from, %to, item_id = %item, quantity, "items transferred");
        Ok((source_left, target_held))
    }

    /// Upsert-increment of a backpack row. Returns the new quantity.
    pub(crate) async fn increment(
        &self,
        uow: &mut UnitOfWork,
        uid: Uid,
        item: ItemId,
        quantity: i64,
    ) -> EconomyResult<i64> {
        let held = uow
            .tx()?
            .upsert_backpack_increment(uid, item, quantity)
            .await?
            .quantity;
        uow.invalidate(uid, CachedView::Backpack);
        Ok(held)
    }

    async fn decrement(
        &self,
        uow: &mut UnitOfWork,
        uid: Uid,
        item: ItemId,
        quantity: i64,
    ) -> EconomyResult<i64> {
        let tx = uow.tx()?;
        let entry = tx
            .lock_backpack_entry(uid, item)
            .await?
            .ok_or(EconomyError::BackpackEntryNotFound { uid, item })?;
        if entry.quantity < quantity {
            return Err(EconomyError::InsufficientQuantity {
                item,
                requested: quantity,
                held: entry.quantity,
            });
        }
        let left = entry.quantity - quantity;
        tx.save_backpack_quantity(entry.id, left).await?;
        uow.invalidate(uid, CachedView::Backpack);
        Ok(left)
    }
}
