use backend_domain::{ItemId, NewStoreItem, StoreItem, Uid};
use serde::Deserialize;
use tracing::warn;

use super::surface;
use crate::services::PurchaseReceipt;
use crate::{AppError, AppState};

#[derive(Debug, Clone, Deserialize)]
pub struct BuyGoodsRequest {
    pub uid: Uid,
    pub item_id: ItemId,
    pub count: i64,
}

pub async fn buy_goods(
    state: &AppState,
    request: BuyGoodsRequest,
) -> Result<PurchaseReceipt, AppError> {
    let mut uow = state.begin().await.map_err(|err| surface("buy_goods", err))?;
    let result = state
        .services
        .purchases
        .buy_goods(&mut uow, request.uid, request.item_id, request.count)
        .await;
    match uow.finish(result).await {
        Ok(receipt) => {
            state.metrics.record_purchase(receipt.level.leveled_up());
            Ok(receipt)
        }
        Err(err) => {
            state.metrics.record_purchase_failure();
            warn!(
                uid = %request.uid,
                item_id = %request.item_id,
                count = request.count,
                code = err.code(),
                "purchase rejected"
            );
            Err(surface("buy_goods", err))
        }
    }
}

pub async fn create_store_item(
    state: &AppState,
    item: NewStoreItem,
) -> Result<StoreItem, AppError> {
    let mut uow = state
        .begin()
        .await
        .map_err(|err| surface("create_store_item", err))?;
    let result = state.services.catalog.create_item(&mut uow, &item).await;
    uow.finish(result)
        .await
        .map_err(|err| surface("create_store_item", err))
}
