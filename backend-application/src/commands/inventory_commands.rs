use backend_domain::{ItemId, Uid};
use serde::{Deserialize, Serialize};

use super::surface;
use crate::{AppError, AppState};

#[derive(Debug, Clone, Deserialize)]
pub struct ConsumeItemRequest {
    pub item_id: ItemId,
    pub quantity: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TransferItemRequest {
    pub to_uid: Uid,
    pub item_id: ItemId,
    pub quantity: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct ItemBalance {
    pub uid: Uid,
    pub item_id: ItemId,
    pub quantity: i64,
}

pub async fn consume_item(
    state: &AppState,
    uid: Uid,
    request: ConsumeItemRequest,
) -> Result<ItemBalance, AppError> {
    let mut uow = state
        .begin()
        .await
        .map_err(|err| surface("consume_item", err))?;
    let result = state
        .services
        .inventory
        .consume(&mut uow, uid, request.item_id, request.quantity)
        .await;
    let quantity = uow
        .finish(result)
        .await
        .map_err(|err| surface("consume_item", err))?;
    Ok(ItemBalance {
        uid,
        item_id: request.item_id,
        quantity,
    })
}

pub async fn transfer_item(
    state: &AppState,
    from: Uid,
    request: TransferItemRequest,
) -> Result<Vec<ItemBalance>, AppError> {
    let mut uow = state
        .begin()
        .await
        .map_err(|err| surface("transfer_item", err))?;
    let result = state
        .services
        .inventory
        .transfer(&mut uow, from, request.to_uid, request.item_id, request.quantity)
        .await;
    let (source_left, target_held) = uow
        .finish(result)
        .await
        .map_err(|err| surface("transfer_item", err))?;
    Ok(vec![
        ItemBalance {
            uid: from,
            item_id: request.item_id,
            quantity: source_left,
        },
        ItemBalance {
            uid: request.to_uid,
            item_id: request.item_id,
            quantity: target_held,
        },
    ])
}
