use backend_domain::{ItemId, StoreItem};

use crate::commands::surface;
use crate::{AppError, AppState};

pub async fn get_store_item(state: &AppState, id: ItemId) -> Result<StoreItem, AppError> {
    let mut uow = state
        .begin()
        .await
        .map_err(|err| surface("get_store_item", err))?;
    let result = state.services.catalog.get_item(&mut uow, id).await;
    uow.finish(result)
        .await
        .map_err(|err| surface("get_store_item", err))
}
