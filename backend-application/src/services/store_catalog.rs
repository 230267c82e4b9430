// Store catalogue administration

use backend_domain::{EconomyError, EconomyResult, ItemId, NewStoreItem, StoreItem};
use tracing::info;

use crate::unit_of_work::UnitOfWork;

#[derive(Debug, Clone, Copy, Default)]
pub struct StoreCatalog;

impl StoreCatalog {
    pub async fn create_item(
        &self,
        uow: &mut UnitOfWork,
        item: &NewStoreItem,
    ) -> EconomyResult<StoreItem> {
        let name = item.name.trim();
        if name.is_empty() {
            return Err(EconomyError::InvalidInput("item name is required".to_string()));
        }
        if item.price < 0 || item.stock < 0 {
            return Err(EconomyError::InvalidInput(
                "price and stock must not be negative".to_string(),
            ));
        }
        let normalized = NewStoreItem {
            name: name.to_string(),
            ..item.clone()
        };
        let created = uow.tx()?.insert_store_item(&normalized).await?;
        info!(item_id = %created.id, name = %created.name, "store item created");
        Ok(created)
    }

    pub async fn get_item(&self, uow: &mut UnitOfWork, id: ItemId) -> EconomyResult<StoreItem> {
        uow.tx()?
            .find_store_item(id)
            .await?
            .ok_or(EconomyError::ItemNotFound(id))
    }
}
