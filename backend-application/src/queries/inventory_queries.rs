use backend_domain::{BackpackSnapshot, Uid};

use crate::commands::surface;
use crate::{AppError, AppState};

pub async fn get_backpack_snapshot(
    state: &AppState,
    uid: Uid,
) -> Result<BackpackSnapshot, AppError> {
    let mut uow = state
        .begin()
        .await
        .map_err(|err| surface("get_backpack_snapshot", err))?;
    let result = state.services.inventory.snapshot(&mut uow, uid).await;
    uow.finish(result)
        .await
        .map_err(|err| surface("get_backpack_snapshot", err))
}
