use backend_domain::{EconomyError, LevelConfig, LevelHistory, Page, PageRequest, Uid};
use serde::Serialize;

use crate::commands::surface;
use crate::{AppError, AppState};

#[derive(Debug, Clone, Serialize)]
pub struct PriceQuote {
    pub uid: Uid,
    pub level: i32,
    pub original_price: i64,
    pub discounted_price: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct UserLevel {
    pub uid: Uid,
    pub level: i32,
    pub experience: i64,
    pub total_spent: i64,
}

pub async fn get_user_level(state: &AppState, uid: Uid) -> Result<UserLevel, AppError> {
    let mut uow = state
        .begin()
        .await
        .map_err(|err| surface("get_user_level", err))?;
    let result = state.services.leveling.get_level(&mut uow, uid).await;
    let user = uow
        .finish(result)
        .await
        .map_err(|err| surface("get_user_level", err))?;
    Ok(UserLevel {
        uid: user.uid,
        level: user.level,
        experience: user.experience,
        total_spent: user.total_spent,
    })
}

pub async fn get_level_history(
    state: &AppState,
    uid: Uid,
    page: PageRequest,
) -> Result<Page<LevelHistory>, AppError> {
    let mut uow = state
        .begin()
        .await
        .map_err(|err| surface("get_level_history", err))?;
    let result = state.services.leveling.history(&mut uow, uid, page).await;
    uow.finish(result)
        .await
        .map_err(|err| surface("get_level_history", err))
}

pub async fn list_level_configs(state: &AppState) -> Result<Vec<LevelConfig>, AppError> {
    let mut uow = state
        .begin()
        .await
        .map_err(|err| surface("list_level_configs", err))?;
    let result = state.services.leveling.level_configs(&mut uow).await;
    uow.finish(result)
        .await
        .map_err(|err| surface("list_level_configs", err))
}

/// What `original_price` costs the user at their current level.
pub async fn get_discounted_price(
    state: &AppState,
    uid: Uid,
    original_price: i64,
) -> Result<PriceQuote, AppError> {
    if original_price < 0 {
        return Err(AppError::BadRequest(format!(
            "price must not be negative, got {}",
            original_price
        )));
    }
    let mut uow = state
        .begin()
        .await
        .map_err(|err| surface("get_discounted_price", err))?;
    let result = async {
        let user = state.services.leveling.get_level(&mut uow, uid).await?;
        let price = state
            .services
            .leveling
            .discounted_price(&mut uow, &user, original_price)
            .await?;
        Ok::<_, EconomyError>((user.level, price))
    }
    .await;
    let (level, discounted_price) = uow
        .finish(result)
        .await
        .map_err(|err| surface("get_discounted_price", err))?;
    Ok(PriceQuote {
        uid,
        level,
        original_price,
        discounted_price,
    })
}
