use backend_domain::{
    PackageId, Page, PageRequest, RewardFlow, RewardPackage, RewardPackageDetail, RewardRecord,
    Uid,
};

use crate::commands::surface;
use crate::{AppError, AppState};

pub async fn get_reward_package(
    state: &AppState,
    id: PackageId,
) -> Result<RewardPackageDetail, AppError> {
    let mut uow = state
        .begin()
        .await
        .map_err(|err| surface("get_reward_package", err))?;
    let result = state.services.rewards.get_package(&mut uow, id).await;
    uow.finish(result)
        .await
        .map_err(|err| surface("get_reward_package", err))
}

pub async fn list_reward_packages(
    state: &AppState,
    page: PageRequest,
) -> Result<Page<RewardPackage>, AppError> {
    let mut uow = state
        .begin()
        .await
        .map_err(|err| surface("list_reward_packages", err))?;
    let result = state.services.rewards.list_packages(&mut uow, page).await;
    uow.finish(result)
        .await
        .map_err(|err| surface("list_reward_packages", err))
}

pub async fn list_reward_records(
    state: &AppState,
    uid: Uid,
    page: PageRequest,
) -> Result<Page<RewardRecord>, AppError> {
    let mut uow = state
        .begin()
        .await
        .map_err(|err| surface("list_reward_records", err))?;
    let result = state.services.rewards.records(&mut uow, uid, page).await;
    uow.finish(result)
        .await
        .map_err(|err| surface("list_reward_records", err))
}

pub async fn list_reward_flows(
    state: &AppState,
    uid: Uid,
    page: PageRequest,
) -> Result<Page<RewardFlow>, AppError> {
    let mut uow = state
        .begin()
        .await
        .map_err(|err| surface("list_reward_flows", err))?;
    let result = state.services.rewards.flows(&mut uow, uid, page).await;
    uow.finish(result)
        .await
        .map_err(|err| surface("list_reward_flows", err))
}
