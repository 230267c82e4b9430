use backend_domain::{
    NewRewardPackage, NewRewardPackageItem, PackageId, RewardPackageDetail, RewardRecord, Uid,
};
use serde::Deserialize;
use tracing::warn;

use super::surface;
use crate::{AppError, AppState};

#[derive(Debug, Clone, Deserialize)]
pub struct GrantRewardRequest {
    pub uid: Uid,
    pub package_id: PackageId,
    #[serde(default = "default_source")]
    pub source: String,
}

fn default_source() -> String {
    "system".to_string()
}

pub async fn grant_reward(
    state: &AppState,
    request: GrantRewardRequest,
) -> Result<RewardRecord, AppError> {
    let mut uow = state
        .begin()
        .await
        .map_err(|err| surface("grant_reward", err))?;
    let result = state
        .services
        .rewards
        .grant_reward(&mut uow, request.uid, request.package_id, &request.source)
        .await;
    match uow.finish(result).await {
        Ok(record) => {
            state.metrics.record_reward_grant();
            Ok(record)
        }
        Err(err) => {
            state.metrics.record_reward_grant_failure();
            warn!(
                uid = %request.uid,
                package_id = %request.package_id,
                code = err.code(),
                "reward grant rejected"
            );
            Err(surface("grant_reward", err))
        }
    }
}

pub async fn create_reward_package(
    state: &AppState,
    package: NewRewardPackage,
) -> Result<RewardPackageDetail, AppError> {
    let mut uow = state
        .begin()
        .await
        .map_err(|err| surface("create_reward_package", err))?;
    let result = state.services.rewards.create_package(&mut uow, &package).await;
    uow.finish(result)
        .await
        .map_err(|err| surface("create_reward_package", err))
}

pub async fn replace_reward_package_items(
    state: &AppState,
    id: PackageId,
    items: Vec<NewRewardPackageItem>,
) -> Result<RewardPackageDetail, AppError> {
    let mut uow = state
        .begin()
        .await
        .map_err(|err| surface("replace_reward_package_items", err))?;
    let result = state.services.rewards.replace_items(&mut uow, id, &items).await;
    uow.finish(result)
        .await
        .map_err(|err| surface("replace_reward_package_items", err))
}

pub async fn delete_reward_package(state: &AppState, id: PackageId) -> Result<(), AppError> {
    let mut uow = state
        .begin()
        .await
        .map_err(|err| surface("delete_reward_package", err))?;
    let result = state.services.rewards.delete_package(&mut uow, id).await;
    uow.finish(result)
        .await
        .map_err(|err| surface("delete_reward_package", err))
}
