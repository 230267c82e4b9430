use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::Json;

use backend_application::commands::{self, GrantRewardRequest};
use backend_application::queries;
use backend_application::AppState;
use backend_domain::{
    NewRewardPackage, NewRewardPackageItem, PackageId, Page, PageRequest, RewardFlow,
    RewardPackage, RewardPackageDetail, RewardRecord, Uid,
};

use crate::error::HttpError;
use crate::middleware::require_auth;

pub async fn grant_reward(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(payload): Json<GrantRewardRequest>,
) -> Result<Json<RewardRecord>, HttpError> {
    require_auth(&state.config, &headers)?;
    Ok(Json(commands::grant_reward(&state, payload).await?))
}

pub async fn list_reward_packages(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(page): Query<PageRequest>,
) -> Result<Json<Page<RewardPackage>>, HttpError> {
    require_auth(&state.config, &headers)?;
    Ok(Json(queries::list_reward_packages(&state, page).await?))
}

pub async fn create_reward_package(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(payload): Json<NewRewardPackage>,
) -> Result<(StatusCode, Json<RewardPackageDetail>), HttpError> {
    require_auth(&state.config, &headers)?;
    let package = commands::create_reward_package(&state, payload).await?;
    Ok((StatusCode::CREATED, Json(package)))
}

pub async fn get_reward_package(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<PackageId>,
) -> Result<Json<RewardPackageDetail>, HttpError> {
    require_auth(&state.config, &headers)?;
    Ok(Json(queries::get_reward_package(&state, id).await?))
}

pub async fn delete_reward_package(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<PackageId>,
) -> Result<StatusCode, HttpError> {
    require_auth(&state.config, &headers)?;
    commands::delete_reward_package(&state, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn replace_reward_package_items(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<PackageId>,
    Json(payload): Json<Vec<NewRewardPackageItem>>,
) -> Result<Json<RewardPackageDetail>, HttpError> {
    require_auth(&state.config, &headers)?;
    Ok(Json(
        commands::replace_reward_package_items(&state, id, payload).await?,
    ))
}

pub async fn list_reward_records(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(uid): Path<Uid>,
    Query(page): Query<PageRequest>,
) -> Result<Json<Page<RewardRecord>>, HttpError> {
    require_auth(&state.config, &headers)?;
    Ok(Json(queries::list_reward_records(&state, uid, page).await?))
}

pub async fn list_reward_flows(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(uid): Path<Uid>,
    Query(page): Query<PageRequest>,
) -> Result<Json<Page<RewardFlow>>, HttpError> {
    require_auth(&state.config, &headers)?;
    Ok(Json(queries::list_reward_flows(&state, uid, page).await?))
}
