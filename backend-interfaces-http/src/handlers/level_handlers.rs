use axum::extract::{Path, Query, State};
use axum::http::HeaderMap;
use axum::Json;
use serde::Deserialize;

use backend_application::commands::{self, AddExperienceRequest};
use backend_application::queries::{self, PriceQuote, UserLevel};
use backend_application::AppState;
use backend_domain::{LevelConfig, LevelHistory, Page, PageRequest, Uid};

use crate::error::HttpError;
use crate::middleware::require_auth;

pub async fn get_user_level(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(uid): Path<Uid>,
) -> Result<Json<UserLevel>, HttpError> {
    require_auth(&state.config, &headers)?;
    Ok(Json(queries::get_user_level(&state, uid).await?))
}

pub async fn get_level_history(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(uid): Path<Uid>,
    Query(page): Query<PageRequest>,
) -> Result<Json<Page<LevelHistory>>, HttpError> {
    require_auth(&state.config, &headers)?;
    Ok(Json(queries::get_level_history(&state, uid, page).await?))
}

pub async fn list_level_configs(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<Vec<LevelConfig>>, HttpError> {
    require_auth(&state.config, &headers)?;
    Ok(Json(queries::list_level_configs(&state).await?))
}

pub async fn add_experience(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(uid): Path<Uid>,
    Json(payload): Json<AddExperienceRequest>,
) -> Result<Json<LevelHistory>, HttpError> {
    require_auth(&state.config, &headers)?;
    Ok(Json(commands::add_experience(&state, uid, payload).await?))
}

#[derive(Deserialize)]
pub struct PriceQuery {
    pub price: i64,
}

pub async fn get_discounted_price(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(uid): Path<Uid>,
    Query(query): Query<PriceQuery>,
) -> Result<Json<PriceQuote>, HttpError> {
    require_auth(&state.config, &headers)?;
    Ok(Json(
        queries::get_discounted_price(&state, uid, query.price).await?,
    ))
}
