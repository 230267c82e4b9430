use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::Json;

use backend_application::commands::{self, BuyGoodsRequest};
use backend_application::queries;
use backend_application::services::PurchaseReceipt;
use backend_application::AppState;
use backend_domain::{ItemId, NewStoreItem, StoreItem};

use crate::error::HttpError;
use crate::middleware::require_auth;

pub async fn create_store_item(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(payload): Json<NewStoreItem>,
) -> Result<(StatusCode, Json<StoreItem>), HttpError> {
    require_auth(&state.config, &headers)?;
    let item = commands::create_store_item(&state, payload).await?;
    Ok((StatusCode::CREATED, Json(item)))
}

pub async fn get_store_item(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<ItemId>,
) -> Result<Json<StoreItem>, HttpError> {
    require_auth(&state.config, &headers)?;
    Ok(Json(queries::get_store_item(&state, id).await?))
}

pub async fn buy_goods(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(payload): Json<BuyGoodsRequest>,
) -> Result<Json<PurchaseReceipt>, HttpError> {
    require_auth(&state.config, &headers)?;
    Ok(Json(commands::buy_goods(&state, payload).await?))
}
