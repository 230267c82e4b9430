use axum::extract::{Path, State};
use axum::http::HeaderMap;
use axum::Json;

use backend_application::commands::{self, ConsumeItemRequest, ItemBalance, TransferItemRequest};
use backend_application::queries;
use backend_application::AppState;
use backend_domain::{BackpackSnapshot, Uid};

use crate::error::HttpError;
use crate::middleware::require_auth;

pub async fn get_backpack(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(uid): Path<Uid>,
) -> Result<Json<BackpackSnapshot>, HttpError> {
    require_auth(&state.config, &headers)?;
    Ok(Json(queries::get_backpack_snapshot(&state, uid).await?))
}

pub async fn consume_item(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(uid): Path<Uid>,
    Json(payload): Json<ConsumeItemRequest>,
) -> Result<Json<ItemBalance>, HttpError> {
    require_auth(&state.config, &headers)?;
    Ok(Json(commands::consume_item(&state, uid, payload).await?))
}

pub async fn transfer_item(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(uid): Path<Uid>,
    Json(payload): Json<TransferItemRequest>,
) -> Result<Json<Vec<ItemBalance>>, HttpError> {
    require_auth(&state.config, &headers)?;
    Ok(Json(commands::transfer_item(&state, uid, payload).await?))
}
