use axum::extract::{Path, Query, State};
use axum::http::HeaderMap;
use axum::Json;

use backend_application::commands::{self, AdjustBalanceRequest};
use backend_application::queries;
use backend_application::AppState;
use backend_domain::{CurrencyFlow, CurrencyKind, Page, PageRequest, Uid, Wallet};

use crate::error::HttpError;
use crate::middleware::require_auth;

pub async fn get_user_wallets(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(uid): Path<Uid>,
) -> Result<Json<Vec<Wallet>>, HttpError> {
    require_auth(&state.config, &headers)?;
    Ok(Json(queries::get_user_wallets(&state, uid).await?))
}

pub async fn get_wallet(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path((uid, kind)): Path<(Uid, CurrencyKind)>,
) -> Result<Json<Wallet>, HttpError> {
    require_auth(&state.config, &headers)?;
    Ok(Json(queries::get_wallet(&state, uid, kind).await?))
}

pub async fn adjust_wallet_balance(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path((uid, kind)): Path<(Uid, CurrencyKind)>,
    Json(payload): Json<AdjustBalanceRequest>,
) -> Result<Json<Wallet>, HttpError> {
    require_auth(&state.config, &headers)?;
    let wallet = commands::update_wallet_balance(&state, uid, kind, payload).await?;
    Ok(Json(wallet))
}

pub async fn list_currency_flows(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(uid): Path<Uid>,
    Query(page): Query<PageRequest>,
) -> Result<Json<Page<CurrencyFlow>>, HttpError> {
    require_auth(&state.config, &headers)?;
    Ok(Json(queries::list_currency_flows(&state, uid, page).await?))
}
