use backend_domain::{CurrencyKind, Uid, Wallet};
use serde::Deserialize;

use super::surface;
use crate::{AppError, AppState};

#[derive(Debug, Clone, Deserialize)]
pub struct AdjustBalanceRequest {
    pub amount: i64,
    #[serde(default)]
    pub description: Option<String>,
}

pub async fn update_wallet_balance(
    state: &AppState,
    uid: Uid,
    kind: CurrencyKind,
    request: AdjustBalanceRequest,
) -> Result<Wallet, AppError> {
    let description = request
        .description
        .filter(|text| !text.trim().is_empty())
        .unwrap_or_else(|| "manual adjustment".to_string());
    let mut uow = state
        .begin()
        .await
        .map_err(|err| surface("update_wallet_balance", err))?;
    let result = state
        .services
        .wallets
        .update_balance(&mut uow, uid, kind, request.amount, &description)
        .await;
    uow.finish(result)
        .await
        .map_err(|err| surface("update_wallet_balance", err))
}
