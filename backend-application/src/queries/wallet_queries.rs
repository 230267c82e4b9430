use backend_domain::{CurrencyFlow, CurrencyKind, Page, PageRequest, Uid, Wallet};

use crate::commands::surface;
use crate::{AppError, AppState};

pub async fn get_wallet(state: &AppState, uid: Uid, kind: CurrencyKind) -> Result<Wallet, AppError> {
    let mut uow = state.begin().await.map_err(|err| surface("get_wallet", err))?;
    let result = state.services.wallets.get_wallet(&mut uow, uid, kind).await;
    uow.finish(result)
        .await
        .map_err(|err| surface("get_wallet", err))
}

pub async fn get_user_wallets(state: &AppState, uid: Uid) -> Result<Vec<Wallet>, AppError> {
    let mut uow = state
        .begin()
        .await
        .map_err(|err| surface("get_user_wallets", err))?;
    let result = state.services.wallets.user_wallets(&mut uow, uid).await;
    uow.finish(result)
        .await
        .map_err(|err| surface("get_user_wallets", err))
}

pub async fn list_currency_flows(
    state: &AppState,
    uid: Uid,
    page: PageRequest,
) -> Result<Page<CurrencyFlow>, AppError> {
    let mut uow = state
        .begin()
        .await
        .map_err(|err| surface("list_currency_flows", err))?;
    let result = state.services.wallets.currency_flows(&mut uow, uid, page).await;
    uow.finish(result)
        .await
        .map_err(|err| surface("list_currency_flows", err))
}
