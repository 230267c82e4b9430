// Wallet ledger: the only path that changes a wallet balance

use std::sync::Arc;
use std::time::Duration;

use backend_domain::ports::{CachedView, ViewCache};
use backend_domain::{
    CurrencyFlow, CurrencyKind, EconomyError, EconomyResult, ItemId, NewCurrencyFlow,
    NewRewardFlow, Page, PageRequest, RewardFlowKind, Uid, User, Wallet,
};
use tracing::info;

use super::views::{read_view, ViewRead};
use crate::unit_of_work::UnitOfWork;

const REWARD_FLOW_DIAMOND_ID: i64 = 0;
const REWARD_FLOW_COIN_ID: i64 = 1;

#[derive(Clone)]
pub struct WalletLedger {
    cache: Arc<dyn ViewCache>,
    view_ttl: Duration,
}

impl WalletLedger {
    pub fn new(cache: Arc<dyn ViewCache>, view_ttl: Duration) -> Self {
        Self { cache, view_ttl }
    }

    pub async fn get_wallet(
        &self,
        uow: &mut UnitOfWork,
        uid: Uid,
        kind: CurrencyKind,
    ) -> EconomyResult<Wallet> {
        uow.tx()?
            .find_wallet(uid, kind)
            .await?
            .ok_or(EconomyError::WalletNotFound { uid, kind })
    }

    /// Takes the row lock on the wallet and returns it.
    pub async fn lock_wallet(
        &self,
        uow: &mut UnitOfWork,
        uid: Uid,
        kind: CurrencyKind,
    ) -> EconomyResult<Wallet> {
        uow.tx()?
            .lock_wallet(uid, kind)
            .await?
            .ok_or(EconomyError::WalletNotFound { uid, kind })
    }

    /// Adds a signed amount to the wallet under its row lock and records the
    /// matching currency flow. A negative result is not refused here; callers
    /// validate funds first.
    pub async fn apply_delta(
        &self,
        uow: &mut UnitOfWork,
        uid: Uid,
        kind: CurrencyKind,
        amount: i64,
        description: &str,
        store_item_id: Option<ItemId>,
    ) -> EconomyResult<Wallet> {
        let mut wallet = self.lock_wallet(uow, uid, kind).await?;
        let balance = wallet
            .balance
            .checked_add(amount)
            .ok_or(EconomyError::AmountOverflow)?;

        let tx = uow.tx()?;
        tx.insert_currency_flow(&NewCurrencyFlow {
            uid,
            kind,
            amount,
            store_item_id,
            description: description.to_string(),
        })
        .await?;
        tx.save_wallet_balance(wallet.id, balance).await?;
        uow.invalidate(uid, CachedView::Wallets);

        wallet.balance = balance;
        Ok(wallet)
    }

    /// Credits reward currency and records it in the reward flow as well.
    pub async fn credit_reward(
        &self,
        uow: &mut UnitOfWork,
        uid: Uid,
        kind: CurrencyKind,
        amount: i64,
        source: &str,
    ) -> EconomyResult<Wallet> {
        let wallet = self.apply_delta(uow, uid, kind, amount, source, None).await?;
        let item_id = match kind {
            CurrencyKind::Diamond => REWARD_FLOW_DIAMOND_ID,
            CurrencyKind::Coin => REWARD_FLOW_COIN_ID,
        };
        uow.tx()?
            .insert_reward_flow(&NewRewardFlow {
                uid,
                kind: RewardFlowKind::from(kind),
                item_id,
                quantity: amount,
                source: source.to_string(),
            })
            .await?;
        Ok(wallet)
    }

    /// Creates the coin and diamond wallets with their seed balances.
    pub async fn initialize_wallet(
        &self,
        uow: &mut UnitOfWork,
        uid: Uid,
    ) -> EconomyResult<Vec<Wallet>> {
        let mut wallets = Vec::with_capacity(CurrencyKind::ALL.len());
        for kind in CurrencyKind::ALL {
            let tx = uow.tx()?;
            if tx.find_wallet(uid, kind).await?.is_some() {
                return Err(EconomyError::WalletAlreadyInitialized { uid, kind });
            }
            wallets.push(tx.insert_wallet(uid, kind, kind.seed_balance()).await?);
        }
        uow.invalidate(uid, CachedView::Wallets);
        Ok(wallets)
    }

    /// Administrative adjustment. Unlike [`WalletLedger::apply_delta`] this
    /// refuses zero amounts and results below zero.
    pub async fn update_balance(
        &self,
        uow: &mut UnitOfWork,
        uid: Uid,
        kind: CurrencyKind,
        amount: i64,
        description: &str,
    ) -> EconomyResult<Wallet> {
        if amount == 0 {
            return Err(EconomyError::InvalidInput(
                "adjustment amount must be non-zero".to_string(),
            ));
        }
        lock_active_user(uow, uid).await?;
        let wallet = self.lock_wallet(uow, uid, kind).await?;
        if wallet.balance.checked_add(amount).map_or(true, |after| after < 0) {
            return Err(EconomyError::InsufficientFunds {
                kind,
                required: amount.saturating_neg(),
                available: wallet.balance,
            });
        }
        let wallet = self
            .apply_delta(uow, uid, kind, amount, description, None)
            .await?;
        info!(%uid, %kind, amount, balance = wallet.balance, "wallet balance adjusted");
        Ok(wallet)
    }

    /// Both wallets of a user, served from the cache when possible.
    pub async fn user_wallets(&self, uow: &mut UnitOfWork, uid: Uid) -> EconomyResult<Vec<Wallet>> {
        let generation = match read_view(self.cache.as_ref(), uid, CachedView::Wallets).await {
            ViewRead::Hit(wallets) => return Ok(wallets),
            ViewRead::Miss(generation) => generation,
        };
        require_user(uow, uid).await?;
        let wallets = uow.tx()?.list_wallets(uid).await?;
        uow.fill_view(uid, CachedView::Wallets, &wallets, generation, self.view_ttl);
        Ok(wallets)
    }

    pub async fn currency_flows(
        &self,
        uow: &mut UnitOfWork,
        uid: Uid,
        page: PageRequest,
    ) -> EconomyResult<Page<CurrencyFlow>> {
        require_user(uow, uid).await?;
        uow.tx()?.list_currency_flows(uid, page).await
    }
}

/// Loads a live (not soft-deleted) user.
pub(crate) async fn require_user(uow: &mut UnitOfWork, uid: Uid) -> EconomyResult<User> {
    match uow.tx()?.find_user(uid).await? {
        Some(user) if user.is_active() => Ok(user),
        _ => Err(EconomyError::UserNotFound(uid)),
    }
}

/// Takes the user's row lock. Every writer calls this before locking any
/// other row, and wallet or backpack rows are only locked while their
/// owner's row is held, so writers of one user queue on the user row.
pub(crate) async fn lock_active_user(uow: &mut UnitOfWork, uid: Uid) -> EconomyResult<User> {
    match uow.tx()?.lock_user(uid).await? {
        Some(user) if user.is_active() => Ok(user),
        _ => Err(EconomyError::UserNotFound(uid)),
    }
}

/// Locks two users in ascending uid order. Missing users are reported
/// `first` before `second` regardless of the lock order.
pub(crate) async fn lock_active_users(
    uow: &mut UnitOfWork,
    first: Uid,
    second: Uid,
) -> EconomyResult<(User, User)> {
    let (low, high) = if first <= second {
        (first, second)
    } else {
        (second, first)
    };
    let tx = uow.tx()?;
    let low_user = tx.lock_user(low).await?;
    let high_user = tx.lock_user(high).await?;
    let (first_user, second_user) = if first <= second {
        (low_user, high_user)
    } else {
        (high_user, low_user)
    };
    match (first_user, second_user) {
        (Some(a), Some(b)) if a.is_active() && b.is_active() => Ok((a, b)),
        (Some(a), _) if a.is_active() => Err(EconomyError::UserNotFound(second)),
        _ => Err(EconomyError::UserNotFound(first)),
    }
}
