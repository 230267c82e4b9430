// Experience, level-ups and level discounts

use backend_domain::{
    discounted_price, plan_level_up, CurrencyKind, EconomyError, EconomyResult, LevelConfig,
    LevelHistory, NewLevelHistory, Page, PageRequest, Uid, User,
};
use tracing::{info, warn};

use super::wallet_ledger::{lock_active_user, require_user, WalletLedger};
use crate::unit_of_work::UnitOfWork;

#[derive(Clone)]
pub struct LevelingService {
    wallets: WalletLedger,
}

impl LevelingService {
    pub fn new(wallets: WalletLedger) -> Self {
        Self { wallets }
    }

    pub async fn get_level(&self, uow: &mut UnitOfWork, uid: Uid) -> EconomyResult<User> {
        require_user(uow, uid).await
    }

    /// Adds experience and applies every level-up it earns, crediting the
    /// summed rewards. Exactly one history row is written per call.
    pub async fn add_experience(
        &self,
        uow: &mut UnitOfWork,
        uid: Uid,
        exp_delta: i64,
        description: &str,
    ) -> EconomyResult<LevelHistory> {
        if exp_delta < 0 {
            return Err(EconomyError::InvalidInput(format!(
                "experience delta must not be negative, got {}",
                exp_delta
            )));
        }
        let user = lock_active_user(uow, uid).await?;
        let experience = user
            .experience
            .checked_add(exp_delta)
            .ok_or(EconomyError::AmountOverflow)?;

        let configs = uow.tx()?.list_level_configs().await?;
        let plan = plan_level_up(user.level, experience, &configs)?;
        uow.tx()?
            .save_user_progress(uid, plan.new_level, experience)
            .await?;

        if plan.leveled_up() {
            let source = format!("level up {} -> {}", plan.old_level, plan.new_level);
            if plan.coin_reward != 0 {
                self.wallets
                    .credit_reward(uow, uid, CurrencyKind::Coin, plan.coin_reward, &source)
                    .await?;
            }
            if plan.diamond_reward != 0 {
                self.wallets
                    .credit_reward(uow, uid, CurrencyKind::Diamond, plan.diamond_reward, &source)
                    .await?;
            }
            info!(
                %uid,
                old_level = plan.old_level,
                new_level = plan.new_level,
                coin = plan.coin_reward,
                diamond = plan.diamond_reward,
                "user leveled up"
            );
        }

        uow.tx()?
            .insert_level_history(&NewLevelHistory {
                uid,
                old_level: plan.old_level,
                new_level: plan.new_level,
                exp_gained: exp_delta,
                experience,
                coin_rewarded: plan.coin_reward,
                diamond_rewarded: plan.diamond_reward,
                description: description.to_string(),
            })
            .await
    }

    /// Price after the user's level discount. Falls back to the original
    /// price when the level has no usable config.
    pub async fn discounted_price(
        &self,
        uow: &mut UnitOfWork,
        user: &User,
        original: i64,
    ) -> EconomyResult<i64> {
        let config = match uow.tx()?.find_level_config(user.level).await {
            Ok(Some(config)) => config,
            Ok(None) => {
                warn!(uid = %user.uid, level = user.level, "no level config, charging list price");
                return Ok(original);
            }
            Err(err) => {
                warn!(uid = %user.uid, level = user.level, error = %err, "level config lookup failed, charging list price");
                return Ok(original);
            }
        };
        match discounted_price(original, config.discount_percent) {
            Ok(price) => Ok(price),
            Err(EconomyError::AmountOverflow) => Err(EconomyError::AmountOverflow),
            Err(err) => {
                warn!(uid = %user.uid, level = user.level, error = %err, "unusable discount, charging list price");
                Ok(original)
            }
        }
    }

    pub async fn history(
        &self,
        uow: &mut UnitOfWork,
        uid: Uid,
        page: PageRequest,
    ) -> EconomyResult<Page<LevelHistory>> {
        require_user(uow, uid).await?;
        uow.tx()?.list_level_history(uid, page).await
    }

    pub async fn level_configs(&self, uow: &mut UnitOfWork) -> EconomyResult<Vec<LevelConfig>> {
        let mut configs = uow.tx()?.list_level_configs().await?;
        configs.sort_by_key(|config| config.level);
        Ok(configs)
    }

    /// Loads the level table into an empty store. Returns how many rows
    /// were written; a populated table is left alone.
    pub async fn seed_level_configs(
        &self,
        uow: &mut UnitOfWork,
        configs: &[LevelConfig],
    ) -> EconomyResult<usize> {
        if !uow.tx()?.list_level_configs().await?.is_empty() {
            return Ok(0);
        }
        for config in configs {
            if config.level < 1 || config.required_exp < 0 {
                return Err(EconomyError::InvalidInput(format!(
                    "invalid level config for level {}",
                    config.level
                )));
            }
            uow.tx()?.upsert_level_config(config).await?;
        }
        Ok(configs.len())
    }
}
