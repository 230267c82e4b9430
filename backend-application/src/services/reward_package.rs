// Reward package engine and package management

use backend_domain::{
    EconomyError, EconomyResult, NewRewardPackage, NewRewardPackageItem, Page, PageRequest,
    PackageId, RewardFlow, RewardGrant, RewardPackage, RewardPackageDetail, RewardRecord, Uid,
};
use tracing::info;

use super::inventory::InventoryService;
use super::wallet_ledger::{lock_active_user, require_user, WalletLedger};
use crate::unit_of_work::UnitOfWork;

#[derive(Clone)]
pub struct RewardPackageEngine {
    wallets: WalletLedger,
    inventory: InventoryService,
}

impl RewardPackageEngine {
    pub fn new(wallets: WalletLedger, inventory: InventoryService) -> Self {
        Self { wallets, inventory }
    }

    /// Applies every item of the package in order. The first failing item
    /// fails the grant; the caller's rollback then discards the record and
    /// every earlier item.
    pub async fn grant_reward(
        &self,
        uow: &mut UnitOfWork,
        uid: Uid,
        package_id: PackageId,
        source: &str,
    ) -> EconomyResult<RewardRecord> {
        let package = uow
            .tx()?
            .find_reward_package(package_id)
            .await?
            .ok_or(EconomyError::PackageNotFound(package_id))?;

        let items = uow.tx()?.list_reward_package_items(package_id).await?;
        if items.is_empty() {
            return Err(EconomyError::EmptyPackage(package_id));
        }

        lock_active_user(uow, uid).await?;
        let record = uow
            .tx()?
            .insert_reward_record(uid, package_id, source)
            .await?;

        let description = format!("reward package {}", package_id);
        for item in &items {
            match RewardGrant::from_package_item(item)? {
                RewardGrant::Goods { item, quantity } => {
                    self.inventory
                        .add(uow, uid, item, quantity, &description)
                        .await?;
                }
                RewardGrant::Currency { kind, amount } => {
                    self.wallets
                        .credit_reward(uow, uid, kind, amount, &description)
                        .await?;
                }
            }
        }

        info!(
            %uid,
            package_id = %package_id,
            package = %package.name,
            items = items.len(),
            source,
            "reward package granted"
        );
        Ok(record)
    }

    pub async fn create_package(
        &self,
        uow: &mut UnitOfWork,
        package: &NewRewardPackage,
    ) -> EconomyResult<RewardPackageDetail> {
        let name = package.name.trim();
        if name.is_empty() {
            return Err(EconomyError::InvalidInput("package name is required".to_string()));
        }
        validate_items(&package.items)?;
        let tx = uow.tx()?;
        let created = tx.insert_reward_package(name, &package.description).await?;
        let items = tx
            .replace_reward_package_items(created.id, &package.items)
            .await?;
        info!(package_id = %created.id, items = items.len(), "reward package created");
        Ok(RewardPackageDetail {
            package: created,
            items,
        })
    }

    pub async fn replace_items(
        &self,
        uow: &mut UnitOfWork,
        id: PackageId,
        items: &[NewRewardPackageItem],
    ) -> EconomyResult<RewardPackageDetail> {
        validate_items(items)?;
        let tx = uow.tx()?;
        let package = tx
            .find_reward_package(id)
            .await?
            .ok_or(EconomyError::PackageNotFound(id))?;
        let items = tx.replace_reward_package_items(id, items).await?;
        Ok(RewardPackageDetail { package, items })
    }

    pub async fn get_package(
        &self,
        uow: &mut UnitOfWork,
        id: PackageId,
    ) -> EconomyResult<RewardPackageDetail> {
        let tx = uow.tx()?;
        let package = tx
            .find_reward_package(id)
            .await?
            .ok_or(EconomyError::PackageNotFound(id))?;
        let items = tx.list_reward_package_items(id).await?;
        Ok(RewardPackageDetail { package, items })
    }

    pub async fn list_packages(
        &self,
        uow: &mut UnitOfWork,
        page: PageRequest,
    ) -> EconomyResult<Page<RewardPackage>> {
        uow.tx()?.list_reward_packages(page).await
    }

    pub async fn delete_package(&self, uow: &mut UnitOfWork, id: PackageId) -> EconomyResult<()> {
        if !uow.tx()?.delete_reward_package(id).await? {
            return Err(EconomyError::PackageNotFound(id));
        }
        info!(package_id = %id, "reward package deleted");
        Ok(())
    }

    pub async fn records(
        &self,
        uow: &mut UnitOfWork,
        uid: Uid,
        page: PageRequest,
    ) -> EconomyResult<Page<RewardRecord>> {
        require_user(uow, uid).await?;
        uow.tx()?.list_reward_records(uid, page).await
    }

    /// Item and currency credits from packages and level-ups, newest first.
    pub async fn flows(
        &self,
        uow: &mut UnitOfWork,
        uid: Uid,
        page: PageRequest,
    ) -> EconomyResult<Page<RewardFlow>> {
        require_user(uow, uid).await?;
        uow.tx()?.list_reward_flows(uid, page).await
    }
}

fn validate_items(items: &[NewRewardPackageItem]) -> EconomyResult<()> {
    if items.is_empty() {
        return Err(EconomyError::InvalidInput(
            "reward package needs at least one item".to_string(),
        ));
    }
    for item in items {
        RewardGrant::classify(item.item_type, item.item_id, item.quantity)?;
    }
    Ok(())
}
