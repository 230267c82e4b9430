use async_trait::async_trait;

use crate::entities::{
    BackpackEntry, BackpackLine, CurrencyFlow, LevelConfig, LevelHistory, NewCurrencyFlow,
    NewLevelHistory, NewRewardFlow, NewRewardPackageItem, NewStoreItem, NewUser, Page,
    PageRequest, RewardFlow, RewardPackage, RewardPackageItem, RewardRecord, StoreItem, User,
    Wallet,
};
use crate::errors::EconomyResult;
use crate::value_objects::{CurrencyKind, ItemId, PackageId, Uid};

/// Durable relational storage for the economy. Every read and write goes
/// through a transaction obtained from [`LedgerStore::begin`].
#[async_trait]
pub trait LedgerStore: Send + Sync {
    async fn begin(&self) -> EconomyResult<Box<dyn LedgerTx>>;
    async fn ping(&self) -> anyhow::Result<()>;
}

/// One open transaction. `lock_*` reads hold an exclusive row lock until the
/// transaction ends. Dropping a transaction without committing rolls it back.
#[async_trait]
pub trait LedgerTx: Send {
    // Users
    async fn find_user(&mut self, uid: Uid) -> EconomyResult<Option<User>>;
    async fn lock_user(&mut self, uid: Uid) -> EconomyResult<Option<User>>;
    async fn user_identity_taken(&mut self, username: &str, email: &str) -> EconomyResult<bool>;
    async fn insert_user(&mut self, user: &NewUser) -> EconomyResult<User>;
    async fn save_user_progress(&mut self, uid: Uid, level: i32, experience: i64)
        -> EconomyResult<()>;
    async fn add_total_spent(&mut self, uid: Uid, amount: i64) -> EconomyResult<()>;

    // Wallets and currency flows
    async fn find_wallet(&mut self, uid: Uid, kind: CurrencyKind)
        -> EconomyResult<Option<Wallet>>;
    async fn lock_wallet(&mut self, uid: Uid, kind: CurrencyKind)
        -> EconomyResult<Option<Wallet>>;
    async fn insert_wallet(&mut self, uid: Uid, kind: CurrencyKind, balance: i64)
        -> EconomyResult<Wallet>;
    async fn save_wallet_balance(&mut self, wallet_id: i64, balance: i64) -> EconomyResult<()>;
    async fn list_wallets(&mut self, uid: Uid) -> EconomyResult<Vec<Wallet>>;
    async fn insert_currency_flow(&mut self, flow: &NewCurrencyFlow)
        -> EconomyResult<CurrencyFlow>;
    async fn list_currency_flows(&mut self, uid: Uid, page: PageRequest)
        -> EconomyResult<Page<CurrencyFlow>>;

    // Store catalogue
    async fn find_store_item(&mut self, id: ItemId) -> EconomyResult<Option<StoreItem>>;
    async fn lock_store_item(&mut self, id: ItemId) -> EconomyResult<Option<StoreItem>>;
    async fn insert_store_item(&mut self, item: &NewStoreItem) -> EconomyResult<StoreItem>;
    async fn save_store_stock(&mut self, id: ItemId, stock: i64) -> EconomyResult<()>;

    // Backpack
    async fn lock_backpack_entry(&mut self, uid: Uid, item: ItemId)
        -> EconomyResult<Option<BackpackEntry>>;
    /// Adds `quantity` to the user's row for `item`, creating it when absent,
    /// in one atomic statement. Returns the row after the increment.
    async fn upsert_backpack_increment(&mut self, uid: Uid, item: ItemId, quantity: i64)
        -> EconomyResult<BackpackEntry>;
    async fn save_backpack_quantity(&mut self, entry_id: i64, quantity: i64) -> EconomyResult<()>;
    async fn list_backpack(&mut self, uid: Uid) -> EconomyResult<Vec<BackpackLine>>;

    // Levels
    async fn list_level_configs(&mut self) -> EconomyResult<Vec<LevelConfig>>;
    async fn find_level_config(&mut self, level: i32) -> EconomyResult<Option<LevelConfig>>;
    async fn upsert_level_config(&mut self, config: &LevelConfig) -> EconomyResult<()>;
    async fn insert_level_history(&mut self, history: &NewLevelHistory)
        -> EconomyResult<LevelHistory>;
    async fn list_level_history(&mut self, uid: Uid, page: PageRequest)
        -> EconomyResult<Page<LevelHistory>>;

    // Reward packages
    async fn find_reward_package(&mut self, id: PackageId)
        -> EconomyResult<Option<RewardPackage>>;
    async fn list_reward_package_items(&mut self, id: PackageId)
        -> EconomyResult<Vec<RewardPackageItem>>;
    async fn insert_reward_package(&mut self, name: &str, description: &str)
        -> EconomyResult<RewardPackage>;
    async fn replace_reward_package_items(
        &mut self,
        id: PackageId,
        items: &[NewRewardPackageItem],
    ) -> EconomyResult<Vec<RewardPackageItem>>;
    async fn delete_reward_package(&mut self, id: PackageId) -> EconomyResult<bool>;
    async fn list_reward_packages(&mut self, page: PageRequest)
        -> EconomyResult<Page<RewardPackage>>;

    // Reward records and flows
    async fn insert_reward_record(&mut self, uid: Uid, package_id: PackageId, source: &str)
        -> EconomyResult<RewardRecord>;
    async fn list_reward_records(&mut self, uid: Uid, page: PageRequest)
        -> EconomyResult<Page<RewardRecord>>;
    async fn insert_reward_flow(&mut self, flow: &NewRewardFlow) -> EconomyResult<RewardFlow>;
    async fn list_reward_flows(&mut self, uid: Uid, page: PageRequest)
        -> EconomyResult<Page<RewardFlow>>;

    async fn commit(self: Box<Self>) -> EconomyResult<()>;
    async fn rollback(self: Box<Self>) -> EconomyResult<()>;
}

#[async_trait]
pub trait ConfigRepository: Send + Sync {
    async fn load_level_table(&self, path: &str) -> anyhow::Result<Vec<LevelConfig>>;
}
