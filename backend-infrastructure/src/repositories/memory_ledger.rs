// In-process ledger store for development and tests

use std::collections::BTreeMap;
use std::sync::Arc;

use anyhow::anyhow;
use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::{Mutex, OwnedMutexGuard};

use backend_domain::{
    BackpackEntry, BackpackLine, CurrencyFlow, CurrencyKind, EconomyError, EconomyResult, ItemId,
    LedgerStore, LedgerTx, LevelConfig, LevelHistory, NewCurrencyFlow, NewLevelHistory,
    NewRewardFlow, NewRewardPackageItem, NewStoreItem, NewUser, PackageId, Page, PageRequest,
    RewardFlow, RewardPackage, RewardPackageItem, RewardRecord, StoreItem, Uid, User, Wallet,
};

#[derive(Debug, Clone, Default)]
struct Sequences {
    user: i64,
    wallet: i64,
    currency_flow: i64,
    store_item: i64,
    backpack: i64,
    level_history: i64,
    package: i64,
    package_item: i64,
    reward_record: i64,
    reward_flow: i64,
}

fn bump(counter: &mut i64) -> i64 {
    *counter += 1;
    *counter
}

#[derive(Debug, Clone, Default)]
struct Tables {
    seq: Sequences,
    users: BTreeMap<Uid, User>,
    wallets: BTreeMap<(Uid, CurrencyKind), Wallet>,
    currency_flows: Vec<CurrencyFlow>,
    store_items: BTreeMap<ItemId, StoreItem>,
    backpack: BTreeMap<(Uid, ItemId), BackpackEntry>,
    level_configs: BTreeMap<i32, LevelConfig>,
    level_history: Vec<LevelHistory>,
    packages: BTreeMap<PackageId, RewardPackage>,
    package_items: Vec<RewardPackageItem>,
    reward_records: Vec<RewardRecord>,
    reward_flows: Vec<RewardFlow>,
}

/// Ledger store kept in memory. A transaction holds the store lock for its
/// whole lifetime and works on a private copy of the tables, so concurrent
/// transactions run one after another. Commit publishes the copy; dropping
/// the transaction discards it.
#[derive(Clone, Default)]
pub struct MemoryLedgerStore {
    tables: Arc<Mutex<Tables>>,
}

impl MemoryLedgerStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl LedgerStore for MemoryLedgerStore {
    async fn begin(&self) -> EconomyResult<Box<dyn LedgerTx>> {
        let guard = self.tables.clone().lock_owned().await;
        let working = guard.clone();
        Ok(Box::new(MemoryLedgerTx { guard, working }))
    }

    async fn ping(&self) -> anyhow::Result<()> {
        Ok(())
    }
}

pub struct MemoryLedgerTx {
    guard: OwnedMutexGuard<Tables>,
    working: Tables,
}

fn page_of<T: Clone>(mut rows: Vec<T>, page: PageRequest) -> Page<T> {
    let total = rows.len() as u64;
    let offset = usize::try_from(page.offset()).unwrap_or(usize::MAX);
    let items = if offset >= rows.len() {
        Vec::new()
    } else {
        rows.drain(offset..)
            .take(page.page_size() as usize)
            .collect()
    };
    Page {
        items,
        total,
        page: page.page(),
        page_size: page.page_size(),
    }
}

fn constraint_violation(message: &str) -> EconomyError {
    EconomyError::Persistence(anyhow!("constraint violation: {}", message))
}

#[async_trait]
impl LedgerTx for MemoryLedgerTx {
    async fn find_user(&mut self, uid: Uid) -> EconomyResult<Option<User>> {
        Ok(self.working.users.get(&uid).cloned())
    }

    async fn lock_user(&mut self, uid: Uid) -> EconomyResult<Option<User>> {
        self.find_user(uid).await
    }

    async fn user_identity_taken(&mut self, username: &str, email: &str) -> EconomyResult<bool> {
        Ok(self
            .working
            .users
            .values()
            .any(|user| user.username == username || user.email == email))
    }

    async fn insert_user(&mut self, user: &NewUser) -> EconomyResult<User> {
        if self.user_identity_taken(&user.username, &user.email).await? {
            return Err(EconomyError::UserAlreadyExists);
        }
        let uid = self
            .working
            .users
            .keys()
            .next_back()
            .map(|last| last.next())
            .unwrap_or(Uid::FIRST);
        let now = Utc::now();
        let created = User {
            id: bump(&mut self.working.seq.user),
            uid,
            username: user.username.clone(),
            email: user.email.clone(),
            level: 1,
            experience: 0,
            total_spent: 0,
            is_deleted: false,
            created_at: now,
            updated_at: now,
        };
        self.working.users.insert(uid, created.clone());
        Ok(created)
    }

    async fn save_user_progress(
        &mut self,
        uid: Uid,
        level: i32,
        experience: i64,
    ) -> EconomyResult<()> {
        let user = self
            .working
            .users
            .get_mut(&uid)
            .ok_or(EconomyError::UserNotFound(uid))?;
        if level < user.level {
            return Err(constraint_violation("user level must not decrease"));
        }
        user.level = level;
        user.experience = experience;
        user.updated_at = Utc::now();
        Ok(())
    }

    async fn add_total_spent(&mut self, uid: Uid, amount: i64) -> EconomyResult<()> {
        let user = self
            .working
            .users
            .get_mut(&uid)
            .ok_or(EconomyError::UserNotFound(uid))?;
        user.total_spent = user
            .total_spent
            .checked_add(amount)
            .ok_or(EconomyError::AmountOverflow)?;
        user.updated_at = Utc::now();
        Ok(())
    }

    async fn find_wallet(
        &mut self,
        uid: Uid,
        kind: CurrencyKind,
    ) -> EconomyResult<Option<Wallet>> {
        Ok(self.working.wallets.get(&(uid, kind)).cloned())
    }

    async fn lock_wallet(
        &mut self,
        uid: Uid,
        kind: CurrencyKind,
    ) -> EconomyResult<Option<Wallet>> {
        self.find_wallet(uid, kind).await
    }

    async fn insert_wallet(
        &mut self,
        uid: Uid,
        kind: CurrencyKind,
        balance: i64,
    ) -> EconomyResult<Wallet> {
        if self.working.wallets.contains_key(&(uid, kind)) {
            return Err(EconomyError::WalletAlreadyInitialized { uid, kind });
        }
        if !self.working.users.contains_key(&uid) {
            return Err(constraint_violation("wallet owner does not exist"));
        }
        let wallet = Wallet {
            id: bump(&mut self.working.seq.wallet),
            uid,
            kind,
            balance,
            updated_at: Utc::now(),
        };
        self.working.wallets.insert((uid, kind), wallet.clone());
        Ok(wallet)
    }

    async fn save_wallet_balance(&mut self, wallet_id: i64, balance: i64) -> EconomyResult<()> {
        if balance < 0 {
            return Err(constraint_violation("wallet balance must not be negative"));
        }
        let wallet = self
            .working
            .wallets
            .values_mut()
            .find(|wallet| wallet.id == wallet_id)
            .ok_or_else(|| EconomyError::Persistence(anyhow!("wallet {} vanished", wallet_id)))?;
        wallet.balance = balance;
        wallet.updated_at = Utc::now();
        Ok(())
    }

    async fn list_wallets(&mut self, uid: Uid) -> EconomyResult<Vec<Wallet>> {
        Ok(self
            .working
            .wallets
            .values()
            .filter(|wallet| wallet.uid == uid)
            .cloned()
            .collect())
    }

    async fn insert_currency_flow(&mut self, flow: &NewCurrencyFlow) -> EconomyResult<CurrencyFlow> {
        let row = CurrencyFlow {
            id: bump(&mut self.working.seq.currency_flow),
            uid: flow.uid,
            kind: flow.kind,
            amount: flow.amount,
            store_item_id: flow.store_item_id,
            description: flow.description.clone(),
            created_at: Utc::now(),
        };
        self.working.currency_flows.push(row.clone());
        Ok(row)
    }

    async fn list_currency_flows(
        &mut self,
        uid: Uid,
        page: PageRequest,
    ) -> EconomyResult<Page<CurrencyFlow>> {
        let rows = self
            .working
            .currency_flows
            .iter()
            .rev()
            .filter(|flow| flow.uid == uid)
            .cloned()
            .collect();
        Ok(page_of(rows, page))
    }

    async fn find_store_item(&mut self, id: ItemId) -> EconomyResult<Option<StoreItem>> {
        Ok(self.working.store_items.get(&id).cloned())
    }

    async fn lock_store_item(&mut self, id: ItemId) -> EconomyResult<Option<StoreItem>> {
        self.find_store_item(id).await
    }

    async fn insert_store_item(&mut self, item: &NewStoreItem) -> EconomyResult<StoreItem> {
        if self
            .working
            .store_items
            .values()
            .any(|existing| existing.name == item.name)
        {
            return Err(EconomyError::DuplicateItemName(item.name.clone()));
        }
        let now = Utc::now();
        let created = StoreItem {
            id: ItemId(bump(&mut self.working.seq.store_item)),
            name: item.name.clone(),
            price: item.price,
            stock: item.stock,
            cost_kind: item.cost_kind,
            status: item.status,
            category: item.category,
            created_at: now,
            updated_at: now,
        };
        self.working.store_items.insert(created.id, created.clone());
        Ok(created)
    }

    async fn save_store_stock(&mut self, id: ItemId, stock: i64) -> EconomyResult<()> {
        if stock < 0 {
            return Err(constraint_violation("stock must not be negative"));
        }
        let item = self
            .working
            .store_items
            .get_mut(&id)
            .ok_or(EconomyError::ItemNotFound(id))?;
        item.stock = stock;
        item.updated_at = Utc::now();
        Ok(())
    }

    async fn lock_backpack_entry(
        &mut self,
        uid: Uid,
        item: ItemId,
    ) -> EconomyResult<Option<BackpackEntry>> {
        Ok(self.working.backpack.get(&(uid, item)).cloned())
    }

    async fn upsert_backpack_increment(
        &mut self,
        uid: Uid,
        item: ItemId,
        quantity: i64,
    ) -> EconomyResult<BackpackEntry> {
        if !self.working.store_items.contains_key(&item) {
            return Err(EconomyError::ItemNotFound(item));
        }
        if let Some(entry) = self.working.backpack.get_mut(&(uid, item)) {
            entry.quantity = entry
                .quantity
                .checked_add(quantity)
                .ok_or(EconomyError::AmountOverflow)?;
            return Ok(entry.clone());
        }
        let entry = BackpackEntry {
            id: bump(&mut self.working.seq.backpack),
            uid,
            item_id: item,
            quantity,
        };
        self.working.backpack.insert((uid, item), entry.clone());
        Ok(entry)
    }

    async fn save_backpack_quantity(&mut self, entry_id: i64, quantity: i64) -> EconomyResult<()> {
        if quantity < 0 {
            return Err(constraint_violation("backpack quantity must not be negative"));
        }
        let entry = self
            .working
            .backpack
            .values_mut()
            .find(|entry| entry.id == entry_id)
            .ok_or_else(|| {
                EconomyError::Persistence(anyhow!("backpack entry {} vanished", entry_id))
            })?;
        entry.quantity = quantity;
        Ok(())
    }

    async fn list_backpack(&mut self, uid: Uid) -> EconomyResult<Vec<BackpackLine>> {
        let items = &self.working.store_items;
        Ok(self
            .working
            .backpack
            .values()
            .filter(|entry| entry.uid == uid && entry.quantity > 0)
            .map(|entry| BackpackLine {
                item_id: entry.item_id,
                name: items
                    .get(&entry.item_id)
                    .map(|item| item.name.clone())
                    .unwrap_or_default(),
                quantity: entry.quantity,
            })
            .collect())
    }

    async fn list_level_configs(&mut self) -> EconomyResult<Vec<LevelConfig>> {
        Ok(self.working.level_configs.values().cloned().collect())
    }

    async fn find_level_config(&mut self, level: i32) -> EconomyResult<Option<LevelConfig>> {
        Ok(self.working.level_configs.get(&level).cloned())
    }

    async fn upsert_level_config(&mut self, config: &LevelConfig) -> EconomyResult<()> {
        self.working
            .level_configs
            .insert(config.level, config.clone());
        Ok(())
    }

    async fn insert_level_history(
        &mut self,
        history: &NewLevelHistory,
    ) -> EconomyResult<LevelHistory> {
        if history.new_level < history.old_level {
            return Err(constraint_violation("level history must not regress"));
        }
        let row = LevelHistory {
            id: bump(&mut self.working.seq.level_history),
            uid: history.uid,
            old_level: history.old_level,
            new_level: history.new_level,
            exp_gained: history.exp_gained,
            experience: history.experience,
            coin_rewarded: history.coin_rewarded,
            diamond_rewarded: history.diamond_rewarded,
            description: history.description.clone(),
            created_at: Utc::now(),
        };
        self.working.level_history.push(row.clone());
        Ok(row)
    }

    async fn list_level_history(
        &mut self,
        uid: Uid,
        page: PageRequest,
    ) -> EconomyResult<Page<LevelHistory>> {
        let rows = self
            .working
            .level_history
            .iter()
            .rev()
            .filter(|row| row.uid == uid)
            .cloned()
            .collect();
        Ok(page_of(rows, page))
    }

    async fn find_reward_package(&mut self, id: PackageId) -> EconomyResult<Option<RewardPackage>> {
        Ok(self.working.packages.get(&id).cloned())
    }

    async fn list_reward_package_items(
        &mut self,
        id: PackageId,
    ) -> EconomyResult<Vec<RewardPackageItem>> {
        Ok(self
            .working
            .package_items
            .iter()
            .filter(|item| item.package_id == id)
            .cloned()
            .collect())
    }

    async fn insert_reward_package(
        &mut self,
        name: &str,
        description: &str,
    ) -> EconomyResult<RewardPackage> {
        let now = Utc::now();
        let package = RewardPackage {
            id: PackageId(bump(&mut self.working.seq.package)),
            name: name.to_string(),
            description: description.to_string(),
            created_at: now,
            updated_at: now,
        };
        self.working.packages.insert(package.id, package.clone());
        Ok(package)
    }

    async fn replace_reward_package_items(
        &mut self,
        id: PackageId,
        items: &[NewRewardPackageItem],
    ) -> EconomyResult<Vec<RewardPackageItem>> {
        let package = self
            .working
            .packages
            .get_mut(&id)
            .ok_or(EconomyError::PackageNotFound(id))?;
        package.updated_at = Utc::now();
        self.working
            .package_items
            .retain(|item| item.package_id != id);
        let mut created = Vec::with_capacity(items.len());
        for item in items {
            let row = RewardPackageItem {
                id: bump(&mut self.working.seq.package_item),
                package_id: id,
                item_type: item.item_type,
                item_id: item.item_id,
                quantity: item.quantity,
            };
            self.working.package_items.push(row.clone());
            created.push(row);
        }
        Ok(created)
    }

    async fn delete_reward_package(&mut self, id: PackageId) -> EconomyResult<bool> {
        if self.working.packages.remove(&id).is_none() {
            return Ok(false);
        }
        self.working
            .package_items
            .retain(|item| item.package_id != id);
        Ok(true)
    }

    async fn list_reward_packages(
        &mut self,
        page: PageRequest,
    ) -> EconomyResult<Page<RewardPackage>> {
        let rows = self.working.packages.values().rev().cloned().collect();
        Ok(page_of(rows, page))
    }

    async fn insert_reward_record(
        &mut self,
        uid: Uid,
        package_id: PackageId,
        source: &str,
    ) -> EconomyResult<RewardRecord> {
        let record = RewardRecord {
            id: bump(&mut self.working.seq.reward_record),
            uid,
            package_id,
            source: source.to_string(),
            created_at: Utc::now(),
        };
        self.working.reward_records.push(record.clone());
        Ok(record)
    }

    async fn list_reward_records(
        &mut self,
        uid: Uid,
        page: PageRequest,
    ) -> EconomyResult<Page<RewardRecord>> {
        let rows = self
            .working
            .reward_records
            .iter()
            .rev()
            .filter(|record| record.uid == uid)
            .cloned()
            .collect();
        Ok(page_of(rows, page))
    }

    async fn insert_reward_flow(&mut self, flow: &NewRewardFlow) -> EconomyResult<RewardFlow> {
        let row = RewardFlow {
            id: bump(&mut self.working.seq.reward_flow),
            uid: flow.uid,
            kind: flow.kind,
            item_id: flow.item_id,
            quantity: flow.quantity,
            source: flow.source.clone(),
            created_at: Utc::now(),
        };
        self.working.reward_flows.push(row.clone());
        Ok(row)
    }

    async fn list_reward_flows(
        &mut self,
        uid: Uid,
        page: PageRequest,
    ) -> EconomyResult<Page<RewardFlow>> {
        let rows = self
            .working
            .reward_flows
            .iter()
            .rev()
            .filter(|flow| flow.uid == uid)
            .cloned()
            .collect();
        Ok(page_of(rows, page))
    }

    async fn commit(self: Box<Self>) -> EconomyResult<()> {
        let MemoryLedgerTx { mut guard, working } = *self;
        *guard = working;
        Ok(())
    }

    async fn rollback(self: Box<Self>) -> EconomyResult<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_user(name: &str) -> NewUser {
        NewUser {
            username: name.to_string(),
            email: format!("{}@example.com", name),
        }
    }

    #[tokio::test]
    async fn uids_start_at_first_and_increase() {
        let store = MemoryLedgerStore::new();
        let mut tx = store.begin().await.unwrap();
        let first = tx.insert_user(&new_user("ada")).await.unwrap();
        let second = tx.insert_user(&new_user("grace")).await.unwrap();
        tx.commit().await.unwrap();
        assert_eq!(first.uid, Uid::FIRST);
        assert_eq!(second.uid, Uid(10_001));
    }

    #[tokio::test]
    async fn dropped_transaction_discards_writes() {
        let store = MemoryLedgerStore::new();
        {
            let mut tx = store.begin().await.unwrap();
            tx.insert_user(&new_user("ada")).await.unwrap();
        }
        let mut tx = store.begin().await.unwrap();
        assert!(tx.find_user(Uid::FIRST).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn enforces_unique_wallet_and_non_negative_balance() {
        let store = MemoryLedgerStore::new();
        let mut tx = store.begin().await.unwrap();
        let user = tx.insert_user(&new_user("ada")).await.unwrap();
        let wallet = tx
            .insert_wallet(user.uid, CurrencyKind::Coin, 10)
            .await
            .unwrap();
        assert!(matches!(
            tx.insert_wallet(user.uid, CurrencyKind::Coin, 10).await,
            Err(EconomyError::WalletAlreadyInitialized { .. })
        ));
        assert!(tx.save_wallet_balance(wallet.id, -1).await.is_err());
    }

    #[tokio::test]
    async fn pages_are_clamped_and_newest_first() {
        let store = MemoryLedgerStore::new();
        let mut tx = store.begin().await.unwrap();
        let user = tx.insert_user(&new_user("ada")).await.unwrap();
        for amount in 1..=12 {
            tx.insert_currency_flow(&NewCurrencyFlow {
                uid: user.uid,
                kind: CurrencyKind::Coin,
                amount,
                store_item_id: None,
                description: String::new(),
            })
            .await
            .unwrap();
        }
        let page = tx
            .list_currency_flows(user.uid, PageRequest::default())
            .await
            .unwrap();
        assert_eq!(page.total, 12);
        assert_eq!(page.items.len(), 10);
        assert_eq!(page.items[0].amount, 12);

        let second = tx
            .list_currency_flows(
                user.uid,
                PageRequest {
                    page: Some(2),
                    page_size: None,
                },
            )
            .await
            .unwrap();
        assert_eq!(second.items.len(), 2);
        assert_eq!(second.items[1].amount, 1);
    }

    #[tokio::test]
    async fn backpack_upsert_creates_then_increments_one_row() {
        let store = MemoryLedgerStore::new();
        let mut tx = store.begin().await.unwrap();
        let user = tx.insert_user(&new_user("ada")).await.unwrap();
        let item = tx
            .insert_store_item(&NewStoreItem {
                name: "Potion".to_string(),
                price: 10,
                stock: 5,
                cost_kind: CurrencyKind::Coin,
                status: backend_domain::ItemStatus::Active,
                category: backend_domain::ItemCategory::Normal,
            })
            .await
            .unwrap();

        let first = tx.upsert_backpack_increment(user.uid, item.id, 2).await.unwrap();
        let second = tx.upsert_backpack_increment(user.uid, item.id, 3).await.unwrap();
        assert_eq!(first.id, second.id);
        assert_eq!(second.quantity, 5);

        assert!(matches!(
            tx.upsert_backpack_increment(user.uid, item.id, i64::MAX).await,
            Err(EconomyError::AmountOverflow)
        ));
        assert!(matches!(
            tx.upsert_backpack_increment(user.uid, ItemId(404), 1).await,
            Err(EconomyError::ItemNotFound(ItemId(404)))
        ));
    }
}
