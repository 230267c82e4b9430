#![allow(dead_code, unused_imports)]

use std::sync::Arc;
use std::time::Duration;

use backend_application::commands::{self, AdjustBalanceRequest, BuyGoodsRequest};
use backend_application::queries;
use backend_application::services::PurchaseReceipt;
use backend_application::{AppError, AppState};
use backend_domain::ports::{CachedView, ViewCache};
use backend_domain::{
    CurrencyFlow, CurrencyKind, ItemCategory, ItemId, ItemStatus, LedgerStore, LedgerTx, LevelConfig,
    LevelHistory, NewStoreItem, NewUser, PageRequest, RewardFlow, RewardRecord, RuntimeConfig,
    StoreItem, Uid, User,
};
use backend_infrastructure::{MemoryLedgerStore, MemoryViewCache};

pub fn level(
    level: i32,
    required_exp: i64,
    coin_reward: i64,
    diamond_reward: i64,
    discount_percent: i32,
) -> LevelConfig {
    LevelConfig {
        level,
        required_exp,
        coin_reward,
        diamond_reward,
        discount_percent,
        description: format!("level {}", level),
    }
}

pub fn default_levels() -> Vec<LevelConfig> {
    vec![
        level(1, 0, 0, 0, 100),
        level(2, 500, 100, 10, 95),
        level(3, 1500, 200, 20, 90),
        level(4, 3000, 300, 30, 85),
        level(5, 6000, 500, 50, 80),
    ]
}

pub struct Harness {
    pub state: AppState,
    pub store: Arc<dyn LedgerStore>,
    pub cache: Arc<MemoryViewCache>,
}

impl Harness {
    pub async fn new() -> Self {
        Self::with_levels(default_levels()).await
    }

    pub async fn with_levels(levels: Vec<LevelConfig>) -> Self {
        Self::with_store(Arc::new(MemoryLedgerStore::new()), levels).await
    }

    /// Harness over any ledger store. Seeding is a no-op when the store
    /// already holds a level table.
    pub async fn with_store(store: Arc<dyn LedgerStore>, levels: Vec<LevelConfig>) -> Self {
        let cache = Arc::new(MemoryViewCache::new());
        let state = AppState::new(RuntimeConfig::default(), store.clone(), cache.clone());
        commands::seed_level_configs(&state, levels)
            .await
            .expect("seed levels");
        Self {
            state,
            store,
            cache,
        }
    }

    /// Harness whose services talk to `cache` instead of the in-memory one.
    pub async fn with_cache(cache: Arc<dyn ViewCache>) -> (AppState, MemoryLedgerStore) {
        let store = MemoryLedgerStore::new();
        let state = AppState::new(RuntimeConfig::default(), Arc::new(store.clone()), cache);
        commands::seed_level_configs(&state, default_levels())
            .await
            .expect("seed levels");
        (state, store)
    }

    pub async fn register(&self, name: &str) -> User {
        register(&self.state, name).await
    }

    pub async fn stock_item(
        &self,
        name: &str,
        price: i64,
        stock: i64,
        kind: CurrencyKind,
    ) -> StoreItem {
        stock_item(&self.state, name, price, stock, kind).await
    }

    pub async fn buy(&self, uid: Uid, item: ItemId, count: i64) -> Result<PurchaseReceipt, AppError> {
        commands::buy_goods(
            &self.state,
            BuyGoodsRequest {
                uid,
                item_id: item,
                count,
            },
        )
        .await
    }

    pub async fn balance(&self, uid: Uid, kind: CurrencyKind) -> i64 {
        queries::get_wallet(&self.state, uid, kind)
            .await
            .expect("wallet")
            .balance
    }

    pub async fn adjust(&self, uid: Uid, kind: CurrencyKind, amount: i64) {
        commands::update_wallet_balance(
            &self.state,
            uid,
            kind,
            AdjustBalanceRequest {
                amount,
                description: Some("test top-up".to_string()),
            },
        )
        .await
        .expect("adjust balance");
    }

    pub async fn flows(&self, uid: Uid) -> Vec<CurrencyFlow> {
        queries::list_currency_flows(
            &self.state,
            uid,
            PageRequest {
                page: Some(1),
                page_size: Some(100),
            },
        )
        .await
        .expect("flows")
        .items
    }

    pub async fn history(&self, uid: Uid) -> Vec<LevelHistory> {
        queries::get_level_history(
            &self.state,
            uid,
            PageRequest {
                page: Some(1),
                page_size: Some(100),
            },
        )
        .await
        .expect("history")
        .items
    }

    pub async fn stock(&self, item: ItemId) -> i64 {
        queries::get_store_item(&self.state, item)
            .await
            .expect("store item")
            .stock
    }

    /// Reads the backpack row straight from the store, bypassing the cache.
    pub async fn held(&self, uid: Uid, item: ItemId) -> i64 {
        let mut tx = self.store.begin().await.expect("begin");
        let entry = tx.lock_backpack_entry(uid, item).await.expect("entry");
        tx.rollback().await.expect("rollback");
        entry.map(|entry| entry.quantity).unwrap_or(0)
    }

    /// Reward flows of a user, oldest first.
    pub async fn reward_flows(&self, uid: Uid) -> Vec<RewardFlow> {
        let mut flows = queries::list_reward_flows(&self.state, uid, everything())
            .await
            .expect("reward flows")
            .items;
        flows.reverse();
        flows
    }

    /// Reward records of a user, oldest first.
    pub async fn reward_records(&self, uid: Uid) -> Vec<RewardRecord> {
        let mut records = queries::list_reward_records(&self.state, uid, everything())
            .await
            .expect("reward records")
            .items;
        records.reverse();
        records
    }

    pub async fn is_cached(&self, uid: Uid, view: CachedView) -> bool {
        self.cache
            .get_view(uid, view)
            .await
            .expect("cache read")
            .value
            .is_some()
    }

    /// Writes raw bytes over a cached view regardless of what the store holds.
    pub async fn plant(&self, uid: Uid, view: CachedView, bytes: &[u8]) {
        let seen = self.cache.get_view(uid, view).await.expect("cache read");
        let stored = self
            .cache
            .set_view(uid, view, bytes, Duration::from_secs(3600), seen.generation)
            .await
            .expect("cache write");
        assert!(stored, "planted view was refused");
    }

    pub async fn user(&self, uid: Uid) -> User {
        let mut tx = self.store.begin().await.expect("begin");
        let user = tx.find_user(uid).await.expect("user").expect("user exists");
        tx.rollback().await.expect("rollback");
        user
    }
}

pub fn everything() -> PageRequest {
    PageRequest {
        page: Some(1),
        page_size: Some(100),
    }
}

pub async fn register(state: &AppState, name: &str) -> User {
    commands::register_user(
        state,
        NewUser {
            username: name.to_string(),
            email: format!("{}@example.com", name),
        },
    )
    .await
    .expect("register user")
}

pub async fn stock_item(
    state: &AppState,
    name: &str,
    price: i64,
    stock: i64,
    kind: CurrencyKind,
) -> StoreItem {
    commands::create_store_item(
        state,
        NewStoreItem {
            name: name.to_string(),
            price,
            stock,
            cost_kind: kind,
            status: ItemStatus::Active,
            category: ItemCategory::Normal,
        },
    )
    .await
    .expect("create store item")
}
