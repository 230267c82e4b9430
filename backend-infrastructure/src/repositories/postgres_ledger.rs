// PostgreSQL ledger store

use std::str::FromStr;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::PgPoolOptions;
use sqlx::{PgPool, Postgres, Transaction};
use tracing::info;

use backend_domain::{
    BackpackEntry, BackpackLine, CurrencyFlow, CurrencyKind, DbConfig, EconomyError,
    EconomyResult, ItemCategory, ItemId, ItemStatus, LedgerStore, LedgerTx, LevelConfig,
    LevelHistory, NewCurrencyFlow, NewLevelHistory, NewRewardFlow, NewRewardPackageItem,
    NewStoreItem, NewUser, PackageId, Page, PageRequest, RewardFlow, RewardFlowKind,
    RewardPackage, RewardPackageItem, RewardRecord, StoreItem, Uid, User, Wallet,
};

const SCHEMA: &[&str] = &[
    "CREATE SEQUENCE IF NOT EXISTS user_uid_seq START WITH 10000 MINVALUE 10000",
    r#"CREATE TABLE IF NOT EXISTS users (
        id BIGSERIAL PRIMARY KEY,
        uid BIGINT NOT NULL UNIQUE DEFAULT nextval('user_uid_seq'),
        username TEXT NOT NULL,
        email TEXT NOT NULL,
        level INTEGER NOT NULL DEFAULT 1 CHECK (level >= 1),
        experience BIGINT NOT NULL DEFAULT 0 CHECK (experience >= 0),
        total_spent BIGINT NOT NULL DEFAULT 0,
        is_deleted BOOLEAN NOT NULL DEFAULT FALSE,
        created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
        updated_at TIMESTAMPTZ NOT NULL DEFAULT now(),
        CONSTRAINT users_username_key UNIQUE (username),
        CONSTRAINT users_email_key UNIQUE (email)
    )"#,
    r#"CREATE TABLE IF NOT EXISTS wallets (
        id BIGSERIAL PRIMARY KEY,
        uid BIGINT NOT NULL REFERENCES users (uid),
        kind TEXT NOT NULL CHECK (kind IN ('coin', 'diamond')),
        balance BIGINT NOT NULL CHECK (balance >= 0),
        updated_at TIMESTAMPTZ NOT NULL DEFAULT now(),
        CONSTRAINT wallets_uid_kind_key UNIQUE (uid, kind)
    )"#,
    r#"CREATE TABLE IF NOT EXISTS currency_flows (
        id BIGSERIAL PRIMARY KEY,
        uid BIGINT NOT NULL,
        kind TEXT NOT NULL,
        amount BIGINT NOT NULL,
        store_item_id BIGINT,
        description TEXT NOT NULL,
        created_at TIMESTAMPTZ NOT NULL DEFAULT now()
    )"#,
    "CREATE INDEX IF NOT EXISTS currency_flows_uid_idx ON currency_flows (uid, id DESC)",
    r#"CREATE TABLE IF NOT EXISTS store_items (
        id BIGSERIAL PRIMARY KEY,
        name TEXT NOT NULL,
        price BIGINT NOT NULL CHECK (price >= 0),
        stock BIGINT NOT NULL CHECK (stock >= 0),
        cost_kind TEXT NOT NULL CHECK (cost_kind IN ('coin', 'diamond')),
        status TEXT NOT NULL,
        category TEXT NOT NULL,
        created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
        updated_at TIMESTAMPTZ NOT NULL DEFAULT now(),
        CONSTRAINT store_items_name_key UNIQUE (name)
    )"#,
    r#"CREATE TABLE IF NOT EXISTS backpacks (
        id BIGSERIAL PRIMARY KEY,
        uid BIGINT NOT NULL REFERENCES users (uid),
        item_id BIGINT NOT NULL REFERENCES store_items (id),
        quantity BIGINT NOT NULL CHECK (quantity >= 0),
        updated_at TIMESTAMPTZ NOT NULL DEFAULT now(),
        CONSTRAINT backpacks_uid_item_key UNIQUE (uid, item_id)
    )"#,
    r#"CREATE TABLE IF NOT EXISTS level_configs (
        level INTEGER PRIMARY KEY,
        required_exp BIGINT NOT NULL CHECK (required_exp >= 0),
        coin_reward BIGINT NOT NULL DEFAULT 0,
        diamond_reward BIGINT NOT NULL DEFAULT 0,
        discount_percent INTEGER NOT NULL DEFAULT 100 CHECK (discount_percent BETWEEN 0 AND 100),
        description TEXT NOT NULL DEFAULT ''
    )"#,
    r#"CREATE TABLE IF NOT EXISTS level_histories (
        id BIGSERIAL PRIMARY KEY,
        uid BIGINT NOT NULL,
        old_level INTEGER NOT NULL,
        new_level INTEGER NOT NULL,
        exp_gained BIGINT NOT NULL,
        experience BIGINT NOT NULL,
        coin_rewarded BIGINT NOT NULL,
        diamond_rewarded BIGINT NOT NULL,
        description TEXT NOT NULL,
        created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
        CHECK (new_level >= old_level)
    )"#,
    "CREATE INDEX IF NOT EXISTS level_histories_uid_idx ON level_histories (uid, id DESC)",
    r#"CREATE TABLE IF NOT EXISTS reward_packages (
        id BIGSERIAL PRIMARY KEY,
        name TEXT NOT NULL,
        description TEXT NOT NULL DEFAULT '',
        created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
        updated_at TIMESTAMPTZ NOT NULL DEFAULT now()
    )"#,
    r#"CREATE TABLE IF NOT EXISTS reward_package_items (
        id BIGSERIAL PRIMARY KEY,
        package_id BIGINT NOT NULL REFERENCES reward_packages (id) ON DELETE CASCADE,
        item_type INTEGER NOT NULL,
        item_id BIGINT NOT NULL,
        quantity BIGINT NOT NULL CHECK (quantity > 0),
        position INTEGER NOT NULL
    )"#,
    r#"CREATE TABLE IF NOT EXISTS reward_records (
        id BIGSERIAL PRIMARY KEY,
        uid BIGINT NOT NULL,
        package_id BIGINT NOT NULL,
        source TEXT NOT NULL,
        created_at TIMESTAMPTZ NOT NULL DEFAULT now()
    )"#,
    "CREATE INDEX IF NOT EXISTS reward_records_uid_idx ON reward_records (uid, id DESC)",
    r#"CREATE TABLE IF NOT EXISTS reward_flows (
        id BIGSERIAL PRIMARY KEY,
        uid BIGINT NOT NULL,
        kind TEXT NOT NULL,
        item_id BIGINT NOT NULL,
        quantity BIGINT NOT NULL,
        source TEXT NOT NULL,
        created_at TIMESTAMPTZ NOT NULL DEFAULT now()
    )"#,
    "CREATE INDEX IF NOT EXISTS reward_flows_uid_idx ON reward_flows (uid, id DESC)",
];

const USER_COLUMNS: &str =
    "id, uid, username, email, level, experience, total_spent, is_deleted, created_at, updated_at";
const WALLET_COLUMNS: &str = "id, uid, kind, balance, updated_at";
const FLOW_COLUMNS: &str = "id, uid, kind, amount, store_item_id, description, created_at";
const ITEM_COLUMNS: &str =
    "id, name, price, stock, cost_kind, status, category, created_at, updated_at";
const HISTORY_COLUMNS: &str = "id, uid, old_level, new_level, exp_gained, experience, \
     coin_rewarded, diamond_rewarded, description, created_at";
const LEVEL_COLUMNS: &str =
    "level, required_exp, coin_reward, diamond_reward, discount_percent, description";
const PACKAGE_COLUMNS: &str = "id, name, description, created_at, updated_at";
const PACKAGE_ITEM_COLUMNS: &str = "id, package_id, item_type, item_id, quantity";
const RECORD_COLUMNS: &str = "id, uid, package_id, source, created_at";
const REWARD_FLOW_COLUMNS: &str = "id, uid, kind, item_id, quantity, source, created_at";

fn db_err(err: sqlx::Error) -> EconomyError {
    EconomyError::Persistence(anyhow::Error::new(err))
}

fn is_unique_violation(err: &sqlx::Error) -> bool {
    err.as_database_error()
        .map(|db| db.is_unique_violation())
        .unwrap_or(false)
}

// 22003: numeric_value_out_of_range
fn is_out_of_range(err: &sqlx::Error) -> bool {
    err.as_database_error()
        .and_then(|db| db.code())
        .map_or(false, |code| code == "22003")
}

fn is_foreign_key_violation(err: &sqlx::Error) -> bool {
    err.as_database_error()
        .map(|db| db.is_foreign_key_violation())
        .unwrap_or(false)
}

fn lock_clause(lock: bool) -> &'static str {
    if lock {
        " FOR UPDATE"
    } else {
        ""
    }
}

fn corrupt(column: &str, value: &str) -> EconomyError {
    EconomyError::Persistence(anyhow::anyhow!(
        "unexpected value '{}' in column {}",
        value,
        column
    ))
}

fn parse_kind(value: &str) -> EconomyResult<CurrencyKind> {
    CurrencyKind::from_str(value).map_err(|_| corrupt("kind", value))
}

#[derive(sqlx::FromRow)]
struct UserRow {
    id: i64,
    uid: i64,
    username: String,
    email: String,
    level: i32,
    experience: i64,
    total_spent: i64,
    is_deleted: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<UserRow> for User {
    fn from(row: UserRow) -> Self {
        User {
            id: row.id,
            uid: Uid(row.uid),
            username: row.username,
            email: row.email,
            level: row.level,
            experience: row.experience,
            total_spent: row.total_spent,
            is_deleted: row.is_deleted,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[derive(sqlx::FromRow)]
struct WalletRow {
    id: i64,
    uid: i64,
    kind: String,
    balance: i64,
    updated_at: DateTime<Utc>,
}

impl TryFrom<WalletRow> for Wallet {
    type Error = EconomyError;

    fn try_from(row: WalletRow) -> Result<Self, Self::Error> {
        Ok(Wallet {
            id: row.id,
            uid: Uid(row.uid),
            kind: parse_kind(&row.kind)?,
            balance: row.balance,
            updated_at: row.updated_at,
        })
    }
}

#[derive(sqlx::FromRow)]
struct FlowRow {
    id: i64,
    uid: i64,
    kind: String,
    amount: i64,
    store_item_id: Option<i64>,
    description: String,
    created_at: DateTime<Utc>,
}

impl TryFrom<FlowRow> for CurrencyFlow {
    type Error = EconomyError;

    fn try_from(row: FlowRow) -> Result<Self, Self::Error> {
        Ok(CurrencyFlow {
            id: row.id,
            uid: Uid(row.uid),
            kind: parse_kind(&row.kind)?,
            amount: row.amount,
            store_item_id: row.store_item_id.map(ItemId),
            description: row.description,
            created_at: row.created_at,
        })
    }
}

#[derive(sqlx::FromRow)]
struct ItemRow {
    id: i64,
    name: String,
    price: i64,
    stock: i64,
    cost_kind: String,
    status: String,
    category: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<ItemRow> for StoreItem {
    type Error = EconomyError;

    fn try_from(row: ItemRow) -> Result<Self, Self::Error> {
        Ok(StoreItem {
            id: ItemId(row.id),
            cost_kind: parse_kind(&row.cost_kind)?,
            status: ItemStatus::from_str(&row.status).map_err(|_| corrupt("status", &row.status))?,
            category: ItemCategory::from_str(&row.category)
                .map_err(|_| corrupt("category", &row.category))?,
            name: row.name,
            price: row.price,
            stock: row.stock,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

#[derive(sqlx::FromRow)]
struct BackpackRow {
    id: i64,
    uid: i64,
    item_id: i64,
    quantity: i64,
}

#[derive(sqlx::FromRow)]
struct BackpackLineRow {
    item_id: i64,
    name: String,
    quantity: i64,
}

#[derive(sqlx::FromRow)]
struct LevelRow {
    level: i32,
    required_exp: i64,
    coin_reward: i64,
    diamond_reward: i64,
    discount_percent: i32,
    description: String,
}

impl From<LevelRow> for LevelConfig {
    fn from(row: LevelRow) -> Self {
        LevelConfig {
            level: row.level,
            required_exp: row.required_exp,
            coin_reward: row.coin_reward,
            diamond_reward: row.diamond_reward,
            discount_percent: row.discount_percent,
            description: row.description,
        }
    }
}

#[derive(sqlx::FromRow)]
struct HistoryRow {
    id: i64,
    uid: i64,
    old_level: i32,
    new_level: i32,
    exp_gained: i64,
    experience: i64,
    coin_rewarded: i64,
    diamond_rewarded: i64,
    description: String,
    created_at: DateTime<Utc>,
}

impl From<HistoryRow> for LevelHistory {
    fn from(row: HistoryRow) -> Self {
        LevelHistory {
            id: row.id,
            uid: Uid(row.uid),
            old_level: row.old_level,
            new_level: row.new_level,
            exp_gained: row.exp_gained,
            experience: row.experience,
            coin_rewarded: row.coin_rewarded,
            diamond_rewarded: row.diamond_rewarded,
            description: row.description,
            created_at: row.created_at,
        }
    }
}

#[derive(sqlx::FromRow)]
struct PackageRow {
    id: i64,
    name: String,
    description: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<PackageRow> for RewardPackage {
    fn from(row: PackageRow) -> Self {
        RewardPackage {
            id: PackageId(row.id),
            name: row.name,
            description: row.description,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[derive(sqlx::FromRow)]
struct PackageItemRow {
    id: i64,
    package_id: i64,
    item_type: i32,
    item_id: i64,
    quantity: i64,
}

impl From<PackageItemRow> for RewardPackageItem {
    fn from(row: PackageItemRow) -> Self {
        RewardPackageItem {
            id: row.id,
            package_id: PackageId(row.package_id),
            item_type: row.item_type,
            item_id: row.item_id,
            quantity: row.quantity,
        }
    }
}

#[derive(sqlx::FromRow)]
struct RecordRow {
    id: i64,
    uid: i64,
    package_id: i64,
    source: String,
    created_at: DateTime<Utc>,
}

impl From<RecordRow> for RewardRecord {
    fn from(row: RecordRow) -> Self {
        RewardRecord {
            id: row.id,
            uid: Uid(row.uid),
            package_id: PackageId(row.package_id),
            source: row.source,
            created_at: row.created_at,
        }
    }
}

#[derive(sqlx::FromRow)]
struct RewardFlowRow {
    id: i64,
    uid: i64,
    kind: String,
    item_id: i64,
    quantity: i64,
    source: String,
    created_at: DateTime<Utc>,
}

impl TryFrom<RewardFlowRow> for RewardFlow {
    type Error = EconomyError;

    fn try_from(row: RewardFlowRow) -> Result<Self, Self::Error> {
        Ok(RewardFlow {
            id: row.id,
            uid: Uid(row.uid),
            kind: RewardFlowKind::parse(&row.kind).ok_or_else(|| corrupt("kind", &row.kind))?,
            item_id: row.item_id,
            quantity: row.quantity,
            source: row.source,
            created_at: row.created_at,
        })
    }
}

fn page_bounds(page: PageRequest) -> (i64, i64) {
    let limit = i64::from(page.page_size());
    let offset = i64::try_from(page.offset()).unwrap_or(i64::MAX);
    (limit, offset)
}

fn into_page<T>(items: Vec<T>, total: i64, page: PageRequest) -> Page<T> {
    Page {
        items,
        total: u64::try_from(total).unwrap_or(0),
        page: page.page(),
        page_size: page.page_size(),
    }
}

pub struct PgLedgerStore {
    pool: PgPool,
}

impl PgLedgerStore {
    pub async fn connect(config: &DbConfig) -> anyhow::Result<Self> {
        let url = config
            .database_url
            .as_deref()
            .ok_or_else(|| anyhow::anyhow!("database_url is not configured"))?;
        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .connect(url)
            .await?;
        info!(max_connections = config.max_connections, "connected to postgres");
        Ok(Self { pool })
    }

    pub async fn ensure_schema(&self) -> anyhow::Result<()> {
        for statement in SCHEMA {
            sqlx::query(statement).execute(&self.pool).await?;
        }
        Ok(())
    }
}

#[async_trait]
impl LedgerStore for PgLedgerStore {
    async fn begin(&self) -> EconomyResult<Box<dyn LedgerTx>> {
        let tx = self.pool.begin().await.map_err(db_err)?;
        Ok(Box::new(PgLedgerTx { tx }))
    }

    async fn ping(&self) -> anyhow::Result<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}

/// Rolled back by sqlx when dropped without commit.
pub struct PgLedgerTx {
    tx: Transaction<'static, Postgres>,
}

impl PgLedgerTx {
    async fn fetch_user(&mut self, uid: Uid, lock: bool) -> EconomyResult<Option<User>> {
        let sql = format!(
            "SELECT {} FROM users WHERE uid = $1{}",
            USER_COLUMNS,
            lock_clause(lock)
        );
        let row = sqlx::query_as::<_, UserRow>(&sql)
            .bind(uid.0)
            .fetch_optional(&mut *self.tx)
            .await
            .map_err(db_err)?;
        Ok(row.map(User::from))
    }

    async fn fetch_wallet(
        &mut self,
        uid: Uid,
        kind: CurrencyKind,
        lock: bool,
    ) -> EconomyResult<Option<Wallet>> {
        let sql = format!(
            "SELECT {} FROM wallets WHERE uid = $1 AND kind = $2{}",
            WALLET_COLUMNS,
            lock_clause(lock)
        );
        let row = sqlx::query_as::<_, WalletRow>(&sql)
            .bind(uid.0)
            .bind(kind.as_str())
            .fetch_optional(&mut *self.tx)
            .await
            .map_err(db_err)?;
        row.map(Wallet::try_from).transpose()
    }

    async fn fetch_item(&mut self, id: ItemId, lock: bool) -> EconomyResult<Option<StoreItem>> {
        let sql = format!(
            "SELECT {} FROM store_items WHERE id = $1{}",
            ITEM_COLUMNS,
            lock_clause(lock)
        );
        let row = sqlx::query_as::<_, ItemRow>(&sql)
            .bind(id.0)
            .fetch_optional(&mut *self.tx)
            .await
            .map_err(db_err)?;
        row.map(StoreItem::try_from).transpose()
    }

    async fn count(&mut self, sql: &str, uid: Option<Uid>) -> EconomyResult<i64> {
        let query = sqlx::query_scalar::<_, i64>(sql);
        let query = match uid {
            Some(uid) => query.bind(uid.0),
            None => query,
        };
        query.fetch_one(&mut *self.tx).await.map_err(db_err)
    }
}

#[async_trait]
impl LedgerTx for PgLedgerTx {
    async fn find_user(&mut self, uid: Uid) -> EconomyResult<Option<User>> {
        self.fetch_user(uid, false).await
    }

    async fn lock_user(&mut self, uid: Uid) -> EconomyResult<Option<User>> {
        self.fetch_user(uid, true).await
    }

    async fn user_identity_taken(&mut self, username: &str, email: &str) -> EconomyResult<bool> {
        sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS (SELECT 1 FROM users WHERE username = $1 OR email = $2)",
        )
        .bind(username)
        .bind(email)
        .fetch_one(&mut *self.tx)
        .await
        .map_err(db_err)
    }

    async fn insert_user(&mut self, user: &NewUser) -> EconomyResult<User> {
        let sql = format!(
            "INSERT INTO users (username, email) VALUES ($1, $2) RETURNING {}",
            USER_COLUMNS
        );
        let row = sqlx::query_as::<_, UserRow>(&sql)
            .bind(&user.username)
            .bind(&user.email)
            .fetch_one(&mut *self.tx)
            .await
            .map_err(|err| {
                if is_unique_violation(&err) {
                    EconomyError::UserAlreadyExists
                } else {
                    db_err(err)
                }
            })?;
        Ok(row.into())
    }

    async fn save_user_progress(
        &mut self,
        uid: Uid,
        level: i32,
        experience: i64,
    ) -> EconomyResult<()> {
        let result = sqlx::query(
            "UPDATE users SET level = $2, experience = $3, updated_at = now() \
             WHERE uid = $1 AND level <= $2",
        )
        .bind(uid.0)
        .bind(level)
        .bind(experience)
        .execute(&mut *self.tx)
        .await
        .map_err(db_err)?;
        if result.rows_affected() == 0 {
            return Err(EconomyError::UserNotFound(uid));
        }
        Ok(())
    }

    async fn add_total_spent(&mut self, uid: Uid, amount: i64) -> EconomyResult<()> {
        sqlx::query(
            "UPDATE users SET total_spent = total_spent + $2, updated_at = now() WHERE uid = $1",
        )
        .bind(uid.0)
        .bind(amount)
        .execute(&mut *self.tx)
        .await
        .map_err(db_err)?;
        Ok(())
    }

    async fn find_wallet(
        &mut self,
        uid: Uid,
        kind: CurrencyKind,
    ) -> EconomyResult<Option<Wallet>> {
        self.fetch_wallet(uid, kind, false).await
    }

    async fn lock_wallet(
        &mut self,
        uid: Uid,
        kind: CurrencyKind,
    ) -> EconomyResult<Option<Wallet>> {
        self.fetch_wallet(uid, kind, true).await
    }

    async fn insert_wallet(
        &mut self,
        uid: Uid,
        kind: CurrencyKind,
        balance: i64,
    ) -> EconomyResult<Wallet> {
        let sql = format!(
            "INSERT INTO wallets (uid, kind, balance) VALUES ($1, $2, $3) RETURNING {}",
            WALLET_COLUMNS
        );
        let row = sqlx::query_as::<_, WalletRow>(&sql)
            .bind(uid.0)
            .bind(kind.as_str())
            .bind(balance)
            .fetch_one(&mut *self.tx)
            .await
            .map_err(|err| {
                if is_unique_violation(&err) {
                    EconomyError::WalletAlreadyInitialized { uid, kind }
                } else {
                    db_err(err)
                }
            })?;
        Wallet::try_from(row)
    }

    async fn save_wallet_balance(&mut self, wallet_id: i64, balance: i64) -> EconomyResult<()> {
        sqlx::query("UPDATE wallets SET balance = $2, updated_at = now() WHERE id = $1")
            .bind(wallet_id)
            .bind(balance)
            .execute(&mut *self.tx)
            .await
            .map_err(db_err)?;
        Ok(())
    }

    async fn list_wallets(&mut self, uid: Uid) -> EconomyResult<Vec<Wallet>> {
        let sql = format!(
            "SELECT {} FROM wallets WHERE uid = $1 ORDER BY kind",
            WALLET_COLUMNS
        );
        let rows = sqlx::query_as::<_, WalletRow>(&sql)
            .bind(uid.0)
            .fetch_all(&mut *self.tx)
            .await
            .map_err(db_err)?;
        rows.into_iter().map(Wallet::try_from).collect()
    }

    async fn insert_currency_flow(&mut self, flow: &NewCurrencyFlow) -> EconomyResult<CurrencyFlow> {
        let sql = format!(
            "INSERT INTO currency_flows (uid, kind, amount, store_item_id, description) \
             VALUES ($1, $2, $3, $4, $5) RETURNING {}",
            FLOW_COLUMNS
        );
        let row = sqlx::query_as::<_, FlowRow>(&sql)
            .bind(flow.uid.0)
            .bind(flow.kind.as_str())
            .bind(flow.amount)
            .bind(flow.store_item_id.map(|id| id.0))
            .bind(&flow.description)
            .fetch_one(&mut *self.tx)
            .await
            .map_err(db_err)?;
        CurrencyFlow::try_from(row)
    }

    async fn list_currency_flows(
        &mut self,
        uid: Uid,
        page: PageRequest,
    ) -> EconomyResult<Page<CurrencyFlow>> {
        let total = self
            .count("SELECT COUNT(*) FROM currency_flows WHERE uid = $1", Some(uid))
            .await?;
        let (limit, offset) = page_bounds(page);
        let sql = format!(
            "SELECT {} FROM currency_flows WHERE uid = $1 ORDER BY id DESC LIMIT $2 OFFSET $3",
            FLOW_COLUMNS
        );
        let rows = sqlx::query_as::<_, FlowRow>(&sql)
            .bind(uid.0)
            .bind(limit)
            .bind(offset)
            .fetch_all(&mut *self.tx)
            .await
            .map_err(db_err)?;
        let items = rows
            .into_iter()
            .map(CurrencyFlow::try_from)
            .collect::<EconomyResult<Vec<_>>>()?;
        Ok(into_page(items, total, page))
    }

    async fn find_store_item(&mut self, id: ItemId) -> EconomyResult<Option<StoreItem>> {
        self.fetch_item(id, false).await
    }

    async fn lock_store_item(&mut self, id: ItemId) -> EconomyResult<Option<StoreItem>> {
        self.fetch_item(id, true).await
    }

    async fn insert_store_item(&mut self, item: &NewStoreItem) -> EconomyResult<StoreItem> {
        let sql = format!(
            "INSERT INTO store_items (name, price, stock, cost_kind, status, category) \
             VALUES ($1, $2, $3, $4, $5, $6) RETURNING {}",
            ITEM_COLUMNS
        );
        let row = sqlx::query_as::<_, ItemRow>(&sql)
            .bind(&item.name)
            .bind(item.price)
            .bind(item.stock)
            .bind(item.cost_kind.as_str())
            .bind(item.status.as_str())
            .bind(item.category.as_str())
            .fetch_one(&mut *self.tx)
            .await
            .map_err(|err| {
                if is_unique_violation(&err) {
                    EconomyError::DuplicateItemName(item.name.clone())
                } else {
                    db_err(err)
                }
            })?;
        StoreItem::try_from(row)
    }

    async fn save_store_stock(&mut self, id: ItemId, stock: i64) -> EconomyResult<()> {
        sqlx::query("UPDATE store_items SET stock = $2, updated_at = now() WHERE id = $1")
            .bind(id.0)
            .bind(stock)
            .execute(&mut *self.tx)
            .await
            .map_err(db_err)?;
        Ok(())
    }

    async fn lock_backpack_entry(
        &mut self,
        uid: Uid,
        item: ItemId,
    ) -> EconomyResult<Option<BackpackEntry>> {
        let row = sqlx::query_as::<_, BackpackRow>(
            "SELECT id, uid, item_id, quantity FROM backpacks \
             WHERE uid = $1 AND item_id = $2 FOR UPDATE",
        )
        .bind(uid.0)
        .bind(item.0)
        .fetch_optional(&mut *self.tx)
        .await
        .map_err(db_err)?;
        Ok(row.map(|row| BackpackEntry {
            id: row.id,
            uid: Uid(row.uid),
            item_id: ItemId(row.item_id),
            quantity: row.quantity,
        }))
    }

    async fn upsert_backpack_increment(
        &mut self,
        uid: Uid,
        item: ItemId,
        quantity: i64,
    ) -> EconomyResult<BackpackEntry> {
        let row = sqlx::query_as::<_, BackpackRow>(
            "INSERT INTO backpacks (uid, item_id, quantity) VALUES ($1, $2, $3) \
             ON CONFLICT (uid, item_id) DO UPDATE \
             SET quantity = backpacks.quantity + EXCLUDED.quantity, updated_at = now() \
             RETURNING id, uid, item_id, quantity",
        )
        .bind(uid.0)
        .bind(item.0)
        .bind(quantity)
        .fetch_one(&mut *self.tx)
        .await
        .map_err(|err| {
            if is_out_of_range(&err) {
                EconomyError::AmountOverflow
            } else if is_foreign_key_violation(&err) {
                EconomyError::ItemNotFound(item)
            } else {
                db_err(err)
            }
        })?;
        Ok(BackpackEntry {
            id: row.id,
            uid: Uid(row.uid),
            item_id: ItemId(row.item_id),
            quantity: row.quantity,
        })
    }

    async fn save_backpack_quantity(&mut self, entry_id: i64, quantity: i64) -> EconomyResult<()> {
        sqlx::query("UPDATE backpacks SET quantity = $2, updated_at = now() WHERE id = $1")
            .bind(entry_id)
            .bind(quantity)
            .execute(&mut *self.tx)
            .await
            .map_err(db_err)?;
        Ok(())
    }

    async fn list_backpack(&mut self, uid: Uid) -> EconomyResult<Vec<BackpackLine>> {
        let rows = sqlx::query_as::<_, BackpackLineRow>(
            "SELECT b.item_id, s.name, b.quantity FROM backpacks b \
             JOIN store_items s ON s.id = b.item_id \
             WHERE b.uid = $1 AND b.quantity > 0 ORDER BY b.item_id",
        )
        .bind(uid.0)
        .fetch_all(&mut *self.tx)
        .await
        .map_err(db_err)?;
        Ok(rows
            .into_iter()
            .map(|row| BackpackLine {
                item_id: ItemId(row.item_id),
                name: row.name,
                quantity: row.quantity,
            })
            .collect())
    }

    async fn list_level_configs(&mut self) -> EconomyResult<Vec<LevelConfig>> {
        let sql = format!("SELECT {} FROM level_configs ORDER BY level", LEVEL_COLUMNS);
        let rows = sqlx::query_as::<_, LevelRow>(&sql)
            .fetch_all(&mut *self.tx)
            .await
            .map_err(db_err)?;
        Ok(rows.into_iter().map(LevelConfig::from).collect())
    }

    async fn find_level_config(&mut self, level: i32) -> EconomyResult<Option<LevelConfig>> {
        let sql = format!("SELECT {} FROM level_configs WHERE level = $1", LEVEL_COLUMNS);
        let row = sqlx::query_as::<_, LevelRow>(&sql)
            .bind(level)
            .fetch_optional(&mut *self.tx)
            .await
            .map_err(db_err)?;
        Ok(row.map(LevelConfig::from))
    }

    async fn upsert_level_config(&mut self, config: &LevelConfig) -> EconomyResult<()> {
        sqlx::query(
            "INSERT INTO level_configs \
             (level, required_exp, coin_reward, diamond_reward, discount_percent, description) \
             VALUES ($1, $2, $3, $4, $5, $6) \
             ON CONFLICT (level) DO UPDATE SET \
             required_exp = EXCLUDED.required_exp, coin_reward = EXCLUDED.coin_reward, \
             diamond_reward = EXCLUDED.diamond_reward, \
             discount_percent = EXCLUDED.discount_percent, description = EXCLUDED.description",
        )
        .bind(config.level)
        .bind(config.required_exp)
        .bind(config.coin_reward)
        .bind(config.diamond_reward)
        .bind(config.discount_percent)
        .bind(&config.description)
        .execute(&mut *self.tx)
        .await
        .map_err(db_err)?;
        Ok(())
    }

    async fn insert_level_history(
        &mut self,
        history: &NewLevelHistory,
    ) -> EconomyResult<LevelHistory> {
        let sql = format!(
            "INSERT INTO level_histories (uid, old_level, new_level, exp_gained, experience, \
             coin_rewarded, diamond_rewarded, description) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8) RETURNING {}",
            HISTORY_COLUMNS
        );
        let row = sqlx::query_as::<_, HistoryRow>(&sql)
            .bind(history.uid.0)
            .bind(history.old_level)
            .bind(history.new_level)
            .bind(history.exp_gained)
            .bind(history.experience)
            .bind(history.coin_rewarded)
            .bind(history.diamond_rewarded)
            .bind(&history.description)
            .fetch_one(&mut *self.tx)
            .await
            .map_err(db_err)?;
        Ok(row.into())
    }

    async fn list_level_history(
        &mut self,
        uid: Uid,
        page: PageRequest,
    ) -> EconomyResult<Page<LevelHistory>> {
        let total = self
            .count("SELECT COUNT(*) FROM level_histories WHERE uid = $1", Some(uid))
            .await?;
        let (limit, offset) = page_bounds(page);
        let sql = format!(
            "SELECT {} FROM level_histories WHERE uid = $1 ORDER BY id DESC LIMIT $2 OFFSET $3",
            HISTORY_COLUMNS
        );
        let rows = sqlx::query_as::<_, HistoryRow>(&sql)
            .bind(uid.0)
            .bind(limit)
            .bind(offset)
            .fetch_all(&mut *self.tx)
            .await
            .map_err(db_err)?;
        Ok(into_page(
            rows.into_iter().map(LevelHistory::from).collect(),
            total,
            page,
        ))
    }

    async fn find_reward_package(&mut self, id: PackageId) -> EconomyResult<Option<RewardPackage>> {
        let sql = format!("SELECT {} FROM reward_packages WHERE id = $1", PACKAGE_COLUMNS);
        let row = sqlx::query_as::<_, PackageRow>(&sql)
            .bind(id.0)
            .fetch_optional(&mut *self.tx)
            .await
            .map_err(db_err)?;
        Ok(row.map(RewardPackage::from))
    }

    async fn list_reward_package_items(
        &mut self,
        id: PackageId,
    ) -> EconomyResult<Vec<RewardPackageItem>> {
        let sql = format!(
            "SELECT {} FROM reward_package_items WHERE package_id = $1 ORDER BY position, id",
            PACKAGE_ITEM_COLUMNS
        );
        let rows = sqlx::query_as::<_, PackageItemRow>(&sql)
            .bind(id.0)
            .fetch_all(&mut *self.tx)
            .await
            .map_err(db_err)?;
        Ok(rows.into_iter().map(RewardPackageItem::from).collect())
    }

    async fn insert_reward_package(
        &mut self,
        name: &str,
        description: &str,
    ) -> EconomyResult<RewardPackage> {
        let sql = format!(
            "INSERT INTO reward_packages (name, description) VALUES ($1, $2) RETURNING {}",
            PACKAGE_COLUMNS
        );
        let row = sqlx::query_as::<_, PackageRow>(&sql)
            .bind(name)
            .bind(description)
            .fetch_one(&mut *self.tx)
            .await
            .map_err(db_err)?;
        Ok(row.into())
    }

    async fn replace_reward_package_items(
        &mut self,
        id: PackageId,
        items: &[NewRewardPackageItem],
    ) -> EconomyResult<Vec<RewardPackageItem>> {
        let touched = sqlx::query("UPDATE reward_packages SET updated_at = now() WHERE id = $1")
            .bind(id.0)
            .execute(&mut *self.tx)
            .await
            .map_err(db_err)?;
        if touched.rows_affected() == 0 {
            return Err(EconomyError::PackageNotFound(id));
        }
        sqlx::query("DELETE FROM reward_package_items WHERE package_id = $1")
            .bind(id.0)
            .execute(&mut *self.tx)
            .await
            .map_err(db_err)?;

        let sql = format!(
            "INSERT INTO reward_package_items (package_id, item_type, item_id, quantity, position) \
             VALUES ($1, $2, $3, $4, $5) RETURNING {}",
            PACKAGE_ITEM_COLUMNS
        );
        let mut created = Vec::with_capacity(items.len());
        for (position, item) in items.iter().enumerate() {
            let position = i32::try_from(position).map_err(|_| EconomyError::AmountOverflow)?;
            let row = sqlx::query_as::<_, PackageItemRow>(&sql)
                .bind(id.0)
                .bind(item.item_type)
                .bind(item.item_id)
                .bind(item.quantity)
                .bind(position)
                .fetch_one(&mut *self.tx)
                .await
                .map_err(db_err)?;
            created.push(row.into());
        }
        Ok(created)
    }

    async fn delete_reward_package(&mut self, id: PackageId) -> EconomyResult<bool> {
        let result = sqlx::query("DELETE FROM reward_packages WHERE id = $1")
            .bind(id.0)
            .execute(&mut *self.tx)
            .await
            .map_err(db_err)?;
        Ok(result.rows_affected() > 0)
    }

    async fn list_reward_packages(
        &mut self,
        page: PageRequest,
    ) -> EconomyResult<Page<RewardPackage>> {
        let total = self.count("SELECT COUNT(*) FROM reward_packages", None).await?;
        let (limit, offset) = page_bounds(page);
        let sql = format!(
            "SELECT {} FROM reward_packages ORDER BY id DESC LIMIT $1 OFFSET $2",
            PACKAGE_COLUMNS
        );
        let rows = sqlx::query_as::<_, PackageRow>(&sql)
            .bind(limit)
            .bind(offset)
            .fetch_all(&mut *self.tx)
            .await
            .map_err(db_err)?;
        Ok(into_page(
            rows.into_iter().map(RewardPackage::from).collect(),
            total,
            page,
        ))
    }

    async fn insert_reward_record(
        &mut self,
        uid: Uid,
        package_id: PackageId,
        source: &str,
    ) -> EconomyResult<RewardRecord> {
        let sql = format!(
            "INSERT INTO reward_records (uid, package_id, source) VALUES ($1, $2, $3) RETURNING {}",
            RECORD_COLUMNS
        );
        let row = sqlx::query_as::<_, RecordRow>(&sql)
            .bind(uid.0)
            .bind(package_id.0)
            .bind(source)
            .fetch_one(&mut *self.tx)
            .await
            .map_err(db_err)?;
        Ok(row.into())
    }

    async fn list_reward_records(
        &mut self,
        uid: Uid,
        page: PageRequest,
    ) -> EconomyResult<Page<RewardRecord>> {
        let total = self
            .count("SELECT COUNT(*) FROM reward_records WHERE uid = $1", Some(uid))
            .await?;
        let (limit, offset) = page_bounds(page);
        let sql = format!(
            "SELECT {} FROM reward_records WHERE uid = $1 ORDER BY id DESC LIMIT $2 OFFSET $3",
            RECORD_COLUMNS
        );
        let rows = sqlx::query_as::<_, RecordRow>(&sql)
            .bind(uid.0)
            .bind(limit)
            .bind(offset)
            .fetch_all(&mut *self.tx)
            .await
            .map_err(db_err)?;
        Ok(into_page(
            rows.into_iter().map(RewardRecord::from).collect(),
            total,
            page,
        ))
    }

    async fn insert_reward_flow(&mut self, flow: &NewRewardFlow) -> EconomyResult<RewardFlow> {
        let sql = format!(
            "INSERT INTO reward_flows (uid, kind, item_id, quantity, source) \
             VALUES ($1, $2, $3, $4, $5) RETURNING {}",
            REWARD_FLOW_COLUMNS
        );
        let row = sqlx::query_as::<_, RewardFlowRow>(&sql)
            .bind(flow.uid.0)
            .bind(flow.kind.as_str())
            .bind(flow.item_id)
            .bind(flow.quantity)
            .bind(&flow.source)
            .fetch_one(&mut *self.tx)
            .await
            .map_err(db_err)?;
        RewardFlow::try_from(row)
    }

    async fn list_reward_flows(
        &mut self,
        uid: Uid,
        page: PageRequest,
    ) -> EconomyResult<Page<RewardFlow>> {
        let total = self
            .count("SELECT COUNT(*) FROM reward_flows WHERE uid = $1", Some(uid))
            .await?;
        let (limit, offset) = page_bounds(page);
        let sql = format!(
            "SELECT {} FROM reward_flows WHERE uid = $1 ORDER BY id DESC LIMIT $2 OFFSET $3",
            REWARD_FLOW_COLUMNS
        );
        let rows = sqlx::query_as::<_, RewardFlowRow>(&sql)
            .bind(uid.0)
            .bind(limit)
            .bind(offset)
            .fetch_all(&mut *self.tx)
            .await
            .map_err(db_err)?;
        let items = rows
            .into_iter()
            .map(RewardFlow::try_from)
            .collect::<EconomyResult<Vec<_>>>()?;
        Ok(into_page(items, total, page))
    }

    async fn commit(self: Box<Self>) -> EconomyResult<()> {
        let this = *self;
        this.tx.commit().await.map_err(db_err)
    }

    async fn rollback(self: Box<Self>) -> EconomyResult<()> {
        let this = *self;
        this.tx.rollback().await.map_err(db_err)
    }
}
