//! Runs against a live Postgres when `HOARD_TEST_DATABASE_URL` is set and
//! passes trivially otherwise. Every test works on freshly named users and
//! items, so the suite can share one database across runs.

mod common;

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use backend_application::commands::{self, AddExperienceRequest, GrantRewardRequest};
use backend_application::{queries, AppError, AppState};
use backend_domain::{
    CurrencyKind, DbConfig, EconomyError, ItemId, NewRewardPackage, NewRewardPackageItem,
    PackageId, StoreItem, Uid, User,
};
use backend_infrastructure::PgLedgerStore;
use common::Harness;

const DATABASE_URL_VAR: &str = "HOARD_TEST_DATABASE_URL";

static SEQ: AtomicU64 = AtomicU64::new(0);

fn unique(name: &str) -> String {
    format!(
        "{}_{}_{}",
        name,
        chrono::Utc::now().timestamp_micros(),
        SEQ.fetch_add(1, Ordering::Relaxed)
    )
}

async fn pg_harness() -> Option<Harness> {
    let Ok(url) = std::env::var(DATABASE_URL_VAR) else {
        eprintln!("{} not set, skipping postgres test", DATABASE_URL_VAR);
        return None;
    };
    let store = PgLedgerStore::connect(&DbConfig {
        database_url: Some(url),
        max_connections: 16,
    })
    .await
    .expect("connect to postgres");
    store.ensure_schema().await.expect("ensure schema");
    Some(Harness::with_store(Arc::new(store), common::default_levels()).await)
}

async fn fresh_user(h: &Harness) -> User {
    h.register(&unique("player")).await
}

async fn fresh_item(h: &Harness, price: i64, stock: i64, kind: CurrencyKind) -> StoreItem {
    h.stock_item(&unique("item"), price, stock, kind).await
}

async fn package(h: &Harness, items: Vec<NewRewardPackageItem>) -> PackageId {
    commands::create_reward_package(
        &h.state,
        NewRewardPackage {
            name: unique("package"),
            description: String::new(),
            items,
        },
    )
    .await
    .expect("create package")
    .package
    .id
}

fn goods(item: ItemId, quantity: i64) -> NewRewardPackageItem {
    NewRewardPackageItem {
        item_type: 0,
        item_id: item.0,
        quantity,
    }
}

fn diamonds(amount: i64) -> NewRewardPackageItem {
    NewRewardPackageItem {
        item_type: 1,
        item_id: 0,
        quantity: amount,
    }
}

fn coins(amount: i64) -> NewRewardPackageItem {
    NewRewardPackageItem {
        item_type: 1,
        item_id: 1,
        quantity: amount,
    }
}

async fn grant(state: &AppState, uid: Uid, package_id: PackageId) -> Result<(), AppError> {
    commands::grant_reward(
        state,
        GrantRewardRequest {
            uid,
            package_id,
            source: "test".to_string(),
        },
    )
    .await
    .map(|_| ())
}

#[tokio::test]
async fn purchase_commits_debit_stock_backpack_and_history() {
    let Some(h) = pg_harness().await else {
        return;
    };
    let user = fresh_user(&h).await;
    let item = fresh_item(&h, 100, 10, CurrencyKind::Coin).await;

    let receipt = h.buy(user.uid, item.id, 3).await.expect("purchase");

    assert_eq!(receipt.charged, 300);
    assert_eq!(h.balance(user.uid, CurrencyKind::Coin).await, 700);
    assert_eq!(h.stock(item.id).await, 7);
    assert_eq!(h.held(user.uid, item.id).await, 3);

    let flows = h.flows(user.uid).await;
    assert_eq!(flows.len(), 1);
    assert_eq!(flows[0].amount, -300);
    assert_eq!(flows[0].store_item_id, Some(item.id));

    let after = h.user(user.uid).await;
    assert_eq!(after.experience, 150);
    assert_eq!(after.total_spent, 300);
    let history = h.history(user.uid).await;
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].old_level, history[0].new_level);
}

#[tokio::test]
async fn failed_grant_rolls_back_earlier_items() {
    let Some(h) = pg_harness().await else {
        return;
    };
    let user = fresh_user(&h).await;
    let item = fresh_item(&h, 10, 10, CurrencyKind::Coin).await;
    let overflowing = package(&h, vec![goods(item.id, 2), diamonds(i64::MAX), coins(10)]).await;

    let err = grant(&h.state, user.uid, overflowing)
        .await
        .expect_err("diamond credit overflows");
    assert!(matches!(err, AppError::Economy(EconomyError::AmountOverflow)));

    assert_eq!(h.held(user.uid, item.id).await, 0);
    assert_eq!(h.balance(user.uid, CurrencyKind::Diamond).await, 200);
    assert_eq!(h.balance(user.uid, CurrencyKind::Coin).await, 1000);
    assert!(h.flows(user.uid).await.is_empty());
    assert!(h.reward_records(user.uid).await.is_empty());
    assert!(h.reward_flows(user.uid).await.is_empty());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_first_grants_share_one_backpack_row() {
    let Some(h) = pg_harness().await else {
        return;
    };
    let user = fresh_user(&h).await;
    let item = fresh_item(&h, 10, 10, CurrencyKind::Coin).await;
    let single = package(&h, vec![goods(item.id, 1)]).await;
    let uid = user.uid;

    let grants: Vec<_> = (0..16)
        .map(|_| {
            let state = h.state.clone();
            tokio::spawn(async move { grant(&state, uid, single).await })
        })
        .collect();
    for handle in grants {
        handle.await.expect("join").expect("grant");
    }

    assert_eq!(h.held(user.uid, item.id).await, 16);
    assert_eq!(h.reward_records(user.uid).await.len(), 16);
    let snapshot = queries::get_backpack_snapshot(&h.state, user.uid)
        .await
        .expect("backpack");
    assert_eq!(snapshot.items.len(), 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn purchases_grants_and_level_ups_on_one_user_all_commit() {
    let Some(h) = pg_harness().await else {
        return;
    };
    let user = fresh_user(&h).await;
    let item = fresh_item(&h, 10, 1000, CurrencyKind::Coin).await;
    let bundle = package(&h, vec![goods(item.id, 1), diamonds(5)]).await;
    let (uid, item_id) = (user.uid, item.id);

    let mut tasks = Vec::new();
    for _ in 0..8 {
        let state = h.state.clone();
        tasks.push(tokio::spawn(async move {
            commands::buy_goods(
                &state,
                commands::BuyGoodsRequest {
                    uid,
                    item_id,
                    count: 1,
                },
            )
            .await
            .map(|_| ())
        }));
        let state = h.state.clone();
        tasks.push(tokio::spawn(async move {
            commands::add_experience(
                &state,
                uid,
                AddExperienceRequest {
                    exp: 100,
                    description: None,
                },
            )
            .await
            .map(|_| ())
        }));
        let state = h.state.clone();
        tasks.push(tokio::spawn(async move { grant(&state, uid, bundle).await }));
    }
    for task in tasks {
        task.await.expect("join").expect("operation");
    }

    // 8 x 5 exp from purchases plus 800 granted reaches level 2 exactly once.
    let after = h.user(user.uid).await;
    assert_eq!(after.experience, 840);
    assert_eq!(after.level, 2);
    assert_eq!(h.held(user.uid, item.id).await, 16);
    assert_eq!(h.stock(item.id).await, 992);
    assert_eq!(
        h.balance(user.uid, CurrencyKind::Coin).await,
        1000 - after.total_spent + 100
    );
    assert_eq!(h.balance(user.uid, CurrencyKind::Diamond).await, 200 + 8 * 5 + 10);
    assert_eq!(h.history(user.uid).await.len(), 16);
}
