mod common;

use backend_application::commands::{self, GrantRewardRequest};
use backend_application::{queries, AppError};
use backend_domain::{
    CurrencyKind, EconomyError, ItemId, LedgerStore, LedgerTx, NewRewardPackage,
    NewRewardPackageItem, PackageId, PageRequest, RewardFlowKind, RewardRecord, Uid,
};
use common::Harness;

fn goods(item: ItemId, quantity: i64) -> NewRewardPackageItem {
    NewRewardPackageItem {
        item_type: 0,
        item_id: item.0,
        quantity,
    }
}

fn currency(kind: CurrencyKind, amount: i64) -> NewRewardPackageItem {
    NewRewardPackageItem {
        item_type: 1,
        item_id: match kind {
            CurrencyKind::Diamond => 0,
            CurrencyKind::Coin => 1,
        },
        quantity: amount,
    }
}

async fn create_package(h: &Harness, name: &str, items: Vec<NewRewardPackageItem>) -> PackageId {
    commands::create_reward_package(
        &h.state,
        NewRewardPackage {
            name: name.to_string(),
            description: String::new(),
            items,
        },
    )
    .await
    .expect("create package")
    .package
    .id
}

/// Writes package rows directly, skipping the validation the command applies.
async fn raw_package(h: &Harness, items: Vec<NewRewardPackageItem>) -> PackageId {
    let mut tx = h.store.begin().await.expect("begin");
    let package = tx
        .insert_reward_package("raw", "")
        .await
        .expect("insert package");
    tx.replace_reward_package_items(package.id, &items)
        .await
        .expect("insert items");
    tx.commit().await.expect("commit");
    package.id
}

async fn grant(h: &Harness, uid: Uid, package_id: PackageId) -> Result<RewardRecord, AppError> {
    commands::grant_reward(
        &h.state,
        GrantRewardRequest {
            uid,
            package_id,
            source: "event".to_string(),
        },
    )
    .await
}

async fn assert_nothing_granted(h: &Harness, uid: Uid, item: ItemId) {
    assert_eq!(h.balance(uid, CurrencyKind::Coin).await, 1000);
    assert_eq!(h.balance(uid, CurrencyKind::Diamond).await, 200);
    assert_eq!(h.held(uid, item).await, 0);
    assert!(h.flows(uid).await.is_empty());
    assert!(h.reward_records(uid).await.is_empty());
    assert!(h.reward_flows(uid).await.is_empty());
}

#[tokio::test]
async fn package_with_goods_and_diamonds_is_applied_once() {
    let h = Harness::new().await;
    let user = h.register("ada").await;
    let mut last = None;
    for index in 1..=7 {
        last = Some(
            h.stock_item(&format!("Item {index}"), 10, 100, CurrencyKind::Coin)
                .await,
        );
    }
    let item = last.expect("seventh item");
    assert_eq!(item.id, ItemId(7));
    let package = create_package(
        &h,
        "starter",
        vec![goods(ItemId(7), 2), currency(CurrencyKind::Diamond, 50)],
    )
    .await;

    let record = grant(&h, user.uid, package).await.expect("grant");

    assert_eq!(record.uid, user.uid);
    assert_eq!(record.package_id, package);
    assert_eq!(record.source, "event");
    assert_eq!(h.held(user.uid, ItemId(7)).await, 2);
    assert_eq!(h.balance(user.uid, CurrencyKind::Diamond).await, 250);
    assert_eq!(h.balance(user.uid, CurrencyKind::Coin).await, 1000);

    let flows = h.flows(user.uid).await;
    assert_eq!(flows.len(), 1);
    assert_eq!(flows[0].kind, CurrencyKind::Diamond);
    assert_eq!(flows[0].amount, 50);

    assert_eq!(h.reward_records(user.uid).await.len(), 1);
    let rewards = h.reward_flows(user.uid).await;
    assert_eq!(rewards.len(), 2);
    assert_eq!(rewards[0].kind, RewardFlowKind::Item);
    assert_eq!(rewards[0].item_id, 7);
    assert_eq!(rewards[0].quantity, 2);
    assert_eq!(rewards[1].kind, RewardFlowKind::Diamond);

    // Granting does not touch the store's stock.
    assert_eq!(h.stock(ItemId(7)).await, 100);
}

#[tokio::test]
async fn failing_middle_item_discards_the_whole_grant() {
    let h = Harness::new().await;
    let user = h.register("ada").await;
    let item = h.stock_item("Potion", 10, 10, CurrencyKind::Coin).await;
    let package = create_package(
        &h,
        "broken",
        vec![
            currency(CurrencyKind::Coin, 100),
            goods(ItemId(999), 1),
            goods(item.id, 3),
        ],
    )
    .await;

    let err = grant(&h, user.uid, package).await.expect_err("missing goods");
    assert!(matches!(
        err,
        AppError::Economy(EconomyError::ItemNotFound(ItemId(999)))
    ));
    assert_nothing_granted(&h, user.uid, item.id).await;
}

#[tokio::test]
async fn unknown_currency_code_fails_the_grant() {
    let h = Harness::new().await;
    let user = h.register("ada").await;
    let item = h.stock_item("Potion", 10, 10, CurrencyKind::Coin).await;
    let package = raw_package(
        &h,
        vec![
            goods(item.id, 1),
            NewRewardPackageItem {
                item_type: 1,
                item_id: 5,
                quantity: 10,
            },
        ],
    )
    .await;

    let err = grant(&h, user.uid, package).await.expect_err("bad code");
    assert!(matches!(
        err,
        AppError::Economy(EconomyError::UnsupportedRewardKind {
            item_type: 1,
            item_id: 5
        })
    ));
    assert_nothing_granted(&h, user.uid, item.id).await;
}

#[tokio::test]
async fn missing_or_empty_package_is_refused() {
    let h = Harness::new().await;
    let user = h.register("ada").await;

    let err = grant(&h, user.uid, PackageId(77)).await.expect_err("missing");
    assert!(matches!(
        err,
        AppError::Economy(EconomyError::PackageNotFound(PackageId(77)))
    ));

    let empty = raw_package(&h, Vec::new()).await;
    let err = grant(&h, user.uid, empty).await.expect_err("empty");
    assert!(matches!(err, AppError::Economy(EconomyError::EmptyPackage(_))));
    assert!(h.reward_records(user.uid).await.is_empty());

    let coins = create_package(&h, "coins", vec![currency(CurrencyKind::Coin, 5)]).await;
    let err = grant(&h, Uid(55_555), coins).await.expect_err("no user");
    assert!(matches!(err, AppError::Economy(EconomyError::UserNotFound(_))));
}

#[tokio::test]
async fn packages_can_be_managed() {
    let h = Harness::new().await;
    let item = h.stock_item("Potion", 10, 10, CurrencyKind::Coin).await;

    let err = commands::create_reward_package(
        &h.state,
        NewRewardPackage {
            name: "nothing".to_string(),
            description: String::new(),
            items: Vec::new(),
        },
    )
    .await
    .expect_err("empty package");
    assert!(matches!(err, AppError::Economy(EconomyError::InvalidInput(_))));

    let err = commands::create_reward_package(
        &h.state,
        NewRewardPackage {
            name: "negative".to_string(),
            description: String::new(),
            items: vec![goods(item.id, -1)],
        },
    )
    .await
    .expect_err("negative quantity");
    assert!(matches!(
        err,
        AppError::Economy(EconomyError::NonPositiveQuantity(-1))
    ));

    let first = create_package(&h, "first", vec![goods(item.id, 1)]).await;
    let second = create_package(&h, "second", vec![currency(CurrencyKind::Coin, 1)]).await;

    let replaced = commands::replace_reward_package_items(
        &h.state,
        first,
        vec![goods(item.id, 2), currency(CurrencyKind::Diamond, 3)],
    )
    .await
    .expect("replace items");
    assert_eq!(replaced.items.len(), 2);

    let detail = queries::get_reward_package(&h.state, first)
        .await
        .expect("get package");
    assert_eq!(detail.items[0].quantity, 2);
    assert_eq!(detail.items[1].item_type, 1);

    let page = queries::list_reward_packages(&h.state, PageRequest::default())
        .await
        .expect("list packages");
    assert_eq!(page.total, 2);
    assert_eq!(page.items[0].id, second);

    commands::delete_reward_package(&h.state, first)
        .await
        .expect("delete");
    let err = queries::get_reward_package(&h.state, first)
        .await
        .expect_err("deleted");
    assert!(matches!(err, AppError::Economy(EconomyError::PackageNotFound(_))));
    let err = commands::delete_reward_package(&h.state, first)
        .await
        .expect_err("deleted twice");
    assert!(matches!(err, AppError::Economy(EconomyError::PackageNotFound(_))));
}

#[tokio::test]
async fn reward_records_are_paged_newest_first() {
    let h = Harness::new().await;
    let user = h.register("ada").await;
    let package = create_package(&h, "daily", vec![currency(CurrencyKind::Coin, 1)]).await;
    for _ in 0..12 {
        grant(&h, user.uid, package).await.expect("grant");
    }

    let first = queries::list_reward_records(
        &h.state,
        user.uid,
        PageRequest {
            page: None,
            page_size: Some(500),
        },
    )
    .await
    .expect("records");
    assert_eq!(first.page_size, 100);
    assert_eq!(first.total, 12);
    assert!(first.items[0].id > first.items[11].id);

    let second = queries::list_reward_records(
        &h.state,
        user.uid,
        PageRequest {
            page: Some(2),
            page_size: Some(5),
        },
    )
    .await
    .expect("records");
    assert_eq!(second.items.len(), 5);
    assert_eq!(h.balance(user.uid, CurrencyKind::Coin).await, 1012);
}
