mod common;

use backend_application::commands::{
    self, AdjustBalanceRequest, ConsumeItemRequest, TransferItemRequest,
};
use backend_application::{queries, AppError};
use backend_domain::ports::CachedView;
use backend_domain::{CurrencyKind, EconomyError, ItemId, NewUser, PageRequest, Uid};
use common::Harness;

fn adjustment(amount: i64) -> AdjustBalanceRequest {
    AdjustBalanceRequest {
        amount,
        description: None,
    }
}

#[tokio::test]
async fn registration_seeds_both_wallets() {
    let h = Harness::new().await;
    let ada = h.register("ada").await;
    let bob = h.register("bob").await;

    assert_eq!(ada.uid, Uid::FIRST);
    assert_eq!(bob.uid, Uid::FIRST.next());
    assert_eq!(ada.level, 1);
    assert_eq!(ada.experience, 0);
    assert_eq!(h.balance(ada.uid, CurrencyKind::Coin).await, 1000);
    assert_eq!(h.balance(ada.uid, CurrencyKind::Diamond).await, 200);
    assert!(h.flows(ada.uid).await.is_empty());

    let wallets = queries::get_user_wallets(&h.state, ada.uid)
        .await
        .expect("wallets");
    assert_eq!(wallets.len(), 2);
}

#[tokio::test]
async fn duplicate_registration_and_wallets_are_refused() {
    let h = Harness::new().await;
    let ada = h.register("ada").await;

    let err = commands::register_user(
        &h.state,
        NewUser {
            username: "  ada ".to_string(),
            email: "other@example.com".to_string(),
        },
    )
    .await
    .expect_err("duplicate username");
    assert!(matches!(err, AppError::Economy(EconomyError::UserAlreadyExists)));

    let err = commands::register_user(
        &h.state,
        NewUser {
            username: "eve".to_string(),
            email: "not-an-email".to_string(),
        },
    )
    .await
    .expect_err("bad email");
    assert!(matches!(err, AppError::Economy(EconomyError::InvalidInput(_))));

    let mut uow = h.state.begin().await.expect("begin");
    let result = h
        .state
        .services
        .wallets
        .initialize_wallet(&mut uow, ada.uid)
        .await;
    let err = uow.finish(result).await.expect_err("already initialized");
    assert!(matches!(
        err,
        EconomyError::WalletAlreadyInitialized {
            kind: CurrencyKind::Coin,
            ..
        }
    ));
    assert_eq!(h.balance(ada.uid, CurrencyKind::Coin).await, 1000);
}

#[tokio::test]
async fn balance_adjustments_are_recorded_and_bounded() {
    let h = Harness::new().await;
    let ada = h.register("ada").await;

    let wallet = commands::update_wallet_balance(
        &h.state,
        ada.uid,
        CurrencyKind::Diamond,
        adjustment(50),
    )
    .await
    .expect("credit");
    assert_eq!(wallet.balance, 250);

    let wallet =
        commands::update_wallet_balance(&h.state, ada.uid, CurrencyKind::Diamond, adjustment(-250))
            .await
            .expect("debit to zero");
    assert_eq!(wallet.balance, 0);

    let err =
        commands::update_wallet_balance(&h.state, ada.uid, CurrencyKind::Diamond, adjustment(-1))
            .await
            .expect_err("overdraw");
    assert!(matches!(
        err,
        AppError::Economy(EconomyError::InsufficientFunds {
            required: 1,
            available: 0,
            ..
        })
    ));

    let err =
        commands::update_wallet_balance(&h.state, ada.uid, CurrencyKind::Coin, adjustment(0))
            .await
            .expect_err("zero");
    assert!(matches!(err, AppError::Economy(EconomyError::InvalidInput(_))));

    let err =
        commands::update_wallet_balance(&h.state, Uid(99_999), CurrencyKind::Coin, adjustment(5))
            .await
            .expect_err("unknown user");
    assert!(matches!(err, AppError::Economy(EconomyError::UserNotFound(_))));

    let flows = h.flows(ada.uid).await;
    assert_eq!(flows.len(), 2);
    assert_eq!(flows[0].amount, -250);
    assert_eq!(flows[0].description, "manual adjustment");
    assert_eq!(flows[1].amount, 50);
    assert!(flows.iter().all(|flow| flow.store_item_id.is_none()));

    let page = queries::list_currency_flows(
        &h.state,
        ada.uid,
        PageRequest {
            page: Some(2),
            page_size: Some(1),
        },
    )
    .await
    .expect("second page");
    assert_eq!(page.total, 2);
    assert_eq!(page.items.len(), 1);
    assert_eq!(page.items[0].amount, 50);
}

#[tokio::test]
async fn consuming_items_checks_what_is_held() {
    let h = Harness::new().await;
    let ada = h.register("ada").await;
    let potion = h.stock_item("Potion", 10, 20, CurrencyKind::Coin).await;
    h.buy(ada.uid, potion.id, 3).await.expect("buy");

    let left = commands::consume_item(
        &h.state,
        ada.uid,
        ConsumeItemRequest {
            item_id: potion.id,
            quantity: 2,
        },
    )
    .await
    .expect("consume");
    assert_eq!(left.quantity, 1);

    let err = commands::consume_item(
        &h.state,
        ada.uid,
        ConsumeItemRequest {
            item_id: potion.id,
            quantity: 5,
        },
    )
    .await
    .expect_err("too many");
    assert!(matches!(
        err,
        AppError::Economy(EconomyError::InsufficientQuantity {
            requested: 5,
            held: 1,
            ..
        })
    ));

    let err = commands::consume_item(
        &h.state,
        ada.uid,
        ConsumeItemRequest {
            item_id: ItemId(404),
            quantity: 1,
        },
    )
    .await
    .expect_err("never held");
    assert!(matches!(
        err,
        AppError::Economy(EconomyError::BackpackEntryNotFound { .. })
    ));

    let err = commands::consume_item(
        &h.state,
        ada.uid,
        ConsumeItemRequest {
            item_id: potion.id,
            quantity: 0,
        },
    )
    .await
    .expect_err("zero");
    assert!(matches!(
        err,
        AppError::Economy(EconomyError::NonPositiveQuantity(0))
    ));
    assert_eq!(h.held(ada.uid, potion.id).await, 1);
}

#[tokio::test]
async fn transfers_move_items_atomically() {
    let h = Harness::new().await;
    let ada = h.register("ada").await;
    let bob = h.register("bob").await;
    let potion = h.stock_item("Potion", 10, 20, CurrencyKind::Coin).await;
    h.buy(ada.uid, potion.id, 5).await.expect("buy");

    let balances = commands::transfer_item(
        &h.state,
        ada.uid,
        TransferItemRequest {
            to_uid: bob.uid,
            item_id: potion.id,
            quantity: 3,
        },
    )
    .await
    .expect("transfer");
    assert_eq!(balances[0].quantity, 2);
    assert_eq!(balances[1].uid, bob.uid);
    assert_eq!(balances[1].quantity, 3);

    let err = commands::transfer_item(
        &h.state,
        ada.uid,
        TransferItemRequest {
            to_uid: bob.uid,
            item_id: potion.id,
            quantity: 3,
        },
    )
    .await
    .expect_err("only two left");
    assert!(matches!(
        err,
        AppError::Economy(EconomyError::InsufficientQuantity { .. })
    ));

    let err = commands::transfer_item(
        &h.state,
        ada.uid,
        TransferItemRequest {
            to_uid: Uid(88_888),
            item_id: potion.id,
            quantity: 1,
        },
    )
    .await
    .expect_err("unknown receiver");
    assert!(matches!(err, AppError::Economy(EconomyError::UserNotFound(_))));

    let err = commands::transfer_item(
        &h.state,
        ada.uid,
        TransferItemRequest {
            to_uid: ada.uid,
            item_id: potion.id,
            quantity: 1,
        },
    )
    .await
    .expect_err("self transfer");
    assert!(matches!(err, AppError::Economy(EconomyError::InvalidInput(_))));

    assert_eq!(h.held(ada.uid, potion.id).await, 2);
    assert_eq!(h.held(bob.uid, potion.id).await, 3);
    assert!(h.reward_flows(bob.uid).await.is_empty());
}

#[tokio::test]
async fn snapshot_of_unknown_user_is_not_found() {
    let h = Harness::new().await;
    let err = queries::get_backpack_snapshot(&h.state, Uid(12_345))
        .await
        .expect_err("unknown");
    assert!(matches!(err, AppError::Economy(EconomyError::UserNotFound(_))));
    assert!(!h.is_cached(Uid(12_345), CachedView::Backpack).await);
}
