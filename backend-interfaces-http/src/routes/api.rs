use axum::routing::{get, post, put};
use axum::Router;

use backend_application::AppState;

use crate::handlers::{
    inventory_handlers, level_handlers, ops_handlers, reward_handlers, store_handlers,
    user_handlers, wallet_handlers,
};

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/api/users", post(user_handlers::register_user))
        .route(
            "/api/users/:uid/level",
            get(level_handlers::get_user_level),
        )
        .route(
            "/api/users/:uid/level/history",
            get(level_handlers::get_level_history),
        )
        .route(
            "/api/users/:uid/level/experience",
            post(level_handlers::add_experience),
        )
        .route(
            "/api/users/:uid/discount",
            get(level_handlers::get_discounted_price),
        )
        .route("/api/levels", get(level_handlers::list_level_configs))
        .route(
            "/api/users/:uid/wallets",
            get(wallet_handlers::get_user_wallets),
        )
        .route(
            "/api/users/:uid/wallets/:kind",
            get(wallet_handlers::get_wallet),
        )
        .route(
            "/api/users/:uid/wallets/:kind/adjust",
            post(wallet_handlers::adjust_wallet_balance),
        )
        .route(
            "/api/users/:uid/currency-flows",
            get(wallet_handlers::list_currency_flows),
        )
        .route(
            "/api/users/:uid/backpack",
            get(inventory_handlers::get_backpack),
        )
        .route(
            "/api/users/:uid/backpack/consume",
            post(inventory_handlers::consume_item),
        )
        .route(
            "/api/users/:uid/backpack/transfer",
            post(inventory_handlers::transfer_item),
        )
        .route(
            "/api/users/:uid/rewards",
            get(reward_handlers::list_reward_records),
        )
        .route(
            "/api/users/:uid/reward-flows",
            get(reward_handlers::list_reward_flows),
        )
        .route("/api/store/items", post(store_handlers::create_store_item))
        .route(
            "/api/store/items/:id",
            get(store_handlers::get_store_item),
        )
        .route("/api/store/buy", post(store_handlers::buy_goods))
        .route("/api/rewards/grant", post(reward_handlers::grant_reward))
        .route(
            "/api/rewards/packages",
            get(reward_handlers::list_reward_packages).post(reward_handlers::create_reward_package),
        )
        .route(
            "/api/rewards/packages/:id",
            get(reward_handlers::get_reward_package).delete(reward_handlers::delete_reward_package),
        )
        .route(
            "/api/rewards/packages/:id/items",
            put(reward_handlers::replace_reward_package_items),
        )
        .route("/api/ops/health/live", get(ops_handlers::health_live))
        .route("/api/ops/health/ready", get(ops_handlers::health_ready))
        .route(
            "/api/ops/metrics/prometheus",
            get(ops_handlers::metrics_prometheus),
        )
        .with_state(state)
}
