// Long-lived economy services, built once at start-up and shared

pub mod inventory;
pub mod leveling;
pub mod purchase;
pub mod reward_package;
pub mod store_catalog;
pub mod users;
pub mod views;
pub mod wallet_ledger;

pub use inventory::InventoryService;
pub use leveling::LevelingService;
pub use purchase::{PurchaseEngine, PurchaseReceipt};
pub use reward_package::RewardPackageEngine;
pub use store_catalog::StoreCatalog;
pub use users::UserService;
pub use wallet_ledger::WalletLedger;

use std::sync::Arc;
use std::time::Duration;

use backend_domain::ports::ViewCache;

/// Every service the entry points need. Services hold only shared handles,
/// never per-request state.
#[derive(Clone)]
pub struct EconomyServices {
    pub wallets: WalletLedger,
    pub leveling: LevelingService,
    pub inventory: InventoryService,
    pub purchases: PurchaseEngine,
    pub rewards: RewardPackageEngine,
    pub catalog: StoreCatalog,
    pub users: UserService,
}

impl EconomyServices {
    pub fn new(cache: Arc<dyn ViewCache>, view_ttl: Duration) -> Self {
        let wallets = WalletLedger::new(cache.clone(), view_ttl);
        let leveling = LevelingService::new(wallets.clone());
        let inventory = InventoryService::new(cache, view_ttl);
        let purchases = PurchaseEngine::new(wallets.clone(), leveling.clone(), inventory.clone());
        let rewards = RewardPackageEngine::new(wallets.clone(), inventory.clone());
        let users = UserService::new(wallets.clone());
        Self {
            wallets,
            leveling,
            inventory,
            purchases,
            rewards,
            catalog: StoreCatalog,
            users,
        }
    }
}
