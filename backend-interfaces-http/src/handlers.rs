pub mod inventory_handlers;
pub mod level_handlers;
pub mod ops_handlers;
pub mod reward_handlers;
pub mod store_handlers;
pub mod user_handlers;
pub mod wallet_handlers;

pub use inventory_handlers::*;
pub use level_handlers::*;
pub use ops_handlers::*;
pub use reward_handlers::*;
pub use store_handlers::*;
pub use user_handlers::*;
pub use wallet_handlers::*;
