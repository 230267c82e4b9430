// Domain entities

pub mod backpack;
pub mod config;
pub mod level;
pub mod paging;
pub mod reward;
pub mod store_item;
pub mod user;
pub mod wallet;

pub use backpack::*;
pub use config::*;
pub use level::*;
pub use paging::*;
pub use reward::*;
pub use store_item::*;
pub use user::*;
pub use wallet::*;
