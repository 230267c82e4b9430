// Read-side entry points

pub mod health_queries;
pub mod inventory_queries;
pub mod level_queries;
pub mod reward_queries;
pub mod store_queries;
pub mod wallet_queries;

pub use health_queries::*;
pub use inventory_queries::*;
pub use level_queries::*;
pub use reward_queries::*;
pub use store_queries::*;
pub use wallet_queries::*;
