pub mod cache;
pub mod config;
pub mod repositories;

pub use cache::*;
pub use config::*;
pub use repositories::*;
