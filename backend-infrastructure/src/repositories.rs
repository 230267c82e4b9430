pub mod config_files;
pub mod memory_ledger;
pub mod postgres_ledger;

pub use config_files::*;
pub use memory_ledger::*;
pub use postgres_ledger::*;
