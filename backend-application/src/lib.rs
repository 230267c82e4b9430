// Backend Application Layer

pub mod commands;
pub mod error;
pub mod metrics;
pub mod queries;
pub mod services;
pub mod state;
pub mod unit_of_work;

pub use error::AppError;
pub use metrics::Metrics;
pub use services::EconomyServices;
pub use state::AppState;
pub use unit_of_work::UnitOfWork;
