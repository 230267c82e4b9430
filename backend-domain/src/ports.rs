// Repository and cache port traits
// Define what the domain needs from infrastructure

pub mod repositories;
pub mod services;

pub use repositories::*;
pub use services::*;
