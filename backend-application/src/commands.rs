// Write-side entry points. Each opens one unit of work and finishes it.

pub mod inventory_commands;
pub mod level_commands;
pub mod purchase_commands;
pub mod reward_commands;
pub mod user_commands;
pub mod wallet_commands;

pub use inventory_commands::*;
pub use level_commands::*;
pub use purchase_commands::*;
pub use reward_commands::*;
pub use user_commands::*;
pub use wallet_commands::*;

use backend_domain::EconomyError;
use tracing::error;

use crate::AppError;

/// Logs infrastructure faults before handing the error to the caller.
pub(crate) fn surface(operation: &str, err: EconomyError) -> AppError {
    if err.is_persistence() {
        error!(operation, error = %err, "persistence failure");
    }
    AppError::Economy(err)
}
