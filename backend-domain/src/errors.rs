// Economy error taxonomy

use thiserror::Error;

use crate::value_objects::{CurrencyKind, ItemId, PackageId, Uid};

pub type EconomyResult<T> = Result<T, EconomyError>;

/// Coarse classification of [`EconomyError`], used by callers that only need
/// to decide how to present a failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    NotFound,
    InvalidState,
    InsufficientResource,
    EmptyInput,
    Conflict,
    Persistence,
}

#[derive(Debug, Error)]
pub enum EconomyError {
    #[error("user {0} not found")]
    UserNotFound(Uid),
    #[error("store item {0} not found")]
    ItemNotFound(ItemId),
    #[error("{kind} wallet not found for user {uid}")]
    WalletNotFound { uid: Uid, kind: CurrencyKind },
    #[error("reward package {0} not found")]
    PackageNotFound(PackageId),
    #[error("user {uid} holds no item {item}")]
    BackpackEntryNotFound { uid: Uid, item: ItemId },

    #[error("store item {0} is not on sale")]
    ItemInactive(ItemId),

    #[error("insufficient stock for item {item}: requested {requested}, available {available}")]
    InsufficientStock {
        item: ItemId,
        requested: i64,
        available: i64,
    },
    #[error("insufficient {kind} balance: required {required}, available {available}")]
    InsufficientFunds {
        kind: CurrencyKind,
        required: i64,
        available: i64,
    },
    #[error("insufficient quantity of item {item}: requested {requested}, held {held}")]
    InsufficientQuantity {
        item: ItemId,
        requested: i64,
        held: i64,
    },

    #[error("reward package {0} has no items")]
    EmptyPackage(PackageId),
    #[error("quantity must be positive, got {0}")]
    NonPositiveQuantity(i64),
    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("unsupported reward kind: item_type={item_type}, item_id={item_id}")]
    UnsupportedRewardKind { item_type: i32, item_id: i64 },

    #[error("{kind} wallet already initialized for user {uid}")]
    WalletAlreadyInitialized { uid: Uid, kind: CurrencyKind },
    #[error("username or email already registered")]
    UserAlreadyExists,
    #[error("store item name '{0}' already exists")]
    DuplicateItemName(String),
    #[error("amount overflow")]
    AmountOverflow,

    #[error("persistence failure: {0}")]
    Persistence(#[from] anyhow::Error),
}

impl EconomyError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            EconomyError::UserNotFound(_)
            | EconomyError::ItemNotFound(_)
            | EconomyError::WalletNotFound { .. }
            | EconomyError::PackageNotFound(_)
            | EconomyError::BackpackEntryNotFound { .. } => ErrorKind::NotFound,
            EconomyError::ItemInactive(_) | EconomyError::UnsupportedRewardKind { .. } => {
                ErrorKind::InvalidState
            }
            EconomyError::InsufficientStock { .. }
            | EconomyError::InsufficientFunds { .. }
            | EconomyError::InsufficientQuantity { .. } => ErrorKind::InsufficientResource,
            EconomyError::EmptyPackage(_)
            | EconomyError::NonPositiveQuantity(_)
            | EconomyError::InvalidInput(_)
            | EconomyError::AmountOverflow => ErrorKind::EmptyInput,
            EconomyError::WalletAlreadyInitialized { .. }
            | EconomyError::UserAlreadyExists
            | EconomyError::DuplicateItemName(_) => ErrorKind::Conflict,
            EconomyError::Persistence(_) => ErrorKind::Persistence,
        }
    }

    /// Stable machine-readable reason for clients.
    pub fn code(&self) -> &'static str {
        match self {
            EconomyError::UserNotFound(_) => "user_not_found",
            EconomyError::ItemNotFound(_) => "item_not_found",
            EconomyError::WalletNotFound { .. } => "wallet_not_found",
            EconomyError::PackageNotFound(_) => "package_not_found",
            EconomyError::BackpackEntryNotFound { .. } => "backpack_entry_not_found",
            EconomyError::ItemInactive(_) => "item_inactive",
            EconomyError::InsufficientStock { .. } => "insufficient_stock",
            EconomyError::InsufficientFunds { .. } => "insufficient_funds",
            EconomyError::InsufficientQuantity { .. } => "insufficient_quantity",
            EconomyError::EmptyPackage(_) => "empty_package",
            EconomyError::NonPositiveQuantity(_) => "non_positive_quantity",
            EconomyError::InvalidInput(_) => "invalid_input",
            EconomyError::UnsupportedRewardKind { .. } => "unsupported_reward_kind",
            EconomyError::WalletAlreadyInitialized { .. } => "wallet_already_initialized",
            EconomyError::UserAlreadyExists => "user_already_exists",
            EconomyError::DuplicateItemName(_) => "duplicate_item_name",
            EconomyError::AmountOverflow => "amount_overflow",
            EconomyError::Persistence(_) => "persistence_error",
        }
    }

    pub fn is_persistence(&self) -> bool {
        matches!(self, EconomyError::Persistence(_))
    }
}

/// Rejects zero and negative quantities before any store access.
pub fn ensure_positive(quantity: i64) -> EconomyResult<i64> {
    if quantity <= 0 {
        return Err(EconomyError::NonPositiveQuantity(quantity));
    }
    Ok(quantity)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shortage_errors_are_resource_failures_not_faults() {
        let err = EconomyError::InsufficientFunds {
            kind: CurrencyKind::Coin,
            required: 300,
            available: 10,
        };
        assert_eq!(err.kind(), ErrorKind::InsufficientResource);
        assert_eq!(err.code(), "insufficient_funds");
        assert!(!err.is_persistence());

        let err = EconomyError::from(anyhow::anyhow!("connection reset"));
        assert_eq!(err.kind(), ErrorKind::Persistence);
    }

    #[test]
    fn ensure_positive_rejects_zero() {
        assert!(matches!(
            ensure_positive(0),
            Err(EconomyError::NonPositiveQuantity(0))
        ));
        assert_eq!(ensure_positive(3).unwrap(), 3);
    }
}
