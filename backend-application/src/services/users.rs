// User registration

use backend_domain::{EconomyError, EconomyResult, NewUser, User};
use tracing::info;

use super::wallet_ledger::WalletLedger;
use crate::unit_of_work::UnitOfWork;

#[derive(Clone)]
pub struct UserService {
    wallets: WalletLedger,
}

impl UserService {
    pub fn new(wallets: WalletLedger) -> Self {
        Self { wallets }
    }

    /// Creates the user and both seeded wallets in the same transaction.
    pub async fn register(&self, uow: &mut UnitOfWork, user: &NewUser) -> EconomyResult<User> {
        let user = user.normalized();
        if user.username.is_empty() {
            return Err(EconomyError::InvalidInput("username is required".to_string()));
        }
        if !user.email.contains('@') {
            return Err(EconomyError::InvalidInput(format!(
                "invalid email '{}'",
                user.email
            )));
        }
        let tx = uow.tx()?;
        if tx.user_identity_taken(&user.username, &user.email).await? {
            return Err(EconomyError::UserAlreadyExists);
        }
        let created = tx.insert_user(&user).await?;
        self.wallets.initialize_wallet(uow, created.uid).await?;
        info!(uid = %created.uid, username = %created.username, "user registered");
        Ok(created)
    }
}
