use backend_domain::{NewUser, User};

use super::surface;
use crate::{AppError, AppState};

pub async fn register_user(state: &AppState, user: NewUser) -> Result<User, AppError> {
    let mut uow = state
        .begin()
        .await
        .map_err(|err| surface("register_user", err))?;
    let result = state.services.users.register(&mut uow, &user).await;
    let created = uow
        .finish(result)
        .await
        .map_err(|err| surface("register_user", err))?;
    state.metrics.record_registration();
    Ok(created)
}
