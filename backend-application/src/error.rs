use backend_domain::EconomyError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("unauthorized")]
    Unauthorized,
    #[error("bad request: {0}")]
    BadRequest(String),
    #[error(transparent)]
    Economy(#[from] EconomyError),
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}
