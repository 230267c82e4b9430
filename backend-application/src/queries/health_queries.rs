use serde::Serialize;
use tracing::warn;

use crate::AppState;

#[derive(Debug, Clone, Serialize)]
pub struct ReadinessReport {
    pub ready: bool,
    pub store: bool,
    pub cache: bool,
}

/// The store must answer for the service to be ready; the cache is reported
/// but never blocks readiness.
pub async fn check_readiness(state: &AppState) -> ReadinessReport {
    let store = match state.store.ping().await {
        Ok(()) => true,
        Err(err) => {
            warn!(error = %err, "ledger store ping failed");
            false
        }
    };
    let cache = match state.cache.ping().await {
        Ok(()) => true,
        Err(err) => {
            warn!(error = %err, "view cache ping failed");
            false
        }
    };
    ReadinessReport {
        ready: store,
        store,
        cache,
    }
}
