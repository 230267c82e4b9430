use std::sync::Arc;
use std::time::Duration;

use backend_domain::ports::{LedgerStore, ViewCache};
use backend_domain::{EconomyResult, RuntimeConfig};

use crate::services::EconomyServices;
use crate::unit_of_work::UnitOfWork;
use crate::Metrics;

#[derive(Clone)]
pub struct AppState {
    pub config: RuntimeConfig,
    pub store: Arc<dyn LedgerStore>,
    pub cache: Arc<dyn ViewCache>,
    pub services: Arc<EconomyServices>,
    pub metrics: Arc<Metrics>,
}

impl AppState {
    pub fn new(
        config: RuntimeConfig,
        store: Arc<dyn LedgerStore>,
        cache: Arc<dyn ViewCache>,
    ) -> Self {
        let view_ttl = Duration::from_secs(config.view_cache_ttl_seconds);
        let services = Arc::new(EconomyServices::new(cache.clone(), view_ttl));
        Self {
            config,
            store,
            cache,
            services,
            metrics: Arc::new(Metrics::default()),
        }
    }

    /// Opens a unit of work. Every command and query runs inside one.
    pub async fn begin(&self) -> EconomyResult<UnitOfWork> {
        UnitOfWork::begin(self.store.as_ref(), self.cache.clone()).await
    }
}
