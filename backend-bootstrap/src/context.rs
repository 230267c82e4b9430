use std::sync::Arc;

use anyhow::Result;
use tracing::{info, warn};

use backend_application::commands;
use backend_application::AppState;
use backend_domain::{ConfigRepository, LedgerStore, ViewCache};
use backend_infrastructure::{
    AppConfig, ConfigFileRepository, MemoryLedgerStore, MemoryViewCache, PgLedgerStore,
    RedisViewCache,
};

pub struct AppContext {
    pub state: AppState,
}

impl AppContext {
    pub async fn new(config: &AppConfig) -> Result<Self> {
        let runtime_config = config.to_runtime_config();
        let db_config = config.to_db_config();
        let cache_config = config.to_cache_config();

        let store: Arc<dyn LedgerStore> = if db_config.database_url.is_some() {
            let repo = PgLedgerStore::connect(&db_config).await?;
            repo.ensure_schema().await?;
            Arc::new(repo)
        } else {
            warn!("database_url not set, using in-memory ledger store; data is lost on exit");
            Arc::new(MemoryLedgerStore::new())
        };

        let cache: Arc<dyn ViewCache> = if cache_config.redis_url.is_some() {
            Arc::new(RedisViewCache::connect(&cache_config).await?)
        } else {
            info!("redis_url not set, using in-process view cache");
            Arc::new(MemoryViewCache::new())
        };

        let state = AppState::new(runtime_config, store, cache);

        let config_repo = ConfigFileRepository::new();
        let levels = config_repo
            .load_level_table(&state.config.level_table_path)
            .await?;
        if levels.is_empty() {
            warn!(
                path = %state.config.level_table_path,
                "no level table found, keeping the stored level configs"
            );
        }
        commands::seed_level_configs(&state, levels).await?;

        Ok(Self { state })
    }
}
