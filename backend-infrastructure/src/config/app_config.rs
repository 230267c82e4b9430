use std::env;
use std::path::Path;

use anyhow::{anyhow, Result};
use serde::Deserialize;
use tokio::fs;
use tracing::warn;

use backend_domain::{CacheConfig, DbConfig, RuntimeConfig};

use super::validation::{validate_database_url, validate_key_prefix, validate_redis_url};

pub const CONFIG_PATH_ENV: &str = "HOARD_CONFIG";

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct AppConfig {
    pub bind_addr: String,
    pub api_token: Option<String>,
    pub database_url: Option<String>,
    pub database_max_connections: u32,
    pub redis_url: Option<String>,
    pub redis_key_prefix: String,
    pub view_cache_ttl_seconds: u64,
    pub level_table_path: String,
    pub log_dir: Option<String>,
    pub max_body_bytes: u64,
    pub request_timeout_seconds: u64,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            bind_addr: "127.0.0.1:3240".to_string(),
            api_token: None,
            database_url: None,
            database_max_connections: 10,
            redis_url: None,
            redis_key_prefix: "hoard".to_string(),
            view_cache_ttl_seconds: 3600,
            level_table_path: "./levels.yaml".to_string(),
            log_dir: None,
            max_body_bytes: 1024 * 1024,
            request_timeout_seconds: 15,
        }
    }
}

impl AppConfig {
    pub async fn load() -> Result<Self> {
        let path = env::var(CONFIG_PATH_ENV).unwrap_or_else(|_| "./config.toml".to_string());
        Self::load_from(&path).await
    }

    pub async fn load_from(path: &str) -> Result<Self> {
        let file_path = Path::new(path);
        let base_dir = file_path.parent();
        let mut config = if file_path.exists() {
            let content = fs::read_to_string(file_path).await?;
            Self::from_toml(&content)?
        } else {
            warn!(path, "config file not found, using defaults");
            AppConfig::default()
        };
        config.apply_env_overrides();
        config.resolve_paths(base_dir);
        config.normalize();
        config.validate()?;
        Ok(config)
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|err| anyhow!("invalid config: {}", err))
    }

    pub fn normalize(&mut self) {
        self.api_token = non_blank(self.api_token.take());
        self.database_url = non_blank(self.database_url.take());
        self.redis_url = non_blank(self.redis_url.take());
        self.log_dir = non_blank(self.log_dir.take());
        self.redis_key_prefix = self.redis_key_prefix.trim().to_string();
    }

    fn resolve_paths(&mut self, base_dir: Option<&Path>) {
        let Some(base) = base_dir else {
            return;
        };
        self.level_table_path = resolve_path(base, &self.level_table_path);
        if let Some(log_dir) = &self.log_dir {
            self.log_dir = Some(resolve_path(base, log_dir));
        }
    }

    pub fn validate(&self) -> Result<()> {
        self.bind_addr
            .parse::<std::net::SocketAddr>()
            .map_err(|err| anyhow!("invalid bind_addr: {}", err))?;
        if self.max_body_bytes == 0 {
            return Err(anyhow!("max_body_bytes must be greater than 0"));
        }
        if self.database_max_connections == 0 {
            return Err(anyhow!("database_max_connections must be greater than 0"));
        }
        if self.view_cache_ttl_seconds == 0 {
            return Err(anyhow!("view_cache_ttl_seconds must be greater than 0"));
        }
        if let Some(url) = &self.database_url {
            validate_database_url(url)?;
        }
        if let Some(url) = &self.redis_url {
            validate_redis_url(url)?;
        }
        validate_key_prefix(&self.redis_key_prefix)?;
        Ok(())
    }

    pub fn to_runtime_config(&self) -> RuntimeConfig {
        RuntimeConfig {
            bind_addr: self.bind_addr.clone(),
            api_token: self.api_token.clone(),
            view_cache_ttl_seconds: self.view_cache_ttl_seconds,
            level_table_path: self.level_table_path.clone(),
            max_body_bytes: self.max_body_bytes,
            request_timeout_seconds: self.request_timeout_seconds,
        }
    }

    pub fn to_db_config(&self) -> DbConfig {
        DbConfig {
            database_url: self.database_url.clone(),
            max_connections: self.database_max_connections,
        }
    }

    pub fn to_cache_config(&self) -> CacheConfig {
        CacheConfig {
            redis_url: self.redis_url.clone(),
            key_prefix: self.redis_key_prefix.clone(),
        }
    }

    fn apply_env_overrides(&mut self) {
        if let Ok(value) = env::var("HOARD_BIND_ADDR") {
            self.bind_addr = value;
        }
        if let Ok(value) = env::var("HOARD_API_TOKEN") {
            self.api_token = Some(value);
        }
        if let Ok(value) = env::var("HOARD_DATABASE_URL") {
            self.database_url = Some(value);
        }
        if let Ok(value) = env::var("HOARD_DATABASE_MAX_CONNECTIONS") {
            self.database_max_connections =
                value.parse().unwrap_or(self.database_max_connections);
        }
        if let Ok(value) = env::var("HOARD_REDIS_URL") {
            self.redis_url = Some(value);
        }
        if let Ok(value) = env::var("HOARD_REDIS_KEY_PREFIX") {
            self.redis_key_prefix = value;
        }
        if let Ok(value) = env::var("HOARD_VIEW_CACHE_TTL_SECONDS") {
            self.view_cache_ttl_seconds = value.parse().unwrap_or(self.view_cache_ttl_seconds);
        }
        if let Ok(value) = env::var("HOARD_LEVEL_TABLE_PATH") {
            self.level_table_path = value;
        }
        if let Ok(value) = env::var("HOARD_LOG_DIR") {
            self.log_dir = Some(value);
        }
        if let Ok(value) = env::var("HOARD_MAX_BODY_BYTES") {
            self.max_body_bytes = value.parse().unwrap_or(self.max_body_bytes);
        }
        if let Ok(value) = env::var("HOARD_REQUEST_TIMEOUT_SECONDS") {
            self.request_timeout_seconds = value.parse().unwrap_or(self.request_timeout_seconds);
        }
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|text| text.trim().to_string())
        .filter(|text| !text.is_empty())
}

fn resolve_path(base: &Path, value: &str) -> String {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return trimmed.to_string();
    }
    let path = Path::new(trimmed);
    if path.is_absolute() {
        trimmed.to_string()
    } else {
        base.join(path).to_string_lossy().to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_file_keeps_defaults() {
        let config = AppConfig::from_toml("bind_addr = \"0.0.0.0:8080\"\n").unwrap();
        assert_eq!(config.bind_addr, "0.0.0.0:8080");
        assert_eq!(config.view_cache_ttl_seconds, 3600);
        assert_eq!(config.redis_key_prefix, "hoard");
        assert!(config.database_url.is_none());
    }

    #[test]
    fn blank_optionals_become_none() {
        let mut config = AppConfig::from_toml(
            "api_token = \"  \"\nredis_url = \"\"\ndatabase_url = \" postgres://localhost/hoard \"\n",
        )
        .unwrap();
        config.normalize();
        assert!(config.api_token.is_none());
        assert!(config.redis_url.is_none());
        assert_eq!(
            config.database_url.as_deref(),
            Some("postgres://localhost/hoard")
        );
        config.validate().unwrap();
    }

    #[test]
    fn validate_rejects_bad_values() {
        let mut config = AppConfig::default();
        config.bind_addr = "not an address".to_string();
        assert!(config.validate().is_err());

        let mut config = AppConfig::default();
        config.view_cache_ttl_seconds = 0;
        assert!(config.validate().is_err());

        let mut config = AppConfig::default();
        config.redis_url = Some("localhost:6379".to_string());
        assert!(config.validate().is_err());
    }

    #[test]
    fn relative_paths_follow_config_file() {
        let mut config = AppConfig::default();
        config.level_table_path = "levels.yaml".to_string();
        config.log_dir = Some("/var/log/hoard".to_string());
        config.resolve_paths(Some(Path::new("/etc/hoard")));
        assert_eq!(config.level_table_path, "/etc/hoard/levels.yaml");
        assert_eq!(config.log_dir.as_deref(), Some("/var/log/hoard"));
    }
}
