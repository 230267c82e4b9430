// Runtime configuration handed to the application layer

#[derive(Debug, Clone)]
pub struct RuntimeConfig {
    pub bind_addr: String,
    pub api_token: Option<String>,
    pub view_cache_ttl_seconds: u64,
    pub level_table_path: String,
    pub max_body_bytes: u64,
    pub request_timeout_seconds: u64,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            bind_addr: "127.0.0.1:3240".to_string(),
            api_token: None,
            view_cache_ttl_seconds: 3600,
            level_table_path: "./levels.yaml".to_string(),
            max_body_bytes: 1024 * 1024,
            request_timeout_seconds: 15,
        }
    }
}

#[derive(Debug, Clone)]
pub struct DbConfig {
    pub database_url: Option<String>,
    pub max_connections: u32,
}

#[derive(Debug, Clone)]
pub struct CacheConfig {
    pub redis_url: Option<String>,
    pub key_prefix: String,
}
