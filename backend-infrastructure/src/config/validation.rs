use anyhow::{anyhow, Result};

pub fn validate_database_url(value: &str) -> Result<()> {
    let trimmed = value.trim();
    if !(trimmed.starts_with("postgres://") || trimmed.starts_with("postgresql://")) {
        return Err(anyhow!("database_url must be a postgres:// or postgresql:// url"));
    }
    Ok(())
}

pub fn validate_redis_url(value: &str) -> Result<()> {
    let trimmed = value.trim();
    if !(trimmed.starts_with("redis://") || trimmed.starts_with("rediss://")) {
        return Err(anyhow!("redis_url must be a redis:// or rediss:// url"));
    }
    Ok(())
}

pub fn validate_key_prefix(value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(anyhow!("redis_key_prefix must not be empty"));
    }
    if value.chars().any(char::is_whitespace) {
        return Err(anyhow!("redis_key_prefix must not contain whitespace"));
    }
    Ok(())
}
