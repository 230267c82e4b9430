use std::path::Path;

use anyhow::anyhow;
use async_trait::async_trait;
use tokio::fs;

use backend_domain::{ConfigRepository, LevelConfig};

pub struct ConfigFileRepository;

impl ConfigFileRepository {
    pub fn new() -> Self {
        Self
    }
}

impl Default for ConfigFileRepository {
    fn default() -> Self {
        Self::new()
    }
}

/// Parses a YAML level table and checks it is usable as a level ladder.
pub fn parse_level_table(content: &str) -> anyhow::Result<Vec<LevelConfig>> {
    let mut levels: Vec<LevelConfig> = serde_yaml::from_str(content)?;
    levels.sort_by_key(|level| level.level);
    for pair in levels.windows(2) {
        if pair[0].level == pair[1].level {
            return Err(anyhow!("level {} is defined twice", pair[0].level));
        }
        if pair[1].required_exp < pair[0].required_exp {
            return Err(anyhow!(
                "level {} requires less experience than level {}",
                pair[1].level,
                pair[0].level
            ));
        }
    }
    if let Some(bad) = levels
        .iter()
        .find(|level| !(0..=100).contains(&level.discount_percent))
    {
        return Err(anyhow!(
            "level {} has discount_percent {} outside 0..=100",
            bad.level,
            bad.discount_percent
        ));
    }
    Ok(levels)
}

#[async_trait]
impl ConfigRepository for ConfigFileRepository {
    async fn load_level_table(&self, path: &str) -> anyhow::Result<Vec<LevelConfig>> {
        if !Path::new(path).exists() {
            return Ok(Vec::new());
        }
        let content = fs::read_to_string(path).await?;
        parse_level_table(&content)
    }
}
