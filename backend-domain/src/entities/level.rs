// Level configuration and level history entities

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::value_objects::Uid;

/// Static reference row: what it takes to reach `level` and what it pays out.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LevelConfig {
    pub level: i32,
    pub required_exp: i64,
    #[serde(default)]
    pub coin_reward: i64,
    #[serde(default)]
    pub diamond_reward: i64,
    #[serde(default = "default_discount_percent")]
    pub discount_percent: i32,
    #[serde(default)]
    pub description: String,
}

fn default_discount_percent() -> i32 {
    100
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LevelHistory {
    pub id: i64,
    pub uid: Uid,
    pub old_level: i32,
    pub new_level: i32,
    pub exp_gained: i64,
    pub experience: i64,
    pub coin_rewarded: i64,
    pub diamond_rewarded: i64,
    pub description: String,
    pub created_at: DateTime<Utc>,
}

impl LevelHistory {
    pub fn leveled_up(&self) -> bool {
        self.new_level > self.old_level
    }
}

#[derive(Debug, Clone)]
pub struct NewLevelHistory {
    pub uid: Uid,
    pub old_level: i32,
    pub new_level: i32,
    pub exp_gained: i64,
    pub experience: i64,
    pub coin_rewarded: i64,
    pub diamond_rewarded: i64,
    pub description: String,
}
