// Level-up planning

use crate::entities::LevelConfig;
use crate::errors::{EconomyError, EconomyResult};

/// Outcome of walking the level table for one experience grant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LevelUpPlan {
    pub old_level: i32,
    pub new_level: i32,
    pub coin_reward: i64,
    pub diamond_reward: i64,
}

impl LevelUpPlan {
    pub fn leveled_up(&self) -> bool {
        self.new_level > self.old_level
    }
}

/// Walks configured levels above `current_level` in ascending order and
/// advances through every level whose requirement `experience` meets,
/// stopping at the first one it does not. Gaps in the table are skipped.
pub fn plan_level_up(
    current_level: i32,
    experience: i64,
    configs: &[LevelConfig],
) -> EconomyResult<LevelUpPlan> {
    let mut candidates: Vec<&LevelConfig> = configs
        .iter()
        .filter(|config| config.level > current_level)
        .collect();
    candidates.sort_by_key(|config| config.level);

    let mut plan = LevelUpPlan {
        old_level: current_level,
        new_level: current_level,
        coin_reward: 0,
        diamond_reward: 0,
    };
    for config in candidates {
        if config.required_exp > experience {
            break;
        }
        plan.new_level = config.level;
        plan.coin_reward = plan
            .coin_reward
            .checked_add(config.coin_reward)
            .ok_or(EconomyError::AmountOverflow)?;
        plan.diamond_reward = plan
            .diamond_reward
            .checked_add(config.diamond_reward)
            .ok_or(EconomyError::AmountOverflow)?;
    }
    Ok(plan)
}
