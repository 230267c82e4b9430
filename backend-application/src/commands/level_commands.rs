use backend_domain::{LevelConfig, LevelHistory, Uid};
use serde::Deserialize;
use tracing::info;

use super::surface;
use crate::{AppError, AppState};

/// Writes the level table when the store has none yet.
pub async fn seed_level_configs(
    state: &AppState,
    configs: Vec<LevelConfig>,
) -> Result<usize, AppError> {
    let mut uow = state
        .begin()
        .await
        .map_err(|err| surface("seed_level_configs", err))?;
    let result = state
        .services
        .leveling
        .seed_level_configs(&mut uow, &configs)
        .await;
    let written = uow
        .finish(result)
        .await
        .map_err(|err| surface("seed_level_configs", err))?;
    if written > 0 {
        info!(levels = written, "level table seeded");
    }
    Ok(written)
}

#[derive(Debug, Clone, Deserialize)]
pub struct AddExperienceRequest {
    pub exp: i64,
    #[serde(default)]
    pub description: Option<String>,
}

/// Grants experience outside of a purchase, e.g. for quests or events.
pub async fn add_experience(
    state: &AppState,
    uid: Uid,
    request: AddExperienceRequest,
) -> Result<LevelHistory, AppError> {
    let description = request
        .description
        .filter(|text| !text.trim().is_empty())
        .unwrap_or_else(|| "experience grant".to_string());
    let mut uow = state
        .begin()
        .await
        .map_err(|err| surface("add_experience", err))?;
    let result = state
        .services
        .leveling
        .add_experience(&mut uow, uid, request.exp, &description)
        .await;
    let history = uow
        .finish(result)
        .await
        .map_err(|err| surface("add_experience", err))?;
    if history.leveled_up() {
        state.metrics.record_level_up();
    }
    Ok(history)
}
