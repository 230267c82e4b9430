use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::Json;

use backend_application::commands;
use backend_application::AppState;
use backend_domain::{NewUser, User};

use crate::error::HttpError;
use crate::middleware::require_auth;

pub async fn register_user(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(payload): Json<NewUser>,
) -> Result<(StatusCode, Json<User>), HttpError> {
    require_auth(&state.config, &headers)?;
    let user = commands::register_user(&state, payload).await?;
    Ok((StatusCode::CREATED, Json(user)))
}
