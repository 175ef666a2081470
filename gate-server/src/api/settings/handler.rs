//! Settings API Handlers
//!
//! Reopening reception happens only here, by explicit operator save;
//! the admission controller can only ever close it.

use axum::{Json, extract::State};

use crate::core::ServerState;
use shared::error::{AppError, AppResult};
use shared::models::{Settings, SettingsPatch};

/// GET /api/settings - cached settings
pub async fn get_settings(State(state): State<ServerState>) -> AppResult<Json<Settings>> {
    Ok(Json(state.settings.get()))
}

/// PUT /api/settings - save settings (write-through)
pub async fn update(
    State(state): State<ServerState>,
    Json(patch): Json<SettingsPatch>,
) -> AppResult<Json<Settings>> {
    let settings = state
        .settings
        .save(patch)
        .await
        .map_err(|e| AppError::store(e.to_string()))?;
    Ok(Json(settings))
}

/// POST /api/settings/refresh - discard the cache and re-read
pub async fn refresh(State(state): State<ServerState>) -> AppResult<Json<Settings>> {
    let settings = state
        .settings
        .reload()
        .await
        .map_err(|e| AppError::store(e.to_string()))?;
    Ok(Json(settings))
}
