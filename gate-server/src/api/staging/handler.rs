//! Staging API Handlers
//!
//! Explicit command surface for interactive group formation: add,
//! remove, accept. The drag source in the operator UI is irrelevant
//! here; the engine only sees these commands.

use axum::{
    Json,
    extract::{Query, State},
};
use serde::Deserialize;

use crate::api::DayQuery;
use crate::core::ServerState;
use crate::scheduler::{AcceptOutcome, StagingView};
use shared::error::{AppError, AppResult};
use shared::models::{EventDay, ReservationId};

#[derive(Debug, Deserialize)]
pub struct StagingCommand {
    pub day: EventDay,
    pub id: ReservationId,
}

/// GET /api/staging?day= - current staging set
pub async fn view(
    State(state): State<ServerState>,
    Query(query): Query<DayQuery>,
) -> AppResult<Json<StagingView>> {
    let view = state
        .scheduler
        .staging_view(query.day)
        .map_err(AppError::from)?;
    Ok(Json(view))
}

/// POST /api/staging/add - stage an entry for the next call group
pub async fn add(
    State(state): State<ServerState>,
    Json(command): Json<StagingCommand>,
) -> AppResult<Json<StagingView>> {
    let view = state
        .scheduler
        .staging_add(command.day, &command.id)
        .await
        .map_err(AppError::from)?;
    Ok(Json(view))
}

/// POST /api/staging/remove - return a staged entry to its lane
pub async fn remove(
    State(state): State<ServerState>,
    Json(command): Json<StagingCommand>,
) -> AppResult<Json<StagingView>> {
    let view = state
        .scheduler
        .staging_remove(command.day, &command.id)
        .await
        .map_err(AppError::from)?;
    Ok(Json(view))
}

/// POST /api/staging/accept?day= - accept the staged group, applying
/// the configured policy per member
pub async fn accept(
    State(state): State<ServerState>,
    Query(query): Query<DayQuery>,
) -> AppResult<Json<Vec<AcceptOutcome>>> {
    let outcomes = state
        .scheduler
        .staging_accept(query.day)
        .await
        .map_err(AppError::from)?;
    Ok(Json(outcomes))
}
