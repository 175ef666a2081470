//! Absentee API Handlers

use axum::{
    Json,
    extract::{Query, State},
};
use chrono::Utc;

use crate::api::DayQuery;
use crate::core::ServerState;
use shared::error::{AppError, AppResult};
use shared::models::AbsenteeEntry;

/// GET /api/absentees?day= - absentees with elapsed time annotations
pub async fn list(
    State(state): State<ServerState>,
    Query(query): Query<DayQuery>,
) -> AppResult<Json<Vec<AbsenteeEntry>>> {
    let absentees = state
        .scheduler
        .list_absentees(query.day, Utc::now())
        .await
        .map_err(AppError::from)?;
    Ok(Json(absentees))
}
