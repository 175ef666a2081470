//! Lane API Handlers

use axum::{
    Json,
    extract::{Query, State},
};

use crate::api::DayQuery;
use crate::core::ServerState;
use shared::error::{AppError, AppResult};
use shared::models::Lanes;

/// GET /api/lanes?day= - classified lanes for a day
pub async fn list(
    State(state): State<ServerState>,
    Query(query): Query<DayQuery>,
) -> AppResult<Json<Lanes>> {
    let lanes = state
        .scheduler
        .classify_lanes(query.day)
        .await
        .map_err(AppError::from)?;
    Ok(Json(lanes))
}
