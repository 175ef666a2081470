//! Group API Handlers

use axum::{
    Json,
    extract::{Path, Query, State},
};
use chrono::Utc;
use serde::Deserialize;

use crate::api::DayQuery;
use crate::core::ServerState;
use crate::scheduler::CallOutcome;
use shared::error::{ApiResponse, AppError, AppResult};
use shared::models::GroupCandidate;

#[derive(Debug, Deserialize)]
pub struct CallManyRequest {
    pub numbers: Vec<u32>,
}

/// GET /api/groups/candidates?day= - ordered candidate groups
pub async fn candidates(
    State(state): State<ServerState>,
    Query(query): Query<DayQuery>,
) -> AppResult<Json<Vec<GroupCandidate>>> {
    let candidates = state
        .scheduler
        .form_candidate_groups(query.day)
        .await
        .map_err(AppError::from)?;
    Ok(Json(candidates))
}

/// GET /api/groups/next?day= - next group to call forward
pub async fn next(
    State(state): State<ServerState>,
    Query(query): Query<DayQuery>,
) -> AppResult<Json<Option<GroupCandidate>>> {
    let next = state
        .scheduler
        .next_group(query.day, Utc::now())
        .await
        .map_err(AppError::from)?;
    Ok(Json(next))
}

/// GET /api/groups/calling?day= - the group currently being called
pub async fn calling(
    State(state): State<ServerState>,
    Query(query): Query<DayQuery>,
) -> AppResult<Json<Option<GroupCandidate>>> {
    let calling = state
        .scheduler
        .calling_group(query.day)
        .await
        .map_err(AppError::from)?;
    Ok(Json(calling))
}

/// POST /api/groups/:number/call?day= - call one group
pub async fn call(
    State(state): State<ServerState>,
    Path(number): Path<u32>,
    Query(query): Query<DayQuery>,
) -> AppResult<ApiResponse<()>> {
    state
        .scheduler
        .call(query.day, number)
        .await
        .map_err(AppError::from)?;
    Ok(ApiResponse::ok())
}

/// POST /api/groups/call?day= - call several groups, independently.
/// Partial success is reported per group, never as an all-or-nothing
/// failure.
pub async fn call_many(
    State(state): State<ServerState>,
    Query(query): Query<DayQuery>,
    Json(request): Json<CallManyRequest>,
) -> AppResult<Json<Vec<CallOutcome>>> {
    let outcomes = state.scheduler.call_many(query.day, &request.numbers).await;
    Ok(Json(outcomes))
}

/// POST /api/groups/:number/reset?day= - send a group back to waiting
pub async fn reset(
    State(state): State<ServerState>,
    Path(number): Path<u32>,
    Query(query): Query<DayQuery>,
) -> AppResult<ApiResponse<()>> {
    // A manual reset supersedes any pending auto-rollover
    state.rollover.cancel(query.day);
    state
        .scheduler
        .reset_group(query.day, number)
        .await
        .map_err(AppError::from)?;
    Ok(ApiResponse::ok())
}

/// POST /api/groups/rollover/cancel?day= - cancel the pending
/// post-completion countdown without applying the reset
pub async fn cancel_rollover(
    State(state): State<ServerState>,
    Query(query): Query<DayQuery>,
) -> AppResult<Json<bool>> {
    Ok(Json(state.rollover.cancel(query.day)))
}
