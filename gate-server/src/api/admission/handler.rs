//! Admission API Handlers

use axum::{
    Json,
    extract::{Query, State},
};

use crate::api::DayQuery;
use crate::core::ServerState;
use crate::scheduler::AutoStopReport;
use shared::error::{AppError, AppResult};

/// POST /api/admission/check?day= - evaluate the auto-stop rule now
pub async fn check(
    State(state): State<ServerState>,
    Query(query): Query<DayQuery>,
) -> AppResult<Json<AutoStopReport>> {
    let report = state
        .scheduler
        .check_auto_stop(query.day)
        .await
        .map_err(AppError::from)?;
    Ok(Json(report))
}
