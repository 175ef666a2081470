//! Reservation API Handlers

use axum::{
    Json,
    extract::{Path, Query, State},
};
use chrono::Utc;
use serde::Deserialize;
use validator::Validate;

use crate::core::ServerState;
use crate::scheduler::{AbsentOutcome, ReservationRequest, VisitOutcome};
use shared::error::{AppError, AppResult};
use shared::models::{EventDay, Reservation, ReservationId, ReservationStatus};

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    pub day: EventDay,
    pub status: Option<ReservationStatus>,
}

fn parse_id(id: &str) -> AppResult<ReservationId> {
    ReservationId::parse(id).map_err(AppError::validation)
}

/// GET /api/reservations?day=&status= - operator list view
pub async fn list(
    State(state): State<ServerState>,
    Query(query): Query<ListQuery>,
) -> AppResult<Json<Vec<Reservation>>> {
    let reservations = state
        .scheduler
        .list_reservations(query.day, query.status)
        .await
        .map_err(AppError::from)?;
    Ok(Json(reservations))
}

/// POST /api/reservations - intake
pub async fn create(
    State(state): State<ServerState>,
    Json(request): Json<ReservationRequest>,
) -> AppResult<Json<Reservation>> {
    request
        .validate()
        .map_err(|e| AppError::validation(e.to_string()))?;
    let reservation = state
        .scheduler
        .create_reservation(&request, Utc::now())
        .await
        .map_err(AppError::from)?;
    Ok(Json(reservation))
}

/// POST /api/reservations/:id/visit - mark a called member admitted
pub async fn visit(
    State(state): State<ServerState>,
    Path(id): Path<String>,
) -> AppResult<Json<VisitOutcome>> {
    let id = parse_id(&id)?;
    let outcome = state
        .scheduler
        .mark_visited(&id, Utc::now())
        .await
        .map_err(AppError::from)?;

    // A completed group rolls over to the next candidate after the
    // countdown, unless the operator cancels it
    if let (Some(number), Some(reservation)) = (outcome.group_completed, &outcome.reservation) {
        state.rollover.schedule(reservation.day, number);
    }
    Ok(Json(outcome))
}

/// POST /api/reservations/:id/absent - mark a member absent
pub async fn absent(
    State(state): State<ServerState>,
    Path(id): Path<String>,
) -> AppResult<Json<AbsentOutcome>> {
    let id = parse_id(&id)?;
    let day = id.category().day();
    let outcome = state
        .scheduler
        .mark_absent(&id, Utc::now())
        .await
        .map_err(AppError::from)?;

    if let Some(number) = outcome.group_completed {
        state.rollover.schedule(day, number);
    }
    Ok(Json(outcome))
}

/// POST /api/reservations/:id/guide - re-admit an absentee with priority
pub async fn guide(
    State(state): State<ServerState>,
    Path(id): Path<String>,
) -> AppResult<Json<Reservation>> {
    let id = parse_id(&id)?;
    let reservation = state
        .scheduler
        .guide_back(&id, Utc::now())
        .await
        .map_err(AppError::from)?;
    Ok(Json(reservation))
}

/// POST /api/reservations/:id/cancel - cancel a waiting reservation
pub async fn cancel(
    State(state): State<ServerState>,
    Path(id): Path<String>,
) -> AppResult<Json<Option<Reservation>>> {
    let id = parse_id(&id)?;
    let cancelled = state
        .scheduler
        .cancel_reservation(&id)
        .await
        .map_err(AppError::from)?;
    Ok(Json(cancelled))
}

/// DELETE /api/reservations/:id - hard-delete a reservation
pub async fn delete(
    State(state): State<ServerState>,
    Path(id): Path<String>,
) -> AppResult<Json<bool>> {
    let id = parse_id(&id)?;
    let deleted = state
        .scheduler
        .delete_reservation(&id)
        .await
        .map_err(AppError::from)?;
    Ok(Json(deleted))
}
