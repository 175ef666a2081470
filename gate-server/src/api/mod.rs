//! HTTP API
//!
//! One module per resource, each exposing a `router()`. The merged
//! router is the presentation surface of the scheduler; handlers stay
//! thin and map scheduler errors onto the unified error codes.

pub mod absentees;
pub mod admission;
pub mod groups;
pub mod health;
pub mod lanes;
pub mod reservations;
pub mod settings;
pub mod staging;

use axum::Router;
use serde::Deserialize;

use crate::core::ServerState;
use shared::models::EventDay;

/// Common `?day=` query
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct DayQuery {
    pub day: EventDay,
}

pub fn create_router(state: ServerState) -> Router {
    Router::new()
        .merge(health::router())
        .merge(lanes::router())
        .merge(groups::router())
        .merge(staging::router())
        .merge(reservations::router())
        .merge(absentees::router())
        .merge(admission::router())
        .merge(settings::router())
        .with_state(state)
}
