//! Group API module

mod handler;

use axum::{
    Router,
    routing::{get, post},
};

use crate::core::ServerState;

pub fn router() -> Router<ServerState> {
    Router::new().nest("/api/groups", routes())
}

fn routes() -> Router<ServerState> {
    Router::new()
        .route("/candidates", get(handler::candidates))
        .route("/next", get(handler::next))
        .route("/calling", get(handler::calling))
        .route("/call", post(handler::call_many))
        .route("/rollover/cancel", post(handler::cancel_rollover))
        .route("/{number}/call", post(handler::call))
        .route("/{number}/reset", post(handler::reset))
}
