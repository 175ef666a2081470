//! Reservation API module

mod handler;

use axum::{
    Router,
    routing::{get, post},
};

use crate::core::ServerState;

pub fn router() -> Router<ServerState> {
    Router::new().nest("/api/reservations", routes())
}

fn routes() -> Router<ServerState> {
    Router::new()
        .route("/", get(handler::list).post(handler::create))
        .route("/{id}", axum::routing::delete(handler::delete))
        .route("/{id}/visit", post(handler::visit))
        .route("/{id}/absent", post(handler::absent))
        .route("/{id}/guide", post(handler::guide))
        .route("/{id}/cancel", post(handler::cancel))
}
