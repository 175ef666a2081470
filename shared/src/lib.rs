//! Shared types for the Torii queue server
//!
//! Domain models and the unified error system used across the
//! gate server and its tests.

pub mod error;
pub mod models;

// Re-exports
pub use serde::{Deserialize, Serialize};

pub use error::{ApiResponse, AppError, AppResult, ErrorCategory, ErrorCode};
pub use models::{
    AbsenteeEntry, CallState, Category, CategoryKind, EventDay, Group, GroupCandidate, Lane,
    Lanes, Reservation, ReservationId, ReservationPatch, ReservationStatus, Settings,
    SettingsPatch,
};
