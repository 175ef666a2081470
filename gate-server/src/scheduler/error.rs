//! Scheduler errors

use thiserror::Error;

use crate::store::StoreError;
use shared::error::{AppError, ErrorCode};
use shared::models::{CallState, ReservationId};

/// Scheduler error taxonomy.
///
/// `Conflict` means the caller acted on a stale snapshot; re-fetch and
/// retry is an operator action, never performed internally.
#[derive(Debug, Error)]
pub enum SchedulerError {
    #[error("group capacity exceeded: {current} + {adding} > {limit}")]
    CapacityExceeded { current: u32, adding: u32, limit: u32 },

    #[error("group {active} is already being called")]
    AlreadyCalling { active: u32 },

    #[error("group {number} not found")]
    GroupNotFound { number: u32 },

    #[error("group {number} has no callable members")]
    EmptyGroup { number: u32 },

    #[error("group {number} is {state:?} and cannot be called")]
    InvalidCallState { number: u32, state: CallState },

    #[error("group {number} is not being called")]
    NotCalling { number: u32 },

    #[error("reservation {0} not found")]
    ReservationNotFound(ReservationId),

    #[error("reservation {0} is not waiting")]
    NotWaiting(ReservationId),

    #[error("reservation {0} is not marked absent")]
    NotAbsent(ReservationId),

    #[error("absence grace period for {0} has expired")]
    AbsenceExpired(ReservationId),

    #[error("reception is closed")]
    ReceptionClosed,

    #[error("stale write: {0}")]
    Conflict(String),

    #[error("{0}")]
    Validation(String),

    #[error("store error: {0}")]
    Store(StoreError),
}

impl From<StoreError> for SchedulerError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Conflict(msg) => SchedulerError::Conflict(msg),
            other => SchedulerError::Store(other),
        }
    }
}

impl From<SchedulerError> for AppError {
    fn from(err: SchedulerError) -> Self {
        let message = err.to_string();
        let code = match &err {
            SchedulerError::CapacityExceeded { .. } => ErrorCode::CapacityExceeded,
            SchedulerError::AlreadyCalling { .. } => ErrorCode::AlreadyCalling,
            SchedulerError::GroupNotFound { .. } => ErrorCode::GroupNotFound,
            SchedulerError::EmptyGroup { .. } => ErrorCode::EmptyGroup,
            SchedulerError::InvalidCallState { .. } => ErrorCode::InvalidCallState,
            SchedulerError::NotCalling { .. } => ErrorCode::InvalidCallState,
            SchedulerError::ReservationNotFound(_) => ErrorCode::ReservationNotFound,
            SchedulerError::NotWaiting(_) => ErrorCode::ReservationNotWaiting,
            SchedulerError::NotAbsent(_) => ErrorCode::ReservationNotAbsent,
            SchedulerError::AbsenceExpired(_) => ErrorCode::AbsenceExpired,
            SchedulerError::ReceptionClosed => ErrorCode::ReceptionClosed,
            SchedulerError::Conflict(_) => ErrorCode::StaleWrite,
            SchedulerError::Validation(_) => ErrorCode::ValidationFailed,
            SchedulerError::Store(StoreError::NotFound(_)) => ErrorCode::NotFound,
            SchedulerError::Store(StoreError::Duplicate(_)) => ErrorCode::AlreadyExists,
            SchedulerError::Store(_) => ErrorCode::StoreUnavailable,
        };
        AppError::with_message(code, message)
    }
}

/// Result type for scheduler operations
pub type SchedulerResult<T> = Result<T, SchedulerError>;
