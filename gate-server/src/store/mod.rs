//! Record Store
//!
//! The scheduler operates against an abstract record store holding
//! per-day reservation and group collections plus a single settings
//! record. Durable persistence is an external concern; this crate ships
//! an in-memory implementation used by the server and the tests.
//!
//! Writes to a single record are serialized per id. There is no
//! multi-record transaction: callers must tolerate partial application
//! of multi-record updates. Updates carry optional preconditions
//! (expected prior status / call state); a precondition miss means the
//! caller acted on a stale read and is surfaced as [`StoreError::Conflict`].

pub mod memory;

pub use memory::MemoryStore;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;

use shared::models::{
    CallState, Category, EventDay, Group, Reservation, ReservationId, ReservationPatch,
    ReservationStatus, Settings, SettingsPatch,
};

/// Store error types
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Duplicate: {0}")]
    Duplicate(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Store unavailable: {0}")]
    Unavailable(String),
}

/// Result type for store operations
pub type StoreResult<T> = Result<T, StoreError>;

/// Abstract record store consumed by the scheduler.
///
/// Every operation is a single bounded read-modify-write; retries on
/// conflict are the caller's responsibility.
#[async_trait]
pub trait Store: Send + Sync {
    /// List reservations for a day, optionally filtered by status and
    /// category
    async fn list_reservations(
        &self,
        day: EventDay,
        status: Option<ReservationStatus>,
        category: Option<Category>,
    ) -> StoreResult<Vec<Reservation>>;

    async fn get_reservation(&self, id: &ReservationId) -> StoreResult<Option<Reservation>>;

    /// Insert a new reservation; rejects an existing id as `Duplicate`
    async fn insert_reservation(&self, reservation: Reservation) -> StoreResult<()>;

    /// Apply a partial update. Preconditions in the patch are checked
    /// atomically with the write; a miss returns `Conflict`.
    async fn update_reservation(
        &self,
        id: &ReservationId,
        patch: ReservationPatch,
    ) -> StoreResult<Reservation>;

    /// Delete a reservation; returns false when it was already gone
    async fn delete_reservation(&self, id: &ReservationId) -> StoreResult<bool>;

    async fn list_groups(&self, day: EventDay) -> StoreResult<Vec<Group>>;

    async fn get_group(&self, day: EventDay, number: u32) -> StoreResult<Option<Group>>;

    /// Insert a new group; rejects an existing number as `Duplicate`
    async fn insert_group(&self, group: Group) -> StoreResult<()>;

    /// Replace a group's member list
    async fn update_group_members(
        &self,
        day: EventDay,
        number: u32,
        members: Vec<ReservationId>,
    ) -> StoreResult<Group>;

    /// The group currently in `Calling` state for a day, if any
    async fn get_calling_group(&self, day: EventDay) -> StoreResult<Option<Group>>;

    /// Transition a group's call state. When `expect` is set, the
    /// transition applies only from that state (`Conflict` otherwise).
    /// `Calling` stamps `called_at`, `Completed` stamps `completed_at`.
    async fn set_group_call_state(
        &self,
        day: EventDay,
        number: u32,
        expect: Option<CallState>,
        next: CallState,
        at: DateTime<Utc>,
    ) -> StoreResult<Group>;

    async fn get_settings(&self) -> StoreResult<Settings>;

    async fn update_settings(&self, patch: SettingsPatch) -> StoreResult<Settings>;
}
