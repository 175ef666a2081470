//! Interactive group formation (staging)
//!
//! The operator assembles a call group one entry at a time. The staging
//! set is memory-only; nothing is persisted until `accept`, which
//! applies the configured [`AcceptPolicy`] member by member. The
//! capacity invariant is enforced on every add.

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

use shared::models::{EventDay, Lane, ReservationId, ReservationPatch, ReservationStatus};

use super::{AcceptPolicy, Scheduler, SchedulerError, SchedulerResult};
use crate::store::StoreError;

/// A reservation held in the staging set
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StagedEntry {
    pub id: ReservationId,
    pub headcount: u32,
}

/// Operator view of the staging set
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StagingView {
    pub entries: Vec<StagedEntry>,
    pub total_headcount: u32,
    pub capacity: u32,
}

/// Per-member result of an accept
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AcceptOutcome {
    pub id: ReservationId,
    pub accepted: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Per-day staging sets
pub(crate) struct StagingArea {
    days: [Mutex<Vec<StagedEntry>>; 2],
}

impl StagingArea {
    pub fn new() -> Self {
        Self {
            days: [Mutex::new(Vec::new()), Mutex::new(Vec::new())],
        }
    }

    fn slot(&self, day: EventDay) -> &Mutex<Vec<StagedEntry>> {
        &self.days[day.index()]
    }

    pub fn remove(&self, day: EventDay, id: &ReservationId) -> bool {
        let mut entries = self.slot(day).lock();
        let before = entries.len();
        entries.retain(|e| &e.id != id);
        entries.len() != before
    }
}

impl Scheduler {
    /// Stage a standard-lane entry for the next call group.
    ///
    /// Rejects entries that would push the running total over capacity;
    /// the staging set is left untouched. Staging an already-staged
    /// entry is a no-op.
    pub async fn staging_add(&self, day: EventDay, id: &ReservationId) -> SchedulerResult<StagingView> {
        let reservation = self
            .store()
            .get_reservation(id)
            .await?
            .ok_or_else(|| SchedulerError::ReservationNotFound(id.clone()))?;

        if reservation.day != day || reservation.category().day() != day {
            return Err(SchedulerError::Validation(format!(
                "reservation {} does not belong to {}",
                id, day
            )));
        }
        if reservation.category().lane() != Lane::Standard {
            return Err(SchedulerError::Validation(format!(
                "reservation {} is a time-slot entry and cannot be staged",
                id
            )));
        }
        if !reservation.is_eligible() {
            return Err(SchedulerError::NotWaiting(id.clone()));
        }

        let capacity = self.config().group_capacity;
        let mut entries = self.staging_area().slot(day).lock();

        if entries.iter().any(|e| &e.id == id) {
            return Ok(view_of(&entries, capacity));
        }

        let current: u32 = entries.iter().map(|e| e.headcount).sum();
        if current + reservation.headcount > capacity {
            return Err(SchedulerError::CapacityExceeded {
                current,
                adding: reservation.headcount,
                limit: capacity,
            });
        }

        entries.push(StagedEntry {
            id: id.clone(),
            headcount: reservation.headcount,
        });
        Ok(view_of(&entries, capacity))
    }

    /// Return a staged entry to its lane
    pub async fn staging_remove(&self, day: EventDay, id: &ReservationId) -> SchedulerResult<StagingView> {
        self.staging_area().remove(day, id);
        self.staging_view(day)
    }

    /// Current staging set for a day
    pub fn staging_view(&self, day: EventDay) -> SchedulerResult<StagingView> {
        let entries = self.staging_area().slot(day).lock();
        Ok(view_of(&entries, self.config().group_capacity))
    }

    /// Accept the staged group, applying the configured policy to each
    /// member independently. Members that fail stay staged so the
    /// operator can retry or remove them.
    pub async fn staging_accept(&self, day: EventDay) -> SchedulerResult<Vec<AcceptOutcome>> {
        let staged: Vec<StagedEntry> = self.staging_area().slot(day).lock().clone();
        if staged.is_empty() {
            return Err(SchedulerError::Validation("staging set is empty".into()));
        }

        let mut outcomes = Vec::with_capacity(staged.len());
        for entry in &staged {
            let result = self.accept_member(&entry.id).await;
            match result {
                Ok(()) => {
                    self.staging_area().remove(day, &entry.id);
                    outcomes.push(AcceptOutcome {
                        id: entry.id.clone(),
                        accepted: true,
                        error: None,
                    });
                }
                Err(err) => {
                    tracing::warn!(id = %entry.id, error = %err, "Accept failed for staged member");
                    outcomes.push(AcceptOutcome {
                        id: entry.id.clone(),
                        accepted: false,
                        error: Some(err.to_string()),
                    });
                }
            }
        }
        Ok(outcomes)
    }

    async fn accept_member(&self, id: &ReservationId) -> SchedulerResult<()> {
        match self.config().accept_policy {
            AcceptPolicy::StatusTransition => {
                let patch = ReservationPatch {
                    status: Some(ReservationStatus::Visited),
                    priority: Some(false),
                    expect_status: Some(ReservationStatus::Waiting),
                    ..Default::default()
                };
                match self.store().update_reservation(id, patch).await {
                    Ok(_) => Ok(()),
                    // Already resolved by another session
                    Err(StoreError::NotFound(_)) => Ok(()),
                    Err(err) => Err(err.into()),
                }
            }
            AcceptPolicy::Delete => {
                self.store().delete_reservation(id).await?;
                Ok(())
            }
        }
    }
}

fn view_of(entries: &[StagedEntry], capacity: u32) -> StagingView {
    StagingView {
        entries: entries.to_vec(),
        total_headcount: entries.iter().map(|e| e.headcount).sum(),
        capacity,
    }
}
