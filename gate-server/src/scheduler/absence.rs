//! Absence Monitor
//!
//! Tracks no-shows: lists absentees with elapsed time, purges entries
//! whose grace period ran out, and re-admits guests guided back in
//! time. Guide-back is the only mechanism that sets `priority`, which
//! orders the guest ahead of all non-priority entries in the Standard
//! lane.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use shared::models::{
    AbsenteeEntry, EventDay, Reservation, ReservationId, ReservationPatch, ReservationStatus,
};

use super::{PurgePolicy, Scheduler, SchedulerError, SchedulerResult};
use crate::store::StoreError;

/// Reason recorded on reservations cancelled by the timeout purge
pub const PURGE_REASON: &str = "priority_timeout";

/// Result of one purge pass
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PurgeReport {
    pub purged: Vec<ReservationId>,
    /// Entries that raced away mid-pass (already handled elsewhere)
    pub skipped: usize,
}

impl Scheduler {
    /// All absentees for a day, ordered by when they went absent,
    /// annotated with elapsed time
    pub async fn list_absentees(
        &self,
        day: EventDay,
        now: DateTime<Utc>,
    ) -> SchedulerResult<Vec<AbsenteeEntry>> {
        let snapshot = self.store().list_reservations(day, None, None).await?;
        let grace = self.config().absence_grace;

        let mut absentees: Vec<AbsenteeEntry> = snapshot
            .into_iter()
            .filter(|r| r.absent)
            .map(|reservation| {
                let elapsed = reservation
                    .absent_at
                    .map(|at| now - at)
                    .unwrap_or_default();
                AbsenteeEntry {
                    expired: elapsed >= grace,
                    elapsed_secs: elapsed.num_seconds(),
                    reservation,
                }
            })
            .collect();
        absentees.sort_by_key(|e| e.reservation.absent_at);
        Ok(absentees)
    }

    /// Purge every absentee whose grace period has run out.
    ///
    /// Each record is attempted once per pass; an entry purged or
    /// resolved by a concurrent session is skipped silently, so
    /// repeated passes are no-ops.
    pub async fn purge_expired(
        &self,
        day: EventDay,
        now: DateTime<Utc>,
    ) -> SchedulerResult<PurgeReport> {
        let absentees = self.list_absentees(day, now).await?;
        let mut report = PurgeReport::default();

        for entry in absentees.iter().filter(|e| e.expired) {
            let id = &entry.reservation.id;
            match self.purge_one(id).await {
                Ok(true) => report.purged.push(id.clone()),
                Ok(false) => report.skipped += 1,
                Err(err) => {
                    tracing::warn!(id = %id, error = %err, "Purge failed");
                    report.skipped += 1;
                }
            }
        }

        if !report.purged.is_empty() {
            tracing::info!(day = %day, count = report.purged.len(), "Expired absentees purged");
        }
        Ok(report)
    }

    async fn purge_one(&self, id: &ReservationId) -> SchedulerResult<bool> {
        match self.config().purge_policy {
            PurgePolicy::Delete => Ok(self.store().delete_reservation(id).await?),
            PurgePolicy::Cancel => {
                let patch = ReservationPatch {
                    status: Some(ReservationStatus::Cancelled),
                    absent: Some(false),
                    priority: Some(false),
                    cancel_reason: Some(PURGE_REASON.to_string()),
                    expect_status: Some(ReservationStatus::Waiting),
                    expect_absent: Some(true),
                    ..Default::default()
                };
                match self.store().update_reservation(id, patch).await {
                    Ok(_) => Ok(true),
                    // Already resolved elsewhere
                    Err(StoreError::NotFound(_)) | Err(StoreError::Conflict(_)) => Ok(false),
                    Err(err) => Err(err.into()),
                }
            }
        }
    }

    /// Re-admit an absentee who came back before the timeout.
    ///
    /// Clears the absent flag and promotes the reservation, placing it
    /// ahead of all non-priority entries in the Standard lane.
    pub async fn guide_back(
        &self,
        id: &ReservationId,
        now: DateTime<Utc>,
    ) -> SchedulerResult<Reservation> {
        let reservation = self
            .store()
            .get_reservation(id)
            .await?
            .ok_or_else(|| SchedulerError::ReservationNotFound(id.clone()))?;

        if !reservation.absent {
            return Err(SchedulerError::NotAbsent(id.clone()));
        }
        let elapsed = reservation
            .absent_at
            .map(|at| now - at)
            .unwrap_or_default();
        if elapsed >= self.config().absence_grace {
            return Err(SchedulerError::AbsenceExpired(id.clone()));
        }

        let patch = ReservationPatch {
            absent: Some(false),
            priority: Some(true),
            expect_status: Some(ReservationStatus::Waiting),
            expect_absent: Some(true),
            ..Default::default()
        };
        let updated = self.store().update_reservation(id, patch).await?;
        tracing::info!(id = %id, "Absentee guided back with priority");
        Ok(updated)
    }
}
