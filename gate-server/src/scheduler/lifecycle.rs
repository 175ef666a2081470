//! Call Lifecycle State Machine
//!
//! Drives a group through Waiting → Calling → Completed, with an
//! explicit reset back to Waiting. At most one group per day is ever in
//! Calling state. Member outcomes (visited / absent) feed the
//! auto-complete check; a member marked absent vacates room that is
//! backfilled from later groups while the call is still open.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use shared::error::AppError;
use shared::models::{
    CallState, EventDay, Group, Reservation, ReservationId, ReservationPatch, ReservationStatus,
};

use super::{Scheduler, SchedulerError, SchedulerResult};
use crate::store::StoreError;

/// Per-group result of a multi-group call
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CallOutcome {
    pub number: u32,
    pub called: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<u16>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Result of marking a member visited
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VisitOutcome {
    /// False when the record was already resolved (purged or cancelled
    /// by another session); treated as a no-op
    pub applied: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reservation: Option<Reservation>,
    /// Set when this visit completed the calling group
    #[serde(skip_serializing_if = "Option::is_none")]
    pub group_completed: Option<u32>,
}

/// Result of marking a member absent
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AbsentOutcome {
    pub applied: bool,
    /// Reservation moved into the calling group to fill the vacated room
    #[serde(skip_serializing_if = "Option::is_none")]
    pub backfilled: Option<ReservationId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub group_completed: Option<u32>,
}

impl Scheduler {
    /// Call a waiting group forward.
    ///
    /// Requires the group to be Waiting with at least one eligible
    /// member, and no other group Calling for the day. The state
    /// transition is guarded, so two operator sessions racing on the
    /// same group surface a conflict instead of double-calling.
    pub async fn call(&self, day: EventDay, number: u32) -> SchedulerResult<()> {
        let group = self
            .store()
            .get_group(day, number)
            .await?
            .ok_or(SchedulerError::GroupNotFound { number })?;

        if let Some(active) = self.store().get_calling_group(day).await? {
            return Err(SchedulerError::AlreadyCalling {
                active: active.number,
            });
        }
        if group.call_state != CallState::Waiting {
            return Err(SchedulerError::InvalidCallState {
                number,
                state: group.call_state,
            });
        }

        let by_id = self.reservation_index(day).await?;
        let eligible = group
            .members
            .iter()
            .filter_map(|id| by_id.get(id))
            .any(|r| r.is_eligible());
        if !eligible {
            return Err(SchedulerError::EmptyGroup { number });
        }

        self.store()
            .set_group_call_state(day, number, Some(CallState::Waiting), CallState::Calling, Utc::now())
            .await?;
        tracing::info!(day = %day, group = number, "Group called");
        Ok(())
    }

    /// Call several groups, independently; one rejection never blocks
    /// the others. Not atomic: partial success is reported per group.
    pub async fn call_many(&self, day: EventDay, numbers: &[u32]) -> Vec<CallOutcome> {
        let mut outcomes = Vec::with_capacity(numbers.len());
        for &number in numbers {
            match self.call(day, number).await {
                Ok(()) => outcomes.push(CallOutcome {
                    number,
                    called: true,
                    code: None,
                    error: None,
                }),
                Err(err) => {
                    let message = err.to_string();
                    let app: AppError = err.into();
                    outcomes.push(CallOutcome {
                        number,
                        called: false,
                        code: Some(app.code.code()),
                        error: Some(message),
                    });
                }
            }
        }
        outcomes
    }

    /// Mark a member of the calling group as admitted.
    ///
    /// When the last active member turns Visited the group
    /// auto-transitions to Completed.
    pub async fn mark_visited(
        &self,
        id: &ReservationId,
        now: DateTime<Utc>,
    ) -> SchedulerResult<VisitOutcome> {
        let Some(reservation) = self.store().get_reservation(id).await? else {
            // Purged by the absence monitor or removed by another
            // session: already resolved
            return Ok(VisitOutcome {
                applied: false,
                reservation: None,
                group_completed: None,
            });
        };

        match reservation.status {
            ReservationStatus::Waiting => {}
            ReservationStatus::Visited | ReservationStatus::Cancelled => {
                return Ok(VisitOutcome {
                    applied: false,
                    reservation: Some(reservation),
                    group_completed: None,
                });
            }
        }

        let number = reservation
            .group
            .ok_or_else(|| SchedulerError::Validation(format!("reservation {} is not grouped", id)))?;
        let day = reservation.day;
        let group = self
            .store()
            .get_group(day, number)
            .await?
            .ok_or(SchedulerError::GroupNotFound { number })?;
        if group.call_state != CallState::Calling {
            return Err(SchedulerError::NotCalling { number });
        }

        let patch = ReservationPatch {
            status: Some(ReservationStatus::Visited),
            priority: Some(false),
            expect_status: Some(ReservationStatus::Waiting),
            ..Default::default()
        };
        let updated = self.store().update_reservation(id, patch).await?;

        let group_completed = if self.maybe_complete_group(day, number, now).await? {
            Some(number)
        } else {
            None
        };

        Ok(VisitOutcome {
            applied: true,
            reservation: Some(updated),
            group_completed,
        })
    }

    /// Mark a reservation as absent.
    ///
    /// Valid for any waiting reservation, whether its group is being
    /// called or it is merely queued/staged. Removes the member from its
    /// group's active membership and, while the group is Calling,
    /// backfills the vacated room from later groups.
    pub async fn mark_absent(
        &self,
        id: &ReservationId,
        now: DateTime<Utc>,
    ) -> SchedulerResult<AbsentOutcome> {
        let Some(reservation) = self.store().get_reservation(id).await? else {
            return Ok(AbsentOutcome {
                applied: false,
                backfilled: None,
                group_completed: None,
            });
        };

        if reservation.absent || reservation.status == ReservationStatus::Cancelled {
            return Ok(AbsentOutcome {
                applied: false,
                backfilled: None,
                group_completed: None,
            });
        }
        if reservation.status != ReservationStatus::Waiting {
            return Err(SchedulerError::NotWaiting(id.clone()));
        }

        let patch = ReservationPatch {
            absent: Some(true),
            absent_at: Some(now),
            // Leaves the lane until guided back; the group slot is freed
            group: Some(None),
            expect_status: Some(ReservationStatus::Waiting),
            expect_absent: Some(false),
            ..Default::default()
        };
        self.store().update_reservation(id, patch).await?;

        let day = reservation.day;
        self.staging_area().remove(day, id);

        let mut backfilled = None;
        let mut group_completed = None;

        if let Some(number) = reservation.group {
            match self.store().get_group(day, number).await? {
                Some(group) => {
                    let members: Vec<ReservationId> = group
                        .members
                        .iter()
                        .filter(|m| *m != id)
                        .cloned()
                        .collect();
                    if let Err(err) = self
                        .store()
                        .update_group_members(day, number, members)
                        .await
                    {
                        tracing::warn!(group = number, error = %err, "Failed to shrink group membership");
                    }

                    if group.call_state == CallState::Calling {
                        backfilled = self
                            .backfill_vacant_slot(day, number, reservation.headcount)
                            .await?;
                        if self.maybe_complete_group(day, number, now).await? {
                            group_completed = Some(number);
                        }
                    }
                }
                None => {
                    tracing::warn!(group = number, "Absent member referenced a missing group");
                }
            }
        }

        tracing::info!(id = %id, "Reservation marked absent");
        Ok(AbsentOutcome {
            applied: true,
            backfilled,
            group_completed,
        })
    }

    /// Send a group back to Waiting.
    ///
    /// Valid from Calling or Completed; members still waiting regain
    /// lane eligibility automatically since lanes are derived from
    /// reservation state. No-op on an already-waiting group.
    pub async fn reset_group(&self, day: EventDay, number: u32) -> SchedulerResult<()> {
        let group = self
            .store()
            .get_group(day, number)
            .await?
            .ok_or(SchedulerError::GroupNotFound { number })?;

        if group.call_state == CallState::Waiting {
            return Ok(());
        }

        self.store()
            .set_group_call_state(day, number, Some(group.call_state), CallState::Waiting, Utc::now())
            .await?;
        tracing::info!(day = %day, group = number, "Group reset to waiting");
        Ok(())
    }

    /// Complete the group if no active member is still waiting.
    ///
    /// Returns whether the transition happened. A concurrent transition
    /// by another session is benign and reported as `false`.
    async fn maybe_complete_group(
        &self,
        day: EventDay,
        number: u32,
        now: DateTime<Utc>,
    ) -> SchedulerResult<bool> {
        let Some(group) = self.store().get_group(day, number).await? else {
            return Ok(false);
        };
        if group.call_state != CallState::Calling {
            return Ok(false);
        }

        let by_id = self.reservation_index(day).await?;
        let any_waiting = group
            .members
            .iter()
            .filter_map(|id| by_id.get(id))
            .any(|r| r.is_eligible());
        if any_waiting {
            return Ok(false);
        }

        match self
            .store()
            .set_group_call_state(day, number, Some(CallState::Calling), CallState::Completed, now)
            .await
        {
            Ok(_) => {
                tracing::info!(day = %day, group = number, "Group completed");
                Ok(true)
            }
            Err(StoreError::Conflict(_)) | Err(StoreError::NotFound(_)) => Ok(false),
            Err(err) => Err(err.into()),
        }
    }

    /// Move the best later-group candidate into the calling group to
    /// fill room vacated by an absentee.
    ///
    /// Candidate order: promoted absentees first, then lowest group
    /// number, then id. Every step is an independent single-record
    /// write; a failure mid-way is logged and leaves the queue in a
    /// recoverable state.
    async fn backfill_vacant_slot(
        &self,
        day: EventDay,
        number: u32,
        room: u32,
    ) -> SchedulerResult<Option<ReservationId>> {
        let snapshot = self.store().list_reservations(day, None, None).await?;
        let mut candidates: Vec<&Reservation> = snapshot
            .iter()
            .filter(|r| r.is_eligible())
            .filter(|r| r.headcount <= room)
            .filter(|r| r.group.is_some_and(|g| g > number))
            .collect();
        candidates.sort_by(|a, b| {
            b.priority
                .cmp(&a.priority)
                .then(a.group.cmp(&b.group))
                .then(a.id.cmp(&b.id))
        });

        let Some(selected) = candidates.first() else {
            return Ok(None);
        };
        let old_group = selected.group.expect("backfill candidate is grouped");

        let patch = ReservationPatch {
            group: Some(Some(number)),
            priority: Some(false),
            expect_status: Some(ReservationStatus::Waiting),
            ..Default::default()
        };
        match self.store().update_reservation(&selected.id, patch).await {
            Ok(_) => {}
            Err(StoreError::Conflict(msg)) => {
                tracing::debug!(id = %selected.id, %msg, "Backfill candidate raced away");
                return Ok(None);
            }
            Err(err) => return Err(err.into()),
        }

        if let Err(err) = self.remove_member(day, old_group, &selected.id).await {
            tracing::warn!(group = old_group, error = %err, "Failed to detach backfill candidate");
        }
        if let Err(err) = self.append_member(day, number, &selected.id).await {
            tracing::warn!(group = number, error = %err, "Failed to attach backfill candidate");
        }

        tracing::info!(id = %selected.id, from = old_group, to = number, "Vacant slot backfilled");
        Ok(Some(selected.id.clone()))
    }

    pub(crate) async fn remove_member(
        &self,
        day: EventDay,
        number: u32,
        id: &ReservationId,
    ) -> SchedulerResult<Group> {
        let group = self
            .store()
            .get_group(day, number)
            .await?
            .ok_or(SchedulerError::GroupNotFound { number })?;
        let members: Vec<ReservationId> =
            group.members.iter().filter(|m| *m != id).cloned().collect();
        Ok(self.store().update_group_members(day, number, members).await?)
    }

    pub(crate) async fn append_member(
        &self,
        day: EventDay,
        number: u32,
        id: &ReservationId,
    ) -> SchedulerResult<Group> {
        let group = self
            .store()
            .get_group(day, number)
            .await?
            .ok_or(SchedulerError::GroupNotFound { number })?;
        let mut members = group.members.clone();
        if !members.contains(id) {
            members.push(id.clone());
        }
        Ok(self.store().update_group_members(day, number, members).await?)
    }
}
