//! Reservation intake and ingestion-time group assignment
//!
//! New reservations get a category-prefixed sequential id. Standard
//! entries are placed first-fit into a waiting group of the matching
//! parity (advance bookings take odd numbers, walk-ins even). VIP
//! entries stay unassigned until shortly before their scheduled time.
//! Promoted absentees are bundled into dedicated priority groups that
//! jump the candidate ordering.

use chrono::{DateTime, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

use shared::models::{
    CallState, Category, CategoryKind, EventDay, Group, Reservation, ReservationId,
    ReservationPatch, ReservationStatus,
};

use super::{Scheduler, SchedulerError, SchedulerResult};

/// Intake payload
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct ReservationRequest {
    pub category: Category,
    #[validate(range(min = 1, message = "headcount must be positive"))]
    pub headcount: u32,
    /// Required for VIP categories, rejected otherwise
    pub scheduled_time: Option<NaiveTime>,
}

impl Scheduler {
    /// Register a new reservation.
    ///
    /// Validation happens before any write: positive headcount no larger
    /// than a group, scheduled time present iff the category is VIP, and
    /// reception open for walk-in intake. Standard entries are assigned
    /// a group immediately; VIP entries wait for their time slot.
    pub async fn create_reservation(
        &self,
        request: &ReservationRequest,
        now: DateTime<Utc>,
    ) -> SchedulerResult<Reservation> {
        let capacity = self.config().group_capacity;
        if request.headcount == 0 {
            return Err(SchedulerError::Validation("headcount must be positive".into()));
        }
        if request.headcount > capacity {
            return Err(SchedulerError::Validation(format!(
                "headcount {} exceeds group capacity {}",
                request.headcount, capacity
            )));
        }

        let category = request.category;
        if category.requires_time() && request.scheduled_time.is_none() {
            return Err(SchedulerError::Validation(format!(
                "category {} requires a scheduled time",
                category
            )));
        }
        if !category.requires_time() && request.scheduled_time.is_some() {
            return Err(SchedulerError::Validation(format!(
                "category {} does not take a scheduled time",
                category
            )));
        }
        if category.kind() == CategoryKind::WalkIn && !self.settings().get().reception_open {
            return Err(SchedulerError::ReceptionClosed);
        }

        let day = category.day();
        let id = self.next_reservation_id(day, category).await?;

        let mut reservation = Reservation {
            id: id.clone(),
            day,
            headcount: request.headcount,
            scheduled_time: request.scheduled_time,
            status: ReservationStatus::Waiting,
            priority: false,
            absent: false,
            absent_at: None,
            created_at: now,
            group: None,
            cancel_reason: None,
        };
        self.store().insert_reservation(reservation.clone()).await?;

        // VIP entries wait for their call window; everything else is
        // grouped right away
        if category.kind() != CategoryKind::Vip {
            let number = self
                .assign_to_group(day, category.kind(), request.headcount, &id, now)
                .await?;
            let patch = ReservationPatch {
                group: Some(Some(number)),
                expect_status: Some(ReservationStatus::Waiting),
                ..Default::default()
            };
            reservation = self.store().update_reservation(&id, patch).await?;
        }

        tracing::info!(id = %id, group = ?reservation.group, "Reservation created");
        Ok(reservation)
    }

    /// Cancel a waiting reservation. Already-resolved records are a
    /// no-op; a visited guest cannot be cancelled.
    pub async fn cancel_reservation(&self, id: &ReservationId) -> SchedulerResult<Option<Reservation>> {
        let Some(reservation) = self.store().get_reservation(id).await? else {
            return Ok(None);
        };
        match reservation.status {
            ReservationStatus::Cancelled => return Ok(Some(reservation)),
            ReservationStatus::Visited => return Err(SchedulerError::NotWaiting(id.clone())),
            ReservationStatus::Waiting => {}
        }

        let patch = ReservationPatch {
            status: Some(ReservationStatus::Cancelled),
            absent: Some(false),
            priority: Some(false),
            expect_status: Some(ReservationStatus::Waiting),
            ..Default::default()
        };
        let updated = self.store().update_reservation(id, patch).await?;
        self.staging_area().remove(reservation.day, id);
        tracing::info!(id = %id, "Reservation cancelled");
        Ok(Some(updated))
    }

    /// Hard-delete a reservation, detaching it from its group and the
    /// staging set. Returns false when the record was already gone.
    pub async fn delete_reservation(&self, id: &ReservationId) -> SchedulerResult<bool> {
        let Some(reservation) = self.store().get_reservation(id).await? else {
            return Ok(false);
        };
        if let Some(number) = reservation.group
            && let Err(err) = self.remove_member(reservation.day, number, id).await
        {
            tracing::warn!(group = number, error = %err, "Failed to detach deleted reservation");
        }
        self.staging_area().remove(reservation.day, id);
        Ok(self.store().delete_reservation(id).await?)
    }

    /// Assign every VIP reservation whose call window has opened
    /// (scheduled time minus the configured lead) into a waiting group,
    /// first-fit, or a fresh group when none has room.
    pub async fn assign_ready_vips(&self, day: EventDay, now: DateTime<Utc>) -> SchedulerResult<usize> {
        let snapshot = self.store().list_reservations(day, None, None).await?;
        let date = self.config().date_of(day);
        let lead = self.config().vip_lead;

        let ready: Vec<&Reservation> = snapshot
            .iter()
            .filter(|r| r.is_eligible() && r.group.is_none())
            .filter(|r| r.category().kind() == CategoryKind::Vip)
            .filter(|r| {
                r.scheduled_time
                    .is_some_and(|t| now.naive_utc() >= date.and_time(t) - lead)
            })
            .collect();

        let mut assigned = 0;
        for vip in ready {
            match self.place_into_waiting_group(day, vip.headcount, &vip.id, None, now).await {
                Ok(number) => {
                    let patch = ReservationPatch {
                        group: Some(Some(number)),
                        expect_status: Some(ReservationStatus::Waiting),
                        ..Default::default()
                    };
                    if let Err(err) = self.store().update_reservation(&vip.id, patch).await {
                        tracing::warn!(id = %vip.id, error = %err, "Failed to record VIP assignment");
                        continue;
                    }
                    tracing::info!(id = %vip.id, group = number, "VIP assigned to group");
                    assigned += 1;
                }
                Err(err) => {
                    tracing::warn!(id = %vip.id, error = %err, "VIP assignment failed");
                }
            }
        }
        Ok(assigned)
    }

    /// Bundle promoted absentees (guided back, not yet regrouped) into a
    /// fresh priority group. Entries that do not fit stay queued for the
    /// next pass. Returns the new group number, if one was formed.
    pub async fn form_priority_group(
        &self,
        day: EventDay,
        now: DateTime<Utc>,
    ) -> SchedulerResult<Option<u32>> {
        let snapshot = self.store().list_reservations(day, None, None).await?;
        let capacity = self.config().group_capacity;

        let mut promoted: Vec<&Reservation> = snapshot
            .iter()
            .filter(|r| r.is_eligible() && r.priority && r.group.is_none())
            .collect();
        if promoted.is_empty() {
            return Ok(None);
        }
        promoted.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));

        let groups = self.store().list_groups(day).await?;
        let number = next_number(&groups, None);

        let mut members = Vec::new();
        let mut total = 0;
        for res in promoted {
            if total + res.headcount > capacity {
                continue;
            }
            members.push(res.id.clone());
            total += res.headcount;
        }
        if members.is_empty() {
            return Ok(None);
        }

        let mut group = Group::new(number, day, members.clone(), now);
        group.is_priority = true;
        self.store().insert_group(group).await?;

        for id in &members {
            let patch = ReservationPatch {
                group: Some(Some(number)),
                expect_status: Some(ReservationStatus::Waiting),
                ..Default::default()
            };
            if let Err(err) = self.store().update_reservation(id, patch).await {
                tracing::warn!(id = %id, error = %err, "Failed to record priority grouping");
            }
        }

        tracing::info!(day = %day, group = number, members = members.len(), "Priority group formed");
        Ok(Some(number))
    }

    /// Next free id for a category: highest existing sequence + 1
    async fn next_reservation_id(
        &self,
        day: EventDay,
        category: Category,
    ) -> SchedulerResult<ReservationId> {
        let existing = self
            .store()
            .list_reservations(day, None, Some(category))
            .await?;
        let max_seq = existing.iter().map(|r| r.id.sequence()).max().unwrap_or(0);
        Ok(ReservationId::new(category, max_seq + 1))
    }

    /// First-fit placement into a waiting group of the required parity,
    /// creating a fresh group when nothing has room.
    async fn assign_to_group(
        &self,
        day: EventDay,
        kind: CategoryKind,
        headcount: u32,
        id: &ReservationId,
        now: DateTime<Utc>,
    ) -> SchedulerResult<u32> {
        self.place_into_waiting_group(day, headcount, id, Some(kind), now)
            .await
    }

    /// Shared placement routine. `kind` narrows the search to the parity
    /// lane (advance odd / walk-in even); `None` considers every waiting
    /// group, which is how VIP entries slot in.
    async fn place_into_waiting_group(
        &self,
        day: EventDay,
        headcount: u32,
        id: &ReservationId,
        kind: Option<CategoryKind>,
        now: DateTime<Utc>,
    ) -> SchedulerResult<u32> {
        let capacity = self.config().group_capacity;
        let groups = self.store().list_groups(day).await?;
        let by_id = self.reservation_index(day).await?;

        for group in groups.iter().filter(|g| g.call_state == CallState::Waiting) {
            if !parity_matches(kind, group.number) {
                continue;
            }
            let total: u32 = group
                .members
                .iter()
                .filter_map(|m| by_id.get(m))
                .map(|r| r.headcount)
                .sum();
            if total + headcount <= capacity {
                self.append_member(day, group.number, id).await?;
                return Ok(group.number);
            }
        }

        let number = next_number(&groups, kind);
        self.store()
            .insert_group(Group::new(number, day, vec![id.clone()], now))
            .await?;
        Ok(number)
    }
}

fn parity_matches(kind: Option<CategoryKind>, number: u32) -> bool {
    match kind {
        Some(CategoryKind::Advance) => number % 2 == 1,
        Some(CategoryKind::WalkIn) => number % 2 == 0,
        _ => true,
    }
}

/// Lowest unused group number above the current maximum, respecting the
/// parity lane when one is requested
fn next_number(groups: &[Group], kind: Option<CategoryKind>) -> u32 {
    let existing: std::collections::HashSet<u32> = groups.iter().map(|g| g.number).collect();
    let step = if kind.is_some() { 2 } else { 1 };

    let mut candidate = match groups.iter().map(|g| g.number).max() {
        None => match kind {
            Some(CategoryKind::Advance) => 1,
            Some(CategoryKind::WalkIn) => 2,
            _ => 1,
        },
        Some(max) => {
            let mut n = max + 1;
            if !parity_matches(kind, n) {
                n += 1;
            }
            n
        }
    };
    while existing.contains(&candidate) {
        candidate += step;
    }
    candidate
}

#[cfg(test)]
mod tests {
    use super::*;

    fn group(number: u32) -> Group {
        Group::new(number, EventDay::Day1, vec![], Utc::now())
    }

    #[test]
    fn test_next_number_empty() {
        assert_eq!(next_number(&[], Some(CategoryKind::Advance)), 1);
        assert_eq!(next_number(&[], Some(CategoryKind::WalkIn)), 2);
        assert_eq!(next_number(&[], None), 1);
    }

    #[test]
    fn test_next_number_keeps_parity() {
        let groups = vec![group(1), group(2), group(3)];
        assert_eq!(next_number(&groups, Some(CategoryKind::Advance)), 5);
        assert_eq!(next_number(&groups, Some(CategoryKind::WalkIn)), 4);
        assert_eq!(next_number(&groups, None), 4);
    }

    #[test]
    fn test_parity_matches() {
        assert!(parity_matches(Some(CategoryKind::Advance), 3));
        assert!(!parity_matches(Some(CategoryKind::Advance), 4));
        assert!(parity_matches(Some(CategoryKind::WalkIn), 4));
        assert!(parity_matches(None, 7));
    }
}
