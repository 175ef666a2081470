//! Automatic group formation
//!
//! Aggregates reservations that already carry a group number into
//! candidate call groups. This policy never assigns numbers itself;
//! assignment happens at ingestion time (`intake`).

use std::collections::HashMap;

use chrono::{DateTime, Utc};

use shared::models::{CallState, EventDay, GroupCandidate, Reservation, ReservationId};

use super::{Scheduler, SchedulerResult};

impl Scheduler {
    /// Build the ordered candidate list for a day.
    ///
    /// Only Waiting groups qualify; the currently-Calling group (if any)
    /// is excluded by number. Within a candidate only eligible members
    /// count. Candidates with no eligible member are dropped. Ordering:
    /// `has_priority` desc, then `number` asc.
    pub async fn form_candidate_groups(&self, day: EventDay) -> SchedulerResult<Vec<GroupCandidate>> {
        let groups = self.store().list_groups(day).await?;
        let by_id = self.reservation_index(day).await?;

        let calling_number = groups
            .iter()
            .find(|g| g.call_state == CallState::Calling)
            .map(|g| g.number);

        let mut candidates = Vec::new();
        for group in &groups {
            if group.call_state != CallState::Waiting {
                continue;
            }
            if Some(group.number) == calling_number {
                continue;
            }
            let members: Vec<Reservation> = group
                .members
                .iter()
                .filter_map(|id| by_id.get(id))
                .filter(|r| r.is_eligible())
                .cloned()
                .collect();
            if members.is_empty() {
                continue;
            }
            candidates.push(GroupCandidate::from_members(group, members));
        }

        candidates.sort_by(|a, b| {
            b.has_priority
                .cmp(&a.has_priority)
                .then(a.number.cmp(&b.number))
        });
        Ok(candidates)
    }

    /// The next group to call forward.
    ///
    /// Runs the time-based VIP assignment and bundles any promoted
    /// absentees into a fresh priority group first, then surfaces the
    /// top candidate.
    pub async fn next_group(
        &self,
        day: EventDay,
        now: DateTime<Utc>,
    ) -> SchedulerResult<Option<GroupCandidate>> {
        self.assign_ready_vips(day, now).await?;
        self.form_priority_group(day, now).await?;
        let candidates = self.form_candidate_groups(day).await?;
        Ok(candidates.into_iter().next())
    }

    /// The group currently being called, with all member records resolved
    /// (visited members included, so the operator sees progress).
    pub async fn calling_group(&self, day: EventDay) -> SchedulerResult<Option<GroupCandidate>> {
        let Some(group) = self.store().get_calling_group(day).await? else {
            return Ok(None);
        };
        let by_id = self.reservation_index(day).await?;
        let members: Vec<Reservation> = group
            .members
            .iter()
            .filter_map(|id| by_id.get(id))
            .cloned()
            .collect();
        Ok(Some(GroupCandidate::from_members(&group, members)))
    }

    pub(crate) async fn reservation_index(
        &self,
        day: EventDay,
    ) -> SchedulerResult<HashMap<ReservationId, Reservation>> {
        let snapshot = self.store().list_reservations(day, None, None).await?;
        Ok(snapshot.into_iter().map(|r| (r.id.clone(), r)).collect())
    }
}
