//! In-memory store implementation
//!
//! Backs the server and the test suite. `DashMap` entries give the
//! per-id write serialization the scheduler contract requires; patch
//! preconditions are checked under the entry lock so a stale caller
//! observes `Conflict` rather than clobbering a concurrent transition.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use parking_lot::RwLock;

use shared::models::{
    CallState, Category, EventDay, Group, Reservation, ReservationId, ReservationPatch,
    ReservationStatus, Settings, SettingsPatch,
};

use super::{Store, StoreError, StoreResult};

/// In-memory record store
#[derive(Debug, Default)]
pub struct MemoryStore {
    reservations: DashMap<ReservationId, Reservation>,
    groups: DashMap<(EventDay, u32), Group>,
    settings: RwLock<Settings>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed settings, used by tests
    pub fn with_settings(settings: Settings) -> Self {
        Self {
            settings: RwLock::new(settings),
            ..Self::default()
        }
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn list_reservations(
        &self,
        day: EventDay,
        status: Option<ReservationStatus>,
        category: Option<Category>,
    ) -> StoreResult<Vec<Reservation>> {
        let mut out: Vec<Reservation> = self
            .reservations
            .iter()
            .filter(|entry| entry.day == day)
            .filter(|entry| status.is_none_or(|s| entry.status == s))
            .filter(|entry| category.is_none_or(|c| entry.id.category() == c))
            .map(|entry| entry.clone())
            .collect();
        out.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(out)
    }

    async fn get_reservation(&self, id: &ReservationId) -> StoreResult<Option<Reservation>> {
        Ok(self.reservations.get(id).map(|r| r.clone()))
    }

    async fn insert_reservation(&self, reservation: Reservation) -> StoreResult<()> {
        match self.reservations.entry(reservation.id.clone()) {
            Entry::Occupied(_) => Err(StoreError::Duplicate(format!(
                "reservation {} already exists",
                reservation.id
            ))),
            Entry::Vacant(slot) => {
                slot.insert(reservation);
                Ok(())
            }
        }
    }

    async fn update_reservation(
        &self,
        id: &ReservationId,
        patch: ReservationPatch,
    ) -> StoreResult<Reservation> {
        let mut entry = self
            .reservations
            .get_mut(id)
            .ok_or_else(|| StoreError::NotFound(format!("reservation {} not found", id)))?;

        if let Some(expect) = patch.expect_status
            && entry.status != expect
        {
            return Err(StoreError::Conflict(format!(
                "reservation {} is {:?}, expected {:?}",
                id, entry.status, expect
            )));
        }
        if let Some(expect) = patch.expect_absent
            && entry.absent != expect
        {
            return Err(StoreError::Conflict(format!(
                "reservation {} absent flag is {}, expected {}",
                id, entry.absent, expect
            )));
        }

        if let Some(status) = patch.status {
            entry.status = status;
        }
        if let Some(priority) = patch.priority {
            entry.priority = priority;
        }
        if let Some(absent) = patch.absent {
            entry.absent = absent;
            if absent {
                entry.absent_at = patch.absent_at;
            } else {
                entry.absent_at = None;
            }
        }
        if let Some(group) = patch.group {
            entry.group = group;
        }
        if let Some(reason) = patch.cancel_reason {
            entry.cancel_reason = Some(reason);
        }

        Ok(entry.clone())
    }

    async fn delete_reservation(&self, id: &ReservationId) -> StoreResult<bool> {
        Ok(self.reservations.remove(id).is_some())
    }

    async fn list_groups(&self, day: EventDay) -> StoreResult<Vec<Group>> {
        let mut out: Vec<Group> = self
            .groups
            .iter()
            .filter(|entry| entry.day == day)
            .map(|entry| entry.clone())
            .collect();
        out.sort_by_key(|g| g.number);
        Ok(out)
    }

    async fn get_group(&self, day: EventDay, number: u32) -> StoreResult<Option<Group>> {
        Ok(self.groups.get(&(day, number)).map(|g| g.clone()))
    }

    async fn insert_group(&self, group: Group) -> StoreResult<()> {
        match self.groups.entry((group.day, group.number)) {
            Entry::Occupied(_) => Err(StoreError::Duplicate(format!(
                "group {} already exists for {}",
                group.number, group.day
            ))),
            Entry::Vacant(slot) => {
                slot.insert(group);
                Ok(())
            }
        }
    }

    async fn update_group_members(
        &self,
        day: EventDay,
        number: u32,
        members: Vec<ReservationId>,
    ) -> StoreResult<Group> {
        let mut entry = self
            .groups
            .get_mut(&(day, number))
            .ok_or_else(|| StoreError::NotFound(format!("group {} not found for {}", number, day)))?;
        entry.members = members;
        Ok(entry.clone())
    }

    async fn get_calling_group(&self, day: EventDay) -> StoreResult<Option<Group>> {
        Ok(self
            .groups
            .iter()
            .find(|entry| entry.day == day && entry.call_state == CallState::Calling)
            .map(|entry| entry.clone()))
    }

    async fn set_group_call_state(
        &self,
        day: EventDay,
        number: u32,
        expect: Option<CallState>,
        next: CallState,
        at: DateTime<Utc>,
    ) -> StoreResult<Group> {
        let mut entry = self
            .groups
            .get_mut(&(day, number))
            .ok_or_else(|| StoreError::NotFound(format!("group {} not found for {}", number, day)))?;

        if let Some(expect) = expect
            && entry.call_state != expect
        {
            return Err(StoreError::Conflict(format!(
                "group {} is {:?}, expected {:?}",
                number, entry.call_state, expect
            )));
        }

        entry.call_state = next;
        match next {
            CallState::Calling => entry.called_at = Some(at),
            CallState::Completed => entry.completed_at = Some(at),
            CallState::Waiting => entry.completed_at = None,
        }

        Ok(entry.clone())
    }

    async fn get_settings(&self) -> StoreResult<Settings> {
        Ok(self.settings.read().clone())
    }

    async fn update_settings(&self, patch: SettingsPatch) -> StoreResult<Settings> {
        let mut settings = self.settings.write();
        patch.apply_to(&mut settings);
        Ok(settings.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::models::Category;

    fn reservation(id: &str, day: EventDay, headcount: u32) -> Reservation {
        Reservation {
            id: ReservationId::parse(id).unwrap(),
            day,
            headcount,
            scheduled_time: None,
            status: ReservationStatus::Waiting,
            priority: false,
            absent: false,
            absent_at: None,
            created_at: Utc::now(),
            group: None,
            cancel_reason: None,
        }
    }

    #[tokio::test]
    async fn test_insert_and_list_by_day() {
        let store = MemoryStore::new();
        store
            .insert_reservation(reservation("A0001", EventDay::Day1, 2))
            .await
            .unwrap();
        store
            .insert_reservation(reservation("B0001", EventDay::Day2, 1))
            .await
            .unwrap();

        let day1 = store.list_reservations(EventDay::Day1, None, None).await.unwrap();
        assert_eq!(day1.len(), 1);
        assert_eq!(day1[0].id.category(), Category::A);
    }

    #[tokio::test]
    async fn test_duplicate_insert_rejected() {
        let store = MemoryStore::new();
        store
            .insert_reservation(reservation("A0001", EventDay::Day1, 2))
            .await
            .unwrap();
        let err = store
            .insert_reservation(reservation("A0001", EventDay::Day1, 2))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Duplicate(_)));
    }

    #[tokio::test]
    async fn test_guarded_update_conflict() {
        let store = MemoryStore::new();
        store
            .insert_reservation(reservation("C0001", EventDay::Day1, 2))
            .await
            .unwrap();

        // First transition succeeds
        store
            .update_reservation(
                &ReservationId::parse("C0001").unwrap(),
                ReservationPatch {
                    status: Some(ReservationStatus::Visited),
                    expect_status: Some(ReservationStatus::Waiting),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        // Second session acting on the stale snapshot conflicts
        let err = store
            .update_reservation(
                &ReservationId::parse("C0001").unwrap(),
                ReservationPatch {
                    status: Some(ReservationStatus::Visited),
                    expect_status: Some(ReservationStatus::Waiting),
                    ..Default::default()
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Conflict(_)));
    }

    #[tokio::test]
    async fn test_clearing_absent_clears_timestamp() {
        let store = MemoryStore::new();
        store
            .insert_reservation(reservation("C0001", EventDay::Day1, 2))
            .await
            .unwrap();
        let id = ReservationId::parse("C0001").unwrap();

        store
            .update_reservation(
                &id,
                ReservationPatch {
                    absent: Some(true),
                    absent_at: Some(Utc::now()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        let updated = store
            .update_reservation(
                &id,
                ReservationPatch {
                    absent: Some(false),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert!(!updated.absent);
        assert!(updated.absent_at.is_none());
    }

    #[tokio::test]
    async fn test_call_state_guard() {
        let store = MemoryStore::new();
        let now = Utc::now();
        store
            .insert_group(Group::new(1, EventDay::Day1, vec![], now))
            .await
            .unwrap();

        store
            .set_group_call_state(
                EventDay::Day1,
                1,
                Some(CallState::Waiting),
                CallState::Calling,
                now,
            )
            .await
            .unwrap();

        let err = store
            .set_group_call_state(
                EventDay::Day1,
                1,
                Some(CallState::Waiting),
                CallState::Calling,
                now,
            )
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Conflict(_)));

        let calling = store.get_calling_group(EventDay::Day1).await.unwrap();
        assert_eq!(calling.unwrap().number, 1);
    }
}
