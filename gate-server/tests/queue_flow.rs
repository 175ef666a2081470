//! End-to-end scheduler flows against the in-memory store

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, NaiveTime, TimeDelta, Utc};
use tokio_util::sync::CancellationToken;

use gate_server::scheduler::{
    AcceptPolicy, PurgePolicy, ReservationRequest, Scheduler, SchedulerConfig, SchedulerError,
};
use gate_server::services::{RolloverTimer, SettingsCache};
use gate_server::store::{MemoryStore, Store};
use shared::models::{
    CallState, Category, EventDay, Group, Reservation, ReservationId, ReservationStatus, Settings,
};

const DAY: EventDay = EventDay::Day1;

fn t0() -> DateTime<Utc> {
    "2025-11-01T09:00:00Z".parse().unwrap()
}

fn rid(s: &str) -> ReservationId {
    ReservationId::parse(s).unwrap()
}

fn reservation(id: &str, headcount: u32, created_offset_secs: i64) -> Reservation {
    let id = rid(id);
    Reservation {
        day: id.category().day(),
        id,
        headcount,
        scheduled_time: None,
        status: ReservationStatus::Waiting,
        priority: false,
        absent: false,
        absent_at: None,
        created_at: t0() + TimeDelta::seconds(created_offset_secs),
        group: None,
        cancel_reason: None,
    }
}

async fn scheduler_with_config(config: SchedulerConfig) -> (Arc<MemoryStore>, Arc<Scheduler>) {
    let store = Arc::new(MemoryStore::new());
    let settings = Arc::new(SettingsCache::load(store.clone()).await.unwrap());
    let scheduler = Arc::new(Scheduler::new(store.clone(), settings, config));
    (store, scheduler)
}

async fn scheduler() -> (Arc<MemoryStore>, Arc<Scheduler>) {
    scheduler_with_config(SchedulerConfig::default()).await
}

/// Seed a waiting group whose members are already in the store
async fn seed_group(store: &MemoryStore, number: u32, members: &[&Reservation]) {
    let ids: Vec<ReservationId> = members.iter().map(|r| r.id.clone()).collect();
    for member in members {
        let patch = shared::models::ReservationPatch {
            group: Some(Some(number)),
            ..Default::default()
        };
        store.update_reservation(&member.id, patch).await.unwrap();
    }
    store
        .insert_group(Group::new(number, DAY, ids, t0()))
        .await
        .unwrap();
}

// ============================================================================
// Staging (interactive formation)
// ============================================================================

#[tokio::test]
async fn staging_orders_priority_first_and_enforces_capacity() {
    let (store, scheduler) = scheduler().await;

    // A1 created first without priority, A2 later with priority
    let a1 = reservation("A0001", 2, 0);
    let mut a2 = reservation("A0002", 1, 10);
    a2.priority = true;
    store.insert_reservation(a1.clone()).await.unwrap();
    store.insert_reservation(a2.clone()).await.unwrap();

    let lanes = scheduler.classify_lanes(DAY).await.unwrap();
    let ids: Vec<&str> = lanes.standard.iter().map(|r| r.id.as_str()).collect();
    assert_eq!(ids, vec!["A0002", "A0001"]);

    // Stage A2 then A1: total 3 of 4
    scheduler.staging_add(DAY, &a2.id).await.unwrap();
    let view = scheduler.staging_add(DAY, &a1.id).await.unwrap();
    assert_eq!(view.total_headcount, 3);

    // A further entry with headcount 2 would exceed capacity
    let a3 = reservation("A0003", 2, 20);
    store.insert_reservation(a3.clone()).await.unwrap();
    let err = scheduler.staging_add(DAY, &a3.id).await.unwrap_err();
    assert!(matches!(
        err,
        SchedulerError::CapacityExceeded { current: 3, adding: 2, limit: 4 }
    ));

    // Rejection left the staging set untouched
    let view = scheduler.staging_view(DAY).unwrap();
    assert_eq!(view.entries.len(), 2);
    assert_eq!(view.total_headcount, 3);
}

#[tokio::test]
async fn staging_add_is_idempotent_and_remove_restores_lane() {
    let (store, scheduler) = scheduler().await;
    let a1 = reservation("A0001", 2, 0);
    store.insert_reservation(a1.clone()).await.unwrap();

    scheduler.staging_add(DAY, &a1.id).await.unwrap();
    let view = scheduler.staging_add(DAY, &a1.id).await.unwrap();
    assert_eq!(view.entries.len(), 1);

    let view = scheduler.staging_remove(DAY, &a1.id).await.unwrap();
    assert!(view.entries.is_empty());

    // Still eligible in the lane
    let lanes = scheduler.classify_lanes(DAY).await.unwrap();
    assert_eq!(lanes.standard.len(), 1);
}

#[tokio::test]
async fn staging_rejects_vip_and_ineligible_entries() {
    let (store, scheduler) = scheduler().await;

    let mut vip = reservation("X0001", 2, 0);
    vip.scheduled_time = NaiveTime::from_hms_opt(12, 0, 0);
    store.insert_reservation(vip.clone()).await.unwrap();
    assert!(matches!(
        scheduler.staging_add(DAY, &vip.id).await.unwrap_err(),
        SchedulerError::Validation(_)
    ));

    let mut gone = reservation("A0001", 1, 0);
    gone.status = ReservationStatus::Visited;
    store.insert_reservation(gone.clone()).await.unwrap();
    assert!(matches!(
        scheduler.staging_add(DAY, &gone.id).await.unwrap_err(),
        SchedulerError::NotWaiting(_)
    ));
}

#[tokio::test]
async fn staging_accept_transitions_members_and_clears_set() {
    let (store, scheduler) = scheduler().await;
    let a1 = reservation("A0001", 2, 0);
    let a2 = reservation("A0002", 1, 5);
    store.insert_reservation(a1.clone()).await.unwrap();
    store.insert_reservation(a2.clone()).await.unwrap();

    scheduler.staging_add(DAY, &a1.id).await.unwrap();
    scheduler.staging_add(DAY, &a2.id).await.unwrap();

    let outcomes = scheduler.staging_accept(DAY).await.unwrap();
    assert!(outcomes.iter().all(|o| o.accepted));

    // Default policy marks members visited
    let r = store.get_reservation(&a1.id).await.unwrap().unwrap();
    assert_eq!(r.status, ReservationStatus::Visited);
    assert!(scheduler.staging_view(DAY).unwrap().entries.is_empty());
}

#[tokio::test]
async fn staging_accept_delete_policy_removes_records() {
    let config = SchedulerConfig {
        accept_policy: AcceptPolicy::Delete,
        ..SchedulerConfig::default()
    };
    let (store, scheduler) = scheduler_with_config(config).await;
    let a1 = reservation("A0001", 2, 0);
    store.insert_reservation(a1.clone()).await.unwrap();

    scheduler.staging_add(DAY, &a1.id).await.unwrap();
    let outcomes = scheduler.staging_accept(DAY).await.unwrap();
    assert!(outcomes[0].accepted);
    assert!(store.get_reservation(&a1.id).await.unwrap().is_none());
}

// ============================================================================
// Call lifecycle
// ============================================================================

#[tokio::test]
async fn call_then_visit_all_completes_group() {
    let (store, scheduler) = scheduler().await;
    let b1 = reservation("A0001", 2, 0);
    let b2 = reservation("A0002", 2, 5);
    store.insert_reservation(b1.clone()).await.unwrap();
    store.insert_reservation(b2.clone()).await.unwrap();
    seed_group(&store, 5, &[&b1, &b2]).await;

    let g6 = reservation("A0003", 1, 10);
    store.insert_reservation(g6.clone()).await.unwrap();
    seed_group(&store, 6, &[&g6]).await;

    scheduler.call(DAY, 5).await.unwrap();

    // Second call while group 5 is active is rejected
    let err = scheduler.call(DAY, 6).await.unwrap_err();
    assert!(matches!(err, SchedulerError::AlreadyCalling { active: 5 }));

    let outcome = scheduler.mark_visited(&b1.id, t0()).await.unwrap();
    assert!(outcome.applied);
    assert!(outcome.group_completed.is_none());

    let outcome = scheduler.mark_visited(&b2.id, t0()).await.unwrap();
    assert_eq!(outcome.group_completed, Some(5));

    let group = store.get_group(DAY, 5).await.unwrap().unwrap();
    assert_eq!(group.call_state, CallState::Completed);
    assert!(group.completed_at.is_some());
}

#[tokio::test]
async fn at_most_one_calling_group_per_day() {
    let (store, scheduler) = scheduler().await;
    for (i, number) in [(1u32, 1u32), (2, 3), (3, 5)] {
        let r = reservation(&format!("A000{}", i), 1, i as i64);
        store.insert_reservation(r.clone()).await.unwrap();
        seed_group(&store, number, &[&r]).await;
    }

    let outcomes = scheduler.call_many(DAY, &[1, 3, 5]).await;
    let called: Vec<u32> = outcomes.iter().filter(|o| o.called).map(|o| o.number).collect();
    assert_eq!(called, vec![1]);
    // Partial success is surfaced per group, not as a batch failure
    assert!(outcomes.iter().filter(|o| !o.called).all(|o| o.error.is_some()));

    let calling = store.get_calling_group(DAY).await.unwrap().unwrap();
    assert_eq!(calling.number, 1);
}

#[tokio::test]
async fn call_requires_waiting_group_with_eligible_members() {
    let (store, scheduler) = scheduler().await;

    assert!(matches!(
        scheduler.call(DAY, 9).await.unwrap_err(),
        SchedulerError::GroupNotFound { number: 9 }
    ));

    // Group whose only member is already visited cannot be called
    let mut done = reservation("A0001", 1, 0);
    done.status = ReservationStatus::Visited;
    store.insert_reservation(done.clone()).await.unwrap();
    store
        .insert_group(Group::new(1, DAY, vec![done.id.clone()], t0()))
        .await
        .unwrap();
    assert!(matches!(
        scheduler.call(DAY, 1).await.unwrap_err(),
        SchedulerError::EmptyGroup { number: 1 }
    ));
}

#[tokio::test]
async fn visit_outside_calling_group_is_rejected() {
    let (store, scheduler) = scheduler().await;
    let r = reservation("A0001", 1, 0);
    store.insert_reservation(r.clone()).await.unwrap();
    seed_group(&store, 1, &[&r]).await;

    // Group still waiting
    let err = scheduler.mark_visited(&r.id, t0()).await.unwrap_err();
    assert!(matches!(err, SchedulerError::NotCalling { number: 1 }));

    // Missing record is already-resolved, not an error
    let outcome = scheduler.mark_visited(&rid("A9999"), t0()).await.unwrap();
    assert!(!outcome.applied);
}

#[tokio::test]
async fn reset_returns_group_to_waiting_and_is_idempotent() {
    let (store, scheduler) = scheduler().await;
    let r = reservation("A0001", 1, 0);
    store.insert_reservation(r.clone()).await.unwrap();
    seed_group(&store, 1, &[&r]).await;

    scheduler.call(DAY, 1).await.unwrap();
    scheduler.reset_group(DAY, 1).await.unwrap();
    let group = store.get_group(DAY, 1).await.unwrap().unwrap();
    assert_eq!(group.call_state, CallState::Waiting);

    // Member is eligible again
    let lanes = scheduler.classify_lanes(DAY).await.unwrap();
    assert_eq!(lanes.standard.len(), 1);

    // No-op on an already-waiting group
    scheduler.reset_group(DAY, 1).await.unwrap();
}

#[tokio::test]
async fn repeated_visit_is_treated_as_already_resolved() {
    let (store, scheduler) = scheduler().await;
    let r = reservation("A0001", 1, 0);
    store.insert_reservation(r.clone()).await.unwrap();
    seed_group(&store, 1, &[&r]).await;
    scheduler.call(DAY, 1).await.unwrap();

    scheduler.mark_visited(&r.id, t0()).await.unwrap();

    // A second session acting on a stale snapshot sees a no-op, not a
    // crash: the record already left Waiting
    let outcome = scheduler.mark_visited(&r.id, t0()).await.unwrap();
    assert!(!outcome.applied);
}

// ============================================================================
// Absence: mark, backfill, round-trip, timeout purge
// ============================================================================

#[tokio::test]
async fn absent_member_vacates_group_and_is_backfilled() {
    let (store, scheduler) = scheduler().await;
    let front = reservation("A0001", 2, 0);
    let stay = reservation("A0002", 2, 5);
    store.insert_reservation(front.clone()).await.unwrap();
    store.insert_reservation(stay.clone()).await.unwrap();
    seed_group(&store, 1, &[&front, &stay]).await;

    // Later group holding a fitting candidate
    let filler = reservation("A0003", 2, 10);
    let big = reservation("A0004", 3, 15);
    store.insert_reservation(filler.clone()).await.unwrap();
    store.insert_reservation(big.clone()).await.unwrap();
    seed_group(&store, 3, &[&filler]).await;
    seed_group(&store, 5, &[&big]).await;

    scheduler.call(DAY, 1).await.unwrap();
    let outcome = scheduler.mark_absent(&front.id, t0()).await.unwrap();
    assert!(outcome.applied);
    // headcount 3 does not fit the vacated room of 2; A0003 from group 3 does
    assert_eq!(outcome.backfilled, Some(filler.id.clone()));

    let group = store.get_group(DAY, 1).await.unwrap().unwrap();
    assert!(group.members.contains(&filler.id));
    assert!(!group.members.contains(&front.id));

    let moved = store.get_reservation(&filler.id).await.unwrap().unwrap();
    assert_eq!(moved.group, Some(1));

    // The absentee keeps Waiting status with the absent flag set
    let absent = store.get_reservation(&front.id).await.unwrap().unwrap();
    assert!(absent.absent);
    assert_eq!(absent.status, ReservationStatus::Waiting);
    assert!(absent.absent_at.is_some());
    assert_eq!(absent.group, None);
}

#[tokio::test]
async fn absence_round_trip_promotes_and_reorders() {
    let (store, scheduler) = scheduler().await;
    let early = reservation("A0001", 1, 0);
    let late = reservation("A0002", 1, 100);
    store.insert_reservation(early.clone()).await.unwrap();
    store.insert_reservation(late.clone()).await.unwrap();

    scheduler.mark_absent(&late.id, t0()).await.unwrap();

    // Absent entries are excluded from both lanes
    let lanes = scheduler.classify_lanes(DAY).await.unwrap();
    assert_eq!(lanes.standard.len(), 1);

    // Guided back within the grace period: promoted ahead of everything
    let back = scheduler
        .guide_back(&late.id, t0() + TimeDelta::minutes(5))
        .await
        .unwrap();
    assert!(back.priority);
    assert!(!back.absent);

    let lanes = scheduler.classify_lanes(DAY).await.unwrap();
    let ids: Vec<&str> = lanes.standard.iter().map(|r| r.id.as_str()).collect();
    assert_eq!(ids, vec!["A0002", "A0001"]);
}

#[tokio::test]
async fn guide_back_rejected_after_grace_period() {
    let (store, scheduler) = scheduler().await;
    let r = reservation("A0001", 1, 0);
    store.insert_reservation(r.clone()).await.unwrap();
    scheduler.mark_absent(&r.id, t0()).await.unwrap();

    let err = scheduler
        .guide_back(&r.id, t0() + TimeDelta::minutes(15))
        .await
        .unwrap_err();
    assert!(matches!(err, SchedulerError::AbsenceExpired(_)));
}

#[tokio::test]
async fn timeout_purge_cancels_once_and_hides_entry() {
    let (store, scheduler) = scheduler().await;
    let r = reservation("A0001", 1, 0);
    store.insert_reservation(r.clone()).await.unwrap();
    scheduler.mark_absent(&r.id, t0()).await.unwrap();

    // Before the grace period nothing is purged
    let report = scheduler
        .purge_expired(DAY, t0() + TimeDelta::minutes(14))
        .await
        .unwrap();
    assert!(report.purged.is_empty());

    let deadline = t0() + TimeDelta::minutes(15);
    let report = scheduler.purge_expired(DAY, deadline).await.unwrap();
    assert_eq!(report.purged, vec![r.id.clone()]);

    let purged = store.get_reservation(&r.id).await.unwrap().unwrap();
    assert_eq!(purged.status, ReservationStatus::Cancelled);
    assert_eq!(purged.cancel_reason.as_deref(), Some("priority_timeout"));
    assert!(!purged.absent);

    // Gone from lanes and from the absentee listing
    assert!(scheduler.classify_lanes(DAY).await.unwrap().standard.is_empty());
    assert!(scheduler.list_absentees(DAY, deadline).await.unwrap().is_empty());

    // A second pass is a no-op
    let report = scheduler.purge_expired(DAY, deadline).await.unwrap();
    assert!(report.purged.is_empty());
}

#[tokio::test]
async fn timeout_purge_delete_policy_removes_record() {
    let config = SchedulerConfig {
        purge_policy: PurgePolicy::Delete,
        ..SchedulerConfig::default()
    };
    let (store, scheduler) = scheduler_with_config(config).await;
    let r = reservation("A0001", 1, 0);
    store.insert_reservation(r.clone()).await.unwrap();
    scheduler.mark_absent(&r.id, t0()).await.unwrap();

    scheduler
        .purge_expired(DAY, t0() + TimeDelta::minutes(16))
        .await
        .unwrap();
    assert!(store.get_reservation(&r.id).await.unwrap().is_none());
}

// ============================================================================
// Priority group formation and next-group surfacing
// ============================================================================

#[tokio::test]
async fn promoted_absentees_form_priority_group_surfaced_first() {
    let (store, scheduler) = scheduler().await;

    // A regular waiting group
    let regular = reservation("A0001", 2, 0);
    store.insert_reservation(regular.clone()).await.unwrap();
    seed_group(&store, 1, &[&regular]).await;

    // An absentee guided back, not yet regrouped
    let comeback = reservation("A0002", 2, 5);
    store.insert_reservation(comeback.clone()).await.unwrap();
    scheduler.mark_absent(&comeback.id, t0()).await.unwrap();
    scheduler
        .guide_back(&comeback.id, t0() + TimeDelta::minutes(1))
        .await
        .unwrap();

    let next = scheduler.next_group(DAY, t0()).await.unwrap().unwrap();
    assert!(next.has_priority);
    assert!(next.members.iter().any(|r| r.id == comeback.id));
    assert_ne!(next.number, 1);

    let group = store.get_group(DAY, next.number).await.unwrap().unwrap();
    assert!(group.is_priority);
}

#[tokio::test]
async fn candidates_exclude_calling_group_and_resolved_members() {
    let (store, scheduler) = scheduler().await;
    let a = reservation("A0001", 1, 0);
    let b = reservation("A0002", 1, 5);
    let mut c = reservation("A0003", 1, 10);
    c.status = ReservationStatus::Visited;
    store.insert_reservation(a.clone()).await.unwrap();
    store.insert_reservation(b.clone()).await.unwrap();
    store.insert_reservation(c.clone()).await.unwrap();

    seed_group(&store, 1, &[&a]).await;
    seed_group(&store, 2, &[&b, &c]).await;
    // Group of only resolved members never becomes a candidate
    let d = reservation("A0004", 1, 15);
    store.insert_reservation(d.clone()).await.unwrap();
    seed_group(&store, 3, &[&d]).await;
    store
        .update_reservation(
            &d.id,
            shared::models::ReservationPatch {
                status: Some(ReservationStatus::Cancelled),
                ..Default::default()
            },
        )
        .await
        .unwrap();

    scheduler.call(DAY, 1).await.unwrap();

    let candidates = scheduler.form_candidate_groups(DAY).await.unwrap();
    let numbers: Vec<u32> = candidates.iter().map(|c| c.number).collect();
    assert_eq!(numbers, vec![2]);
    // Visited member is not counted in the candidate
    assert_eq!(candidates[0].members.len(), 1);
    assert_eq!(candidates[0].total_headcount, 1);
}

// ============================================================================
// Intake: ids, parity, VIP windows
// ============================================================================

#[tokio::test]
async fn intake_assigns_parity_lanes_and_sequential_ids() {
    let (store, scheduler) = scheduler().await;

    let advance = scheduler
        .create_reservation(
            &ReservationRequest {
                category: Category::A,
                headcount: 2,
                scheduled_time: None,
            },
            t0(),
        )
        .await
        .unwrap();
    assert_eq!(advance.id.as_str(), "A0001");
    assert_eq!(advance.group, Some(1));

    let walkin = scheduler
        .create_reservation(
            &ReservationRequest {
                category: Category::C,
                headcount: 3,
                scheduled_time: None,
            },
            t0(),
        )
        .await
        .unwrap();
    assert_eq!(walkin.id.as_str(), "C0001");
    assert_eq!(walkin.group, Some(2));

    // Second advance entry fits into group 1 (2 + 2 <= 4)
    let advance2 = scheduler
        .create_reservation(
            &ReservationRequest {
                category: Category::A,
                headcount: 2,
                scheduled_time: None,
            },
            t0(),
        )
        .await
        .unwrap();
    assert_eq!(advance2.id.as_str(), "A0002");
    assert_eq!(advance2.group, Some(1));

    // Third does not fit group 1 anymore: new odd group
    let advance3 = scheduler
        .create_reservation(
            &ReservationRequest {
                category: Category::A,
                headcount: 1,
                scheduled_time: None,
            },
            t0(),
        )
        .await
        .unwrap();
    assert_eq!(advance3.group, Some(3));

    let group1 = store.get_group(DAY, 1).await.unwrap().unwrap();
    assert_eq!(group1.members.len(), 2);
}

#[tokio::test]
async fn intake_validates_vip_time_and_headcount() {
    let (_store, scheduler) = scheduler().await;

    let err = scheduler
        .create_reservation(
            &ReservationRequest {
                category: Category::X,
                headcount: 2,
                scheduled_time: None,
            },
            t0(),
        )
        .await
        .unwrap_err();
    assert!(matches!(err, SchedulerError::Validation(_)));

    let err = scheduler
        .create_reservation(
            &ReservationRequest {
                category: Category::C,
                headcount: 2,
                scheduled_time: NaiveTime::from_hms_opt(12, 0, 0),
            },
            t0(),
        )
        .await
        .unwrap_err();
    assert!(matches!(err, SchedulerError::Validation(_)));

    let err = scheduler
        .create_reservation(
            &ReservationRequest {
                category: Category::C,
                headcount: 5,
                scheduled_time: None,
            },
            t0(),
        )
        .await
        .unwrap_err();
    assert!(matches!(err, SchedulerError::Validation(_)));
}

#[tokio::test]
async fn walkin_intake_rejected_while_reception_closed() {
    let store = Arc::new(MemoryStore::with_settings(Settings {
        reception_open: false,
        ..Settings::default()
    }));
    let settings = Arc::new(SettingsCache::load(store.clone()).await.unwrap());
    let scheduler = Scheduler::new(store.clone(), settings, SchedulerConfig::default());

    let err = scheduler
        .create_reservation(
            &ReservationRequest {
                category: Category::C,
                headcount: 1,
                scheduled_time: None,
            },
            t0(),
        )
        .await
        .unwrap_err();
    assert!(matches!(err, SchedulerError::ReceptionClosed));

    // Advance bookings are operator data entry and still accepted
    scheduler
        .create_reservation(
            &ReservationRequest {
                category: Category::A,
                headcount: 1,
                scheduled_time: None,
            },
            t0(),
        )
        .await
        .unwrap();
}

#[tokio::test]
async fn vip_assigned_when_call_window_opens() {
    let (store, scheduler) = scheduler().await;

    let vip = scheduler
        .create_reservation(
            &ReservationRequest {
                category: Category::X,
                headcount: 2,
                scheduled_time: NaiveTime::from_hms_opt(13, 0, 0),
            },
            t0(),
        )
        .await
        .unwrap();
    assert_eq!(vip.group, None);

    // 12:54, six minutes before the slot: window still closed
    let before: DateTime<Utc> = "2025-11-01T12:54:00Z".parse().unwrap();
    assert_eq!(scheduler.assign_ready_vips(DAY, before).await.unwrap(), 0);

    // 12:55, five minutes before: assigned
    let open: DateTime<Utc> = "2025-11-01T12:55:00Z".parse().unwrap();
    assert_eq!(scheduler.assign_ready_vips(DAY, open).await.unwrap(), 1);

    let assigned = store.get_reservation(&vip.id).await.unwrap().unwrap();
    assert!(assigned.group.is_some());
}

// ============================================================================
// Admission control
// ============================================================================

#[tokio::test]
async fn auto_stop_closes_reception_idempotently_and_never_reopens() {
    let config = SchedulerConfig {
        auto_stop_threshold: 4,
        ..SchedulerConfig::default()
    };
    let (store, scheduler) = scheduler_with_config(config).await;

    store
        .insert_reservation(reservation("A0001", 3, 0))
        .await
        .unwrap();
    let report = scheduler.check_auto_stop(DAY).await.unwrap();
    assert!(!report.should_stop);
    assert_eq!(report.waiting_headcount, 3);

    store
        .insert_reservation(reservation("C0001", 2, 5))
        .await
        .unwrap();
    let report = scheduler.check_auto_stop(DAY).await.unwrap();
    assert!(report.should_stop);
    assert_eq!(report.waiting_headcount, 5);
    assert!(!store.get_settings().await.unwrap().reception_open);

    // Repeated checks stay closed without error
    for _ in 0..3 {
        let report = scheduler.check_auto_stop(DAY).await.unwrap();
        assert!(report.should_stop);
        assert!(!store.get_settings().await.unwrap().reception_open);
    }
}

#[tokio::test]
async fn auto_stop_disabled_never_closes_reception() {
    let config = SchedulerConfig {
        auto_stop_threshold: 1,
        ..SchedulerConfig::default()
    };
    let (store, scheduler) = scheduler_with_config(config).await;
    store
        .update_settings(shared::models::SettingsPatch {
            auto_stop_enabled: Some(false),
            ..Default::default()
        })
        .await
        .unwrap();
    let settings = Arc::new(SettingsCache::load(store.clone()).await.unwrap());
    let scheduler2 = Scheduler::new(store.clone(), settings, scheduler.config().clone());

    store
        .insert_reservation(reservation("A0001", 4, 0))
        .await
        .unwrap();
    let report = scheduler2.check_auto_stop(DAY).await.unwrap();
    assert!(!report.should_stop);
    assert!(store.get_settings().await.unwrap().reception_open);
}

// ============================================================================
// Completion rollover
// ============================================================================

#[tokio::test(start_paused = true)]
async fn rollover_resets_completed_group_after_countdown() {
    let (store, scheduler) = scheduler().await;
    let r = reservation("A0001", 1, 0);
    store.insert_reservation(r.clone()).await.unwrap();
    seed_group(&store, 1, &[&r]).await;

    scheduler.call(DAY, 1).await.unwrap();
    let outcome = scheduler.mark_visited(&r.id, t0()).await.unwrap();
    assert_eq!(outcome.group_completed, Some(1));

    let timer = RolloverTimer::new(
        scheduler.clone(),
        Duration::from_secs(30),
        CancellationToken::new(),
    );
    timer.schedule(DAY, 1);

    tokio::time::sleep(Duration::from_secs(31)).await;
    let group = store.get_group(DAY, 1).await.unwrap().unwrap();
    assert_eq!(group.call_state, CallState::Waiting);
}

#[tokio::test(start_paused = true)]
async fn cancelled_rollover_does_not_advance_state() {
    let (store, scheduler) = scheduler().await;
    let r = reservation("A0001", 1, 0);
    store.insert_reservation(r.clone()).await.unwrap();
    seed_group(&store, 1, &[&r]).await;

    scheduler.call(DAY, 1).await.unwrap();
    scheduler.mark_visited(&r.id, t0()).await.unwrap();

    let timer = RolloverTimer::new(
        scheduler.clone(),
        Duration::from_secs(30),
        CancellationToken::new(),
    );
    timer.schedule(DAY, 1);
    assert!(timer.cancel(DAY));

    tokio::time::sleep(Duration::from_secs(60)).await;
    let group = store.get_group(DAY, 1).await.unwrap().unwrap();
    assert_eq!(group.call_state, CallState::Completed);

    // Nothing pending anymore
    assert!(!timer.cancel(DAY));
}
