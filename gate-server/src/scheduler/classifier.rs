//! Lane Classifier
//!
//! Splits the day's reservation snapshot into the two ordered lanes.
//! Pure function of snapshot + day; no side effects.

use shared::models::{EventDay, Lane, Lanes, Reservation};

use super::{Scheduler, SchedulerResult};

/// Partition eligible reservations into ordered lanes.
///
/// Eligibility: Waiting, not absent, category routed to `day`.
/// Standard lane: promoted absentees first (`priority` desc), then FIFO
/// by `created_at`. Priority-Time lane: `scheduled_time` asc; entries
/// without a time sort last, tie-broken by `created_at`.
pub fn classify(snapshot: &[Reservation], day: EventDay) -> Lanes {
    let mut standard = Vec::new();
    let mut priority_time = Vec::new();

    for res in snapshot {
        if !res.is_eligible() {
            continue;
        }
        let category = res.category();
        if category.day() != day {
            continue;
        }
        match category.lane() {
            Lane::Standard => standard.push(res.clone()),
            Lane::PriorityTime => priority_time.push(res.clone()),
        }
    }

    standard.sort_by(|a, b| {
        b.priority
            .cmp(&a.priority)
            .then(a.created_at.cmp(&b.created_at))
    });

    priority_time.sort_by(|a, b| match (a.scheduled_time, b.scheduled_time) {
        (Some(ta), Some(tb)) => ta.cmp(&tb).then(a.created_at.cmp(&b.created_at)),
        (Some(_), None) => std::cmp::Ordering::Less,
        (None, Some(_)) => std::cmp::Ordering::Greater,
        (None, None) => a.created_at.cmp(&b.created_at),
    });

    Lanes {
        standard,
        priority_time,
    }
}

impl Scheduler {
    /// Fetch the day's snapshot and classify it into lanes
    pub async fn classify_lanes(&self, day: EventDay) -> SchedulerResult<Lanes> {
        let snapshot = self.store().list_reservations(day, None, None).await?;
        Ok(classify(&snapshot, day))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, NaiveTime, TimeDelta, Utc};
    use shared::models::{ReservationId, ReservationStatus};

    fn t0() -> DateTime<Utc> {
        "2025-11-01T09:00:00Z".parse().unwrap()
    }

    fn reservation(id: &str, created_offset_secs: i64) -> Reservation {
        Reservation {
            id: ReservationId::parse(id).unwrap(),
            day: ReservationId::parse(id).unwrap().category().day(),
            headcount: 2,
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

    #[test]
    fn test_partition_by_day_and_lane() {
        let snapshot = vec![
            reservation("A0001", 0),
            reservation("B0001", 1), // day 2, excluded
            reservation("C0001", 2),
            Reservation {
                scheduled_time: Some(NaiveTime::from_hms_opt(13, 0, 0).unwrap()),
                ..reservation("X0001", 3)
            },
        ];
        let lanes = classify(&snapshot, EventDay::Day1);
        assert_eq!(lanes.standard.len(), 2);
        assert_eq!(lanes.priority_time.len(), 1);
    }

    #[test]
    fn test_excludes_absent_and_non_waiting() {
        let snapshot = vec![
            Reservation {
                absent: true,
                absent_at: Some(t0()),
                ..reservation("A0001", 0)
            },
            Reservation {
                status: ReservationStatus::Visited,
                ..reservation("A0002", 1)
            },
            Reservation {
                status: ReservationStatus::Cancelled,
                ..reservation("A0003", 2)
            },
            reservation("A0004", 3),
        ];
        let lanes = classify(&snapshot, EventDay::Day1);
        assert_eq!(lanes.standard.len(), 1);
        assert_eq!(lanes.standard[0].id.as_str(), "A0004");
    }

    #[test]
    fn test_standard_lane_priority_then_fifo() {
        // A1 created first without priority, A2 created later with priority
        let snapshot = vec![
            reservation("A0001", 0),
            Reservation {
                priority: true,
                ..reservation("A0002", 10)
            },
        ];
        let lanes = classify(&snapshot, EventDay::Day1);
        let ids: Vec<&str> = lanes.standard.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["A0002", "A0001"]);
    }

    #[test]
    fn test_standard_lane_fifo_within_equal_priority() {
        let snapshot = vec![
            reservation("C0002", 5),
            reservation("C0001", 0),
            reservation("C0003", 10),
        ];
        let lanes = classify(&snapshot, EventDay::Day1);
        let ids: Vec<&str> = lanes.standard.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["C0001", "C0002", "C0003"]);
    }

    #[test]
    fn test_priority_time_lane_by_scheduled_time() {
        let at = |h: u32, m: u32| NaiveTime::from_hms_opt(h, m, 0);
        let snapshot = vec![
            Reservation {
                scheduled_time: at(14, 30),
                ..reservation("X0001", 0)
            },
            Reservation {
                scheduled_time: at(10, 0),
                ..reservation("X0002", 1)
            },
            // Missing time sorts last
            reservation("X0003", 2),
        ];
        let lanes = classify(&snapshot, EventDay::Day1);
        let ids: Vec<&str> = lanes.priority_time.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["X0002", "X0001", "X0003"]);
    }
}
