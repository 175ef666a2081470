//! Reservation Model

use chrono::{DateTime, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use super::category::Category;
use super::day::EventDay;

/// Reservation identifier: category prefix + 4-digit sequence, e.g. `C0042`
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ReservationId(String);

impl ReservationId {
    pub fn new(category: Category, sequence: u32) -> Self {
        Self(format!("{}{:04}", category.as_char(), sequence))
    }

    /// Parse an id string, requiring a known category prefix and a
    /// numeric suffix.
    pub fn parse(s: &str) -> Result<Self, String> {
        let mut chars = s.chars();
        let prefix = chars.next().ok_or_else(|| "empty reservation id".to_string())?;
        Category::from_char(prefix).ok_or_else(|| format!("unknown category prefix: {}", s))?;
        let rest = chars.as_str();
        if rest.is_empty() || !rest.chars().all(|c| c.is_ascii_digit()) {
            return Err(format!("invalid reservation id: {}", s));
        }
        Ok(Self(s.to_string()))
    }

    pub fn category(&self) -> Category {
        // Constructed or parsed with a valid prefix
        Category::from_char(self.0.chars().next().unwrap_or('?'))
            .expect("reservation id has no category prefix")
    }

    /// Numeric sequence part of the id
    pub fn sequence(&self) -> u32 {
        self.0[1..].parse().unwrap_or(0)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ReservationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Reservation status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ReservationStatus {
    #[default]
    Waiting,
    Visited,
    Cancelled,
}

/// Reservation entity
///
/// Invariants: `absent == true` implies `status == Waiting`;
/// `scheduled_time` is present iff the category is VIP.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Reservation {
    pub id: ReservationId,
    pub day: EventDay,
    pub headcount: u32,
    /// Scheduled admission time, VIP categories only
    pub scheduled_time: Option<NaiveTime>,
    pub status: ReservationStatus,
    /// Set only when the guest is guided back after an absence
    pub priority: bool,
    pub absent: bool,
    pub absent_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    /// Assigned group number, if any
    pub group: Option<u32>,
    pub cancel_reason: Option<String>,
}

impl Reservation {
    pub fn category(&self) -> Category {
        self.id.category()
    }

    /// Eligible for lane listing and group calling
    pub fn is_eligible(&self) -> bool {
        self.status == ReservationStatus::Waiting && !self.absent
    }
}

/// Partial update for a reservation record.
///
/// The `expect_*` fields are preconditions: the store applies the patch
/// only while the record still matches, otherwise the write is rejected
/// as a conflict. This is how a stale read by one operator session is
/// surfaced instead of silently overwritten.
#[derive(Debug, Clone, Default)]
pub struct ReservationPatch {
    pub status: Option<ReservationStatus>,
    pub priority: Option<bool>,
    /// Setting `false` also clears `absent_at`
    pub absent: Option<bool>,
    pub absent_at: Option<DateTime<Utc>>,
    /// `Some(None)` clears the group assignment
    pub group: Option<Option<u32>>,
    pub cancel_reason: Option<String>,
    pub expect_status: Option<ReservationStatus>,
    pub expect_absent: Option<bool>,
}

/// Absentee listing entry, annotated with time elapsed since the guest
/// was marked absent.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AbsenteeEntry {
    pub reservation: Reservation,
    pub elapsed_secs: i64,
    /// Grace period has run out; the next monitor pass purges this entry
    pub expired: bool,
}

/// The two per-day lanes produced by the classifier
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Lanes {
    pub standard: Vec<Reservation>,
    pub priority_time: Vec<Reservation>,
}

impl Lanes {
    /// Total waiting headcount across both lanes
    pub fn waiting_headcount(&self) -> u32 {
        self.standard
            .iter()
            .chain(self.priority_time.iter())
            .map(|r| r.headcount)
            .sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reservation_id_roundtrip() {
        let id = ReservationId::new(Category::C, 42);
        assert_eq!(id.as_str(), "C0042");
        assert_eq!(id.category(), Category::C);
        assert_eq!(id.sequence(), 42);

        let parsed = ReservationId::parse("X0007").unwrap();
        assert_eq!(parsed.category(), Category::X);
    }

    #[test]
    fn test_reservation_id_rejects_garbage() {
        assert!(ReservationId::parse("").is_err());
        assert!(ReservationId::parse("Z0001").is_err());
        assert!(ReservationId::parse("A00x1").is_err());
        assert!(ReservationId::parse("A").is_err());
    }

    #[test]
    fn test_waiting_headcount() {
        let mk = |id: &str, count: u32| Reservation {
            id: ReservationId::parse(id).unwrap(),
            day: EventDay::Day1,
            headcount: count,
            scheduled_time: None,
            status: ReservationStatus::Waiting,
            priority: false,
            absent: false,
            absent_at: None,
            created_at: Utc::now(),
            group: None,
            cancel_reason: None,
        };
        let lanes = Lanes {
            standard: vec![mk("A0001", 2), mk("C0001", 1)],
            priority_time: vec![mk("X0001", 3)],
        };
        assert_eq!(lanes.waiting_headcount(), 6);
    }
}
