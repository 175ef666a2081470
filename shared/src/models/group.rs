//! Call Group Model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::day::EventDay;
use super::reservation::{Reservation, ReservationId};

/// Lifecycle state of a call group
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CallState {
    #[default]
    Waiting,
    Calling,
    Completed,
}

/// A capacity-bounded bundle of reservations called forward together.
///
/// `number` is unique per day. Total member headcount never exceeds the
/// group capacity (4 people).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Group {
    pub number: u32,
    pub day: EventDay,
    pub members: Vec<ReservationId>,
    pub call_state: CallState,
    /// Formed for promoted absentees, surfaced ahead of regular groups
    pub is_priority: bool,
    pub created_at: DateTime<Utc>,
    pub called_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
}

impl Group {
    pub fn new(number: u32, day: EventDay, members: Vec<ReservationId>, now: DateTime<Utc>) -> Self {
        Self {
            number,
            day,
            members,
            call_state: CallState::Waiting,
            is_priority: false,
            created_at: now,
            called_at: None,
            completed_at: None,
        }
    }
}

/// A group as surfaced to the operator: member records resolved, derived
/// headcount and priority flags computed over the included members.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GroupCandidate {
    pub number: u32,
    pub members: Vec<Reservation>,
    pub total_headcount: u32,
    pub has_priority: bool,
    pub call_state: CallState,
}

impl GroupCandidate {
    pub fn from_members(group: &Group, members: Vec<Reservation>) -> Self {
        let total_headcount = members.iter().map(|r| r.headcount).sum();
        let has_priority = group.is_priority || members.iter().any(|r| r.priority);
        Self {
            number: group.number,
            members,
            total_headcount,
            has_priority,
            call_state: group.call_state,
        }
    }
}
