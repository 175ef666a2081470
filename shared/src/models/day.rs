//! Event Day

use serde::{Deserialize, Serialize};
use std::fmt;

/// The two event days.
///
/// Calendar dates for each day come from server configuration; the
/// scheduler itself only ever distinguishes the two logical days.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventDay {
    Day1,
    Day2,
}

impl EventDay {
    pub const ALL: [EventDay; 2] = [EventDay::Day1, EventDay::Day2];

    /// Zero-based index, used for per-day storage slots
    pub fn index(&self) -> usize {
        match self {
            EventDay::Day1 => 0,
            EventDay::Day2 => 1,
        }
    }
}

impl fmt::Display for EventDay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EventDay::Day1 => write!(f, "day1"),
            EventDay::Day2 => write!(f, "day2"),
        }
    }
}

impl std::str::FromStr for EventDay {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "day1" | "1" => Ok(EventDay::Day1),
            "day2" | "2" => Ok(EventDay::Day2),
            other => Err(format!("unknown event day: {}", other)),
        }
    }
}
