//! Reservation categories and the category routing table
//!
//! The first character of a reservation id encodes its category. Each
//! category routes to exactly one event day and one lane; VIP categories
//! additionally carry a scheduled admission time.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::day::EventDay;

/// Queue lane a category feeds into
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Lane {
    /// FIFO lane for advance and walk-in reservations
    Standard,
    /// Time-slot lane for VIP reservations
    PriorityTime,
}

/// How a reservation entered the system
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CategoryKind {
    /// Booked ahead of the event (odd group numbers)
    Advance,
    /// Registered at the venue (even group numbers)
    WalkIn,
    /// Time-slot reservation, assigned near its scheduled time
    Vip,
}

/// Reservation category, encoded as the id prefix
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Category {
    A,
    B,
    C,
    D,
    X,
    Y,
}

/// One row of the category routing table
#[derive(Debug, Clone, Copy)]
pub struct CategoryRoute {
    pub category: Category,
    pub day: EventDay,
    pub lane: Lane,
    pub kind: CategoryKind,
    pub requires_time: bool,
}

/// The full routing table. Validated once at startup via
/// [`Category::validate_table`].
pub const CATEGORY_TABLE: [CategoryRoute; 6] = [
    CategoryRoute { category: Category::A, day: EventDay::Day1, lane: Lane::Standard, kind: CategoryKind::Advance, requires_time: false },
    CategoryRoute { category: Category::B, day: EventDay::Day2, lane: Lane::Standard, kind: CategoryKind::Advance, requires_time: false },
    CategoryRoute { category: Category::C, day: EventDay::Day1, lane: Lane::Standard, kind: CategoryKind::WalkIn, requires_time: false },
    CategoryRoute { category: Category::D, day: EventDay::Day2, lane: Lane::Standard, kind: CategoryKind::WalkIn, requires_time: false },
    CategoryRoute { category: Category::X, day: EventDay::Day1, lane: Lane::PriorityTime, kind: CategoryKind::Vip, requires_time: true },
    CategoryRoute { category: Category::Y, day: EventDay::Day2, lane: Lane::PriorityTime, kind: CategoryKind::Vip, requires_time: true },
];

impl Category {
    pub const ALL: [Category; 6] = [
        Category::A,
        Category::B,
        Category::C,
        Category::D,
        Category::X,
        Category::Y,
    ];

    pub fn from_char(c: char) -> Option<Self> {
        match c {
            'A' => Some(Category::A),
            'B' => Some(Category::B),
            'C' => Some(Category::C),
            'D' => Some(Category::D),
            'X' => Some(Category::X),
            'Y' => Some(Category::Y),
            _ => None,
        }
    }

    pub fn as_char(&self) -> char {
        match self {
            Category::A => 'A',
            Category::B => 'B',
            Category::C => 'C',
            Category::D => 'D',
            Category::X => 'X',
            Category::Y => 'Y',
        }
    }

    fn route(&self) -> &'static CategoryRoute {
        // The table covers every variant; validated at startup.
        CATEGORY_TABLE
            .iter()
            .find(|r| r.category == *self)
            .expect("category missing from routing table")
    }

    pub fn day(&self) -> EventDay {
        self.route().day
    }

    pub fn lane(&self) -> Lane {
        self.route().lane
    }

    pub fn kind(&self) -> CategoryKind {
        self.route().kind
    }

    pub fn requires_time(&self) -> bool {
        self.route().requires_time
    }

    pub fn is_vip(&self) -> bool {
        self.kind() == CategoryKind::Vip
    }

    /// Validate the routing table: every category present exactly once,
    /// each day has exactly one Advance, one WalkIn and one Vip category,
    /// and `requires_time` holds iff the category is Vip.
    pub fn validate_table() -> Result<(), String> {
        if CATEGORY_TABLE.len() != Category::ALL.len() {
            return Err("category table size mismatch".into());
        }
        for cat in Category::ALL {
            if CATEGORY_TABLE.iter().filter(|r| r.category == cat).count() != 1 {
                return Err(format!("category {} must appear exactly once", cat));
            }
        }
        for day in EventDay::ALL {
            for kind in [CategoryKind::Advance, CategoryKind::WalkIn, CategoryKind::Vip] {
                let n = CATEGORY_TABLE
                    .iter()
                    .filter(|r| r.day == day && r.kind == kind)
                    .count();
                if n != 1 {
                    return Err(format!("day {} must have exactly one {:?} category", day, kind));
                }
            }
        }
        for row in &CATEGORY_TABLE {
            if row.requires_time != (row.kind == CategoryKind::Vip) {
                return Err(format!("category {} requires_time inconsistent", row.category));
            }
            let vip_lane = row.lane == Lane::PriorityTime;
            if vip_lane != (row.kind == CategoryKind::Vip) {
                return Err(format!("category {} lane inconsistent", row.category));
            }
        }
        Ok(())
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_char())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_table_is_valid() {
        Category::validate_table().unwrap();
    }

    #[test]
    fn test_category_routing() {
        assert_eq!(Category::A.day(), EventDay::Day1);
        assert_eq!(Category::B.day(), EventDay::Day2);
        assert_eq!(Category::C.lane(), Lane::Standard);
        assert_eq!(Category::X.lane(), Lane::PriorityTime);
        assert_eq!(Category::A.kind(), CategoryKind::Advance);
        assert_eq!(Category::D.kind(), CategoryKind::WalkIn);
        assert!(Category::Y.requires_time());
        assert!(!Category::B.requires_time());
    }

    #[test]
    fn test_from_char() {
        assert_eq!(Category::from_char('C'), Some(Category::C));
        assert_eq!(Category::from_char('Z'), None);
    }
}
