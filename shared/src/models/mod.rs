//! Domain models for the queue server

pub mod category;
pub mod day;
pub mod group;
pub mod reservation;
pub mod settings;

pub use category::{CATEGORY_TABLE, Category, CategoryKind, CategoryRoute, Lane};
pub use day::EventDay;
pub use group::{CallState, Group, GroupCandidate};
pub use reservation::{
    AbsenteeEntry, Lanes, Reservation, ReservationId, ReservationPatch, ReservationStatus,
};
pub use settings::{Settings, SettingsPatch};
