//! Reservation Queue & Group-Call Scheduler
//!
//! The behavioral core of the server. Decides which reservations are
//! eligible to queue, how they are ordered into lanes, how lanes are
//! bundled into capacity-bounded call groups, and drives a group through
//! waiting → calling → completed, with absence tracking and admission
//! control layered on top.
//!
//! Every operation is a bounded read-modify-write against the [`Store`];
//! conflicting concurrent writes surface as
//! [`SchedulerError::Conflict`] and are retried by the operator, never
//! internally.

mod absence;
mod admission;
mod candidates;
mod classifier;
mod error;
mod intake;
mod lifecycle;
mod staging;

pub use absence::PurgeReport;
pub use admission::AutoStopReport;
pub use error::{SchedulerError, SchedulerResult};
pub use intake::ReservationRequest;
pub use lifecycle::{AbsentOutcome, CallOutcome, VisitOutcome};
pub use staging::{AcceptOutcome, StagedEntry, StagingView};

use std::str::FromStr;
use std::sync::Arc;

use chrono::{NaiveDate, TimeDelta};

use crate::services::SettingsCache;
use crate::store::Store;
use shared::models::{EventDay, Reservation, ReservationStatus};

use staging::StagingArea;

/// What `accept` does to the staged members. The record-store contract
/// differs between deployments, so the choice is configuration, not
/// scheduler logic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AcceptPolicy {
    /// Mark each member Visited
    #[default]
    StatusTransition,
    /// Delete each member record
    Delete,
}

impl FromStr for AcceptPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "status-transition" => Ok(AcceptPolicy::StatusTransition),
            "delete" => Ok(AcceptPolicy::Delete),
            other => Err(format!("unknown accept policy: {}", other)),
        }
    }
}

/// What the absence monitor does to a timed-out absentee.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PurgePolicy {
    /// Demote to a terminal Cancelled status with reason `priority_timeout`
    #[default]
    Cancel,
    /// Delete the record
    Delete,
}

impl FromStr for PurgePolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "cancel" => Ok(PurgePolicy::Cancel),
            "delete" => Ok(PurgePolicy::Delete),
            other => Err(format!("unknown purge policy: {}", other)),
        }
    }
}

/// Tunable scheduler parameters, derived from server [`Config`]
///
/// [`Config`]: crate::core::Config
#[derive(Debug, Clone)]
pub struct SchedulerConfig {
    /// Maximum total headcount per group
    pub group_capacity: u32,
    /// How long an absentee is held before being purged
    pub absence_grace: TimeDelta,
    /// How far ahead of its scheduled time a VIP reservation becomes
    /// assignable
    pub vip_lead: TimeDelta,
    /// Waiting headcount at which intake auto-stops
    pub auto_stop_threshold: u32,
    /// Calendar dates of the two event days
    pub day_dates: [NaiveDate; 2],
    pub accept_policy: AcceptPolicy,
    pub purge_policy: PurgePolicy,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            group_capacity: 4,
            absence_grace: TimeDelta::minutes(15),
            vip_lead: TimeDelta::minutes(5),
            auto_stop_threshold: 40,
            day_dates: [
                NaiveDate::from_ymd_opt(2025, 11, 1).unwrap(),
                NaiveDate::from_ymd_opt(2025, 11, 2).unwrap(),
            ],
            accept_policy: AcceptPolicy::default(),
            purge_policy: PurgePolicy::default(),
        }
    }
}

impl SchedulerConfig {
    pub fn date_of(&self, day: EventDay) -> NaiveDate {
        self.day_dates[day.index()]
    }

    /// The event day whose calendar date matches `date`, if any
    pub fn day_for_date(&self, date: NaiveDate) -> Option<EventDay> {
        EventDay::ALL
            .into_iter()
            .find(|day| self.date_of(*day) == date)
    }
}

/// Scheduler facade.
///
/// Holds the store handle, the settings cache and the per-day staging
/// areas. All state an operation needs beyond these is passed in
/// explicitly (`day`, `now`), so operations stay independent of any
/// session context.
pub struct Scheduler {
    store: Arc<dyn Store>,
    settings: Arc<SettingsCache>,
    staging: StagingArea,
    config: SchedulerConfig,
}

impl Scheduler {
    pub fn new(store: Arc<dyn Store>, settings: Arc<SettingsCache>, config: SchedulerConfig) -> Self {
        Self {
            store,
            settings,
            staging: StagingArea::new(),
            config,
        }
    }

    pub fn config(&self) -> &SchedulerConfig {
        &self.config
    }

    pub(crate) fn store(&self) -> &Arc<dyn Store> {
        &self.store
    }

    pub(crate) fn settings(&self) -> &Arc<SettingsCache> {
        &self.settings
    }

    pub(crate) fn staging_area(&self) -> &StagingArea {
        &self.staging
    }

    /// Raw reservation listing, passed through for the operator list view
    pub async fn list_reservations(
        &self,
        day: EventDay,
        status: Option<ReservationStatus>,
    ) -> SchedulerResult<Vec<Reservation>> {
        let mut out = self.store.list_reservations(day, status, None).await?;
        // Operator list view: grouped entries first by group number, then
        // registration order
        out.sort_by(|a, b| {
            let ga = a.group.unwrap_or(u32::MAX);
            let gb = b.group.unwrap_or(u32::MAX);
            ga.cmp(&gb).then(a.created_at.cmp(&b.created_at))
        });
        Ok(out)
    }
}
