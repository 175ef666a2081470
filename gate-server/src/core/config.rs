//! Server configuration
//!
//! # Environment variables
//!
//! All settings can be overridden through the environment:
//!
//! | Variable | Default | Meaning |
//! |----------|---------|---------|
//! | HTTP_PORT | 3000 | HTTP API port |
//! | LOG_DIR | (unset) | Optional log file directory |
//! | EVENT_DAY1_DATE | 2025-11-01 | Calendar date of day 1 |
//! | EVENT_DAY2_DATE | 2025-11-02 | Calendar date of day 2 |
//! | GROUP_CAPACITY | 4 | Max total headcount per call group |
//! | ABSENCE_GRACE_MINUTES | 15 | Minutes before an absentee is purged |
//! | VIP_LEAD_MINUTES | 5 | How early a VIP slot opens for grouping |
//! | AUTO_STOP_THRESHOLD | 40 | Waiting headcount that closes reception |
//! | ABSENCE_CHECK_SECS | 30 | Absence monitor period |
//! | AUTO_STOP_CHECK_SECS | 60 | Admission controller period |
//! | ROLLOVER_SECS | 30 | Post-completion countdown before auto-reset |
//! | ACCEPT_POLICY | status-transition | `status-transition` or `delete` |
//! | PURGE_POLICY | cancel | `cancel` or `delete` |
//!
//! # Example
//!
//! ```ignore
//! HTTP_PORT=8080 AUTO_STOP_THRESHOLD=60 cargo run
//! ```

use chrono::NaiveDate;
use std::time::Duration;

use crate::scheduler::{AcceptPolicy, PurgePolicy, SchedulerConfig};

#[derive(Debug, Clone)]
pub struct Config {
    /// HTTP API port
    pub http_port: u16,
    /// Optional directory for daily log files
    pub log_dir: Option<String>,
    /// Calendar dates of the two event days
    pub day_dates: [NaiveDate; 2],
    /// Maximum total headcount per call group
    pub group_capacity: u32,
    /// How long an absentee is held before being purged
    pub absence_grace_minutes: u64,
    /// How early a VIP slot opens for grouping
    pub vip_lead_minutes: u64,
    /// Waiting headcount at which reception auto-closes
    pub auto_stop_threshold: u32,
    /// Absence monitor period
    pub absence_check_secs: u64,
    /// Admission controller period
    pub auto_stop_check_secs: u64,
    /// Post-completion countdown before the automatic reset
    pub rollover_secs: u64,
    /// What accepting a staged group does to its members
    pub accept_policy: AcceptPolicy,
    /// What the timeout purge does to an absentee
    pub purge_policy: PurgePolicy,
}

impl Config {
    /// Load configuration from the environment, falling back to defaults
    pub fn from_env() -> Self {
        Self {
            http_port: env_parsed("HTTP_PORT", 3000),
            log_dir: std::env::var("LOG_DIR").ok(),
            day_dates: [
                env_date("EVENT_DAY1_DATE", NaiveDate::from_ymd_opt(2025, 11, 1).unwrap()),
                env_date("EVENT_DAY2_DATE", NaiveDate::from_ymd_opt(2025, 11, 2).unwrap()),
            ],
            group_capacity: env_parsed("GROUP_CAPACITY", 4),
            absence_grace_minutes: env_parsed("ABSENCE_GRACE_MINUTES", 15),
            vip_lead_minutes: env_parsed("VIP_LEAD_MINUTES", 5),
            auto_stop_threshold: env_parsed("AUTO_STOP_THRESHOLD", 40),
            absence_check_secs: env_parsed("ABSENCE_CHECK_SECS", 30),
            auto_stop_check_secs: env_parsed("AUTO_STOP_CHECK_SECS", 60),
            rollover_secs: env_parsed("ROLLOVER_SECS", 30),
            accept_policy: env_parsed_str("ACCEPT_POLICY"),
            purge_policy: env_parsed_str("PURGE_POLICY"),
        }
    }

    /// Derive the scheduler's view of the configuration
    pub fn scheduler_config(&self) -> SchedulerConfig {
        SchedulerConfig {
            group_capacity: self.group_capacity,
            absence_grace: chrono::TimeDelta::minutes(self.absence_grace_minutes as i64),
            vip_lead: chrono::TimeDelta::minutes(self.vip_lead_minutes as i64),
            auto_stop_threshold: self.auto_stop_threshold,
            day_dates: self.day_dates,
            accept_policy: self.accept_policy,
            purge_policy: self.purge_policy,
        }
    }

    pub fn absence_check_period(&self) -> Duration {
        Duration::from_secs(self.absence_check_secs)
    }

    pub fn auto_stop_check_period(&self) -> Duration {
        Duration::from_secs(self.auto_stop_check_secs)
    }

    pub fn rollover_delay(&self) -> Duration {
        Duration::from_secs(self.rollover_secs)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::from_env()
    }
}

fn env_parsed<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

fn env_parsed_str<T: std::str::FromStr + Default>(key: &str) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or_default()
}

fn env_date(key: &str, default: NaiveDate) -> NaiveDate {
    std::env::var(key)
        .ok()
        .and_then(|v| NaiveDate::parse_from_str(&v, "%Y-%m-%d").ok())
        .unwrap_or(default)
}
