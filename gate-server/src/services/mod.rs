//! Long-running services and caches

mod absence_monitor;
mod auto_stop;
mod rollover;
mod settings_cache;

pub use absence_monitor::AbsenceMonitor;
pub use auto_stop::AutoStopService;
pub use rollover::RolloverTimer;
pub use settings_cache::SettingsCache;
