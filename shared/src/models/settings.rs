//! Settings Model

use serde::{Deserialize, Serialize};

/// Operator-controlled configuration flags.
///
/// `reception_open` gates walk-in intake and is the only field the
/// system ever writes on its own (the admission controller closes it;
/// it is never reopened automatically).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    pub reception_open: bool,
    pub auto_stop_enabled: bool,
    /// Display toggle for the public wait-status board; not consulted by
    /// the scheduler
    pub show_wait_status: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            reception_open: true,
            auto_stop_enabled: true,
            show_wait_status: true,
        }
    }
}

/// Partial settings update
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SettingsPatch {
    pub reception_open: Option<bool>,
    pub auto_stop_enabled: Option<bool>,
    pub show_wait_status: Option<bool>,
}

impl SettingsPatch {
    pub fn apply_to(&self, settings: &mut Settings) {
        if let Some(v) = self.reception_open {
            settings.reception_open = v;
        }
        if let Some(v) = self.auto_stop_enabled {
            settings.auto_stop_enabled = v;
        }
        if let Some(v) = self.show_wait_status {
            settings.show_wait_status = v;
        }
    }
}
