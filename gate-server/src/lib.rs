//! Torii Gate Server - reservation queue & group-call scheduler
//!
//! Manages the physical queueing process for a two-day ticketed event:
//! reservations are classified into lanes, bundled into capacity-bounded
//! call groups, and called forward for admission, with priority handling
//! for previously-absent and VIP entries and automatic suspension of new
//! intake when the queue grows too long.
//!
//! # Module structure
//!
//! ```text
//! gate-server/src/
//! ├── core/       # config, state, server, background tasks
//! ├── store/      # record store trait + in-memory implementation
//! ├── scheduler/  # lanes, group formation, call lifecycle, absence,
//! │               # admission control, intake
//! ├── services/   # settings cache, periodic monitors, rollover timer
//! ├── api/        # HTTP routes and handlers
//! └── utils/      # logging
//! ```

pub mod api;
pub mod core;
pub mod scheduler;
pub mod services;
pub mod store;
pub mod utils;

// Re-export public types
pub use core::{Config, Server, ServerState};
pub use scheduler::{Scheduler, SchedulerConfig, SchedulerError};
pub use store::{MemoryStore, Store, StoreError};
pub use utils::{ApiResponse, AppError, AppResult};

// Re-export logger functions
pub use utils::logger::{init_logger, init_logger_with_file};
