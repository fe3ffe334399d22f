//! Core domain logic for clantimer, a per-account game timer tracker.
//! This crate is the single source of truth for timer availability rules.

pub mod clock;
pub mod config;
pub mod db;
pub mod engine;
pub mod logging;
pub mod model;
pub mod service;
pub mod store;
pub mod ticker;

pub use clock::{Clock, ManualClock, SystemClock};
pub use config::{AppConfig, ConfigError};
pub use engine::{
    account_availability, closest_pending_timer, format_remaining, is_available,
    min_remaining_across_timers, order_accounts, order_timers, reconcile_completions,
    reconcile_with_report, remaining, Availability, ClosestPending, CompletedTimer, MinRemaining,
    Reconciliation,
};
pub use logging::{default_log_level, init_logging, logging_status, LoggingError};
pub use model::account::{Account, AccountId, Timer, TimerId, ValidationError, DEFAULT_TIMER_NAMES};
pub use model::duration::TimerDuration;
pub use model::snapshot::Snapshot;
pub use service::timer_service::{EditOutcome, ServiceError, TickReport, TimerService};
pub use service::views::{AccountSummary, TimerView};
pub use store::memory::MemorySnapshotStore;
pub use store::sqlite::SqliteSnapshotStore;
pub use store::{SnapshotStore, StoreError, StoreResult};
pub use ticker::{SharedTimerService, TickHandle};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
