//! Habit lifecycle and consistency engine.
//! This crate is the single source of truth for habit invariants.

pub mod clock;
pub mod config;
pub mod consistency;
pub mod db;
pub mod logging;
pub mod model;
pub mod repo;
pub mod scheduler;
pub mod service;

pub use clock::{Clock, ManualClock, SystemClock};
pub use config::{ConfigError, EngineConfig};
pub use consistency::{average_consistency, consistency, days_elapsed};
pub use logging::{init_logging, logging_status, LogLevel};
pub use model::habit::{
    validate_new_habit, Habit, HabitId, HabitState, HabitValidationError, NewHabit, Transition,
    TransitionError, DAY_MS,
};
pub use model::rollover::RolloverReport;
pub use repo::habit_repo::{
    HabitListQuery, HabitPartition, HabitRepository, RepoError, RepoResult,
    SqliteHabitRepository,
};
pub use scheduler::{RolloverScheduler, SchedulerError, DEFAULT_ROLLOVER_INTERVAL};
pub use service::habit_service::{
    HabitService, HabitServiceError, ProfileSummary, ServiceResult,
};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
