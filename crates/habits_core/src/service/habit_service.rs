//! Habit lifecycle controller.
//!
//! # Responsibility
//! - Expose the use-case API consumed by presentation layers.
//! - Apply lifecycle transitions and commit them through the habit store.
//! - Run the daily rollover across the active partition.
//!
//! # Invariants
//! - Every read-modify-commit runs in an IMMEDIATE transaction, so no two
//!   mutations interleave, whether they come from this process or from
//!   another connection on the same database file.
//! - A mutation either commits fully or returns an error with storage
//!   unchanged.
//! - Archived habits never accrue progress.

use crate::clock::{Clock, SystemClock};
use crate::consistency::{average_consistency, consistency};
use crate::db::{open_db, open_db_in_memory, DbResult};
use crate::model::habit::{Habit, HabitId, NewHabit, TransitionError};
use crate::model::rollover::RolloverReport;
use crate::repo::habit_repo::{
    HabitListQuery, HabitRepository, RepoError, SqliteHabitRepository,
};
use log::{error, info};
use rusqlite::{Connection, TransactionBehavior};
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::Path;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Instant;

pub type ServiceResult<T> = Result<T, HabitServiceError>;

/// Service error for habit use-cases.
#[derive(Debug)]
pub enum HabitServiceError {
    /// Target habit does not exist.
    NotFound(HabitId),
    /// Operation is not valid in the habit's current state.
    InvalidTransition(TransitionError),
    /// Underlying storage failed to read or write.
    Persistence(RepoError),
}

impl Display for HabitServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotFound(id) => write!(f, "habit not found: {id}"),
            Self::InvalidTransition(err) => write!(f, "{err}"),
            Self::Persistence(err) => write!(f, "persistence failure: {err}"),
        }
    }
}

impl Error for HabitServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::NotFound(_) => None,
            Self::InvalidTransition(err) => Some(err),
            Self::Persistence(err) => Some(err),
        }
    }
}

impl From<RepoError> for HabitServiceError {
    fn from(value: RepoError) -> Self {
        match value {
            RepoError::NotFound(id) => Self::NotFound(id),
            other => Self::Persistence(other),
        }
    }
}

impl From<rusqlite::Error> for HabitServiceError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Persistence(value.into())
    }
}

impl From<TransitionError> for HabitServiceError {
    fn from(value: TransitionError) -> Self {
        Self::InvalidTransition(value)
    }
}

impl HabitServiceError {
    fn code(&self) -> &'static str {
        match self {
            Self::NotFound(_) => "not_found",
            Self::InvalidTransition(_) => "invalid_transition",
            Self::Persistence(err) if err.is_busy() => "storage_busy",
            Self::Persistence(_) => "persistence_failed",
        }
    }
}

/// Aggregate figures across every stored habit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProfileSummary {
    /// Habits in both partitions.
    pub total_habits: usize,
    /// Habits whose goal is not yet fulfilled today.
    pub in_progress: usize,
    /// Mean consistency percentage; `None` when no habits exist.
    pub average_consistency: Option<f64>,
}

/// Lifecycle controller over a single SQLite connection.
pub struct HabitService<C: Clock = SystemClock> {
    conn: Mutex<Connection>,
    clock: C,
}

impl HabitService<SystemClock> {
    /// Opens (and migrates) a database file using the system clock.
    pub fn open(path: impl AsRef<Path>) -> DbResult<Self> {
        Ok(Self::new(open_db(path)?, SystemClock))
    }
}

impl<C: Clock> HabitService<C> {
    /// Wraps an already migrated connection.
    pub fn new(conn: Connection, clock: C) -> Self {
        Self {
            conn: Mutex::new(conn),
            clock,
        }
    }

    /// Opens a throwaway in-memory store with the provided clock.
    pub fn in_memory(clock: C) -> DbResult<Self> {
        Ok(Self::new(open_db_in_memory()?, clock))
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }

    /// Creates an active, unfulfilled habit stamped with the current time.
    ///
    /// Empty `name`/`goal` are accepted; see `validate_new_habit`.
    pub fn create_habit(&self, input: &NewHabit) -> ServiceResult<Habit> {
        let created_at = self.clock.now_epoch_ms();
        let started_at = Instant::now();
        let result = self.with_repo(|repo| Ok(repo.create_habit(input, created_at)?));
        match &result {
            Ok(habit) => info!(
                "event=habit_create module=service status=ok habit_id={} duration_ms={}",
                habit.id,
                started_at.elapsed().as_millis()
            ),
            Err(err) => error!(
                "event=habit_create module=service status=error duration_ms={} error_code={} error={}",
                started_at.elapsed().as_millis(),
                err.code(),
                err
            ),
        }
        result
    }

    pub fn get_habit(&self, id: HabitId) -> ServiceResult<Habit> {
        self.with_repo(|repo| load(repo, id))
    }

    /// Active habits ordered by `name`, then `id`.
    pub fn list_active_habits(&self) -> ServiceResult<Vec<Habit>> {
        self.with_repo(|repo| Ok(repo.list_habits(&HabitListQuery::active())?))
    }

    /// Archived habits ordered by `name`, then `id`.
    pub fn list_archived_habits(&self) -> ServiceResult<Vec<Habit>> {
        self.with_repo(|repo| Ok(repo.list_habits(&HabitListQuery::archived())?))
    }

    /// Consistency percentage of one habit at `now` (epoch milliseconds).
    pub fn get_consistency(&self, id: HabitId, now: i64) -> ServiceResult<u32> {
        let habit = self.get_habit(id)?;
        Ok(consistency(&habit, now))
    }

    /// Flips today's fulfillment flag of an active habit.
    pub fn toggle_fulfillment(&self, id: HabitId) -> ServiceResult<Habit> {
        self.mutate("habit_toggle", id, |habit| Ok(habit.toggle_fulfillment()?))
    }

    pub fn archive_habit(&self, id: HabitId) -> ServiceResult<Habit> {
        self.mutate("habit_archive", id, |habit| Ok(habit.archive()?))
    }

    pub fn restore_habit(&self, id: HabitId) -> ServiceResult<Habit> {
        self.mutate("habit_restore", id, |habit| Ok(habit.restore()?))
    }

    pub fn rename_habit(
        &self,
        id: HabitId,
        name: impl Into<String>,
        goal: impl Into<String>,
    ) -> ServiceResult<Habit> {
        let (name, goal) = (name.into(), goal.into());
        self.mutate("habit_rename", id, move |habit| {
            habit.rename(name, goal);
            Ok(())
        })
    }

    pub fn set_polarity(&self, id: HabitId, is_good: bool) -> ServiceResult<Habit> {
        self.mutate("habit_polarity", id, |habit| {
            habit.set_polarity(is_good);
            Ok(())
        })
    }

    /// Permanently removes a habit.
    pub fn delete_habit(&self, id: HabitId) -> ServiceResult<()> {
        let started_at = Instant::now();
        let result = self.with_repo(|repo| Ok(repo.delete_habit(id)?));
        log_outcome("habit_delete", id, started_at, &result);
        result
    }

    /// Rollover tick at the clock's current time.
    pub fn rollover_now(&self) -> ServiceResult<RolloverReport> {
        self.rollover_all(self.clock.now_epoch_ms())
    }

    /// Applies one rollover tick to every active habit.
    ///
    /// Runs inside one transaction: on failure no habit is changed and no
    /// run is recorded.
    pub fn rollover_all(&self, now: i64) -> ServiceResult<RolloverReport> {
        let started_at = Instant::now();
        let result = self.rollover_in_transaction(now);
        match &result {
            Ok(report) => info!(
                "event=rollover module=service status=ok scanned={} advanced={} duration_ms={}",
                report.scanned,
                report.advanced,
                started_at.elapsed().as_millis()
            ),
            Err(err) => error!(
                "event=rollover module=service status=error duration_ms={} error_code={} error={}",
                started_at.elapsed().as_millis(),
                err.code(),
                err
            ),
        }
        result
    }

    /// Most recently recorded rollover tick, if any.
    pub fn last_rollover(&self) -> ServiceResult<Option<RolloverReport>> {
        self.with_repo(|repo| Ok(repo.last_rollover()?))
    }

    /// Totals across both partitions at `now`.
    pub fn profile_summary(&self, now: i64) -> ServiceResult<ProfileSummary> {
        let habits = self.with_repo(|repo| Ok(repo.list_habits(&HabitListQuery::all())?))?;
        Ok(ProfileSummary {
            total_habits: habits.len(),
            in_progress: habits.iter().filter(|habit| !habit.goal_fulfilled).count(),
            average_consistency: average_consistency(&habits, now),
        })
    }

    fn rollover_in_transaction(&self, now: i64) -> ServiceResult<RolloverReport> {
        self.with_write_tx(|repo| {
            let mut report = RolloverReport {
                ran_at: now,
                scanned: 0,
                advanced: 0,
            };
            let active = repo.list_habits(&HabitListQuery::active())?;
            for mut habit in active.into_iter().filter(Habit::is_active) {
                report.scanned += 1;
                if habit.rollover()? {
                    repo.update_habit(&habit)?;
                    report.advanced += 1;
                }
            }
            repo.record_rollover(&report)?;
            Ok(report)
        })
    }

    fn mutate(
        &self,
        event: &'static str,
        id: HabitId,
        apply: impl FnOnce(&mut Habit) -> ServiceResult<()>,
    ) -> ServiceResult<Habit> {
        let started_at = Instant::now();
        let result = self.with_write_tx(|repo| {
            let mut habit = load(repo, id)?;
            apply(&mut habit)?;
            repo.update_habit(&habit)?;
            Ok(habit)
        });
        log_outcome(event, id, started_at, &result);
        result
    }

    /// Runs `f` inside an IMMEDIATE transaction and commits on success.
    ///
    /// The write lock is taken before the first read, so other connections on
    /// the same file cannot commit between this read and this write, and a
    /// contended lock waits out the busy timeout instead of failing at once.
    fn with_write_tx<T>(
        &self,
        f: impl FnOnce(&SqliteHabitRepository<'_>) -> ServiceResult<T>,
    ) -> ServiceResult<T> {
        let mut conn = self.lock();
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
        let value = f(&SqliteHabitRepository::new(&tx))?;
        tx.commit()?;
        Ok(value)
    }

    fn with_repo<T>(
        &self,
        f: impl FnOnce(&SqliteHabitRepository<'_>) -> ServiceResult<T>,
    ) -> ServiceResult<T> {
        let conn = self.lock();
        let repo = SqliteHabitRepository::new(&conn);
        f(&repo)
    }

    fn lock(&self) -> MutexGuard<'_, Connection> {
        // Writes are single statements or transactions; a poisoned lock holds
        // no partial state.
        self.conn.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

fn load(repo: &impl HabitRepository, id: HabitId) -> ServiceResult<Habit> {
    repo.get_habit(id)?.ok_or(HabitServiceError::NotFound(id))
}

fn log_outcome<T>(event: &str, id: HabitId, started_at: Instant, result: &ServiceResult<T>) {
    match result {
        Ok(_) => info!(
            "event={event} module=service status=ok habit_id={id} duration_ms={}",
            started_at.elapsed().as_millis()
        ),
        Err(err) => error!(
            "event={event} module=service status=error habit_id={id} duration_ms={} error_code={} error={}",
            started_at.elapsed().as_millis(),
            err.code(),
            err
        ),
    }
}
