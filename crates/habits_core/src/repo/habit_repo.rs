//! Habit repository contract and SQLite implementation.
//!
//! # Responsibility
//! - Provide create/update/delete/get/list over canonical `habits` storage.
//! - Record rollover tick history.
//! - Keep SQL details inside the persistence boundary.
//!
//! # Invariants
//! - Listing is ordered by `name ASC, uuid ASC` using binary collation.
//! - `update_habit` and `delete_habit` report `NotFound` when no row matched.
//! - Read paths reject invalid persisted state instead of masking it.

use crate::db::DbError;
use crate::model::habit::{Habit, HabitId, NewHabit};
use crate::model::rollover::RolloverReport;
use rusqlite::{params, Connection, Row};
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

const HABIT_SELECT_SQL: &str = "SELECT
    uuid,
    name,
    is_good,
    goal,
    created_at,
    goal_fulfilled,
    progress_days,
    archived
FROM habits";

pub type RepoResult<T> = Result<T, RepoError>;

/// Repository error for habit persistence and query operations.
#[derive(Debug)]
pub enum RepoError {
    Db(DbError),
    NotFound(HabitId),
    InvalidData(String),
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Db(err) => write!(f, "{err}"),
            Self::NotFound(id) => write!(f, "habit not found: {id}"),
            Self::InvalidData(message) => write!(f, "invalid persisted habit data: {message}"),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            Self::NotFound(_) | Self::InvalidData(_) => None,
        }
    }
}

impl RepoError {
    pub fn is_busy(&self) -> bool {
        matches!(self, Self::Db(err) if err.is_busy())
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// Which partition a listing covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum HabitPartition {
    #[default]
    Active,
    Archived,
    All,
}

/// Query options for listing habits.
#[derive(Debug, Clone, Copy, Default)]
pub struct HabitListQuery {
    pub partition: HabitPartition,
}

impl HabitListQuery {
    pub fn active() -> Self {
        Self {
            partition: HabitPartition::Active,
        }
    }

    pub fn archived() -> Self {
        Self {
            partition: HabitPartition::Archived,
        }
    }

    pub fn all() -> Self {
        Self {
            partition: HabitPartition::All,
        }
    }
}

/// Repository interface for the habit store.
pub trait HabitRepository {
    /// Assigns identity and creation time, persists, and returns the record.
    fn create_habit(&self, input: &NewHabit, created_at: i64) -> RepoResult<Habit>;
    /// Persists the full state of an existing record keyed by `id`.
    fn update_habit(&self, habit: &Habit) -> RepoResult<()>;
    fn delete_habit(&self, id: HabitId) -> RepoResult<()>;
    fn get_habit(&self, id: HabitId) -> RepoResult<Option<Habit>>;
    fn list_habits(&self, query: &HabitListQuery) -> RepoResult<Vec<Habit>>;
    fn record_rollover(&self, report: &RolloverReport) -> RepoResult<()>;
    fn last_rollover(&self) -> RepoResult<Option<RolloverReport>>;
}

/// SQLite-backed habit repository.
pub struct SqliteHabitRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteHabitRepository<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }
}

impl HabitRepository for SqliteHabitRepository<'_> {
    fn create_habit(&self, input: &NewHabit, created_at: i64) -> RepoResult<Habit> {
        let habit = Habit::new(input, created_at);

        self.conn.execute(
            "INSERT INTO habits (
                uuid,
                name,
                is_good,
                goal,
                created_at,
                goal_fulfilled,
                progress_days,
                archived
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8);",
            params![
                habit.id.to_string(),
                habit.name.as_str(),
                bool_to_int(habit.is_good),
                habit.goal.as_str(),
                habit.created_at,
                bool_to_int(habit.goal_fulfilled),
                i64::from(habit.progress_days),
                bool_to_int(habit.archived),
            ],
        )?;

        Ok(habit)
    }

    fn update_habit(&self, habit: &Habit) -> RepoResult<()> {
        // `created_at` is immutable and stays out of the SET list.
        let changed = self.conn.execute(
            "UPDATE habits
             SET
                name = ?1,
                is_good = ?2,
                goal = ?3,
                goal_fulfilled = ?4,
                progress_days = ?5,
                archived = ?6,
                updated_at = (strftime('%s', 'now') * 1000)
             WHERE uuid = ?7;",
            params![
                habit.name.as_str(),
                bool_to_int(habit.is_good),
                habit.goal.as_str(),
                bool_to_int(habit.goal_fulfilled),
                i64::from(habit.progress_days),
                bool_to_int(habit.archived),
                habit.id.to_string(),
            ],
        )?;

        if changed == 0 {
            return Err(RepoError::NotFound(habit.id));
        }

        Ok(())
    }

    fn delete_habit(&self, id: HabitId) -> RepoResult<()> {
        let changed = self
            .conn
            .execute("DELETE FROM habits WHERE uuid = ?1;", [id.to_string()])?;

        if changed == 0 {
            return Err(RepoError::NotFound(id));
        }

        Ok(())
    }

    fn get_habit(&self, id: HabitId) -> RepoResult<Option<Habit>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{HABIT_SELECT_SQL} WHERE uuid = ?1;"))?;

        let mut rows = stmt.query([id.to_string()])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_habit_row(row)?));
        }

        Ok(None)
    }

    fn list_habits(&self, query: &HabitListQuery) -> RepoResult<Vec<Habit>> {
        let filter = match query.partition {
            HabitPartition::Active => " WHERE archived = 0",
            HabitPartition::Archived => " WHERE archived = 1",
            HabitPartition::All => "",
        };
        let sql = format!(
            "{HABIT_SELECT_SQL}{filter} ORDER BY name COLLATE BINARY ASC, uuid ASC;"
        );

        let mut stmt = self.conn.prepare(&sql)?;
        let mut rows = stmt.query([])?;
        let mut habits = Vec::new();

        while let Some(row) = rows.next()? {
            habits.push(parse_habit_row(row)?);
        }

        Ok(habits)
    }

    fn record_rollover(&self, report: &RolloverReport) -> RepoResult<()> {
        self.conn.execute(
            "INSERT INTO rollover_runs (ran_at, scanned, advanced) VALUES (?1, ?2, ?3);",
            params![
                report.ran_at,
                i64::from(report.scanned),
                i64::from(report.advanced)
            ],
        )?;
        Ok(())
    }

    fn last_rollover(&self) -> RepoResult<Option<RolloverReport>> {
        let mut stmt = self.conn.prepare(
            "SELECT ran_at, scanned, advanced
             FROM rollover_runs
             ORDER BY id DESC
             LIMIT 1;",
        )?;

        let mut rows = stmt.query([])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(RolloverReport {
                ran_at: row.get("ran_at")?,
                scanned: parse_count(row, "scanned", "rollover_runs.scanned")?,
                advanced: parse_count(row, "advanced", "rollover_runs.advanced")?,
            }));
        }

        Ok(None)
    }
}

fn parse_habit_row(row: &Row<'_>) -> RepoResult<Habit> {
    let uuid_text: String = row.get("uuid")?;
    let id = Uuid::parse_str(&uuid_text).map_err(|_| {
        RepoError::InvalidData(format!("invalid uuid value `{uuid_text}` in habits.uuid"))
    })?;

    Ok(Habit {
        id,
        name: row.get("name")?,
        is_good: parse_flag(row, "is_good")?,
        goal: row.get("goal")?,
        created_at: row.get("created_at")?,
        goal_fulfilled: parse_flag(row, "goal_fulfilled")?,
        progress_days: parse_count(row, "progress_days", "habits.progress_days")?,
        archived: parse_flag(row, "archived")?,
    })
}

fn parse_flag(row: &Row<'_>, column: &str) -> RepoResult<bool> {
    match row.get::<_, i64>(column)? {
        0 => Ok(false),
        1 => Ok(true),
        other => Err(RepoError::InvalidData(format!(
            "invalid {column} value `{other}` in habits.{column}"
        ))),
    }
}

fn parse_count(row: &Row<'_>, column: &str, location: &str) -> RepoResult<u32> {
    let value = row.get::<_, i64>(column)?;
    u32::try_from(value)
        .map_err(|_| RepoError::InvalidData(format!("invalid count `{value}` in {location}")))
}

fn bool_to_int(value: bool) -> i64 {
    if value {
        1
    } else {
        0
    }
}
