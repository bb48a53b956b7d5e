//! Habit domain model.
//!
//! # Responsibility
//! - Define the canonical record for one tracked behavior.
//! - Provide the lifecycle transitions applied by the controller.
//!
//! # Invariants
//! - `id` and `created_at` never change after creation.
//! - `goal_fulfilled` only describes the current daily cycle and is cleared by
//!   every rollover.
//! - `progress_days` never decreases.
//! - Transitions that are invalid for the current state leave the value
//!   untouched.

use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

/// Stable identifier for a habit record.
pub type HabitId = Uuid;

/// Length of one day in epoch milliseconds.
pub const DAY_MS: i64 = 24 * 60 * 60 * 1000;

/// Lifecycle state derived from the mutable habit attributes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HabitState {
    /// Visible in the active list, today's goal not yet met.
    ActiveUnfulfilled,
    /// Visible in the active list, today's goal met.
    ActiveFulfilled,
    /// Hidden from the active list and exempt from rollover.
    Archived,
}

/// Input for creating a habit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewHabit {
    pub name: String,
    pub is_good: bool,
    pub goal: String,
}

impl NewHabit {
    pub fn new(name: impl Into<String>, is_good: bool, goal: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            is_good,
            goal: goal.into(),
        }
    }
}

/// Canonical habit record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Habit {
    /// Assigned at creation, never reused.
    pub id: HabitId,
    pub name: String,
    /// Polarity: `true` for a behavior to build, `false` for one to quit.
    pub is_good: bool,
    /// Free-text description of the target behavior.
    pub goal: String,
    /// Unix epoch milliseconds.
    pub created_at: i64,
    pub goal_fulfilled: bool,
    pub progress_days: u32,
    pub archived: bool,
}

impl Habit {
    /// Creates a fresh active, unfulfilled habit with a generated ID.
    pub fn new(input: &NewHabit, created_at: i64) -> Self {
        Self::with_id(Uuid::new_v4(), input, created_at)
    }

    /// Creates a fresh habit with a caller-provided ID.
    pub fn with_id(id: HabitId, input: &NewHabit, created_at: i64) -> Self {
        Self {
            id,
            name: input.name.clone(),
            is_good: input.is_good,
            goal: input.goal.clone(),
            created_at,
            goal_fulfilled: false,
            progress_days: 0,
            archived: false,
        }
    }

    pub fn state(&self) -> HabitState {
        match (self.archived, self.goal_fulfilled) {
            (true, _) => HabitState::Archived,
            (false, true) => HabitState::ActiveFulfilled,
            (false, false) => HabitState::ActiveUnfulfilled,
        }
    }

    pub fn is_active(&self) -> bool {
        !self.archived
    }

    /// Flips today's fulfillment flag. Two calls restore the original value.
    pub fn toggle_fulfillment(&mut self) -> Result<(), TransitionError> {
        self.require_active(Transition::ToggleFulfillment)?;
        self.goal_fulfilled = !self.goal_fulfilled;
        Ok(())
    }

    /// Closes the daily cycle.
    ///
    /// Returns whether `progress_days` advanced.
    pub fn rollover(&mut self) -> Result<bool, TransitionError> {
        self.require_active(Transition::Rollover)?;
        if !self.goal_fulfilled {
            return Ok(false);
        }
        self.progress_days = self.progress_days.saturating_add(1);
        self.goal_fulfilled = false;
        Ok(true)
    }

    pub fn archive(&mut self) -> Result<(), TransitionError> {
        self.require_active(Transition::Archive)?;
        self.archived = true;
        Ok(())
    }

    /// Moves an archived habit back to the active partition, keeping
    /// `goal_fulfilled` as it was.
    pub fn restore(&mut self) -> Result<(), TransitionError> {
        if !self.archived {
            return Err(TransitionError {
                transition: Transition::Restore,
                state: self.state(),
            });
        }
        self.archived = false;
        Ok(())
    }

    /// Replaces display name and goal text. Valid in any state.
    pub fn rename(&mut self, name: impl Into<String>, goal: impl Into<String>) {
        self.name = name.into();
        self.goal = goal.into();
    }

    /// Changes polarity. Valid in any state.
    pub fn set_polarity(&mut self, is_good: bool) {
        self.is_good = is_good;
    }

    fn require_active(&self, transition: Transition) -> Result<(), TransitionError> {
        if self.archived {
            return Err(TransitionError {
                transition,
                state: self.state(),
            });
        }
        Ok(())
    }
}

/// Named lifecycle transition, used in error reporting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    ToggleFulfillment,
    Rollover,
    Archive,
    Restore,
}

impl Transition {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::ToggleFulfillment => "toggle_fulfillment",
            Self::Rollover => "rollover",
            Self::Archive => "archive",
            Self::Restore => "restore",
        }
    }
}

/// A transition was requested from a state that does not allow it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransitionError {
    pub transition: Transition,
    pub state: HabitState,
}

impl Display for TransitionError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "transition `{}` is not allowed in state {:?}",
            self.transition.as_str(),
            self.state
        )
    }
}

impl Error for TransitionError {}

/// Add-flow validation failure.
///
/// The engine accepts empty text; callers that require non-empty input check
/// with [`validate_new_habit`] before creating.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HabitValidationError {
    EmptyName,
    EmptyGoal,
}

impl Display for HabitValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyName => write!(f, "habit name cannot be empty"),
            Self::EmptyGoal => write!(f, "habit goal cannot be empty"),
        }
    }
}

impl Error for HabitValidationError {}

/// Rejects blank name or goal text.
pub fn validate_new_habit(name: &str, goal: &str) -> Result<(), HabitValidationError> {
    if name.trim().is_empty() {
        return Err(HabitValidationError::EmptyName);
    }
    if goal.trim().is_empty() {
        return Err(HabitValidationError::EmptyGoal);
    }
    Ok(())
}
