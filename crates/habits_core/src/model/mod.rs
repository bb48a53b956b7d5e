//! Habit domain model.
//!
//! # Responsibility
//! - Define the canonical habit record shared by store, controller and callers.
//! - Express lifecycle transitions as pure value operations.
//!
//! # Invariants
//! - Every habit is identified by a stable `HabitId`.
//! - A habit is either active or archived, never both.

pub mod habit;
pub mod rollover;
