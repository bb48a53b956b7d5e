//! Repository layer abstractions and persistence implementations.
//!
//! # Responsibility
//! - Define the habit store contract used by the lifecycle controller.
//! - Isolate SQLite query details from service orchestration.
//!
//! # Invariants
//! - Repository APIs return semantic errors (`NotFound`) in addition to DB
//!   transport errors.
//! - Persisted rows that break model constraints are rejected on read.

pub mod habit_repo;
