//! Rollover tick outcome.

use serde::{Deserialize, Serialize};

/// Summary of one rollover tick across the active partition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RolloverReport {
    /// Unix epoch milliseconds at which the tick ran.
    pub ran_at: i64,
    /// Active habits inspected.
    pub scanned: u32,
    /// Habits whose `progress_days` advanced.
    pub advanced: u32,
}
