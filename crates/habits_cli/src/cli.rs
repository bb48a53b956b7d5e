//! Command-line definition for the `habits` binary.

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use uuid::Uuid;

#[derive(Parser)]
#[command(
    name = "habits",
    version = env!("CARGO_PKG_VERSION"),
    about = "Track daily habits and their consistency",
    long_about = None
)]
pub struct Cli {
    /// Override database path (defaults to $HABITS_DB_PATH or the temp dir)
    #[arg(global = true, long = "db")]
    pub db: Option<PathBuf>,

    /// Write rolling logs into this absolute directory
    #[arg(global = true, long = "log-dir")]
    pub log_dir: Option<PathBuf>,

    /// Print results as JSON
    #[arg(global = true, long = "json")]
    pub json: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Add a new habit
    Add {
        name: String,
        goal: String,
        /// Mark the habit as one to quit rather than build
        #[arg(long = "bad")]
        bad: bool,
    },

    /// List active habits (or archived ones with --archived)
    List {
        #[arg(long = "archived")]
        archived: bool,
    },

    /// Show one habit
    Show { id: Uuid },

    /// Flip today's fulfillment flag
    Toggle { id: Uuid },

    /// Move a habit to the archive
    Archive { id: Uuid },

    /// Bring an archived habit back
    Restore { id: Uuid },

    /// Change name and goal
    Rename { id: Uuid, name: String, goal: String },

    /// Change polarity
    Polarity {
        id: Uuid,
        /// `good` or `bad`
        #[arg(value_parser = ["good", "bad"])]
        polarity: String,
    },

    /// Permanently delete a habit
    Delete { id: Uuid },

    /// Consistency percentage of one habit as of now
    Consistency { id: Uuid },

    /// Run one rollover tick immediately
    Rollover,

    /// Totals and average consistency
    Stats,

    /// Keep running and roll over on a fixed interval
    Run {
        /// Interval in seconds (defaults to $HABITS_ROLLOVER_INTERVAL_SECS or 24h)
        #[arg(long = "interval-secs")]
        interval_secs: Option<u64>,
    },
}
