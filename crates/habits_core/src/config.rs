//! Engine configuration.
//!
//! # Responsibility
//! - Resolve database location, rollover period and logging options.
//! - Apply environment overrides on top of built-in defaults.
//!
//! # Invariants
//! - `rollover_interval` is never zero.
//! - Blank environment values are treated as unset.

use crate::logging::LogLevel;
use crate::scheduler::DEFAULT_ROLLOVER_INTERVAL;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::PathBuf;
use std::time::Duration;

pub const ENV_DB_PATH: &str = "HABITS_DB_PATH";
pub const ENV_ROLLOVER_INTERVAL_SECS: &str = "HABITS_ROLLOVER_INTERVAL_SECS";
pub const ENV_LOG_LEVEL: &str = "HABITS_LOG_LEVEL";
pub const ENV_LOG_DIR: &str = "HABITS_LOG_DIR";

const DEFAULT_DB_FILE_NAME: &str = "habits.sqlite3";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    InvalidValue { key: &'static str, message: String },
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidValue { key, message } => write!(f, "invalid `{key}`: {message}"),
        }
    }
}

impl Error for ConfigError {}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineConfig {
    pub db_path: PathBuf,
    pub rollover_interval: Duration,
    pub log_level: LogLevel,
    /// File logging stays off when unset.
    pub log_dir: Option<PathBuf>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            db_path: std::env::temp_dir().join(DEFAULT_DB_FILE_NAME),
            rollover_interval: DEFAULT_ROLLOVER_INTERVAL,
            log_level: LogLevel::build_default(),
            log_dir: None,
        }
    }
}

impl EngineConfig {
    /// Defaults overridden by `HABITS_*` environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`EngineConfig::from_env`] with an injectable variable source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let read = |key: &str| {
            lookup(key)
                .map(|raw| raw.trim().to_string())
                .filter(|value| !value.is_empty())
        };

        let mut config = Self::default();
        if let Some(path) = read(ENV_DB_PATH) {
            config.db_path = PathBuf::from(path);
        }
        if let Some(raw) = read(ENV_ROLLOVER_INTERVAL_SECS) {
            config.rollover_interval = parse_interval_secs(&raw)?;
        }
        if let Some(raw) = read(ENV_LOG_LEVEL) {
            config.log_level = raw
                .parse::<LogLevel>()
                .map_err(|message| ConfigError::InvalidValue {
                    key: ENV_LOG_LEVEL,
                    message,
                })?;
        }
        if let Some(dir) = read(ENV_LOG_DIR) {
            config.log_dir = Some(PathBuf::from(dir));
        }
        Ok(config)
    }
}

fn parse_interval_secs(raw: &str) -> Result<Duration, ConfigError> {
    let invalid = |message: String| ConfigError::InvalidValue {
        key: ENV_ROLLOVER_INTERVAL_SECS,
        message,
    };
    let secs: u64 = raw
        .parse()
        .map_err(|_| invalid(format!("`{raw}` is not a whole number of seconds")))?;
    if secs == 0 {
        return Err(invalid("interval must be greater than zero".to_string()));
    }
    Ok(Duration::from_secs(secs))
}
