//! Logger configuration loaded from the environment.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{
    core::store::MemoryMutationLog,
    persist::{MutationLog, StorageResult, sqlite::SqliteMutationLog},
    runtime::handle::{MutationLogHandle, RuntimeConfig, spawn_mutation_log},
};

/// Backend selector; `MUTLOG_DATABASE` value.
pub const DATABASE_VAR: &str = "MUTLOG_DATABASE";
/// Command queue bound; `MUTLOG_QUEUE_BOUND` value.
pub const QUEUE_BOUND_VAR: &str = "MUTLOG_QUEUE_BOUND";
/// Event broadcast capacity; `MUTLOG_EVENT_CAPACITY` value.
pub const EVENT_CAPACITY_VAR: &str = "MUTLOG_EVENT_CAPACITY";

/// Invalid configuration value.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    /// A variable was set but could not be parsed.
    #[error("invalid value for {var}: {value:?}")]
    InvalidValue {
        /// Variable name.
        var: &'static str,
        /// Raw value.
        value: String,
    },
}

/// Where records are persisted.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DatabaseConfig {
    /// Process-local; lost on exit.
    #[default]
    Memory,
    /// SQLite database file.
    Sqlite {
        /// Database path.
        path: PathBuf,
    },
}

/// Top-level configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggerConfig {
    /// Storage backend.
    pub database: DatabaseConfig,
    /// Runtime queue sizing.
    pub runtime: RuntimeConfig,
}

impl LoggerConfig {
    /// Reads configuration from process environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Reads configuration through `lookup`; unset variables keep their defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let mut config = Self::default();

        if let Some(db) = lookup(DATABASE_VAR) {
            let db = db.trim();
            config.database = if db.is_empty() || db.eq_ignore_ascii_case("memory") {
                DatabaseConfig::Memory
            } else {
                DatabaseConfig::Sqlite { path: db.into() }
            };
        }
        if let Some(raw) = lookup(QUEUE_BOUND_VAR) {
            config.runtime.queue_bound = parse_positive(QUEUE_BOUND_VAR, raw)?;
        }
        if let Some(raw) = lookup(EVENT_CAPACITY_VAR) {
            config.runtime.events_capacity = parse_positive(EVENT_CAPACITY_VAR, raw)?;
        }

        Ok(config)
    }

    /// Opens the configured backend.
    pub fn open_log(&self) -> StorageResult<Box<dyn MutationLog>> {
        Ok(match &self.database {
            DatabaseConfig::Memory => Box::new(MemoryMutationLog::new()),
            DatabaseConfig::Sqlite { path } => Box::new(SqliteMutationLog::open(path)?),
        })
    }

    /// Opens the configured backend and starts the runtime. Must be called inside a tokio runtime.
    pub fn spawn(&self) -> StorageResult<MutationLogHandle> {
        let log = self.open_log()?;
        Ok(spawn_mutation_log(log, self.runtime.clone()))
    }
}

fn parse_positive(var: &'static str, raw: String) -> Result<usize, ConfigError> {
    match raw.trim().parse::<usize>() {
        Ok(v) if v > 0 => Ok(v),
        _ => Err(ConfigError::InvalidValue { var, value: raw }),
    }
}
