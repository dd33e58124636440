//! Runtime configuration for the agenda core.
//!
//! # Responsibility
//! - Hold the knobs a host application sets at startup.
//! - Overlay `AGENDA_*` environment variables on defaults.
//!
//! # Invariants
//! - `db_path == None` means a private in-memory database.
//! - `log_dir == None` means file logging stays off.

use crate::controller::DEFAULT_FAILURE_CAPACITY;
use crate::logging::{default_log_level, parse_level, require_absolute};
use std::path::PathBuf;

pub const ENV_DB_PATH: &str = "AGENDA_DB_PATH";
pub const ENV_LOG_LEVEL: &str = "AGENDA_LOG_LEVEL";
pub const ENV_LOG_DIR: &str = "AGENDA_LOG_DIR";
pub const ENV_FAILURE_CAPACITY: &str = "AGENDA_FAILURE_CAPACITY";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoreConfig {
    pub db_path: Option<PathBuf>,
    pub log_level: String,
    pub log_dir: Option<PathBuf>,
    /// Buffered failures per controller before slow subscribers lag.
    pub failure_channel_capacity: usize,
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self {
            db_path: None,
            log_level: default_log_level().to_string(),
            log_dir: None,
            failure_channel_capacity: DEFAULT_FAILURE_CAPACITY,
        }
    }
}

impl CoreConfig {
    /// Defaults overlaid with `AGENDA_*` variables from the process
    /// environment. Blank variables are ignored.
    pub fn from_env() -> Result<Self, String> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Defaults overlaid with values from `lookup`.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, String> {
        let read = |key: &str| {
            lookup(key)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };

        let mut config = Self::default();
        if let Some(path) = read(ENV_DB_PATH) {
            config.db_path = Some(PathBuf::from(path));
        }
        if let Some(level) = read(ENV_LOG_LEVEL) {
            config.log_level = level;
        }
        if let Some(dir) = read(ENV_LOG_DIR) {
            config.log_dir = Some(PathBuf::from(dir));
        }
        if let Some(capacity) = read(ENV_FAILURE_CAPACITY) {
            config.failure_channel_capacity = capacity
                .parse()
                .map_err(|err| format!("invalid {ENV_FAILURE_CAPACITY} `{capacity}`: {err}"))?;
        }
        Ok(config)
    }

    /// Persist to `path` instead of memory.
    pub fn with_db_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.db_path = Some(path.into());
        self
    }

    /// Enable file logging under `dir`.
    pub fn with_log_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.log_dir = Some(dir.into());
        self
    }

    pub fn validate(&self) -> Result<(), String> {
        parse_level(&self.log_level)?;
        if let Some(dir) = &self.log_dir {
            require_absolute(dir)?;
        }
        if self.failure_channel_capacity == 0 {
            return Err("failure_channel_capacity must be greater than zero".to_string());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::{CoreConfig, ENV_DB_PATH, ENV_FAILURE_CAPACITY, ENV_LOG_DIR, ENV_LOG_LEVEL};
    use std::collections::HashMap;
    use std::path::PathBuf;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(key, value)| (key.to_string(), value.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_are_in_memory_without_file_logging() {
        let config = CoreConfig::default();
        assert!(config.db_path.is_none());
        assert!(config.log_dir.is_none());
        assert_eq!(config.failure_channel_capacity, 64);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn lookup_overlays_values_and_skips_blank_ones() {
        let config = CoreConfig::from_lookup(lookup(&[
            (ENV_DB_PATH, "/tmp/agenda.sqlite3"),
            (ENV_LOG_LEVEL, "warn"),
            (ENV_LOG_DIR, "   "),
            (ENV_FAILURE_CAPACITY, "8"),
        ]))
        .unwrap();

        assert_eq!(config.db_path, Some(PathBuf::from("/tmp/agenda.sqlite3")));
        assert_eq!(config.log_level, "warn");
        assert!(config.log_dir.is_none());
        assert_eq!(config.failure_channel_capacity, 8);
    }

    #[test]
    fn lookup_rejects_non_numeric_capacity() {
        let error = CoreConfig::from_lookup(lookup(&[(ENV_FAILURE_CAPACITY, "lots")])).unwrap_err();
        assert!(error.contains(ENV_FAILURE_CAPACITY));
    }

    #[test]
    fn validate_rejects_bad_values() {
        let mut config = CoreConfig::default();
        config.log_level = "chatty".to_string();
        assert!(config.validate().is_err());

        let config = CoreConfig::default().with_log_dir("relative/logs");
        assert!(config.validate().unwrap_err().contains("absolute"));

        let mut config = CoreConfig::default();
        config.failure_channel_capacity = 0;
        assert!(config.validate().is_err());
    }
}
