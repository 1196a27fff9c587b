//! Store configuration.
//!
//! # Responsibility
//! - Describe where the database lives and how connections/logging behave.
//! - Load settings from JSON documents or `ENTITYKIT_*` environment variables.
//!
//! # Invariants
//! - Missing settings fall back to defaults; unknown JSON keys are rejected.
//! - `database_url` is never empty after loading.

use crate::logging::default_log_level;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const DEFAULT_BUSY_TIMEOUT_MS: u64 = 5_000;
pub const MEMORY_DATABASE_URL: &str = ":memory:";

const ENV_DATABASE_URL: &str = "ENTITYKIT_DATABASE_URL";
const ENV_BUSY_TIMEOUT_MS: &str = "ENTITYKIT_BUSY_TIMEOUT_MS";
const ENV_LOG_LEVEL: &str = "ENTITYKIT_LOG_LEVEL";
const ENV_LOG_DIR: &str = "ENTITYKIT_LOG_DIR";

/// Configuration loading failure.
#[derive(Debug)]
pub enum ConfigError {
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    Json(serde_json::Error),
    InvalidValue {
        key: &'static str,
        value: String,
    },
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io { path, source } => {
                write!(f, "failed to read config `{}`: {source}", path.display())
            }
            Self::Json(err) => write!(f, "invalid config document: {err}"),
            Self::InvalidValue { key, value } => {
                write!(f, "invalid value `{value}` for `{key}`")
            }
        }
    }
}

impl Error for ConfigError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Io { source, .. } => Some(source),
            Self::Json(err) => Some(err),
            Self::InvalidValue { .. } => None,
        }
    }
}

impl From<serde_json::Error> for ConfigError {
    fn from(value: serde_json::Error) -> Self {
        Self::Json(value)
    }
}

/// Physical location of the database.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DatabaseLocation {
    Memory,
    File(PathBuf),
}

impl DatabaseLocation {
    /// Short label used in log events.
    pub fn mode(&self) -> &'static str {
        match self {
            Self::Memory => "memory",
            Self::File(_) => "file",
        }
    }
}

/// Settings for opening the store and initializing logging.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct StoreConfig {
    /// `:memory:`, a file path, or a `sqlite://`-prefixed file path.
    pub database_url: String,
    pub busy_timeout_ms: u64,
    pub log_level: String,
    /// Rolling log file directory; logs go to stderr when unset.
    pub log_dir: Option<PathBuf>,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            database_url: MEMORY_DATABASE_URL.to_string(),
            busy_timeout_ms: DEFAULT_BUSY_TIMEOUT_MS,
            log_level: default_log_level().to_string(),
            log_dir: None,
        }
    }
}

impl StoreConfig {
    /// Parses a JSON config document.
    pub fn from_json_str(document: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(document)?;
        config.validate()?;
        Ok(config)
    }

    /// Reads and parses a JSON config file.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let document = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&document)
    }

    /// Loads settings from `ENTITYKIT_*` environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Loads settings through an arbitrary key lookup, using defaults for
    /// absent keys.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(url) = lookup(ENV_DATABASE_URL) {
            config.database_url = url;
        }
        if let Some(raw) = lookup(ENV_BUSY_TIMEOUT_MS) {
            config.busy_timeout_ms =
                raw.trim()
                    .parse()
                    .map_err(|_| ConfigError::InvalidValue {
                        key: ENV_BUSY_TIMEOUT_MS,
                        value: raw.clone(),
                    })?;
        }
        if let Some(level) = lookup(ENV_LOG_LEVEL) {
            config.log_level = level;
        }
        if let Some(dir) = lookup(ENV_LOG_DIR).filter(|dir| !dir.trim().is_empty()) {
            config.log_dir = Some(PathBuf::from(dir));
        }

        config.validate()?;
        Ok(config)
    }

    /// Resolves `database_url` into a location.
    pub fn database_location(&self) -> DatabaseLocation {
        let url = self.database_url.trim();
        let url = url.strip_prefix("sqlite://").unwrap_or(url);
        match url {
            MEMORY_DATABASE_URL | "memory" => DatabaseLocation::Memory,
            path => DatabaseLocation::File(PathBuf::from(path)),
        }
    }

    pub fn busy_timeout(&self) -> Duration {
        Duration::from_millis(self.busy_timeout_ms)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        let url = self.database_url.trim();
        if url.is_empty() || url == "sqlite://" {
            return Err(ConfigError::InvalidValue {
                key: "database_url",
                value: self.database_url.clone(),
            });
        }
        Ok(())
    }
}
