//! Catalog process configuration.
//!
//! # Responsibility
//! - Collect the database path, image root, and logging settings that are
//!   passed explicitly into store constructors.
//!
//! # Invariants
//! - No store reads configuration from globals; callers hand values in.

use crate::logging::{default_log_level, normalize_level};
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::PathBuf;

pub const ENV_DB_PATH: &str = "CATALOG_DB_PATH";
pub const ENV_IMAGE_DIR: &str = "CATALOG_IMAGE_DIR";
pub const ENV_LOG_LEVEL: &str = "CATALOG_LOG_LEVEL";
pub const ENV_LOG_DIR: &str = "CATALOG_LOG_DIR";

const DEFAULT_DB_PATH: &str = "db/catalog.sqlite3";
const DEFAULT_IMAGE_DIR: &str = "images";

/// Configuration errors reported by [`CatalogConfig::validate`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    EmptyPath(&'static str),
    UnsupportedLogLevel(String),
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyPath(field) => write!(f, "config field `{field}` must not be empty"),
            Self::UnsupportedLogLevel(level) => write!(f, "unsupported log level `{level}`"),
        }
    }
}

impl Error for ConfigError {}

/// Settings for opening the catalog stores.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CatalogConfig {
    /// SQLite database file.
    pub db_path: PathBuf,
    /// Root directory for content-addressed image files.
    pub image_dir: PathBuf,
    pub log_level: String,
    /// Absolute directory for rolling log files; `None` disables file logging.
    pub log_dir: Option<PathBuf>,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            db_path: PathBuf::from(DEFAULT_DB_PATH),
            image_dir: PathBuf::from(DEFAULT_IMAGE_DIR),
            log_level: default_log_level().to_string(),
            log_dir: None,
        }
    }
}

impl CatalogConfig {
    /// Builds configuration from `CATALOG_*` environment variables, falling
    /// back to defaults for unset or empty values.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds configuration from an arbitrary key lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let get = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());
        let defaults = Self::default();

        Self {
            db_path: get(ENV_DB_PATH).map_or(defaults.db_path, PathBuf::from),
            image_dir: get(ENV_IMAGE_DIR).map_or(defaults.image_dir, PathBuf::from),
            log_level: get(ENV_LOG_LEVEL).unwrap_or(defaults.log_level),
            log_dir: get(ENV_LOG_DIR).map(PathBuf::from),
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.db_path.as_os_str().is_empty() {
            return Err(ConfigError::EmptyPath("db_path"));
        }
        if self.image_dir.as_os_str().is_empty() {
            return Err(ConfigError::EmptyPath("image_dir"));
        }
        normalize_level(&self.log_level)
            .map_err(|_| ConfigError::UnsupportedLogLevel(self.log_level.clone()))?;
        Ok(())
    }
}
