//! Runtime configuration loaded from `LEAFTRACKER_*` environment variables.

use crate::logging::default_log_level;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::{Path, PathBuf};

pub const DATABASE_VAR: &str = "LEAFTRACKER_DATABASE";
pub const INDEX_PREFIX_VAR: &str = "LEAFTRACKER_INDEX_PREFIX";
pub const LOG_LEVEL_VAR: &str = "LEAFTRACKER_LOG_LEVEL";
pub const LOG_DIR_VAR: &str = "LEAFTRACKER_LOG_DIR";

const DEFAULT_DATABASE: &str = "leaftracker.db";

/// Invalid configuration value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// `LEAFTRACKER_LOG_DIR` must be an absolute path.
    RelativeLogDir(String),
    Empty(&'static str),
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::RelativeLogDir(path) => {
                write!(f, "{LOG_DIR_VAR} must be an absolute path, got `{path}`")
            }
            Self::Empty(var) => write!(f, "{var} is set but empty"),
        }
    }
}

impl Error for ConfigError {}

/// Where the document indexes live and how the process logs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// SQLite file backing every index.
    pub database: PathBuf,
    /// Prepended to every index name; tests use `test_`.
    pub index_prefix: String,
    pub log_level: String,
    /// File logging is enabled only when set.
    pub log_dir: Option<PathBuf>,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Builds a config from `lookup`, falling back to defaults for unset
    /// variables.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let defaults = Self::default();

        let database = match lookup(DATABASE_VAR) {
            Some(value) if value.trim().is_empty() => return Err(ConfigError::Empty(DATABASE_VAR)),
            Some(value) => PathBuf::from(value.trim()),
            None => defaults.database,
        };
        let index_prefix = lookup(INDEX_PREFIX_VAR)
            .map(|value| value.trim().to_string())
            .unwrap_or(defaults.index_prefix);
        let log_level = lookup(LOG_LEVEL_VAR)
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty())
            .unwrap_or(defaults.log_level);
        let log_dir = match lookup(LOG_DIR_VAR).map(|value| value.trim().to_string()) {
            Some(value) if value.is_empty() => None,
            Some(value) if !Path::new(&value).is_absolute() => {
                return Err(ConfigError::RelativeLogDir(value))
            }
            Some(value) => Some(PathBuf::from(value)),
            None => None,
        };

        Ok(Self {
            database,
            index_prefix,
            log_level,
            log_dir,
        })
    }

    /// Physical index name for `base`, e.g. `test_species`.
    pub fn index_name(&self, base: &str) -> String {
        format!("{}{base}", self.index_prefix)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database: PathBuf::from(DEFAULT_DATABASE),
            index_prefix: String::new(),
            log_level: default_log_level().to_string(),
            log_dir: None,
        }
    }
}
