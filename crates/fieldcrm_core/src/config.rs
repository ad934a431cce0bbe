//! TOML configuration for core callers.
//!
//! # Responsibility
//! - Load optional settings for storage, logging and scheduling defaults.
//! - Validate values once at load time.
//!
//! # Invariants
//! - A missing config file yields defaults, never an error.
//! - Every accessor returns a usable value (configured or default).

use crate::logging::default_log_level;
use crate::model::validation::ValidationError;
use crate::notify::DEFAULT_DIGEST_HOUR;
use crate::schedule::interval::{IntervalDays, ScheduleDefaults};
use crate::service::calendar_service::{normalize_window_days, DEFAULT_WINDOW_DAYS};
use directories::ProjectDirs;
use serde::Deserialize;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::{Path, PathBuf};

const CONFIG_FILE_NAME: &str = "config.toml";
const DB_FILE_NAME: &str = "fieldcrm.sqlite3";

#[derive(Debug, Deserialize, Default, Clone, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct CrmConfig {
    pub storage: Option<StorageConfig>,
    pub logging: Option<LoggingConfig>,
    pub schedule: Option<ScheduleConfig>,
    pub calendar: Option<CalendarConfig>,
}

#[derive(Debug, Deserialize, Default, Clone, PartialEq, Eq)]
pub struct StorageConfig {
    pub db_path: Option<PathBuf>,
}

#[derive(Debug, Deserialize, Default, Clone, PartialEq, Eq)]
pub struct LoggingConfig {
    pub level: Option<String>,
    pub dir: Option<PathBuf>,
}

#[derive(Debug, Deserialize, Default, Clone, PartialEq, Eq)]
pub struct ScheduleConfig {
    pub default_call_interval_days: Option<i64>,
    pub default_visit_interval_days: Option<i64>,
    pub digest_hour: Option<u32>,
}

#[derive(Debug, Deserialize, Default, Clone, PartialEq, Eq)]
pub struct CalendarConfig {
    pub window_days: Option<u32>,
}

/// Configuration load failure.
#[derive(Debug)]
pub enum ConfigError {
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    Parse(toml::de::Error),
    Invalid(ValidationError),
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Read { path, source } => {
                write!(f, "failed to read config file `{}`: {source}", path.display())
            }
            Self::Parse(err) => write!(f, "failed to parse config file as TOML: {err}"),
            Self::Invalid(err) => write!(f, "invalid config value: {err}"),
        }
    }
}

impl Error for ConfigError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Read { source, .. } => Some(source),
            Self::Parse(err) => Some(err),
            Self::Invalid(err) => Some(err),
        }
    }
}

impl From<ValidationError> for ConfigError {
    fn from(value: ValidationError) -> Self {
        Self::Invalid(value)
    }
}

impl CrmConfig {
    /// Parses and validates TOML text.
    pub fn from_toml_str(contents: &str) -> Result<Self, ConfigError> {
        let config: CrmConfig = toml::from_str(contents).map_err(ConfigError::Parse)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        self.schedule_defaults()?;
        let hour = self.digest_hour();
        if hour > 23 {
            return Err(ValidationError::InvalidHour(hour));
        }
        Ok(())
    }

    pub fn db_path(&self) -> Option<PathBuf> {
        self.storage
            .as_ref()
            .and_then(|storage| storage.db_path.clone())
    }

    /// Configured database path, or `fieldcrm.sqlite3` in the data directory.
    pub fn db_path_or_default(&self) -> PathBuf {
        self.db_path().unwrap_or_else(default_db_path)
    }

    pub fn log_level(&self) -> &str {
        self.logging
            .as_ref()
            .and_then(|logging| logging.level.as_deref())
            .unwrap_or(default_log_level())
    }

    pub fn log_dir(&self) -> Option<PathBuf> {
        self.logging.as_ref().and_then(|logging| logging.dir.clone())
    }

    /// Interval defaults for new customers (7/30 days unless configured).
    pub fn schedule_defaults(&self) -> Result<ScheduleDefaults, ValidationError> {
        let builtin = ScheduleDefaults::default();
        let schedule = self.schedule.as_ref();
        let call = match schedule.and_then(|s| s.default_call_interval_days) {
            Some(days) => IntervalDays::new(days)?,
            None => builtin.call,
        };
        let visit = match schedule.and_then(|s| s.default_visit_interval_days) {
            Some(days) => IntervalDays::new(days)?,
            None => builtin.visit,
        };
        Ok(ScheduleDefaults { call, visit })
    }

    pub fn digest_hour(&self) -> u32 {
        self.schedule
            .as_ref()
            .and_then(|schedule| schedule.digest_hour)
            .unwrap_or(DEFAULT_DIGEST_HOUR)
    }

    pub fn calendar_window_days(&self) -> u32 {
        self.calendar
            .as_ref()
            .and_then(|calendar| calendar.window_days)
            .map_or(DEFAULT_WINDOW_DAYS, |days| normalize_window_days(Some(days)))
    }
}

fn project_dirs() -> Option<ProjectDirs> {
    ProjectDirs::from("", "", "fieldcrm")
}

/// Platform config path (`<config dir>/fieldcrm/config.toml`).
pub fn default_config_path() -> Option<PathBuf> {
    project_dirs().map(|dirs| dirs.config_dir().join(CONFIG_FILE_NAME))
}

/// Platform data path for the database, falling back to the temp dir.
pub fn default_db_path() -> PathBuf {
    project_dirs()
        .map(|dirs| dirs.data_dir().join(DB_FILE_NAME))
        .unwrap_or_else(|| std::env::temp_dir().join(DB_FILE_NAME))
}

/// Loads configuration from `path`; a missing file yields defaults.
pub fn load_config(path: &Path) -> Result<CrmConfig, ConfigError> {
    if !path.exists() {
        return Ok(CrmConfig::default());
    }

    let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    CrmConfig::from_toml_str(&contents)
}
