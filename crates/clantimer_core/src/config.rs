//! Host configuration.
//!
//! Loaded from an optional JSON file; every field has a default so an empty
//! object (or no file at all) is a valid configuration.

use crate::logging::{default_log_level, normalize_level};
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const DEFAULT_ACCOUNT_REFRESH_SECS: u64 = 60;
pub const DEFAULT_TIMER_REFRESH_SECS: u64 = 5;
const DEFAULT_DATA_FILE: &str = "clantimer.sqlite3";

#[derive(Debug)]
pub enum ConfigError {
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    Parse(serde_json::Error),
    Invalid(String),
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Read { path, source } => {
                write!(f, "cannot read config `{}`: {source}", path.display())
            }
            Self::Parse(err) => write!(f, "invalid config json: {err}"),
            Self::Invalid(message) => write!(f, "invalid config: {message}"),
        }
    }
}

impl Error for ConfigError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Read { source, .. } => Some(source),
            Self::Parse(err) => Some(err),
            Self::Invalid(_) => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AppConfig {
    /// SQLite file holding the snapshot.
    pub data_path: PathBuf,
    pub log_level: String,
    /// Directory for rolling log files; logging stays off when unset.
    pub log_dir: Option<PathBuf>,
    /// Reconciliation interval while showing the account list.
    pub account_refresh_secs: u64,
    /// Reconciliation interval while showing one account's timers.
    pub timer_refresh_secs: u64,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            data_path: PathBuf::from(DEFAULT_DATA_FILE),
            log_level: default_log_level().to_string(),
            log_dir: None,
            account_refresh_secs: DEFAULT_ACCOUNT_REFRESH_SECS,
            timer_refresh_secs: DEFAULT_TIMER_REFRESH_SECS,
        }
    }
}

impl AppConfig {
    /// Reads and validates a JSON config file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&text)
    }

    pub fn from_json_str(text: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(text).map_err(ConfigError::Parse)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        normalize_level(&self.log_level).map_err(|err| ConfigError::Invalid(err.to_string()))?;
        if self.account_refresh_secs == 0 {
            return Err(ConfigError::Invalid(
                "account_refresh_secs must be greater than 0".to_string(),
            ));
        }
        if self.timer_refresh_secs == 0 {
            return Err(ConfigError::Invalid(
                "timer_refresh_secs must be greater than 0".to_string(),
            ));
        }
        if self.data_path.as_os_str().is_empty() {
            return Err(ConfigError::Invalid("data_path must not be empty".to_string()));
        }
        Ok(())
    }

    pub fn account_refresh_interval(&self) -> Duration {
        Duration::from_secs(self.account_refresh_secs)
    }

    pub fn timer_refresh_interval(&self) -> Duration {
        Duration::from_secs(self.timer_refresh_secs)
    }
}
