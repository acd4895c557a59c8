//! TOML-based application configuration.
//!
//! Stored at `~/.config/hacktrack/config.toml` (platform config dir). Every
//! field is optional:
//!
//! ```toml
//! timezone = "Asia/Kolkata"
//! data_dir = "/home/me/.local/share/hacktrack"
//! ```

use std::path::{Path, PathBuf};

use jiff::tz::TimeZone;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::clock::DEFAULT_TIMEZONE;

/// Environment variable overriding the data directory
pub const DATA_DIR_ENV: &str = "HACKTRACK_DATA_DIR";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file '{path}': {source}")]
    ReadFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config file '{path}': {source}")]
    ParseFailed {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("Unknown timezone '{name}': {source}")]
    UnknownTimezone {
        name: String,
        #[source]
        source: jiff::Error,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// IANA timezone in which "today" is resolved
    #[serde(default = "default_timezone")]
    pub timezone: String,
    #[serde(default)]
    pub data_dir: Option<PathBuf>,
}

fn default_timezone() -> String {
    DEFAULT_TIMEZONE.to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            timezone: default_timezone(),
            data_dir: None,
        }
    }
}

impl Config {
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("hacktrack")
            .join("config.toml")
    }

    /// A missing file means defaults; anything else wrong with it is an error.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        match std::fs::read_to_string(path) {
            Ok(content) => toml::from_str(&content).map_err(|e| ConfigError::ParseFailed {
                path: path.to_path_buf(),
                source: e,
            }),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Config::default()),
            Err(e) => Err(ConfigError::ReadFailed {
                path: path.to_path_buf(),
                source: e,
            }),
        }
    }

    pub fn time_zone(&self) -> Result<TimeZone, ConfigError> {
        TimeZone::get(&self.timezone).map_err(|e| ConfigError::UnknownTimezone {
            name: self.timezone.clone(),
            source: e,
        })
    }

    /// Flag beats environment beats config file beats the platform default
    pub fn resolve_data_dir(&self, flag: Option<PathBuf>, env: Option<PathBuf>) -> PathBuf {
        flag.or(env)
            .or_else(|| self.data_dir.clone())
            .unwrap_or_else(|| {
                dirs::data_local_dir()
                    .unwrap_or_else(|| PathBuf::from("."))
                    .join("hacktrack")
            })
    }
}
