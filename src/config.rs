use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs::File;
use std::io;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BusinessProfile {
    pub business_name: String,
    pub currency_symbol: String,
}

impl Default for BusinessProfile {
    fn default() -> Self {
        Self {
            business_name: "Lawncare Job Management".to_string(),
            currency_symbol: "$".to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StorageBackend {
    Json,
    Sqlite,
}

impl StorageBackend {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "json" => Some(StorageBackend::Json),
            "sqlite" => Some(StorageBackend::Sqlite),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            StorageBackend::Json => "json",
            StorageBackend::Sqlite => "sqlite",
        }
    }
}

impl fmt::Display for StorageBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StorageConfig {
    pub backend: StorageBackend,
    pub path: PathBuf,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub profile: BusinessProfile,
    /// Seed the demo clients and services into an empty ledger at startup.
    pub seed_demo_data: bool,
    pub storage: Option<StorageConfig>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            profile: BusinessProfile::default(),
            seed_demo_data: true,
            storage: None,
        }
    }
}

impl AppConfig {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|err| ConfigError::Io {
            path: path.to_path_buf(),
            source: err,
        })?;
        let config: AppConfig = serde_json::from_reader(file)?;
        log::debug!("loaded configuration from {}", path.display());
        Ok(config)
    }
}

#[derive(Debug)]
pub enum ConfigError {
    Io { path: PathBuf, source: io::Error },
    Parse(serde_json::Error),
    InvalidEnv { name: &'static str, value: String },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Io { path, source } => {
                write!(f, "failed to read config {}: {source}", path.display())
            }
            ConfigError::Parse(err) => write!(f, "invalid config: {err}"),
            ConfigError::InvalidEnv { name, value } => {
                write!(f, "`{name}` environment variable has invalid value '{value}'")
            }
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::Io { source, .. } => Some(source),
            ConfigError::Parse(err) => Some(err),
            ConfigError::InvalidEnv { .. } => None,
        }
    }
}

impl From<serde_json::Error> for ConfigError {
    fn from(value: serde_json::Error) -> Self {
        Self::Parse(value)
    }
}

pub const LOG_ENV: &str = "LAWNCARE_LOG";
pub const TODAY_ENV: &str = "LAWNCARE_TODAY";

pub fn log_level_from_env() -> Result<log::LevelFilter, ConfigError> {
    let value = std::env::var(LOG_ENV).unwrap_or_default();
    parse_log_level(&value).ok_or(ConfigError::InvalidEnv {
        name: LOG_ENV,
        value,
    })
}

pub fn parse_log_level(value: &str) -> Option<log::LevelFilter> {
    match value.trim().to_ascii_lowercase().as_str() {
        "" | "off" => Some(log::LevelFilter::Off),
        "error" => Some(log::LevelFilter::Error),
        "warn" => Some(log::LevelFilter::Warn),
        "info" => Some(log::LevelFilter::Info),
        "debug" => Some(log::LevelFilter::Debug),
        "trace" => Some(log::LevelFilter::Trace),
        _ => None,
    }
}

/// Today's date, or the `LAWNCARE_TODAY` override when set.
pub fn today() -> Result<NaiveDate, ConfigError> {
    match std::env::var(TODAY_ENV) {
        Ok(value) if !value.trim().is_empty() => {
            NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d").map_err(|_| {
                ConfigError::InvalidEnv {
                    name: TODAY_ENV,
                    value,
                }
            })
        }
        _ => Ok(chrono::Local::now().date_naive()),
    }
}
