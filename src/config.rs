//! Runtime configuration for the binaries and the workflow service.
//!
//! Values come from an optional JSON file, then environment overrides:
//! - `COMIC_WORKFLOW_HTTP_ADDR`: listen address for the HTTP API
//! - `COMIC_WORKFLOW_DB`: SQLite database path
//! - `COMIC_WORKFLOW_LOG`: tracing filter (falls back to `RUST_LOG`, then `info`)

use crate::calendar::{WorkCalendar, WorkCalendarConfig};
use crate::progress::DEFAULT_PROGRESS_TOLERANCE;
use crate::service::RetentionPolicy;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use thiserror::Error;

pub const ENV_HTTP_ADDR: &str = "COMIC_WORKFLOW_HTTP_ADDR";
pub const ENV_DATABASE: &str = "COMIC_WORKFLOW_DB";
pub const ENV_LOG_FILTER: &str = "COMIC_WORKFLOW_LOG";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("could not parse config file: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("invalid listen address '{0}'")]
    InvalidAddress(String),
    #[error("progress tolerance {0} must be between 0 and 1")]
    InvalidTolerance(f64),
    #[error("work calendar requires at least one working day")]
    NoWorkingDays,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub http_addr: String,
    pub database_path: Option<PathBuf>,
    pub log_filter: String,
    pub progress_tolerance: f64,
    pub calendar: WorkCalendarConfig,
    pub retention: RetentionPolicy,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            http_addr: "0.0.0.0:3000".to_string(),
            database_path: None,
            log_filter: "info".to_string(),
            progress_tolerance: DEFAULT_PROGRESS_TOLERANCE,
            calendar: WorkCalendarConfig::default(),
            retention: RetentionPolicy::default(),
        }
    }
}

impl AppConfig {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(serde_json::from_reader(file)?)
    }

    /// File (when given) plus process environment, validated.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        config.apply_overrides(|key| std::env::var(key).ok());
        config.validate()?;
        Ok(config)
    }

    pub fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(addr) = lookup(ENV_HTTP_ADDR) {
            self.http_addr = addr;
        }
        if let Some(db) = lookup(ENV_DATABASE) {
            self.database_path = Some(PathBuf::from(db));
        }
        if let Some(filter) = lookup(ENV_LOG_FILTER).or_else(|| lookup("RUST_LOG")) {
            self.log_filter = filter;
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.socket_addr()?;
        if !(0.0..=1.0).contains(&self.progress_tolerance) {
            return Err(ConfigError::InvalidTolerance(self.progress_tolerance));
        }
        self.work_calendar()?;
        Ok(())
    }

    pub fn socket_addr(&self) -> Result<SocketAddr, ConfigError> {
        self.http_addr
            .parse()
            .map_err(|_| ConfigError::InvalidAddress(self.http_addr.clone()))
    }

    pub fn work_calendar(&self) -> Result<WorkCalendar, ConfigError> {
        WorkCalendar::from_config(&self.calendar)
    }
}
