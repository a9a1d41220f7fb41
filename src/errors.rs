use std::result::Result as StdResult;

use expense_config::ConfigError;
use expense_core::CoreError;
use thiserror::Error;

/// Unified error type for the store, persistence, and configuration layers.
#[derive(Error, Debug)]
pub enum TrackerError {
    #[error("Persistence error: {0}")]
    Storage(String),
    #[error("Configuration error: {0}")]
    Config(String),
    #[error("Validation failed: {0}")]
    Validation(String),
    #[error("Duplicate expense id: {0}")]
    DuplicateId(String),
    #[error("Persistence writer unavailable: {0}")]
    Persistence(String),
}

pub type Result<T> = StdResult<T, TrackerError>;

impl From<std::io::Error> for TrackerError {
    fn from(err: std::io::Error) -> Self {
        TrackerError::Storage(err.to_string())
    }
}

impl From<serde_json::Error> for TrackerError {
    fn from(err: serde_json::Error) -> Self {
        TrackerError::Storage(err.to_string())
    }
}

impl From<CoreError> for TrackerError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::Io(err) => TrackerError::Storage(err.to_string()),
            CoreError::Serde(message) | CoreError::Storage(message) => {
                TrackerError::Storage(message)
            }
            CoreError::Validation(message) => TrackerError::Validation(message),
            CoreError::DuplicateId(id) => TrackerError::DuplicateId(id),
        }
    }
}

impl From<ConfigError> for TrackerError {
    fn from(err: ConfigError) -> Self {
        match err {
            ConfigError::Io(io) => TrackerError::Storage(io.to_string()),
            ConfigError::Serde(message) => TrackerError::Config(message),
            missing @ ConfigError::BackupNotFound(_) => TrackerError::Config(missing.to_string()),
        }
    }
}
