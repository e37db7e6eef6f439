//! Core error types for coherence-core.
//!
//! This module defines the error hierarchy using thiserror. Statistics never
//! fail; the fallible operations are validation of configuration and
//! incoming records, starting a live session, and the persistence
//! collaborator.

use std::path::PathBuf;
use thiserror::Error;

/// Core error type for coherence-core.
#[derive(Error, Debug)]
pub enum CoreError {
    /// Configuration or precondition errors, rejected before any state changes
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    /// The store could not be opened or read
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    /// The in-memory log was updated but could not be saved.
    #[error("Persistence unavailable: {source}")]
    PersistenceUnavailable {
        #[source]
        source: StoreError,
    },

    /// Configuration file errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// A live session was requested on a controller that is already running
    #[error("Breathing cycle already running")]
    AlreadyRunning,
}

/// Persistence collaborator errors.
#[derive(Error, Debug)]
pub enum StoreError {
    /// Failed to open the backing database
    #[error("Failed to open store at {path}: {source}")]
    OpenFailed {
        path: PathBuf,
        #[source]
        source: rusqlite::Error,
    },

    /// Query execution failed
    #[error("Query failed: {0}")]
    QueryFailed(String),

    /// Database is locked
    #[error("Store is locked")]
    Locked,

    /// A stored row could not be turned back into a record
    #[error("Corrupt record '{id}': {message}")]
    Corrupt { id: String, message: String },

    /// Store refused the write (used by non-SQL backends)
    #[error("Store unavailable: {0}")]
    Unavailable(String),
}

/// Configuration-specific errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Failed to load configuration
    #[error("Failed to load configuration from {path}: {message}")]
    LoadFailed { path: PathBuf, message: String },

    /// Failed to save configuration
    #[error("Failed to save configuration to {path}: {message}")]
    SaveFailed { path: PathBuf, message: String },

    /// Key does not exist in the configuration
    #[error("Unknown configuration key: {0}")]
    UnknownKey(String),

    /// Invalid configuration value
    #[error("Invalid configuration value for '{key}': {message}")]
    InvalidValue { key: String, message: String },
}

/// Validation errors.
#[derive(Error, Debug, PartialEq)]
pub enum ValidationError {
    /// A duration that must be strictly positive was zero
    #[error("'{field}' must be greater than zero")]
    ZeroDuration { field: &'static str },

    /// Invalid value
    #[error("Invalid value for '{field}': {message}")]
    InvalidValue { field: String, message: String },
}

impl From<rusqlite::Error> for StoreError {
    fn from(err: rusqlite::Error) -> Self {
        match &err {
            rusqlite::Error::SqliteFailure(inner, _msg) => {
                if inner.code == rusqlite::ErrorCode::DatabaseBusy
                    || inner.code == rusqlite::ErrorCode::DatabaseLocked
                {
                    StoreError::Locked
                } else {
                    StoreError::QueryFailed(err.to_string())
                }
            }
            _ => StoreError::QueryFailed(err.to_string()),
        }
    }
}

/// Result type alias for CoreError
pub type Result<T, E = CoreError> = std::result::Result<T, E>;
