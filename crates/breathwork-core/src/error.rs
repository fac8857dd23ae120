//! Core error types for breathwork-core.
//!
//! This module defines the error hierarchy using thiserror. Only session
//! construction can fail on user input; storage and notification errors are
//! collaborator failures that callers absorb at the boundary.

use std::path::PathBuf;
use thiserror::Error;

use crate::pattern::Phase;

/// Core error type for breathwork-core.
#[derive(Error, Debug)]
pub enum CoreError {
    /// Pattern validation errors
    #[error("Invalid pattern: {0}")]
    Pattern(#[from] PatternError),

    /// Saved pattern management errors
    #[error("Pattern library error: {0}")]
    Library(#[from] LibraryError),

    /// Session construction errors
    #[error("Session error: {0}")]
    Session(#[from] SessionError),

    /// Saved snapshot could not be used
    #[error("Snapshot error: {0}")]
    Snapshot(#[from] SnapshotError),

    /// Key-value storage errors
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Reminder delivery errors
    #[error("Notification error: {0}")]
    Notify(#[from] NotifyError),
}

/// A breath pattern that cannot drive a session.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum PatternError {
    #[error("all phase durations are zero")]
    AllZero,

    #[error("{phase} duration must not be negative (got {value})")]
    Negative { phase: Phase, value: f64 },

    #[error("{phase} duration must be a finite number")]
    NotFinite { phase: Phase },
}

/// Errors raised while managing saved patterns.
#[derive(Error, Debug)]
pub enum LibraryError {
    #[error(transparent)]
    InvalidPattern(#[from] PatternError),

    #[error("pattern name must not be empty")]
    EmptyName,

    #[error("'{0}' is a built-in pattern and cannot be replaced")]
    ReservedName(String),

    #[error("unknown pattern: {0}")]
    UnknownPattern(String),

    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Errors raised when starting a session.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SessionError {
    #[error(transparent)]
    InvalidPattern(#[from] PatternError),

    #[error("target cycle count must be at least 1")]
    ZeroTargetCycles,
}

/// A persisted snapshot that cannot be resumed.
#[derive(Error, Debug)]
pub enum SnapshotError {
    /// Not valid JSON or missing required fields
    #[error("malformed snapshot: {0}")]
    Malformed(#[from] serde_json::Error),

    /// Parsed, but the pattern is not runnable
    #[error("snapshot pattern is invalid: {0}")]
    InvalidPattern(#[from] PatternError),

    /// Parsed, but the progress does not fit the pattern
    #[error("inconsistent snapshot: {0}")]
    Inconsistent(String),
}

/// Key-value storage errors.
#[derive(Error, Debug)]
pub enum StorageError {
    #[error("database error: {0}")]
    Database(#[from] DatabaseError),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("storage unavailable: {0}")]
    Unavailable(String),
}

/// Database-specific errors.
#[derive(Error, Debug)]
pub enum DatabaseError {
    /// Failed to open database connection
    #[error("Failed to open database at {path}: {source}")]
    OpenFailed {
        path: PathBuf,
        #[source]
        source: rusqlite::Error,
    },

    /// Query execution failed
    #[error("Query failed: {0}")]
    QueryFailed(String),

    /// Database is locked
    #[error("Database is locked")]
    Locked,
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

    /// Unknown dot-path key
    #[error("unknown config key: {0}")]
    UnknownKey(String),

    /// Invalid configuration value
    #[error("Invalid configuration value for '{key}': {message}")]
    InvalidValue { key: String, message: String },

    /// Data directory could not be resolved or created
    #[error("Data directory unavailable: {0}")]
    DataDir(String),
}

/// Reminder delivery errors.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum NotifyError {
    #[error("notification permission denied")]
    PermissionDenied,

    #[error("notification delivery failed: {0}")]
    DeliveryFailed(String),
}

impl From<rusqlite::Error> for DatabaseError {
    fn from(err: rusqlite::Error) -> Self {
        match &err {
            rusqlite::Error::SqliteFailure(e, _msg) => {
                if e.code == rusqlite::ErrorCode::DatabaseLocked
                    || e.code == rusqlite::ErrorCode::DatabaseBusy
                {
                    DatabaseError::Locked
                } else {
                    DatabaseError::QueryFailed(err.to_string())
                }
            }
            _ => DatabaseError::QueryFailed(err.to_string()),
        }
    }
}

impl From<rusqlite::Error> for StorageError {
    fn from(err: rusqlite::Error) -> Self {
        StorageError::Database(err.into())
    }
}

/// Result type alias for CoreError
pub type Result<T, E = CoreError> = std::result::Result<T, E>;
