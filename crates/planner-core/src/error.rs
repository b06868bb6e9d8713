//! Core error types for planner-core.
//!
//! One top-level [`CoreError`] with `#[from]` conversions from the narrower
//! enums below. Cache misses are not errors: lookups return `Option`.

use std::path::PathBuf;
use thiserror::Error;

use crate::jobs::JobKind;

/// Core error type for planner-core.
#[derive(Error, Debug)]
pub enum CoreError {
    /// Malformed user input
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    /// Stale rank or wrong job kind
    #[error("Job error: {0}")]
    Job(#[from] JobError),

    /// Cache document errors
    #[error("Cache error: {0}")]
    Cache(#[from] CacheError),

    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// A timer process started without a queued hand-off record.
    #[error("No timer hand-off record at {}: nothing to run", path.display())]
    HandoffMissing { path: PathBuf },

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Validation errors for drafts, settings and config values.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// One or more draft fields are not integers.
    #[error("Invalid draft fields: {}", fields.join(", "))]
    InvalidFields { fields: Vec<&'static str> },

    #[error("Job name must not be empty")]
    EmptyName,

    /// The name collides with a reserved document key.
    #[error("Job name '{name}' is reserved")]
    ReservedName { name: String },

    /// Invalid value
    #[error("Invalid value for '{field}': {message}")]
    InvalidValue { field: String, message: String },
}

/// Errors raised by job collections.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum JobError {
    /// Out of bounds
    #[error("Index {index} out of bounds for {collection} (length: {len})")]
    OutOfBounds {
        collection: &'static str,
        index: usize,
        len: usize,
    },

    /// The job at the given rank is not of the kind the operation needs.
    #[error("Expected a {expected} but found a {found}")]
    KindMismatch {
        expected: &'static str,
        found: JobKind,
    },
}

/// Cache document errors.
#[derive(Error, Debug)]
pub enum CacheError {
    #[error("Cache IO failed at {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Malformed cache document at {}: {source}", path.display())]
    Malformed {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Configuration-specific errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Failed to load configuration
    #[error("Failed to load configuration from {}: {message}", path.display())]
    LoadFailed { path: PathBuf, message: String },

    /// Failed to save configuration
    #[error("Failed to save configuration to {}: {message}", path.display())]
    SaveFailed { path: PathBuf, message: String },

    /// Invalid configuration value
    #[error("Invalid configuration value for '{key}': {message}")]
    InvalidValue { key: String, message: String },

    /// Failed to parse configuration
    #[error("Failed to parse configuration: {0}")]
    ParseFailed(String),
}

impl JobError {
    pub(crate) fn out_of_bounds(collection: &'static str, index: usize, len: usize) -> Self {
        JobError::OutOfBounds {
            collection,
            index,
            len,
        }
    }
}

/// Result type alias for CoreError
pub type Result<T, E = CoreError> = std::result::Result<T, E>;
