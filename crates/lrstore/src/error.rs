//! Error types for lrstore.
//!
//! This module defines all error types used throughout the lrstore crate.
//! The HTTP layer relies on [`Error::is_not_found_kind`] to pick between the
//! two status codes the API exposes.

use std::path::PathBuf;
use thiserror::Error;

/// The main error type for lrstore operations.
#[derive(Error, Debug)]
pub enum Error {
    // === Record Errors ===
    /// A live record already holds the requested `lrNum`.
    #[error("Already Record Exists With Same LR")]
    DuplicateRecord,

    /// No live record holds the requested `lrNum`.
    #[error("Record not found")]
    RecordNotFound,

    /// No user with the requested username exists.
    #[error("User not found")]
    UserNotFound,

    /// A user with the same username already exists.
    #[error("user '{username}' already exists")]
    DuplicateUser {
        /// The conflicting username.
        username: String,
    },

    /// A payload could not be coerced into the collection schema.
    #[error("{message}")]
    Validation {
        /// Description of the offending field.
        message: String,
    },

    // === Storage Errors ===
    /// Failed to open or create the database.
    #[error("failed to open database at {path}: {source}")]
    DatabaseOpen {
        /// Path to the database file.
        path: PathBuf,
        /// The underlying error.
        #[source]
        source: rusqlite::Error,
    },

    /// A database query failed.
    #[error("database query failed: {0}")]
    DatabaseQuery(#[from] rusqlite::Error),

    /// Failed to run database migrations.
    #[error("database migration failed: {message}")]
    DatabaseMigration {
        /// Description of what went wrong.
        message: String,
    },

    // === Configuration Errors ===
    /// Failed to load configuration.
    #[error("failed to load configuration: {0}")]
    ConfigLoad(Box<figment::Error>),

    /// Configuration validation failed.
    #[error("invalid configuration: {message}")]
    ConfigValidation {
        /// Description of the validation failure.
        message: String,
    },

    // === I/O Errors ===
    /// File system or socket operation failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Failed to create a required directory.
    #[error("failed to create directory {path}: {source}")]
    DirectoryCreate {
        /// Path that couldn't be created.
        path: PathBuf,
        /// The underlying error.
        #[source]
        source: std::io::Error,
    },

    // === Serialization Errors ===
    /// JSON serialization/deserialization failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    // === Generic Errors ===
    /// An internal error occurred (bug).
    #[error("internal error: {0}")]
    Internal(String),
}

/// A specialized Result type for lrstore operations.
pub type Result<T> = std::result::Result<T, Error>;

impl From<figment::Error> for Error {
    fn from(err: figment::Error) -> Self {
        Self::ConfigLoad(Box::new(err))
    }
}

impl Error {
    /// Create a new validation error.
    #[must_use]
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    /// Create a new internal error.
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    /// Check if this error is one of the uniqueness or existence outcomes.
    ///
    /// These are reported to HTTP clients as `404`; everything else is `400`.
    #[must_use]
    pub fn is_not_found_kind(&self) -> bool {
        matches!(
            self,
            Self::DuplicateRecord | Self::RecordNotFound | Self::UserNotFound
        )
    }

    /// Check if this error is a store-level unique constraint violation.
    #[must_use]
    pub fn is_unique_violation(&self) -> bool {
        match self {
            Self::DatabaseQuery(rusqlite::Error::SqliteFailure(err, _)) => {
                err.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE
                    || err.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_PRIMARYKEY
            }
            _ => false,
        }
    }
}
