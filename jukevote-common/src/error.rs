//! Common error types for Jukevote

use thiserror::Error;

/// Common result type for Jukevote operations
pub type Result<T> = std::result::Result<T, Error>;

/// Common error types across the Jukevote crates
#[derive(Error, Debug)]
pub enum Error {
    /// A required song field was missing or blank
    #[error("{0}")]
    ValidationFailed(String),

    /// No song with the given id exists
    #[error("Song not found: {0}")]
    NotFound(i64),

    /// Edit request carried none of the editable fields
    #[error("No fields provided to update")]
    NoFieldsProvided,

    /// Backing storage could not be opened or initialized
    #[error("Storage unavailable: {0}")]
    StorageUnavailable(String),

    /// Database operation error (wraps sqlx::Error)
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// I/O operation error (wraps std::io::Error)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration loading or validation error
    #[error("Configuration error: {0}")]
    Config(String),
}
