//! Common error types for turnsync

use thiserror::Error;

/// Common result type for turnsync operations
pub type Result<T> = std::result::Result<T, Error>;

/// Common error types across the turnsync tools.
///
/// Every variant is fatal to the current run: nothing is recovered
/// internally, the error surfaces to the invoking context and the run
/// stops at the first detected fault.
#[derive(Error, Debug)]
pub enum Error {
    /// A composite user identifier cannot be rewritten because it has no
    /// user-id portion
    #[error("Identity error: {0}")]
    Identity(String),

    /// A source record failed to parse as a well-formed turn
    #[error("Validation error: {0}")]
    Validation(String),

    /// A destination responded unexpectedly (non-empty body on a bodyless
    /// upsert/ingest endpoint). Never retried.
    #[error("Contract violation: {0}")]
    Contract(String),

    /// The network call itself failed
    #[error("Transport error: {0}")]
    Transport(String),

    /// Document store error (wraps sqlx::Error)
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// I/O operation error (wraps std::io::Error)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration loading or validation error
    #[error("Configuration error: {0}")]
    Config(String),
}
