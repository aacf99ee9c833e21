//! Common error types for AQuA insights

use thiserror::Error;

/// Common result type for AQuA operations
pub type Result<T> = std::result::Result<T, Error>;

/// Common error types across the AQuA crates
///
/// `Transport`, `Persistence` and `Logic` form the core taxonomy. The rest
/// cover configuration and host-surface failures.
#[derive(Error, Debug)]
pub enum Error {
    /// Remote fetch failed and nothing cached could answer the query
    #[error("Transport error: {0}")]
    Transport(String),

    /// Cache store could not be read or written
    #[error("Persistence error: {0}")]
    Persistence(String),

    /// Operation invoked in a state that forbids it
    #[error("Logic error: {0}")]
    Logic(String),

    /// Database operation error (wraps sqlx::Error)
    #[cfg(feature = "sqlx")]
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// I/O operation error (wraps std::io::Error)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON encode/decode error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Configuration loading or validation error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Requested resource not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Invalid user input or request parameter
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}
