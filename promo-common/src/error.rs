//! Common error types for the promo tools

use thiserror::Error;

/// Common result type for promo operations
pub type Result<T> = std::result::Result<T, Error>;

/// Common error types across the promo crates
#[derive(Error, Debug)]
pub enum Error {
    /// Database operation error (wraps sqlx::Error)
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// I/O operation error (wraps std::io::Error)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration loading or validation error. Fatal for a run.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Requested resource not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Invalid user input or request parameter
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Source spreadsheet could not be opened, or broke the sheet/header contract
    #[error("Spreadsheet error: {0}")]
    Spreadsheet(String),

    /// Secret hashing or validation failure
    #[error("Credential error: {0}")]
    Credential(String),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// True when the store rejected a write on a UNIQUE constraint
    pub fn is_unique_violation(&self) -> bool {
        match self {
            Error::Database(sqlx::Error::Database(db)) => db.is_unique_violation(),
            _ => false,
        }
    }
}
