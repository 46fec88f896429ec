//! Error types for lmp-ap
//!
//! Device and persistence failures are caught where they are issued and
//! logged; these variants exist so the boundaries can say what went wrong.

use thiserror::Error;

/// Main error type for the lmp-ap crate
#[derive(Error, Debug)]
pub enum Error {
    /// Configuration file loading errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Database connection or query errors
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// HTTP server errors
    #[error("HTTP server error: {0}")]
    Http(String),

    /// Output device could not load or play a resource
    #[error("Resource error: {0}")]
    Resource(String),

    /// Audio decoding errors
    #[error("Audio decode error: {0}")]
    Decode(String),

    /// Audio output device errors
    #[error("Audio output error: {0}")]
    AudioOutput(String),

    /// Queue index outside `[0, len)`
    #[error("Invalid queue index {index} for queue of length {len}")]
    InvalidIndex { index: usize, len: usize },

    /// Saved state missing, unreadable or corrupt
    #[error("Persistence error: {0}")]
    Persistence(String),

    /// Resource not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Invalid request
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// File I/O errors
    #[error("File I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Other errors
    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<lmp_common::Error> for Error {
    fn from(err: lmp_common::Error) -> Self {
        match err {
            lmp_common::Error::Database(e) => Error::Database(e),
            lmp_common::Error::Io(e) => Error::Io(e),
            lmp_common::Error::Config(msg) => Error::Config(msg),
            lmp_common::Error::InvalidInput(msg) => Error::BadRequest(msg),
        }
    }
}

/// Convenience Result type using lmp-ap Error
pub type Result<T> = std::result::Result<T, Error>;
