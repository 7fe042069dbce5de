//! Error types for sqlite3-pcre2.
//!
//! Discovery and the connection hook only ever surface
//! [`Pcre2Error::LibraryNotFound`]. Everything else comes from driver
//! registration, opening the SQLite connection, or loading configuration.

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for sqlite3-pcre2.
#[derive(Debug, Error)]
pub enum Pcre2Error {
    /// No shared library was found, or every candidate failed to load.
    #[error("pcre2: could not find sqlite3_pcre2 shared library")]
    LibraryNotFound,

    // Driver registry errors
    #[error("Driver already registered: {name}")]
    DuplicateDriver { name: String },

    #[error("Driver not registered: {name}")]
    UnknownDriver { name: String },

    // Database errors
    #[error("Database error: {message}")]
    Database {
        message: String,
        #[source]
        source: Option<rusqlite::Error>,
    },

    // File system errors
    #[error("IO error at {path:?}: {message}")]
    Io {
        message: String,
        path: Option<PathBuf>,
        #[source]
        source: Option<std::io::Error>,
    },

    // Serialization errors
    #[error("JSON error: {message}")]
    Json {
        message: String,
        #[source]
        source: Option<serde_json::Error>,
    },

    // Configuration errors
    #[error("Configuration error: {message}")]
    Config { message: String },
}

/// Result type alias for sqlite3-pcre2 operations.
pub type Result<T> = std::result::Result<T, Pcre2Error>;

impl From<rusqlite::Error> for Pcre2Error {
    fn from(err: rusqlite::Error) -> Self {
        Pcre2Error::Database {
            message: err.to_string(),
            source: Some(err),
        }
    }
}

impl Pcre2Error {
    /// Create an IO error with path context.
    pub fn io_with_path(err: std::io::Error, path: impl Into<PathBuf>) -> Self {
        Pcre2Error::Io {
            message: err.to_string(),
            path: Some(path.into()),
            source: Some(err),
        }
    }

    /// True if this is the "library not found" condition.
    pub fn is_library_not_found(&self) -> bool {
        matches!(self, Pcre2Error::LibraryNotFound)
    }
}
