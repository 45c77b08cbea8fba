use std::time::Duration;

use thiserror::Error;

/// Application-wide error types for Quarry.
#[derive(Error, Debug)]
pub enum AppError {
    /// HTTP request failed (fetching a job board).
    #[error("HTTP error: {0}")]
    HttpError(String),

    /// Board response could not be understood by the adapter.
    #[error("Parse error: {0}")]
    ParseError(String),

    /// JSON serialization/deserialization failed.
    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    /// Request timed out.
    #[error("Request timed out after {0:?}")]
    Timeout(Duration),

    /// Network/connection error.
    #[error("Network error: {0}")]
    NetworkError(String),

    /// The ATS family of a source could not be determined.
    #[error("Unknown ATS type for {0}")]
    UnknownSourceType(String),

    /// A raw posting lacks a mandatory field.
    #[error("Posting is missing mandatory field '{field}'")]
    MissingField { field: &'static str },

    /// Database operation failed.
    #[error("Database error: {0}")]
    DatabaseError(String),

    /// A uniqueness constraint rejected the write (duplicate source name or URL).
    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Not found: {0}")]
    NotFound(String),

    /// Configuration is missing or invalid.
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// Generic error.
    #[error("{0}")]
    Generic(String),
}

impl AppError {
    /// Returns true if this error came out of fetching or parsing a job board.
    ///
    /// These are contained to the source that raised them.
    pub fn is_scrape_failure(&self) -> bool {
        matches!(
            self,
            AppError::HttpError(_)
                | AppError::ParseError(_)
                | AppError::SerializationError(_)
                | AppError::Timeout(_)
                | AppError::NetworkError(_)
        )
    }

    /// Returns true if the store is unavailable. Such errors abort a run.
    pub fn is_store_failure(&self) -> bool {
        matches!(self, AppError::DatabaseError(_))
    }
}
