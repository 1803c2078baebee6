//! Error types for careerscope-core

use thiserror::Error;

/// Main error type for the careerscope-core library
#[derive(Error, Debug)]
pub enum Error {
    /// Local store error
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON parsing error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Configuration error
    #[error("configuration error: {0}")]
    Config(String),

    /// Row store request failed
    #[error("store error: {0}")]
    Store(String),

    /// Query could not be built for the backend
    #[error("invalid query: {0}")]
    Query(String),

    /// Row not found
    #[error("{table} row not found")]
    NotFound { table: &'static str },

    /// Auth provider error
    #[error("auth error: {0}")]
    Auth(String),

    /// Insight generation error
    #[error("insight error: {0}")]
    Insight(String),
}

/// Result type alias for careerscope-core
pub type Result<T> = std::result::Result<T, Error>;
