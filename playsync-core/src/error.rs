//! Error types for playsync-core

use thiserror::Error;

/// Main error type for the playsync-core library
#[derive(Error, Debug)]
pub enum Error {
    /// Database error
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON encoding/decoding error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Configuration error
    #[error("configuration error: {0}")]
    Config(String),

    /// The activity store has not been loaded (or migrated) yet
    #[error("activity store is not loaded")]
    StoreUnavailable,

    /// Game not found in the host catalog
    #[error("game not found: {0}")]
    GameNotFound(String),

    /// A record carried a value the store cannot represent
    #[error("invalid record: {0}")]
    InvalidRecord(String),
}

/// Result type alias for playsync-core
pub type Result<T> = std::result::Result<T, Error>;
