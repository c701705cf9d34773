//! Error types for bazaar-core

use thiserror::Error;

use crate::bookmarks::BookmarkError;
use crate::remote::RemoteError;

/// Result type alias using bazaar-core's Error
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in bazaar-core operations
#[derive(Error, Debug)]
pub enum Error {
    /// Database error
    #[error("Database error: {0}")]
    Database(String),

    /// SQLite error
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Invalid input
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Remote record store error
    #[error("Remote store error: {0}")]
    Remote(#[from] RemoteError),

    /// Bookmark operation error
    #[error(transparent)]
    Bookmark(#[from] BookmarkError),
}
