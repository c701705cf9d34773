use std::io;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Core(#[from] bazaar_core::Error),
    #[error(transparent)]
    Bookmark(#[from] bazaar_core::BookmarkError),
    #[error(transparent)]
    Remote(#[from] bazaar_core::remote::RemoteError),
    #[error(transparent)]
    Io(#[from] io::Error),
    #[error(transparent)]
    Serialization(#[from] serde_json::Error),
    #[error("Listing ID cannot be empty")]
    EmptyListingId,
    #[error("Invalid listing ID: {0}")]
    InvalidListingId(String),
    #[error("Bookmark not found for id/prefix: {0}")]
    BookmarkNotFound(String),
    #[error("{0}")]
    AmbiguousListingId(String),
    #[error("Bookmark {0} was not removed: {1}")]
    RemovalNotConfirmed(String, String),
    #[error("Bookmark {0} is already being removed")]
    RemovalInFlight(String),
    #[error("Configuration error: {0}")]
    Config(String),
    #[error(
        "Remote bookmarks are not available. Run `bazaar config init --remote-url <URL>` and set BAZAAR_REMOTE_TOKEN."
    )]
    RemoteNotConfigured,
}
