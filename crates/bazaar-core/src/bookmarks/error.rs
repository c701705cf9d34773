use thiserror::Error;

use crate::remote::RemoteError;

/// Failures of bookmark operations. None of them is fatal; the store logs
/// them and keeps running.
#[derive(Debug, Error)]
pub enum BookmarkError {
    #[error("Remote bookmark store is not available")]
    StoreUnavailable,
    #[error("Bookmark record not found")]
    RecordNotFound,
    #[error("Failed to delete bookmark: {0}")]
    DeletionFailed(#[source] RemoteError),
    #[error("Remote bookmark operation failed: {0}")]
    Remote(#[source] RemoteError),
    #[error("Failed to serialize bookmarks: {0}")]
    SerializationFailed(#[from] serde_json::Error),
    #[error("Local bookmark storage error: {0}")]
    Storage(String),
}

impl BookmarkError {
    /// Classify a remote failure outside of deletion
    pub fn from_remote(error: RemoteError) -> Self {
        match error {
            RemoteError::Unavailable => Self::StoreUnavailable,
            RemoteError::NotFound(_) => Self::RecordNotFound,
            other => Self::Remote(other),
        }
    }
}
