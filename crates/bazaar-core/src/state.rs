//! Shared cross-module state types.

use crate::remote::UserId;

/// What the bookmark store currently knows about the remote side.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RemoteAvailability {
    /// Account probe has not completed, or could not reach the service
    Unknown,
    /// No usable remote account; bookmarks live on this device only
    LocalOnly,
    /// Signed in as the given remote user
    Available(UserId),
}

impl RemoteAvailability {
    pub const fn user_id(&self) -> Option<&UserId> {
        match self {
            Self::Available(user_id) => Some(user_id),
            Self::Unknown | Self::LocalOnly => None,
        }
    }

    pub const fn label(&self) -> &'static str {
        match self {
            Self::Unknown => "unknown",
            Self::LocalOnly => "local-only",
            Self::Available(_) => "available",
        }
    }
}
