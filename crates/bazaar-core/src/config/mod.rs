//! Runtime configuration for the bookmark store and its remote backend.

use std::time::Duration;

use serde::{Deserialize, Serialize};

pub use crate::util::normalize_text_option;
use crate::util::is_http_url;

/// Remote record type used for bookmark records
pub const DEFAULT_RECORD_TYPE: &str = "Bookmark";
/// Local storage key holding the serialized bookmark set
pub const DEFAULT_STORAGE_KEY: &str = "bookmarkedServices";

const DEFAULT_EVENT_CAPACITY: usize = 64;
const DEFAULT_SHUTDOWN_GRACE_SECS: u64 = 5;

/// Tunables for a [`crate::bookmarks::BookmarkStore`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreOptions {
    pub record_type: String,
    pub storage_key: String,
    /// Buffered change events per subscriber before lagging
    pub event_capacity: usize,
    /// How long `shutdown` waits for in-flight remote tasks
    pub shutdown_grace: Duration,
}

impl Default for StoreOptions {
    fn default() -> Self {
        Self {
            record_type: DEFAULT_RECORD_TYPE.to_string(),
            storage_key: DEFAULT_STORAGE_KEY.to_string(),
            event_capacity: DEFAULT_EVENT_CAPACITY,
            shutdown_grace: Duration::from_secs(DEFAULT_SHUTDOWN_GRACE_SECS),
        }
    }
}

impl StoreOptions {
    #[must_use]
    pub fn with_record_type(mut self, record_type: impl Into<String>) -> Self {
        self.record_type = record_type.into();
        self
    }

    #[must_use]
    pub fn with_storage_key(mut self, storage_key: impl Into<String>) -> Self {
        self.storage_key = storage_key.into();
        self
    }

    #[must_use]
    pub const fn with_shutdown_grace(mut self, grace: Duration) -> Self {
        self.shutdown_grace = grace;
        self
    }
}

/// Connection settings for the hosted record service.
///
/// The token is a user credential and is never written to disk by this crate.
#[derive(Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct RemoteConfig {
    #[serde(default)]
    pub base_url: Option<String>,
    #[serde(default, skip_serializing)]
    pub auth_token: Option<String>,
}

impl std::fmt::Debug for RemoteConfig {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        formatter
            .debug_struct("RemoteConfig")
            .field("base_url", &self.base_url)
            .field("auth_token", &self.auth_token.as_ref().map(|_| "[REDACTED]"))
            .finish()
    }
}

impl RemoteConfig {
    pub fn new(base_url: Option<String>, auth_token: Option<String>) -> Self {
        Self {
            base_url: normalize_text_option(base_url),
            auth_token: normalize_text_option(auth_token),
        }
    }

    /// Overlay values from another source; `other` wins when set
    #[must_use]
    pub fn merged_with(self, other: Self) -> Self {
        Self {
            base_url: normalize_text_option(other.base_url).or(self.base_url),
            auth_token: normalize_text_option(other.auth_token).or(self.auth_token),
        }
    }

    /// A usable remote needs an http(s) base URL
    pub fn is_configured(&self) -> bool {
        self.base_url.as_deref().is_some_and(is_http_url)
    }
}
