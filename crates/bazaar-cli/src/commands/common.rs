use std::env;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use bazaar_core::config::{RemoteConfig, StoreOptions};
use bazaar_core::db::{KeyValueStore, SqliteKeyValueStore};
use bazaar_core::remote::{HttpRecordStore, OfflineRecordStore, RemoteRecordStore};
use bazaar_core::util::compact_text;
use bazaar_core::{BookmarkStore, Listing, ListingId};
use serde::Serialize;

use crate::config_profiles::CliProfilesConfig;
use crate::error::CliError;

const SHORT_ID_LEN: usize = 13;

#[derive(Debug, Serialize)]
pub struct BookmarkListItem {
    pub id: String,
    pub title: String,
    pub description: String,
    pub price: f64,
    pub owner: String,
    pub images: Vec<String>,
}

/// Global options shared by every store-backed command
#[derive(Debug, Clone, Default)]
pub struct StoreArgs {
    pub db_path: Option<PathBuf>,
    pub profile: Option<String>,
    pub local_only: bool,
}

pub fn resolve_db_path(cli_db_path: Option<PathBuf>) -> Result<PathBuf, CliError> {
    if let Some(path) = cli_db_path.or_else(|| env::var_os("BAZAAR_DB_PATH").map(PathBuf::from)) {
        return Ok(path);
    }
    default_db_path()
}

pub fn default_db_path() -> Result<PathBuf, CliError> {
    dirs::data_dir()
        .map(|dir| dir.join("bazaar").join("bazaar.db"))
        .ok_or_else(|| CliError::Config("Failed to resolve CLI data directory".to_string()))
}

/// Effective remote settings for this invocation, or `None` when local only
pub fn resolve_remote_config(args: &StoreArgs) -> Result<Option<RemoteConfig>, CliError> {
    if args.local_only {
        return Ok(None);
    }
    let config = CliProfilesConfig::load()?.remote_config(args.profile.as_deref());
    Ok(config.is_configured().then_some(config))
}

pub fn open_store(args: &StoreArgs) -> Result<BookmarkStore, CliError> {
    let db_path = resolve_db_path(args.db_path.clone())?;
    let remote_config = resolve_remote_config(args)?;
    open_store_at(&db_path, remote_config.as_ref())
}

pub fn open_store_at(
    db_path: &Path,
    remote_config: Option<&RemoteConfig>,
) -> Result<BookmarkStore, CliError> {
    let storage: Arc<dyn KeyValueStore> = Arc::new(SqliteKeyValueStore::open(db_path)?);
    let remote: Arc<dyn RemoteRecordStore> = match remote_config {
        Some(config) => {
            tracing::debug!("Using remote record store at {:?}", config.base_url);
            Arc::new(HttpRecordStore::from_config(config)?)
        }
        None => Arc::new(OfflineRecordStore),
    };
    Ok(BookmarkStore::open_shared(
        storage,
        remote,
        StoreOptions::default(),
    ))
}

pub fn normalize_listing_identifier(value: &str) -> Result<String, CliError> {
    let value = value.trim();
    if value.is_empty() {
        Err(CliError::EmptyListingId)
    } else {
        Ok(value.to_ascii_lowercase())
    }
}

pub fn parse_listing_id(value: &str) -> Result<ListingId, CliError> {
    value
        .parse::<ListingId>()
        .map_err(|_| CliError::InvalidListingId(value.trim().to_string()))
}

/// Find a bookmark by full id or unique id prefix
pub fn resolve_bookmark(query: &str, store: &BookmarkStore) -> Result<Listing, CliError> {
    let query = normalize_listing_identifier(query)?;
    if let Ok(id) = query.parse::<ListingId>() {
        if let Some(listing) = store.get(id) {
            return Ok(listing);
        }
    }

    let mut matching: Vec<Listing> = store
        .get_all_bookmarks()
        .into_iter()
        .filter(|listing| listing.id.as_str().starts_with(&query))
        .collect();

    match matching.len() {
        0 => Err(CliError::BookmarkNotFound(query)),
        1 => Ok(matching.remove(0)),
        _ => {
            let options = matching
                .iter()
                .take(3)
                .map(|listing| short_id(listing.id))
                .collect::<Vec<_>>()
                .join(", ");

            Err(CliError::AmbiguousListingId(format!(
                "ID prefix '{query}' is ambiguous; matches: {options}"
            )))
        }
    }
}

pub fn short_id(id: ListingId) -> String {
    id.as_str().chars().take(SHORT_ID_LEN).collect()
}

pub fn format_price(price: f64) -> String {
    format!("{price:.2}")
}

pub fn format_bookmark_lines(listings: &[Listing]) -> Vec<String> {
    listings
        .iter()
        .map(|listing| {
            let mut line = format!(
                "{}  {}  {}",
                short_id(listing.id),
                format_price(listing.price),
                compact_text(&listing.title)
            );
            if !listing.owner.trim().is_empty() {
                line.push_str(&format!("  ({})", listing.owner.trim()));
            }
            line
        })
        .collect()
}

pub fn bookmark_to_list_item(listing: &Listing) -> BookmarkListItem {
    BookmarkListItem {
        id: listing.id.to_string(),
        title: listing.title.clone(),
        description: listing.description.clone(),
        price: listing.price,
        owner: listing.owner.clone(),
        images: listing
            .images
            .iter()
            .map(|image| image.as_str().to_string())
            .collect(),
    }
}
