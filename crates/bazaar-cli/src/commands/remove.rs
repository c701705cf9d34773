use bazaar_core::{BookmarkStore, ToggleOutcome};

use crate::commands::common::{resolve_bookmark, short_id};
use crate::error::CliError;

/// Remove a bookmark once the remote side confirms it
pub async fn run_remove(store: &BookmarkStore, id: &str) -> Result<(), CliError> {
    let listing = resolve_bookmark(id, store)?;

    match store.toggle_bookmark(&listing).await {
        ToggleOutcome::Removed => {
            println!("Removed bookmark {} {}", short_id(listing.id), listing.title);
            Ok(())
        }
        ToggleOutcome::Kept(error) => Err(CliError::RemovalNotConfirmed(
            short_id(listing.id),
            error.to_string(),
        )),
        ToggleOutcome::InFlight => Err(CliError::RemovalInFlight(short_id(listing.id))),
        ToggleOutcome::Added => {
            tracing::warn!("Listing {} was removed concurrently", listing.id);
            Ok(())
        }
    }
}
