use bazaar_core::{BookmarkStore, Listing, ListingId, ToggleOutcome};

use crate::commands::common::{format_price, parse_listing_id, short_id};
use crate::error::CliError;

pub struct NewBookmark {
    pub id: Option<String>,
    pub title: String,
    pub description: String,
    pub price: f64,
    pub owner: String,
}

impl NewBookmark {
    pub fn into_listing(self) -> Result<Listing, CliError> {
        let id = match self.id.as_deref() {
            Some(raw) => parse_listing_id(raw)?,
            None => ListingId::new(),
        };
        Ok(Listing::new(
            id,
            self.title.trim(),
            self.description.trim(),
            self.price,
            self.owner.trim(),
        )?)
    }
}

/// Bookmark a listing, leaving it untouched when it is already bookmarked
pub async fn run_bookmark(store: &BookmarkStore, new: NewBookmark) -> Result<Listing, CliError> {
    let listing = new.into_listing()?;
    if store.is_bookmarked(&listing) {
        println!("Already bookmarked {}", short_id(listing.id));
        return Ok(listing);
    }

    match store.toggle_bookmark(&listing).await {
        ToggleOutcome::Added => {
            println!(
                "Bookmarked {} {} ({})",
                short_id(listing.id),
                listing.title,
                format_price(listing.price)
            );
            Ok(listing)
        }
        ToggleOutcome::InFlight => Err(CliError::RemovalInFlight(listing.id.to_string())),
        ToggleOutcome::Removed | ToggleOutcome::Kept(_) => {
            tracing::warn!("Listing {} was bookmarked concurrently", listing.id);
            Ok(listing)
        }
    }
}
