//! Data models for Bazaar

mod bookmark;
mod listing;

pub use bookmark::{
    BookmarkRecord, RecordDecodeError, FIELD_DESCRIPTION, FIELD_IMAGES, FIELD_LISTING_ID,
    FIELD_OWNER, FIELD_PRICE, FIELD_TITLE, FIELD_USER_ID,
};
pub use listing::{validate_price, Listing, ListingId};
