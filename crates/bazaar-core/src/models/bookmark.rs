//! Remote bookmark record model

use thiserror::Error;

use crate::models::{Listing, ListingId};
use crate::remote::{FieldValue, Record, UserId};

pub const FIELD_USER_ID: &str = "userID";
pub const FIELD_LISTING_ID: &str = "serviceID";
pub const FIELD_TITLE: &str = "title";
pub const FIELD_DESCRIPTION: &str = "description";
pub const FIELD_PRICE: &str = "price";
pub const FIELD_OWNER: &str = "user";
pub const FIELD_IMAGES: &str = "images";

/// A user's bookmark as stored remotely.
///
/// Carries a denormalized copy of the listing so the bookmarking user never
/// needs read access to the owner's record.
#[derive(Debug, Clone)]
pub struct BookmarkRecord {
    pub user_id: UserId,
    pub listing: Listing,
}

/// Why a remote record could not be read back as a bookmark
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RecordDecodeError {
    #[error("missing field `{0}`")]
    MissingField(&'static str),
    #[error("invalid listing id `{0}`")]
    InvalidListingId(String),
}

impl BookmarkRecord {
    pub const fn new(user_id: UserId, listing: Listing) -> Self {
        Self { user_id, listing }
    }

    /// Encode as a new remote record of `record_type`
    pub fn to_record(&self, record_type: &str) -> Record {
        let listing = &self.listing;
        let mut record = Record::new(record_type);
        record.set(FIELD_USER_ID, FieldValue::String(self.user_id.to_string()));
        record.set(FIELD_LISTING_ID, FieldValue::String(listing.id.to_string()));
        record.set(FIELD_TITLE, FieldValue::String(listing.title.clone()));
        record.set(
            FIELD_DESCRIPTION,
            FieldValue::String(listing.description.clone()),
        );
        record.set(FIELD_PRICE, FieldValue::Number(listing.price));
        record.set(FIELD_OWNER, FieldValue::String(listing.owner.clone()));
        if !listing.images.is_empty() {
            record.set(FIELD_IMAGES, FieldValue::Assets(listing.images.clone()));
        }
        record
    }

    /// Decode a remote record. The owner name and images are optional.
    pub fn from_record(record: &Record) -> Result<Self, RecordDecodeError> {
        let user_id = required_str(record, FIELD_USER_ID)?;
        let raw_id = required_str(record, FIELD_LISTING_ID)?;
        let id: ListingId = raw_id
            .parse()
            .map_err(|_| RecordDecodeError::InvalidListingId(raw_id.to_string()))?;
        let title = required_str(record, FIELD_TITLE)?;
        let description = required_str(record, FIELD_DESCRIPTION)?;
        let price = record
            .get_number(FIELD_PRICE)
            .ok_or(RecordDecodeError::MissingField(FIELD_PRICE))?;

        let listing = Listing {
            id,
            title: title.to_string(),
            description: description.to_string(),
            price,
            image_name: String::new(),
            owner: record.get_str(FIELD_OWNER).unwrap_or_default().to_string(),
            owner_ref: None,
            images: record
                .get(FIELD_IMAGES)
                .and_then(FieldValue::as_assets)
                .unwrap_or_default(),
        };

        Ok(Self {
            user_id: UserId::new(user_id),
            listing,
        })
    }
}

fn required_str<'a>(record: &'a Record, field: &'static str) -> Result<&'a str, RecordDecodeError> {
    record
        .get_str(field)
        .ok_or(RecordDecodeError::MissingField(field))
}
