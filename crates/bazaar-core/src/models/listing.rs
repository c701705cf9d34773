//! Listing model

use serde::{Deserialize, Serialize};
use std::fmt;
use std::hash::{Hash, Hasher};
use std::str::FromStr;
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::remote::{AssetRef, RecordId};

/// A unique identifier for a listing, using UUID v7 for new listings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ListingId(Uuid);

impl ListingId {
    /// Create a new unique listing ID using UUID v7
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }

    /// Wrap an existing UUID
    #[must_use]
    pub const fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Get the string representation of this ID
    #[must_use]
    pub fn as_str(&self) -> String {
        self.0.to_string()
    }
}

impl Default for ListingId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ListingId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for ListingId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Ok(Self(Uuid::parse_str(s.trim())?))
    }
}

/// A tutoring or service listing a user can browse and bookmark.
///
/// Equality and hashing look at `id` only, so a re-fetched snapshot with
/// updated fields is still the same set member.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Listing {
    pub id: ListingId,
    pub title: String,
    pub description: String,
    pub price: f64,
    /// Legacy bundled image name
    #[serde(default, rename = "imageName")]
    pub image_name: String,
    /// Owner display name
    #[serde(default, rename = "user")]
    pub owner: String,
    /// Opaque reference to the owner's record (remote only)
    #[serde(skip)]
    pub owner_ref: Option<RecordId>,
    /// Image handles (remote only)
    #[serde(skip)]
    pub images: Vec<AssetRef>,
}

impl Listing {
    /// Create a listing, validating title and price
    pub fn new(
        id: ListingId,
        title: impl Into<String>,
        description: impl Into<String>,
        price: f64,
        owner: impl Into<String>,
    ) -> Result<Self> {
        let title = title.into();
        if title.trim().is_empty() {
            return Err(Error::InvalidInput("Listing title cannot be empty".into()));
        }
        validate_price(price)?;

        Ok(Self {
            id,
            title,
            description: description.into(),
            price,
            image_name: String::new(),
            owner: owner.into(),
            owner_ref: None,
            images: Vec::new(),
        })
    }

    /// Attach image handles
    #[must_use]
    pub fn with_images(mut self, images: Vec<AssetRef>) -> Self {
        self.images = images;
        self
    }

    /// Attach the owner's record reference
    #[must_use]
    pub fn with_owner_ref(mut self, owner_ref: RecordId) -> Self {
        self.owner_ref = Some(owner_ref);
        self
    }
}

impl PartialEq for Listing {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Listing {}

impl Hash for Listing {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

/// Reject negative, NaN and infinite prices
pub fn validate_price(price: f64) -> Result<()> {
    if price.is_finite() && price >= 0.0 {
        Ok(())
    } else {
        Err(Error::InvalidInput(format!(
            "Price must be a non-negative number, got {price}"
        )))
    }
}
