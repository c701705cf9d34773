//! bazaar-core - Core library for Bazaar
//!
//! This crate contains the listing models, the local key-value storage, the
//! remote record store seam and the bookmark store shared by all Bazaar
//! front-ends.

pub mod bookmarks;
pub mod config;
pub mod db;
pub mod error;
pub mod models;
pub mod remote;
pub mod state;
pub mod util;

pub use bookmarks::{BookmarkError, BookmarkEvent, BookmarkStore, ReconcileReport, ToggleOutcome};
pub use error::{Error, Result};
pub use models::{Listing, ListingId};
pub use state::RemoteAvailability;
