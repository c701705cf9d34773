//! Local storage layer for Bazaar

mod connection;
mod kv;
mod migrations;

pub use connection::Database;
pub use kv::{KeyValueStore, MemoryKeyValueStore, SqliteKeyValueStore};
