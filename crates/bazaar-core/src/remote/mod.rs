//! Remote record store seam.
//!
//! The bookmark store only talks to the network through [`RemoteRecordStore`].
//! Records are loosely typed field maps, mirroring what a cloud record
//! database hands back.

mod http;
mod memory;

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use http::HttpRecordStore;
pub use memory::InMemoryRecordStore;

/// Identifier of a record in the remote store
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecordId(String);

impl RecordId {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Identifier of the signed-in remote user
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(String);

impl UserId {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Opaque handle to a binary asset held by the remote store
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AssetRef(String);

impl AssetRef {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// A single record field value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum FieldValue {
    String(String),
    Number(f64),
    Asset(AssetRef),
    Assets(Vec<AssetRef>),
    Reference(RecordId),
}

impl FieldValue {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(value) => Some(value),
            _ => None,
        }
    }

    pub const fn as_number(&self) -> Option<f64> {
        match self {
            Self::Number(value) => Some(*value),
            _ => None,
        }
    }

    /// Asset handles, accepting both single and list values
    pub fn as_assets(&self) -> Option<Vec<AssetRef>> {
        match self {
            Self::Asset(asset) => Some(vec![asset.clone()]),
            Self::Assets(assets) => Some(assets.clone()),
            _ => None,
        }
    }
}

/// A remote record: a typed bag of named fields
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    /// Assigned by the store on save when `None`
    #[serde(default)]
    pub id: Option<RecordId>,
    pub record_type: String,
    #[serde(default)]
    pub fields: BTreeMap<String, FieldValue>,
}

impl Record {
    pub fn new(record_type: impl Into<String>) -> Self {
        Self {
            id: None,
            record_type: record_type.into(),
            fields: BTreeMap::new(),
        }
    }

    pub fn set(&mut self, field: impl Into<String>, value: FieldValue) {
        self.fields.insert(field.into(), value);
    }

    pub fn get(&self, field: &str) -> Option<&FieldValue> {
        self.fields.get(field)
    }

    pub fn get_str(&self, field: &str) -> Option<&str> {
        self.get(field).and_then(FieldValue::as_str)
    }

    pub fn get_number(&self, field: &str) -> Option<f64> {
        self.get(field).and_then(FieldValue::as_number)
    }
}

/// Conjunction of `field == value` clauses over string fields
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Predicate {
    clauses: Vec<(String, String)>,
}

impl Predicate {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a `field == value` clause
    #[must_use]
    pub fn field_eq(mut self, field: impl Into<String>, value: impl Into<String>) -> Self {
        self.clauses.push((field.into(), value.into()));
        self
    }

    pub fn clauses(&self) -> &[(String, String)] {
        &self.clauses
    }

    /// An empty predicate matches every record
    pub fn matches(&self, record: &Record) -> bool {
        self.clauses
            .iter()
            .all(|(field, value)| record.get_str(field) == Some(value.as_str()))
    }
}

/// Remote account state for the current device user
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccountStatus {
    Available,
    NoAccount,
    Restricted,
    Unknown,
}

#[derive(Debug, Error)]
pub enum RemoteError {
    #[error("Remote store is unavailable (no signed-in account)")]
    Unavailable,
    #[error("Remote record not found: {0}")]
    NotFound(String),
    #[error("Network error: {0}")]
    Network(String),
    #[error("Remote store API error: {0}")]
    Api(String),
    #[error("Invalid remote payload: {0}")]
    InvalidPayload(String),
}

impl From<reqwest::Error> for RemoteError {
    fn from(error: reqwest::Error) -> Self {
        Self::Network(error.to_string())
    }
}

pub type RemoteResult<T> = Result<T, RemoteError>;

/// Per-record outcome of a query; one bad record does not fail the batch
pub type QueryResults = Vec<(RecordId, RemoteResult<Record>)>;

/// The networked record store the bookmark store mirrors into
#[async_trait::async_trait]
pub trait RemoteRecordStore: Send + Sync {
    async fn account_status(&self) -> RemoteResult<AccountStatus>;

    /// Fails with [`RemoteError::Unavailable`] when no account is signed in
    async fn current_user_id(&self) -> RemoteResult<UserId>;

    async fn query(&self, record_type: &str, predicate: &Predicate) -> RemoteResult<QueryResults>;

    /// Returns the stored record with its assigned id
    async fn save(&self, record: Record) -> RemoteResult<Record>;

    async fn delete(&self, id: &RecordId) -> RemoteResult<()>;
}

/// Remote for devices with no configured record service.
///
/// Always reports [`AccountStatus::NoAccount`], which puts the bookmark store
/// in local-only mode.
#[derive(Debug, Clone, Copy, Default)]
pub struct OfflineRecordStore;

#[async_trait::async_trait]
impl RemoteRecordStore for OfflineRecordStore {
    async fn account_status(&self) -> RemoteResult<AccountStatus> {
        Ok(AccountStatus::NoAccount)
    }

    async fn current_user_id(&self) -> RemoteResult<UserId> {
        Err(RemoteError::Unavailable)
    }

    async fn query(&self, _record_type: &str, _predicate: &Predicate) -> RemoteResult<QueryResults> {
        Err(RemoteError::Unavailable)
    }

    async fn save(&self, _record: Record) -> RemoteResult<Record> {
        Err(RemoteError::Unavailable)
    }

    async fn delete(&self, _id: &RecordId) -> RemoteResult<()> {
        Err(RemoteError::Unavailable)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bookmark_record(user: &str, service: &str) -> Record {
        let mut record = Record::new("Bookmark");
        record.set("userID", FieldValue::String(user.to_string()));
        record.set("serviceID", FieldValue::String(service.to_string()));
        record.set("price", FieldValue::Number(12.5));
        record
    }

    #[test]
    fn predicate_matches_all_clauses() {
        let record = bookmark_record("u1", "s1");

        assert!(Predicate::new().matches(&record));
        assert!(Predicate::new().field_eq("userID", "u1").matches(&record));
        assert!(Predicate::new()
            .field_eq("userID", "u1")
            .field_eq("serviceID", "s1")
            .matches(&record));
        assert!(!Predicate::new()
            .field_eq("userID", "u1")
            .field_eq("serviceID", "s2")
            .matches(&record));
    }

    #[test]
    fn predicate_does_not_match_non_string_fields() {
        let record = bookmark_record("u1", "s1");
        assert!(!Predicate::new().field_eq("price", "12.5").matches(&record));
        assert!(!Predicate::new().field_eq("missing", "x").matches(&record));
    }

    #[test]
    fn field_value_accessors() {
        assert_eq!(FieldValue::String("a".into()).as_str(), Some("a"));
        assert_eq!(FieldValue::Number(2.0).as_number(), Some(2.0));
        assert_eq!(FieldValue::Number(2.0).as_str(), None);
        assert_eq!(
            FieldValue::Asset(AssetRef::new("x")).as_assets(),
            Some(vec![AssetRef::new("x")])
        );
        assert_eq!(FieldValue::String("a".into()).as_assets(), None);
    }

    #[tokio::test]
    async fn offline_store_reports_no_account() {
        let store = OfflineRecordStore;
        assert_eq!(
            store.account_status().await.unwrap(),
            AccountStatus::NoAccount
        );
        assert!(matches!(
            store.query("Bookmark", &Predicate::new()).await,
            Err(RemoteError::Unavailable)
        ));
    }

    #[test]
    fn field_value_json_is_tagged() {
        let json = serde_json::to_string(&FieldValue::Number(3.0)).unwrap();
        assert_eq!(json, r#"{"type":"number","value":3.0}"#);

        let decoded: FieldValue =
            serde_json::from_str(r#"{"type":"reference","value":"rec-1"}"#).unwrap();
        assert_eq!(decoded, FieldValue::Reference(RecordId::new("rec-1")));
    }
}
