//! In-process remote record store.
//!
//! Backs tests and local development. Failures and latency can be injected
//! to exercise the bookmark store's error paths.

use std::collections::{BTreeMap, HashSet};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use super::{
    AccountStatus, Predicate, QueryResults, Record, RecordId, RemoteError, RemoteRecordStore,
    RemoteResult, UserId,
};

#[derive(Debug)]
struct Inner {
    records: BTreeMap<RecordId, Record>,
    status: AccountStatus,
    user_id: UserId,
    next_id: u64,
    latency: Option<Duration>,
    fail_queries: bool,
    fail_saves: bool,
    fail_deletes: bool,
    fail_account_probe: bool,
    failing_deletes: HashSet<RecordId>,
    unreadable: HashSet<RecordId>,
    save_calls: usize,
    delete_calls: usize,
}

/// Thread-safe in-memory implementation of [`RemoteRecordStore`]
#[derive(Debug, Clone)]
pub struct InMemoryRecordStore {
    inner: Arc<Mutex<Inner>>,
}

impl Default for InMemoryRecordStore {
    fn default() -> Self {
        Self::new(UserId::new("local-user"))
    }
}

impl InMemoryRecordStore {
    /// Create an available store signed in as `user_id`
    pub fn new(user_id: UserId) -> Self {
        Self {
            inner: Arc::new(Mutex::new(Inner {
                records: BTreeMap::new(),
                status: AccountStatus::Available,
                user_id,
                next_id: 1,
                latency: None,
                fail_queries: false,
                fail_saves: false,
                fail_deletes: false,
                fail_account_probe: false,
                failing_deletes: HashSet::new(),
                unreadable: HashSet::new(),
                save_calls: 0,
                delete_calls: 0,
            })),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        // A poisoned lock only means a test thread panicked mid-update.
        self.inner
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }

    pub fn set_account_status(&self, status: AccountStatus) {
        self.lock().status = status;
    }

    /// Delay every remote call by `latency`
    pub fn set_latency(&self, latency: Option<Duration>) {
        self.lock().latency = latency;
    }

    pub fn fail_queries(&self, fail: bool) {
        self.lock().fail_queries = fail;
    }

    pub fn fail_saves(&self, fail: bool) {
        self.lock().fail_saves = fail;
    }

    pub fn fail_deletes(&self, fail: bool) {
        self.lock().fail_deletes = fail;
    }

    /// Make `account_status` fail as if the service were unreachable
    pub fn fail_account_probe(&self, fail: bool) {
        self.lock().fail_account_probe = fail;
    }

    /// Fail deletes of `id` only
    pub fn fail_delete_of(&self, id: RecordId) {
        self.lock().failing_deletes.insert(id);
    }

    /// Make `id` come back as a per-record error from queries
    pub fn mark_unreadable(&self, id: RecordId) {
        self.lock().unreadable.insert(id);
    }

    /// Insert a record directly, bypassing failure injection
    pub fn insert(&self, mut record: Record) -> RecordId {
        let mut inner = self.lock();
        let id = record
            .id
            .clone()
            .unwrap_or_else(|| allocate_id(&mut inner));
        record.id = Some(id.clone());
        inner.records.insert(id.clone(), record);
        id
    }

    /// Snapshot of all stored records
    pub fn records(&self) -> Vec<Record> {
        self.lock().records.values().cloned().collect()
    }

    pub fn save_calls(&self) -> usize {
        self.lock().save_calls
    }

    pub fn delete_calls(&self) -> usize {
        self.lock().delete_calls
    }

    async fn simulate_latency(&self) {
        let latency = self.lock().latency;
        if let Some(latency) = latency {
            tokio::time::sleep(latency).await;
        }
    }

    fn require_account(inner: &Inner) -> RemoteResult<()> {
        if inner.status == AccountStatus::Available {
            Ok(())
        } else {
            Err(RemoteError::Unavailable)
        }
    }
}

fn allocate_id(inner: &mut Inner) -> RecordId {
    let id = RecordId::new(format!("rec-{}", inner.next_id));
    inner.next_id += 1;
    id
}

#[async_trait::async_trait]
impl RemoteRecordStore for InMemoryRecordStore {
    async fn account_status(&self) -> RemoteResult<AccountStatus> {
        self.simulate_latency().await;
        let inner = self.lock();
        if inner.fail_account_probe {
            return Err(RemoteError::Network("simulated account probe failure".into()));
        }
        Ok(inner.status)
    }

    async fn current_user_id(&self) -> RemoteResult<UserId> {
        self.simulate_latency().await;
        let inner = self.lock();
        Self::require_account(&inner)?;
        Ok(inner.user_id.clone())
    }

    async fn query(&self, record_type: &str, predicate: &Predicate) -> RemoteResult<QueryResults> {
        self.simulate_latency().await;
        let inner = self.lock();
        Self::require_account(&inner)?;
        if inner.fail_queries {
            return Err(RemoteError::Network("simulated query failure".into()));
        }

        Ok(inner
            .records
            .iter()
            .filter(|(_, record)| record.record_type == record_type && predicate.matches(record))
            .map(|(id, record)| {
                let result = if inner.unreadable.contains(id) {
                    Err(RemoteError::InvalidPayload(format!("record {id} is unreadable")))
                } else {
                    Ok(record.clone())
                };
                (id.clone(), result)
            })
            .collect())
    }

    async fn save(&self, mut record: Record) -> RemoteResult<Record> {
        self.simulate_latency().await;
        let mut inner = self.lock();
        Self::require_account(&inner)?;
        inner.save_calls += 1;
        if inner.fail_saves {
            return Err(RemoteError::Network("simulated save failure".into()));
        }

        let id = match record.id.clone() {
            Some(id) => id,
            None => allocate_id(&mut inner),
        };
        record.id = Some(id.clone());
        inner.records.insert(id, record.clone());
        Ok(record)
    }

    async fn delete(&self, id: &RecordId) -> RemoteResult<()> {
        self.simulate_latency().await;
        let mut inner = self.lock();
        Self::require_account(&inner)?;
        inner.delete_calls += 1;
        if inner.fail_deletes || inner.failing_deletes.contains(id) {
            return Err(RemoteError::Network("simulated delete failure".into()));
        }

        inner
            .records
            .remove(id)
            .map(|_| ())
            .ok_or_else(|| RemoteError::NotFound(id.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::remote::FieldValue;

    fn record(user: &str) -> Record {
        let mut record = Record::new("Bookmark");
        record.set("userID", FieldValue::String(user.into()));
        record
    }

    #[tokio::test]
    async fn save_assigns_ids_and_query_filters() {
        let store = InMemoryRecordStore::new(UserId::new("u1"));
        let saved = store.save(record("u1")).await.unwrap();
        store.save(record("u2")).await.unwrap();

        assert!(saved.id.is_some());
        let results = store
            .query("Bookmark", &Predicate::new().field_eq("userID", "u1"))
            .await
            .unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(Some(&results[0].0), saved.id.as_ref());

        let none = store.query("Other", &Predicate::new()).await.unwrap();
        assert!(none.is_empty());
    }

    #[tokio::test]
    async fn delete_missing_record_is_not_found() {
        let store = InMemoryRecordStore::default();
        let error = store.delete(&RecordId::new("nope")).await.unwrap_err();
        assert!(matches!(error, RemoteError::NotFound(_)));
        assert_eq!(store.delete_calls(), 1);
    }

    #[tokio::test]
    async fn operations_fail_without_account() {
        let store = InMemoryRecordStore::default();
        store.set_account_status(AccountStatus::NoAccount);

        assert_eq!(
            store.account_status().await.unwrap(),
            AccountStatus::NoAccount
        );
        assert!(matches!(
            store.current_user_id().await,
            Err(RemoteError::Unavailable)
        ));
        assert!(matches!(
            store.save(record("u1")).await,
            Err(RemoteError::Unavailable)
        ));
    }

    #[tokio::test]
    async fn unreadable_records_surface_per_record_errors() {
        let store = InMemoryRecordStore::default();
        let good = store.insert(record("u1"));
        let bad = store.insert(record("u1"));
        store.mark_unreadable(bad.clone());

        let results = store.query("Bookmark", &Predicate::new()).await.unwrap();
        assert_eq!(results.len(), 2);
        for (id, result) in results {
            if id == good {
                assert!(result.is_ok());
            } else {
                assert_eq!(id, bad);
                assert!(result.is_err());
            }
        }
    }

    #[tokio::test]
    async fn injected_failures() {
        let store = InMemoryRecordStore::default();
        let id = store.insert(record("u1"));

        store.fail_saves(true);
        store.fail_deletes(true);
        store.fail_queries(true);
        assert!(matches!(
            store.save(record("u1")).await,
            Err(RemoteError::Network(_))
        ));
        assert!(matches!(store.delete(&id).await, Err(RemoteError::Network(_))));
        assert!(store.query("Bookmark", &Predicate::new()).await.is_err());
        assert_eq!(store.records().len(), 1);
    }

    #[tokio::test]
    async fn per_record_delete_failure_spares_other_records() {
        let store = InMemoryRecordStore::default();
        let kept = store.insert(record("u1"));
        let removed = store.insert(record("u1"));
        store.fail_delete_of(kept.clone());

        assert!(matches!(
            store.delete(&kept).await,
            Err(RemoteError::Network(_))
        ));
        store.delete(&removed).await.unwrap();
        assert_eq!(store.records().len(), 1);
        assert_eq!(store.records()[0].id.as_ref(), Some(&kept));
    }

    #[tokio::test]
    async fn account_probe_failure_is_a_network_error() {
        let store = InMemoryRecordStore::default();
        store.fail_account_probe(true);
        assert!(matches!(
            store.account_status().await,
            Err(RemoteError::Network(_))
        ));
    }
}
