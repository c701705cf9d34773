//! Bookmark store
//!
//! Keeps the user's bookmarked listings in a local set persisted to a
//! [`KeyValueStore`], and mirrors it best-effort into a [`RemoteRecordStore`].
//!
//! Adds are optimistic: the local set and storage change first, the remote
//! record is created by a background task and never rolled back. Removals
//! are pessimistic: the remote records are deleted first and the local set
//! only changes once that is confirmed.
//!
//! Reconciliation is a union: remote entries missing locally are merged in,
//! local entries missing remotely are pushed. No tombstones are kept, so a
//! bookmark removed while the remote delete could not be confirmed comes
//! back on the next pass.

mod error;

use std::collections::HashSet;
use std::future::Future;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tokio::sync::broadcast;
use tokio::task::JoinSet;

pub use error::BookmarkError;

use crate::config::StoreOptions;
use crate::db::KeyValueStore;
use crate::models::{BookmarkRecord, Listing, ListingId, FIELD_LISTING_ID, FIELD_USER_ID};
use crate::remote::{AccountStatus, Predicate, RecordId, RemoteError, RemoteRecordStore, UserId};
use crate::state::RemoteAvailability;

/// Change notification for subscribers of a [`BookmarkStore`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BookmarkEvent {
    /// The set changed; carries the new contents sorted by title
    Updated(Vec<Listing>),
    /// The set was emptied
    Cleared,
}

/// Result of [`BookmarkStore::toggle_bookmark`]
#[derive(Debug)]
pub enum ToggleOutcome {
    /// Bookmarked locally; the remote record is created in the background
    Added,
    /// Remote removal confirmed and the local set updated
    Removed,
    /// Removal could not be confirmed; the bookmark stays
    Kept(BookmarkError),
    /// A removal for this listing is still pending
    InFlight,
}

/// Summary of one [`BookmarkStore::reconcile`] pass
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReconcileReport {
    /// Remote entries merged into the local set
    pub pulled: usize,
    /// Local entries created remotely
    pub pushed: usize,
    /// Local entries whose remote create failed
    pub failed_pushes: usize,
    /// Remote records that could not be read as bookmarks
    pub skipped_records: usize,
}

struct LocalState {
    bookmarks: HashSet<Listing>,
    availability: RemoteAvailability,
    removals_in_flight: HashSet<ListingId>,
}

struct Inner {
    storage: Arc<dyn KeyValueStore>,
    remote: Arc<dyn RemoteRecordStore>,
    options: StoreOptions,
    state: Mutex<LocalState>,
    events: broadcast::Sender<BookmarkEvent>,
    tasks: Mutex<JoinSet<()>>,
    /// Spawned tasks not yet finished or aborted
    active_tasks: Arc<AtomicUsize>,
    shutting_down: AtomicBool,
}

/// Local bookmark set mirrored to a remote record store.
///
/// Cheap to clone; clones share the same state. Construct one per
/// application run and hand it to whatever needs bookmarks.
#[derive(Clone)]
pub struct BookmarkStore {
    inner: Arc<Inner>,
}

impl BookmarkStore {
    /// Load the persisted set and build the store.
    ///
    /// Missing or unreadable storage yields an empty set. The remote side
    /// stays [`RemoteAvailability::Unknown`] until [`Self::initialize`] runs.
    pub fn open(
        storage: impl KeyValueStore + 'static,
        remote: impl RemoteRecordStore + 'static,
        options: StoreOptions,
    ) -> Self {
        Self::open_shared(Arc::new(storage), Arc::new(remote), options)
    }

    /// Like [`Self::open`], for backends chosen at runtime
    pub fn open_shared(
        storage: Arc<dyn KeyValueStore>,
        remote: Arc<dyn RemoteRecordStore>,
        options: StoreOptions,
    ) -> Self {
        let bookmarks = match load_bookmarks(storage.as_ref(), &options.storage_key) {
            Ok(bookmarks) => bookmarks,
            Err(error) => {
                tracing::warn!("Ignoring unreadable bookmark storage: {}", error);
                HashSet::new()
            }
        };
        tracing::debug!("Loaded {} bookmarks from local storage", bookmarks.len());

        let (events, _) = broadcast::channel(options.event_capacity.max(1));
        Self {
            inner: Arc::new(Inner {
                storage,
                remote,
                options,
                state: Mutex::new(LocalState {
                    bookmarks,
                    availability: RemoteAvailability::Unknown,
                    removals_in_flight: HashSet::new(),
                }),
                events,
                tasks: Mutex::new(JoinSet::new()),
                active_tasks: Arc::new(AtomicUsize::new(0)),
                shutting_down: AtomicBool::new(false),
            }),
        }
    }

    /// Probe the remote account and, when available, reconcile once.
    pub async fn initialize(&self) -> RemoteAvailability {
        let availability = self.connect().await;
        if availability.user_id().is_some() {
            match self.reconcile().await {
                Ok(report) => tracing::info!(
                    "Reconciled bookmarks: pulled {}, pushed {}, failed {}, skipped {}",
                    report.pulled,
                    report.pushed,
                    report.failed_pushes,
                    report.skipped_records
                ),
                Err(error) => tracing::warn!("Bookmark reconciliation failed: {}", error),
            }
        }

        availability
    }

    /// Run [`Self::initialize`] as a tracked background task
    pub fn spawn_initialize(&self) {
        let store = self.clone();
        self.spawn_background(async move {
            store.initialize().await;
        });
    }

    pub fn availability(&self) -> RemoteAvailability {
        self.lock_state().availability.clone()
    }

    pub fn is_bookmarked(&self, listing: &Listing) -> bool {
        self.lock_state().bookmarks.contains(listing)
    }

    /// Look up a bookmarked listing by id
    pub fn get(&self, id: ListingId) -> Option<Listing> {
        self.lock_state()
            .bookmarks
            .iter()
            .find(|listing| listing.id == id)
            .cloned()
    }

    /// All bookmarks sorted by title (case-sensitive)
    pub fn get_all_bookmarks(&self) -> Vec<Listing> {
        sorted_by_title(&self.lock_state().bookmarks)
    }

    pub fn subscribe(&self) -> broadcast::Receiver<BookmarkEvent> {
        self.inner.events.subscribe()
    }

    /// Bookmark `listing` if it isn't, otherwise try to remove it.
    pub async fn toggle_bookmark(&self, listing: &Listing) -> ToggleOutcome {
        let (bookmarked, availability) = {
            let state = self.lock_state();
            if state.removals_in_flight.contains(&listing.id) {
                tracing::debug!("Ignoring toggle for {}: removal in flight", listing.id);
                return ToggleOutcome::InFlight;
            }
            (
                state.bookmarks.contains(listing),
                state.availability.clone(),
            )
        };

        if bookmarked {
            self.remove_bookmark(listing, availability).await
        } else {
            self.add_bookmark(listing, availability);
            ToggleOutcome::Added
        }
    }

    fn add_bookmark(&self, listing: &Listing, availability: RemoteAvailability) {
        let snapshot = {
            let mut state = self.lock_state();
            state.bookmarks.insert(listing.clone());
            self.persist(&state.bookmarks);
            sorted_by_title(&state.bookmarks)
        };
        self.notify(BookmarkEvent::Updated(snapshot));

        if let RemoteAvailability::Available(user_id) = availability {
            let store = self.clone();
            let listing = listing.clone();
            self.spawn_background(async move {
                if let Err(error) = store.save_remote(&user_id, &listing).await {
                    tracing::warn!("Failed to save bookmark {} remotely: {}", listing.id, error);
                }
            });
        }
    }

    async fn remove_bookmark(
        &self,
        listing: &Listing,
        availability: RemoteAvailability,
    ) -> ToggleOutcome {
        let Some(_guard) = InFlightGuard::acquire(self, listing.id) else {
            return ToggleOutcome::InFlight;
        };

        let confirmed = match availability {
            RemoteAvailability::Available(user_id) => {
                self.delete_remote(&user_id, listing.id).await
            }
            RemoteAvailability::LocalOnly => Ok(()),
            RemoteAvailability::Unknown => Err(BookmarkError::StoreUnavailable),
        };

        if let Err(error) = confirmed {
            tracing::warn!("Keeping bookmark {}: {}", listing.id, error);
            return ToggleOutcome::Kept(error);
        }

        let snapshot = {
            let mut state = self.lock_state();
            state.bookmarks.remove(listing);
            self.persist(&state.bookmarks);
            sorted_by_title(&state.bookmarks)
        };
        self.notify(BookmarkEvent::Updated(snapshot));
        ToggleOutcome::Removed
    }

    /// Merge remote bookmarks into the local set and push local-only ones.
    ///
    /// Union merge: entries removed locally but still present remotely are
    /// restored. Local entries win over remote copies of the same listing,
    /// except that remote image handles fill in a local copy that has none.
    pub async fn reconcile(&self) -> Result<ReconcileReport, BookmarkError> {
        let user_id = self
            .availability()
            .user_id()
            .cloned()
            .ok_or(BookmarkError::StoreUnavailable)?;

        let mut report = ReconcileReport::default();
        let remote_set = self.fetch_remote_bookmarks(&user_id, &mut report).await?;

        let (snapshot, to_push) = {
            let mut state = self.lock_state();
            for remote_listing in &remote_set {
                match state.bookmarks.get(remote_listing).cloned() {
                    None => {
                        state.bookmarks.insert(remote_listing.clone());
                        report.pulled += 1;
                    }
                    Some(mut local) if local.images.is_empty() && !remote_listing.images.is_empty() => {
                        local.images.clone_from(&remote_listing.images);
                        state.bookmarks.replace(local);
                    }
                    Some(_) => {}
                }
            }
            let to_push: Vec<Listing> = state
                .bookmarks
                .iter()
                .filter(|listing| !remote_set.contains(*listing))
                .cloned()
                .collect();
            self.persist(&state.bookmarks);
            (sorted_by_title(&state.bookmarks), to_push)
        };

        if report.pulled > 0 {
            self.notify(BookmarkEvent::Updated(snapshot));
        }

        for listing in to_push {
            match self.save_remote(&user_id, &listing).await {
                Ok(()) => report.pushed += 1,
                Err(error) => {
                    report.failed_pushes += 1;
                    tracing::warn!("Failed to push bookmark {}: {}", listing.id, error);
                }
            }
        }

        Ok(report)
    }

    /// Empty the local set now; remote records are deleted in the background.
    pub fn clear_bookmarks(&self) {
        let availability = {
            let mut state = self.lock_state();
            state.bookmarks.clear();
            self.persist(&state.bookmarks);
            state.availability.clone()
        };
        self.notify(BookmarkEvent::Cleared);

        match availability {
            RemoteAvailability::Available(user_id) => {
                let store = self.clone();
                self.spawn_background(async move {
                    store.clear_remote(&user_id).await;
                });
            }
            RemoteAvailability::Unknown => {
                tracing::debug!("Remote state unknown; skipping remote bookmark cleanup");
            }
            RemoteAvailability::LocalOnly => {}
        }
    }

    /// Wait for every in-flight remote task to finish
    pub async fn wait_idle(&self) {
        loop {
            let mut tasks = std::mem::take(&mut *self.lock_tasks());
            if tasks.is_empty() {
                return;
            }
            join_all(&mut tasks).await;
        }
    }

    /// Stop accepting background work, wait up to the configured grace
    /// period, then abandon whatever is still running.
    pub async fn shutdown(&self) {
        self.shutdown_with_grace(self.inner.options.shutdown_grace)
            .await;
    }

    pub async fn shutdown_with_grace(&self, grace: Duration) {
        self.inner.shutting_down.store(true, Ordering::SeqCst);
        let mut tasks = std::mem::take(&mut *self.lock_tasks());
        if tokio::time::timeout(grace, join_all(&mut tasks)).await.is_err() {
            tasks.shutdown().await;
            tracing::warn!("Abandoned bookmark tasks still running after {:?}", grace);
        }
    }

    /// Number of background tasks still running, including ones a
    /// concurrent [`Self::wait_idle`] is joining
    pub fn pending_tasks(&self) -> usize {
        self.inner.active_tasks.load(Ordering::SeqCst)
    }

    /// Probe the remote account without reconciling
    pub async fn connect(&self) -> RemoteAvailability {
        let availability = self.probe_remote().await;
        self.lock_state().availability = availability.clone();
        tracing::info!("Remote bookmark store is {}", availability.label());
        availability
    }

    /// Only a definite "no usable account" answer yields `LocalOnly`. A
    /// probe that could not reach the service stays `Unknown`, so removals
    /// keep refusing until a later probe succeeds.
    async fn probe_remote(&self) -> RemoteAvailability {
        match self.inner.remote.account_status().await {
            Ok(AccountStatus::Available) => match self.inner.remote.current_user_id().await {
                Ok(user_id) => RemoteAvailability::Available(user_id),
                Err(RemoteError::Unavailable) => {
                    tracing::info!("Remote account has no user id; bookmarks stay local");
                    RemoteAvailability::LocalOnly
                }
                Err(error) => {
                    tracing::warn!("Could not fetch remote user id: {}", error);
                    RemoteAvailability::Unknown
                }
            },
            Ok(status) => {
                tracing::info!("Remote account status is {:?}; bookmarks stay local", status);
                RemoteAvailability::LocalOnly
            }
            Err(RemoteError::Unavailable) => {
                tracing::info!("Remote account is unavailable; bookmarks stay local");
                RemoteAvailability::LocalOnly
            }
            Err(error) => {
                tracing::warn!("Remote account probe failed: {}", error);
                RemoteAvailability::Unknown
            }
        }
    }

    async fn fetch_remote_bookmarks(
        &self,
        user_id: &UserId,
        report: &mut ReconcileReport,
    ) -> Result<HashSet<Listing>, BookmarkError> {
        let predicate = Predicate::new().field_eq(FIELD_USER_ID, user_id.as_str());
        let results = self
            .inner
            .remote
            .query(&self.inner.options.record_type, &predicate)
            .await
            .map_err(BookmarkError::from_remote)?;

        let mut remote_set = HashSet::new();
        for (record_id, result) in results {
            let record = match result {
                Ok(record) => record,
                Err(error) => {
                    report.skipped_records += 1;
                    tracing::warn!("Skipping unreadable remote record {}: {}", record_id, error);
                    continue;
                }
            };
            match BookmarkRecord::from_record(&record) {
                Ok(bookmark) => {
                    remote_set.insert(bookmark.listing);
                }
                Err(error) => {
                    report.skipped_records += 1;
                    tracing::warn!("Skipping remote bookmark record {}: {}", record_id, error);
                }
            }
        }
        Ok(remote_set)
    }

    async fn save_remote(&self, user_id: &UserId, listing: &Listing) -> Result<(), RemoteError> {
        let record = BookmarkRecord::new(user_id.clone(), listing.clone())
            .to_record(&self.inner.options.record_type);
        let saved = self.inner.remote.save(record).await?;
        tracing::debug!(
            "Saved bookmark {} as remote record {}",
            listing.id,
            saved.id.as_ref().map_or("?", RecordId::as_str)
        );
        Ok(())
    }

    /// Delete every remote record for (`user_id`, `listing_id`).
    ///
    /// Zero matching records counts as a failure so the caller keeps the
    /// bookmark. Records that vanish between query and delete are fine.
    async fn delete_remote(
        &self,
        user_id: &UserId,
        listing_id: ListingId,
    ) -> Result<(), BookmarkError> {
        let predicate = Predicate::new()
            .field_eq(FIELD_USER_ID, user_id.as_str())
            .field_eq(FIELD_LISTING_ID, listing_id.as_str());
        let results = self
            .inner
            .remote
            .query(&self.inner.options.record_type, &predicate)
            .await
            .map_err(|error| match error {
                RemoteError::Unavailable => BookmarkError::StoreUnavailable,
                other => BookmarkError::DeletionFailed(other),
            })?;

        let record_ids: Vec<RecordId> = results
            .into_iter()
            .filter_map(|(record_id, result)| result.ok().map(|_| record_id))
            .collect();
        if record_ids.is_empty() {
            return Err(BookmarkError::RecordNotFound);
        }

        let mut deletions = JoinSet::new();
        for record_id in record_ids {
            let remote = Arc::clone(&self.inner.remote);
            deletions.spawn(async move {
                match remote.delete(&record_id).await {
                    Ok(()) | Err(RemoteError::NotFound(_)) => Ok(()),
                    Err(error) => Err(error),
                }
            });
        }

        let mut first_error = None;
        while let Some(joined) = deletions.join_next().await {
            let outcome = joined
                .map_err(|error| RemoteError::Api(format!("delete task failed: {error}")))
                .and_then(|result| result);
            if let Err(error) = outcome {
                tracing::warn!("Remote bookmark delete failed: {}", error);
                first_error.get_or_insert(error);
            }
        }

        first_error.map_or(Ok(()), |error| Err(BookmarkError::DeletionFailed(error)))
    }

    async fn clear_remote(&self, user_id: &UserId) {
        let predicate = Predicate::new().field_eq(FIELD_USER_ID, user_id.as_str());
        let results = match self
            .inner
            .remote
            .query(&self.inner.options.record_type, &predicate)
            .await
        {
            Ok(results) => results,
            Err(error) => {
                tracing::warn!("Failed to list remote bookmarks for cleanup: {}", error);
                return;
            }
        };

        for (record_id, result) in results {
            if result.is_err() {
                continue;
            }
            match self.inner.remote.delete(&record_id).await {
                Ok(()) | Err(RemoteError::NotFound(_)) => {}
                Err(error) => {
                    tracing::warn!("Failed to delete remote bookmark {}: {}", record_id, error);
                }
            }
        }
    }

    /// Write `bookmarks` to storage; callers hold the state lock so writes
    /// land in mutation order.
    fn persist(&self, bookmarks: &HashSet<Listing>) {
        let key = &self.inner.options.storage_key;
        if let Err(error) = store_bookmarks(self.inner.storage.as_ref(), key, bookmarks) {
            tracing::warn!("Failed to persist bookmarks: {}", error);
        }
    }

    fn notify(&self, event: BookmarkEvent) {
        // No subscribers is fine
        let _ = self.inner.events.send(event);
    }

    fn spawn_background<F>(&self, task: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        if self.inner.shutting_down.load(Ordering::SeqCst) {
            tracing::debug!("Store is shutting down; dropping background task");
            return;
        }
        let Ok(handle) = tokio::runtime::Handle::try_current() else {
            tracing::warn!("No async runtime available; skipping remote bookmark update");
            return;
        };

        let counter = ActiveTask::start(&self.inner.active_tasks);
        let mut tasks = self.lock_tasks();
        while tasks.try_join_next().is_some() {}
        tasks.spawn_on(
            async move {
                let _counter = counter;
                task.await;
            },
            &handle,
        );
    }

    fn lock_state(&self) -> MutexGuard<'_, LocalState> {
        self.inner
            .state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    fn lock_tasks(&self) -> MutexGuard<'_, JoinSet<()>> {
        self.inner
            .tasks
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

/// Marks a listing's removal as pending until dropped
struct InFlightGuard<'a> {
    store: &'a BookmarkStore,
    id: ListingId,
}

impl<'a> InFlightGuard<'a> {
    fn acquire(store: &'a BookmarkStore, id: ListingId) -> Option<Self> {
        if store.lock_state().removals_in_flight.insert(id) {
            Some(Self { store, id })
        } else {
            None
        }
    }
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.store.lock_state().removals_in_flight.remove(&self.id);
    }
}

/// Holds one slot of the active task count; released on completion or abort
struct ActiveTask(Arc<AtomicUsize>);

impl ActiveTask {
    fn start(count: &Arc<AtomicUsize>) -> Self {
        count.fetch_add(1, Ordering::SeqCst);
        Self(Arc::clone(count))
    }
}

impl Drop for ActiveTask {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

async fn join_all(tasks: &mut JoinSet<()>) {
    while let Some(result) = tasks.join_next().await {
        if let Err(error) = result {
            tracing::warn!("Bookmark background task failed: {}", error);
        }
    }
}

fn sorted_by_title(bookmarks: &HashSet<Listing>) -> Vec<Listing> {
    let mut listings: Vec<Listing> = bookmarks.iter().cloned().collect();
    listings.sort_by(|a, b| a.title.cmp(&b.title).then_with(|| a.id.cmp(&b.id)));
    listings
}

fn load_bookmarks(
    storage: &dyn KeyValueStore,
    key: &str,
) -> Result<HashSet<Listing>, BookmarkError> {
    let Some(bytes) = storage
        .get(key)
        .map_err(|error| BookmarkError::Storage(error.to_string()))?
    else {
        return Ok(HashSet::new());
    };
    let listings: Vec<Listing> = serde_json::from_slice(&bytes)?;
    Ok(listings.into_iter().collect())
}

fn store_bookmarks(
    storage: &dyn KeyValueStore,
    key: &str,
    bookmarks: &HashSet<Listing>,
) -> Result<(), BookmarkError> {
    let mut listings: Vec<&Listing> = bookmarks.iter().collect();
    listings.sort_by_key(|listing| listing.id);
    let bytes = serde_json::to_vec(&listings)?;
    storage
        .set(key, &bytes)
        .map_err(|error| BookmarkError::Storage(error.to_string()))
}
