use bazaar_core::config::{StoreOptions, DEFAULT_RECORD_TYPE};
use bazaar_core::db::MemoryKeyValueStore;
use bazaar_core::models::BookmarkRecord;
use bazaar_core::remote::{InMemoryRecordStore, UserId};
use bazaar_core::{BookmarkStore, Listing, ListingId, ReconcileReport, RemoteAvailability};
use pretty_assertions::assert_eq;

use crate::cli::CompletionShell;
use crate::commands::bookmark::{run_bookmark, NewBookmark};
use crate::commands::clear::run_clear;
use crate::commands::common::{
    format_bookmark_lines, normalize_listing_identifier, open_store_at, resolve_bookmark,
};
use crate::commands::completions::run_completions;
use crate::commands::config::apply_config_init;
use crate::commands::remove::run_remove;
use crate::commands::status::run_status;
use crate::commands::sync::{format_report_lines, run_sync};
use crate::config_profiles::CliProfilesConfig;
use crate::error::CliError;

const FIRST_ID: &str = "01900000-0000-7000-8000-000000000001";
const SECOND_ID: &str = "01900000-0000-7000-8000-000000000002";

fn new_bookmark(id: Option<&str>, title: &str, price: f64) -> NewBookmark {
    NewBookmark {
        id: id.map(str::to_string),
        title: title.to_string(),
        description: String::new(),
        price,
        owner: "Sam".to_string(),
    }
}

fn listing(id: &str, title: &str) -> Listing {
    Listing::new(id.parse::<ListingId>().unwrap(), title, "", 20.0, "Sam").unwrap()
}

fn remote_store() -> (BookmarkStore, InMemoryRecordStore) {
    let remote = InMemoryRecordStore::new(UserId::new("user-1"));
    let store = BookmarkStore::open(
        MemoryKeyValueStore::new(),
        remote.clone(),
        StoreOptions::default(),
    );
    (store, remote)
}

#[test]
fn normalize_listing_identifier_rejects_empty() {
    assert!(matches!(
        normalize_listing_identifier("  "),
        Err(CliError::EmptyListingId)
    ));
    assert_eq!(
        normalize_listing_identifier(" 0190ABC ").unwrap(),
        "0190abc".to_string()
    );
}

#[test]
fn format_bookmark_lines_show_short_id_price_and_owner() {
    let lines = format_bookmark_lines(&[listing(FIRST_ID, "Guitar lessons")]);
    assert_eq!(
        lines,
        vec!["01900000-0000  20.00  Guitar lessons  (Sam)".to_string()]
    );
}

#[test]
fn format_report_lines_mention_failures_only_when_present() {
    let clean = ReconcileReport {
        pulled: 2,
        pushed: 1,
        ..ReconcileReport::default()
    };
    assert_eq!(
        format_report_lines(&clean),
        vec!["Sync complete: pulled 2, pushed 1".to_string()]
    );

    let noisy = ReconcileReport {
        failed_pushes: 1,
        skipped_records: 3,
        ..ReconcileReport::default()
    };
    assert_eq!(format_report_lines(&noisy).len(), 3);
}

#[test]
fn config_init_rejects_non_http_remote_url() {
    let mut config = CliProfilesConfig::default();
    let result = apply_config_init(
        &mut config,
        Some("work"),
        Some("records.example.com".to_string()),
        false,
    );
    assert!(matches!(result, Err(CliError::Config(_))));
}

#[test]
fn config_init_trims_trailing_slash_and_activates_profile() {
    let mut config = CliProfilesConfig::default();
    let name = apply_config_init(
        &mut config,
        Some("work"),
        Some("https://records.example.com/".to_string()),
        false,
    )
    .unwrap();

    assert_eq!(name, "work");
    assert_eq!(config.active_profile.as_deref(), Some("work"));
    assert_eq!(
        config.profiles["work"].remote_url.as_deref(),
        Some("https://records.example.com")
    );
}

#[test]
fn config_init_no_activate_keeps_active_profile() {
    let mut config = CliProfilesConfig {
        active_profile: Some("default".to_string()),
        ..CliProfilesConfig::default()
    };
    apply_config_init(
        &mut config,
        Some("staging"),
        Some("https://staging.example.com".to_string()),
        true,
    )
    .unwrap();
    assert_eq!(config.active_profile.as_deref(), Some("default"));
    assert!(config.profile("staging").is_some());
}

#[test]
fn completions_write_to_output_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("bazaar.bash");
    run_completions(CompletionShell::Bash, Some(&path)).unwrap();
    let script = std::fs::read_to_string(&path).unwrap();
    assert!(script.contains("bazaar"));
}

#[tokio::test]
async fn bookmark_persists_across_store_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let db_path = dir.path().join("bazaar.db");

    {
        let store = open_store_at(&db_path, None).unwrap();
        store.initialize().await;
        run_bookmark(&store, new_bookmark(Some(FIRST_ID), "Guitar lessons", 25.0))
            .await
            .unwrap();
        store.shutdown().await;
    }

    let reopened = open_store_at(&db_path, None).unwrap();
    let titles: Vec<String> = reopened
        .get_all_bookmarks()
        .into_iter()
        .map(|listing| listing.title)
        .collect();
    assert_eq!(titles, vec!["Guitar lessons".to_string()]);
}

#[tokio::test]
async fn bookmark_twice_keeps_one_entry() {
    let (store, _remote) = remote_store();
    run_bookmark(&store, new_bookmark(Some(FIRST_ID), "Chess", 10.0))
        .await
        .unwrap();
    run_bookmark(&store, new_bookmark(Some(FIRST_ID), "Chess", 10.0))
        .await
        .unwrap();
    assert_eq!(store.get_all_bookmarks().len(), 1);
}

#[tokio::test]
async fn bookmark_rejects_invalid_input() {
    let (store, _remote) = remote_store();

    let bad_id = run_bookmark(&store, new_bookmark(Some("not-a-uuid"), "Chess", 10.0)).await;
    assert!(matches!(bad_id, Err(CliError::InvalidListingId(_))));

    let bad_price = run_bookmark(&store, new_bookmark(None, "Chess", -1.0)).await;
    assert!(matches!(bad_price, Err(CliError::Core(_))));

    assert!(store.get_all_bookmarks().is_empty());
}

#[tokio::test]
async fn bookmark_generates_id_when_omitted() {
    let (store, _remote) = remote_store();
    let added = run_bookmark(&store, new_bookmark(None, "Math tutoring", 30.0))
        .await
        .unwrap();
    assert_eq!(
        store.get(added.id).map(|listing| listing.title),
        Some("Math tutoring".to_string())
    );
}

#[tokio::test]
async fn resolve_bookmark_by_prefix_and_reports_ambiguity() {
    let (store, _remote) = remote_store();
    run_bookmark(&store, new_bookmark(Some(FIRST_ID), "Alpha", 1.0))
        .await
        .unwrap();
    run_bookmark(&store, new_bookmark(Some(SECOND_ID), "Beta", 2.0))
        .await
        .unwrap();

    let exact = resolve_bookmark(FIRST_ID, &store).unwrap();
    assert_eq!(exact.title, "Alpha");

    let by_prefix = resolve_bookmark("01900000-0000-7000-8000-0000000000", &store);
    assert!(matches!(by_prefix, Err(CliError::AmbiguousListingId(_))));

    let unique = resolve_bookmark("01900000-0000-7000-8000-000000000002", &store).unwrap();
    assert_eq!(unique.title, "Beta");

    let missing = resolve_bookmark("ffff", &store);
    assert!(matches!(missing, Err(CliError::BookmarkNotFound(_))));
}

#[tokio::test]
async fn remove_in_local_only_mode_succeeds() {
    let dir = tempfile::tempdir().unwrap();
    let store = open_store_at(&dir.path().join("bazaar.db"), None).unwrap();
    assert_eq!(store.connect().await, RemoteAvailability::LocalOnly);

    run_bookmark(&store, new_bookmark(Some(FIRST_ID), "Alpha", 1.0))
        .await
        .unwrap();
    run_remove(&store, "01900000-0000-7000-8000-000000000001")
        .await
        .unwrap();
    assert!(store.get_all_bookmarks().is_empty());
}

#[tokio::test]
async fn remove_with_unknown_remote_is_refused() {
    let dir = tempfile::tempdir().unwrap();
    let store = open_store_at(&dir.path().join("bazaar.db"), None).unwrap();
    run_bookmark(&store, new_bookmark(Some(FIRST_ID), "Alpha", 1.0))
        .await
        .unwrap();

    let result = run_remove(&store, FIRST_ID).await;
    assert!(matches!(result, Err(CliError::RemovalNotConfirmed(_, _))));
    assert_eq!(store.get_all_bookmarks().len(), 1);
}

#[tokio::test]
async fn remove_keeps_bookmark_when_remote_delete_fails() {
    let (store, remote) = remote_store();
    store.initialize().await;
    run_bookmark(&store, new_bookmark(Some(FIRST_ID), "Alpha", 1.0))
        .await
        .unwrap();
    store.wait_idle().await;

    remote.fail_deletes(true);
    let result = run_remove(&store, FIRST_ID).await;
    assert!(matches!(result, Err(CliError::RemovalNotConfirmed(_, _))));
    assert_eq!(store.get_all_bookmarks().len(), 1);

    remote.fail_deletes(false);
    run_remove(&store, FIRST_ID).await.unwrap();
    assert!(store.get_all_bookmarks().is_empty());
    assert!(remote.records().is_empty());
}

#[tokio::test]
async fn sync_requires_available_remote() {
    let dir = tempfile::tempdir().unwrap();
    let store = open_store_at(&dir.path().join("bazaar.db"), None).unwrap();
    let result = run_sync(&store).await;
    assert!(matches!(result, Err(CliError::RemoteNotConfigured)));
}

#[tokio::test]
async fn sync_merges_remote_bookmarks() {
    let (store, remote) = remote_store();
    remote.insert(
        BookmarkRecord::new(UserId::new("user-1"), listing(SECOND_ID, "Remote"))
            .to_record(DEFAULT_RECORD_TYPE),
    );
    run_bookmark(&store, new_bookmark(Some(FIRST_ID), "Local", 1.0))
        .await
        .unwrap();

    let report = run_sync(&store).await.unwrap();
    assert_eq!(report.pulled, 1);
    assert_eq!(report.pushed, 1);
    assert_eq!(store.get_all_bookmarks().len(), 2);
    assert_eq!(remote.records().len(), 2);
}

#[tokio::test]
async fn clear_empties_local_set() {
    let (store, _remote) = remote_store();
    run_bookmark(&store, new_bookmark(Some(FIRST_ID), "Alpha", 1.0))
        .await
        .unwrap();
    run_bookmark(&store, new_bookmark(Some(SECOND_ID), "Beta", 1.0))
        .await
        .unwrap();

    assert_eq!(run_clear(&store), 2);
    assert!(store.get_all_bookmarks().is_empty());
}

#[tokio::test]
async fn status_reports_user_and_count() {
    let (store, _remote) = remote_store();
    run_bookmark(&store, new_bookmark(Some(FIRST_ID), "Alpha", 1.0))
        .await
        .unwrap();

    let report = run_status(&store, Some("https://records.example.com".to_string()), true)
        .await
        .unwrap();
    assert_eq!(report.remote, "available");
    assert_eq!(report.user_id.as_deref(), Some("user-1"));
    assert_eq!(report.bookmarks, 1);
}
