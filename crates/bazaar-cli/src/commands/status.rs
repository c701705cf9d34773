use bazaar_core::BookmarkStore;
use serde::Serialize;

use crate::error::CliError;

#[derive(Debug, Serialize)]
pub struct StatusReport {
    pub remote: &'static str,
    pub user_id: Option<String>,
    pub bookmarks: usize,
    pub remote_url: Option<String>,
}

pub async fn run_status(
    store: &BookmarkStore,
    remote_url: Option<String>,
    as_json: bool,
) -> Result<StatusReport, CliError> {
    let availability = store.connect().await;
    let report = StatusReport {
        remote: availability.label(),
        user_id: availability.user_id().map(ToString::to_string),
        bookmarks: store.get_all_bookmarks().len(),
        remote_url,
    };

    if as_json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("Remote: {}", report.remote);
        if let Some(user_id) = &report.user_id {
            println!("User: {user_id}");
        }
        if let Some(url) = &report.remote_url {
            println!("Remote URL: {url}");
        }
        println!("Bookmarks: {}", report.bookmarks);
    }

    Ok(report)
}
