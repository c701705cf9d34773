use bazaar_core::BookmarkStore;

use crate::commands::common::{bookmark_to_list_item, format_bookmark_lines, BookmarkListItem};
use crate::error::CliError;

pub fn run_list(store: &BookmarkStore, as_json: bool) -> Result<(), CliError> {
    let bookmarks = store.get_all_bookmarks();

    if as_json {
        let json_items = bookmarks
            .iter()
            .map(bookmark_to_list_item)
            .collect::<Vec<BookmarkListItem>>();
        println!("{}", serde_json::to_string_pretty(&json_items)?);
    } else if bookmarks.is_empty() {
        println!("No bookmarks yet.");
    } else {
        for line in format_bookmark_lines(&bookmarks) {
            println!("{line}");
        }
    }

    Ok(())
}
