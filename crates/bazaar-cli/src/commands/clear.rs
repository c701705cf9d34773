use bazaar_core::BookmarkStore;

pub fn run_clear(store: &BookmarkStore) -> usize {
    let count = store.get_all_bookmarks().len();
    store.clear_bookmarks();
    println!("Cleared {count} bookmark(s)");
    count
}
