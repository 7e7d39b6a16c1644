pub mod classify;
pub mod entry;
pub mod extract;
pub mod filter;
pub mod fixup;
pub mod page;

pub use entry::{Category, Entry};
pub use page::Page;

/// Index pass over a freshly loaded page: extraction, filtering and
/// classification in one go. Member listings are the caller's to skip.
pub fn process_page(page: &Page) -> Vec<Entry> {
    extract::extract(page)
}
