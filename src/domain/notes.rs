//! Read-only projections over upstream notes.

pub use notehub_api_types::{ListingQuery, Note, NotesPage};

/// Leading `max_chars` characters of `text`, without padding.
pub fn excerpt(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((end, _)) => &text[..end],
        None => text,
    }
}
