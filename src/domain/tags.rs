//! Tag filter resolution for the notes listing.
//!
//! The first route segment names the tag. The literal `All` and a missing or
//! empty segment both mean "unfiltered". The raw segment is kept alongside the
//! normalized filter because the client view and the query key are keyed on
//! the raw value.

/// Route segment value that selects every note.
pub const ALL_TAGS: &str = "All";

/// Tag selection derived from the catch-all route segments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TagSelection {
    raw: String,
}

impl TagSelection {
    /// Take the first segment as the tag, defaulting to an empty string.
    pub fn from_segments<S: AsRef<str>>(segments: &[S]) -> Self {
        let raw = segments
            .first()
            .map(|segment| segment.as_ref().to_string())
            .unwrap_or_default();
        Self { raw }
    }

    /// Split a `a/b/c` wildcard capture into segments and select the first.
    pub fn from_path(path: &str) -> Self {
        let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
        Self::from_segments(&segments)
    }

    /// The tag exactly as it appeared in the route, possibly empty.
    pub fn raw(&self) -> &str {
        &self.raw
    }

    /// The filter sent upstream: `None` for an empty tag or `All`.
    pub fn filter(&self) -> Option<&str> {
        if self.raw.is_empty() || self.raw == ALL_TAGS {
            None
        } else {
            Some(self.raw.as_str())
        }
    }
}
