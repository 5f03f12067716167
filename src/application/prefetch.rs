//! Prefetch of the first listing page for a tag filter.

use std::sync::Arc;

use metrics::counter;
use thiserror::Error;
use tracing::{debug, instrument};

use crate::application::query_cache::{DehydratedState, QueryCache, QueryKey};
use crate::application::repos::{NotesRepo, RepoError};
use crate::domain::notes::{ListingQuery, NotesPage};
use crate::domain::tags::TagSelection;

pub const FIRST_PAGE: u32 = 1;
pub const PER_PAGE: u32 = 12;

#[derive(Debug, Error)]
pub enum PrefetchError {
    #[error(transparent)]
    Upstream(#[from] RepoError),
    #[error("failed to encode prefetched data: {0}")]
    Encode(#[from] serde_json::Error),
}

/// Key the client view reads the first listing page from.
///
/// Server and client must agree on this key for hydration to hit.
pub fn listing_key(selection: &TagSelection) -> QueryKey {
    QueryKey::notes(FIRST_PAGE, "", selection.raw())
}

/// Upstream request for the first listing page of `selection`.
pub fn initial_listing(selection: &TagSelection) -> ListingQuery {
    ListingQuery {
        page: FIRST_PAGE,
        per_page: PER_PAGE,
        search: String::new(),
        tag: selection.filter().map(str::to_string),
    }
}

/// Everything the client view needs to mount without refetching.
#[derive(Debug, Clone)]
pub struct PrefetchedView {
    pub initial_tag: String,
    pub query_key: QueryKey,
    pub listing: NotesPage,
    pub state: DehydratedState,
}

#[derive(Clone)]
pub struct PrefetchService {
    notes: Arc<dyn NotesRepo>,
}

impl PrefetchService {
    pub fn new(notes: Arc<dyn NotesRepo>) -> Self {
        Self { notes }
    }

    /// Prefetch the first page for `selection` into a cache owned by this call.
    ///
    /// Upstream failures are returned unchanged; there is no retry and no
    /// partial result.
    #[instrument(skip(self), fields(tag = selection.raw()))]
    pub async fn dispatch(&self, selection: &TagSelection) -> Result<PrefetchedView, PrefetchError> {
        let mut cache = QueryCache::new();
        let key = listing_key(selection);
        let query = initial_listing(selection);

        let notes = Arc::clone(&self.notes);
        let listing = cache
            .prefetch(key.clone(), || async move {
                notes.list_notes(&query).await.map_err(PrefetchError::from)
            })
            .await
            .inspect_err(|_| {
                counter!("notehub_prefetch_failed_total").increment(1);
            })?;

        debug!(
            target = "notehub::application::prefetch",
            notes = listing.notes.len(),
            total_pages = listing.total_pages,
            "prefetched listing"
        );

        Ok(PrefetchedView {
            initial_tag: selection.raw().to_string(),
            query_key: key,
            listing,
            state: cache.dehydrate(),
        })
    }
}
