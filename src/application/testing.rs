//! In-memory doubles shared by application unit tests.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use url::Url;

use crate::application::metadata::SiteIdentity;
use crate::application::repos::{NotesRepo, RepoError};
use crate::domain::notes::{ListingQuery, Note, NotesPage};

pub(crate) fn site_identity() -> SiteIdentity {
    SiteIdentity {
        name: "NoteHub".to_string(),
        url: Url::parse("https://notehub.com").expect("site url"),
        preview_image: "https://ac.goit.global/fullstack/react/notehub-og-meta.jpg".to_string(),
    }
}

#[derive(Clone, Default)]
pub(crate) struct FakeNotes {
    notes: HashMap<String, Note>,
    listing: Option<NotesPage>,
    fail_listing: bool,
    note_lookups: Arc<Mutex<Vec<String>>>,
    listing_queries: Arc<Mutex<Vec<ListingQuery>>>,
}

impl FakeNotes {
    pub(crate) fn with_note(mut self, id: &str, note: Note) -> Self {
        self.notes.insert(id.to_string(), note);
        self
    }

    pub(crate) fn with_listing(mut self, page: NotesPage) -> Self {
        self.listing = Some(page);
        self
    }

    pub(crate) fn failing_listing(mut self) -> Self {
        self.fail_listing = true;
        self
    }

    pub(crate) fn note_lookups(&self) -> Vec<String> {
        self.note_lookups.lock().expect("lookups lock").clone()
    }

    pub(crate) fn listing_queries(&self) -> Vec<ListingQuery> {
        self.listing_queries.lock().expect("queries lock").clone()
    }
}

#[async_trait]
impl NotesRepo for FakeNotes {
    async fn find_note(&self, id: &str) -> Result<Note, RepoError> {
        self.note_lookups
            .lock()
            .expect("lookups lock")
            .push(id.to_string());
        self.notes.get(id).cloned().ok_or(RepoError::Status {
            status: 404,
            body: "Not Found".to_string(),
        })
    }

    async fn list_notes(&self, query: &ListingQuery) -> Result<NotesPage, RepoError> {
        self.listing_queries
            .lock()
            .expect("queries lock")
            .push(query.clone());
        if self.fail_listing {
            return Err(RepoError::Status {
                status: 500,
                body: "upstream down".to_string(),
            });
        }
        Ok(self.listing.clone().unwrap_or(NotesPage {
            notes: Vec::new(),
            total_pages: 0,
        }))
    }
}
