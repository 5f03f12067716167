//! Page metadata derived from a single note lookup.

use std::sync::Arc;

use metrics::counter;
use tracing::{debug, warn};
use url::Url;

use crate::application::repos::NotesRepo;
use crate::domain::notes::{Note, excerpt};

pub const NOT_FOUND_TITLE: &str = "Note not found";
const TITLE_PREFIX: &str = "Note: ";
const DESCRIPTION_CHARS: usize = 30;
const SOCIAL_DESCRIPTION_CHARS: usize = 100;
const PREVIEW_IMAGE_WIDTH: u32 = 1200;
const PREVIEW_IMAGE_HEIGHT: u32 = 630;
const OPEN_GRAPH_KIND: &str = "website";
const TWITTER_CARD: &str = "summary_large_image";

/// Fixed identity of the public site, used to fill social preview fields.
#[derive(Debug, Clone)]
pub struct SiteIdentity {
    pub name: String,
    pub url: Url,
    pub preview_image: String,
}

impl SiteIdentity {
    /// Public URL of a note page: `{site}/notes/{id}` with `id` as one path segment.
    pub fn note_url(&self, id: &str) -> String {
        let mut url = self.url.clone();
        if let Ok(mut segments) = url.path_segments_mut() {
            segments.pop_if_empty().extend(["notes", id]);
        }
        url.to_string()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageMetadata {
    pub title: String,
    pub description: String,
    pub open_graph: Option<OpenGraph>,
    pub twitter: Option<TwitterCard>,
}

impl PageMetadata {
    /// Record used whenever the note cannot be loaded.
    pub fn not_found() -> Self {
        Self {
            title: NOT_FOUND_TITLE.to_string(),
            description: String::new(),
            open_graph: None,
            twitter: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OpenGraph {
    pub title: String,
    pub description: String,
    pub url: String,
    pub site_name: String,
    pub images: Vec<OpenGraphImage>,
    pub kind: &'static str,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OpenGraphImage {
    pub url: String,
    pub width: u32,
    pub height: u32,
    pub alt: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TwitterCard {
    pub card: &'static str,
    pub title: String,
    pub description: String,
    pub images: Vec<String>,
}

#[derive(Clone)]
pub struct MetadataService {
    notes: Arc<dyn NotesRepo>,
    site: SiteIdentity,
}

impl MetadataService {
    pub fn new(notes: Arc<dyn NotesRepo>, site: SiteIdentity) -> Self {
        Self { notes, site }
    }

    pub fn site(&self) -> &SiteIdentity {
        &self.site
    }

    /// Resolve metadata for the note `id`. Never fails: every upstream problem
    /// collapses into [`PageMetadata::not_found`].
    pub async fn resolve(&self, id: Option<&str>) -> PageMetadata {
        let Some(id) = id.filter(|id| !id.is_empty()) else {
            debug!(
                target = "notehub::application::metadata",
                "no note id bound to request; using fallback metadata"
            );
            counter!("notehub_metadata_fallback_total", "reason" => "missing_id").increment(1);
            return PageMetadata::not_found();
        };

        match self.notes.find_note(id).await {
            Ok(note) => self.describe(id, &note),
            Err(err) => {
                warn!(
                    target = "notehub::application::metadata",
                    note_id = id,
                    error = %err,
                    "note lookup failed; using fallback metadata"
                );
                counter!("notehub_metadata_fallback_total", "reason" => "lookup_failed")
                    .increment(1);
                PageMetadata::not_found()
            }
        }
    }

    fn describe(&self, id: &str, note: &Note) -> PageMetadata {
        let title = format!("{TITLE_PREFIX}{}", note.title);
        let description = excerpt(&note.content, DESCRIPTION_CHARS).to_string();
        let social_description = excerpt(&note.content, SOCIAL_DESCRIPTION_CHARS).to_string();

        PageMetadata {
            open_graph: Some(OpenGraph {
                title: title.clone(),
                description: social_description,
                url: self.site.note_url(id),
                site_name: self.site.name.clone(),
                images: vec![OpenGraphImage {
                    url: self.site.preview_image.clone(),
                    width: PREVIEW_IMAGE_WIDTH,
                    height: PREVIEW_IMAGE_HEIGHT,
                    alt: note.title.clone(),
                }],
                kind: OPEN_GRAPH_KIND,
            }),
            twitter: Some(TwitterCard {
                card: TWITTER_CARD,
                title: note.title.clone(),
                description: description.clone(),
                images: vec![self.site.preview_image.clone()],
            }),
            title,
            description,
        }
    }
}
