use crate::application::{
    error::{ErrorReport, HttpError},
    metadata::PageMetadata,
    prefetch::PrefetchedView,
};
use crate::domain::notes::{Note, excerpt};
use askama::{Error as AskamaError, Template};
use axum::{
    http::StatusCode,
    response::{Html, IntoResponse, Response},
};
use thiserror::Error;

const CARD_EXCERPT_CHARS: usize = 100;

#[derive(Debug, Error)]
#[error("{public_message}")]
pub struct TemplateRenderError {
    pub(crate) source: &'static str,
    pub(crate) public_message: &'static str,
    #[source]
    pub(crate) error: AskamaError,
}

impl TemplateRenderError {
    pub fn new(source: &'static str, public_message: &'static str, error: AskamaError) -> Self {
        Self {
            source,
            public_message,
            error,
        }
    }
}

impl From<TemplateRenderError> for HttpError {
    fn from(err: TemplateRenderError) -> Self {
        let TemplateRenderError {
            source,
            public_message,
            error,
        } = err;

        HttpError::from_error(
            source,
            StatusCode::INTERNAL_SERVER_ERROR,
            public_message,
            &error,
        )
    }
}

pub fn render_template<T: Template>(template: T) -> Result<Html<String>, HttpError> {
    template.render().map(Html).map_err(|err| {
        TemplateRenderError::new(
            "presentation::views::render_template",
            "Template rendering failed",
            err,
        )
        .into()
    })
}

pub fn render_template_response<T: Template>(template: T, status: StatusCode) -> Response {
    match render_template(template) {
        Ok(html) => (status, html).into_response(),
        Err(err) => err.into_response(),
    }
}

pub fn render_not_found_response(site_name: &str) -> Response {
    let view = LayoutContext::new(
        site_name,
        PageMetadata {
            title: "Page not found".to_string(),
            description: String::new(),
            open_graph: None,
            twitter: None,
        },
        ErrorPageView::not_found(),
    );
    let mut response = render_template_response(ErrorTemplate { view }, StatusCode::NOT_FOUND);
    ErrorReport::from_message(
        "presentation::views::render_not_found_response",
        StatusCode::NOT_FOUND,
        "Resource not found",
    )
    .attach(&mut response);
    response
}

/// Render the standard error page for `error`, keeping its status and report.
pub fn render_error_response(site_name: &str, error: HttpError) -> Response {
    let status = error.status();
    let content = ErrorPageView {
        title: status
            .canonical_reason()
            .unwrap_or("Something went wrong")
            .to_string(),
        message: error.public_message().to_string(),
    };
    let meta = PageMetadata {
        title: content.title.clone(),
        description: String::new(),
        open_graph: None,
        twitter: None,
    };
    let view = LayoutContext::new(site_name, meta, content);
    let mut response = render_template_response(ErrorTemplate { view }, status);
    error.into_report().attach(&mut response);
    response
}

#[derive(Clone)]
pub struct LayoutContext<T> {
    pub site_name: String,
    pub meta: PageMetadata,
    pub content: T,
}

impl<T> LayoutContext<T> {
    pub fn new(site_name: &str, meta: PageMetadata, content: T) -> Self {
        Self {
            site_name: site_name.to_string(),
            meta,
            content,
        }
    }
}

#[derive(Clone)]
pub struct NoteCard {
    pub title: String,
    pub excerpt: String,
    pub tag: String,
}

impl NoteCard {
    fn from_note(note: &Note) -> Self {
        Self {
            title: note.title.clone(),
            excerpt: excerpt(&note.content, CARD_EXCERPT_CHARS).to_string(),
            tag: note.tag.clone().unwrap_or_default(),
        }
    }
}

/// Mount point for the client notes view.
pub struct NotesFilterView {
    pub initial_tag: String,
    pub query_key_json: String,
    pub state_json: String,
    pub notes: Vec<NoteCard>,
    pub total_pages: u32,
    pub client_script: String,
}

impl NotesFilterView {
    pub fn new(prefetched: &PrefetchedView, client_script: &str) -> Result<Self, serde_json::Error> {
        Ok(Self {
            initial_tag: prefetched.initial_tag.clone(),
            query_key_json: serde_json::to_string(&prefetched.query_key)?,
            state_json: prefetched.state.to_script_json()?,
            notes: prefetched
                .listing
                .notes
                .iter()
                .map(NoteCard::from_note)
                .collect(),
            total_pages: prefetched.listing.total_pages,
            client_script: client_script.to_string(),
        })
    }
}

#[derive(Template)]
#[template(path = "notes/filter.html")]
pub struct NotesFilterTemplate {
    pub view: LayoutContext<NotesFilterView>,
}

pub struct ErrorPageView {
    pub title: String,
    pub message: String,
}

impl ErrorPageView {
    pub fn not_found() -> Self {
        Self {
            title: "Page Not Found".to_string(),
            message: "The page you requested does not exist.".to_string(),
        }
    }
}

#[derive(Template)]
#[template(path = "error.html")]
pub struct ErrorTemplate {
    pub view: LayoutContext<ErrorPageView>,
}
