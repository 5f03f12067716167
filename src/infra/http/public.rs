use std::sync::Arc;

use axum::{
    Router,
    extract::{
        Path, Query, State,
        rejection::{PathRejection, QueryRejection},
    },
    http::StatusCode,
    middleware,
    response::{IntoResponse, Response},
    routing::get,
};
use serde::Deserialize;

use crate::{
    application::{
        error::HttpError,
        metadata::{MetadataService, SiteIdentity},
        prefetch::PrefetchService,
        repos::NotesRepo,
    },
    config::Settings,
    domain::tags::TagSelection,
    infra::{error::InfraError, notehub::NotehubClient},
    presentation::views::{
        LayoutContext, NotesFilterTemplate, NotesFilterView, render_error_response,
        render_not_found_response, render_template_response,
    },
};

use super::middleware::{NotesPageContext, log_responses, set_request_context};

const SOURCE: &str = "infra::http::public::notes_filter";
const BAD_REQUEST_MESSAGE: &str = "That notes address could not be understood";

#[derive(Clone)]
pub struct HttpState {
    pub metadata: Arc<MetadataService>,
    pub prefetch: Arc<PrefetchService>,
    pub client_script: Arc<str>,
}

impl HttpState {
    /// Wire the services against the configured notes API.
    pub fn from_settings(settings: &Settings) -> Result<Self, InfraError> {
        let notes: Arc<dyn NotesRepo> = Arc::new(NotehubClient::new(&settings.upstream)?);
        let site = SiteIdentity {
            name: settings.site.name.clone(),
            url: settings.site.url.clone(),
            preview_image: settings.site.preview_image.clone(),
        };

        Ok(Self {
            metadata: Arc::new(MetadataService::new(notes.clone(), site)),
            prefetch: Arc::new(PrefetchService::new(notes)),
            client_script: Arc::from(settings.site.client_script.as_str()),
        })
    }
}

pub fn build_router(state: HttpState) -> Router {
    Router::new()
        .route("/notes/filter", get(notes_filter_all))
        .route("/notes/filter/{*slug}", get(notes_filter))
        .route("/_health", get(health))
        .fallback(fallback_router)
        .with_state(state)
        .layer(middleware::from_fn(log_responses))
        .layer(middleware::from_fn(set_request_context))
}

/// Binds the note whose metadata fills the page head.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct NoteQuery {
    note: Option<String>,
}

async fn notes_filter_all(
    State(state): State<HttpState>,
    query: Result<Query<NoteQuery>, QueryRejection>,
) -> Response {
    let query = match query {
        Ok(Query(query)) => query,
        Err(rejection) => return bad_request(&state, &rejection),
    };
    let selection = TagSelection::from_segments::<&str>(&[]);
    render_notes_filter(&state, selection, query.note).await
}

async fn notes_filter(
    State(state): State<HttpState>,
    slug: Result<Path<String>, PathRejection>,
    query: Result<Query<NoteQuery>, QueryRejection>,
) -> Response {
    let slug = match slug {
        Ok(Path(slug)) => slug,
        Err(rejection) => return bad_request(&state, &rejection),
    };
    let query = match query {
        Ok(Query(query)) => query,
        Err(rejection) => return bad_request(&state, &rejection),
    };
    let selection = TagSelection::from_path(&slug);
    render_notes_filter(&state, selection, query.note).await
}

fn bad_request(state: &HttpState, rejection: &dyn std::error::Error) -> Response {
    let error = HttpError::from_error(
        SOURCE,
        StatusCode::BAD_REQUEST,
        BAD_REQUEST_MESSAGE,
        rejection,
    );
    render_error_response(&state.metadata.site().name, error)
}

async fn render_notes_filter(
    state: &HttpState,
    selection: TagSelection,
    note_id: Option<String>,
) -> Response {
    let site_name = state.metadata.site().name.as_str();
    let context = NotesPageContext::new(&selection, note_id.as_deref());
    let mut response = notes_filter_response(state, site_name, &selection, note_id).await;
    context.attach(&mut response);
    response
}

async fn notes_filter_response(
    state: &HttpState,
    site_name: &str,
    selection: &TagSelection,
    note_id: Option<String>,
) -> Response {
    let (meta, prefetched) = tokio::join!(
        state.metadata.resolve(note_id.as_deref()),
        state.prefetch.dispatch(selection),
    );

    let prefetched = match prefetched {
        Ok(prefetched) => prefetched,
        Err(err) => return render_error_response(site_name, err.into()),
    };

    let content = match NotesFilterView::new(&prefetched, &state.client_script) {
        Ok(content) => content,
        Err(err) => {
            let error = HttpError::from_error(
                SOURCE,
                StatusCode::INTERNAL_SERVER_ERROR,
                "Internal server error",
                &err,
            );
            return render_error_response(site_name, error);
        }
    };

    let view = LayoutContext::new(site_name, meta, content);
    render_template_response(NotesFilterTemplate { view }, StatusCode::OK)
}

async fn health() -> Response {
    StatusCode::NO_CONTENT.into_response()
}

async fn fallback_router(State(state): State<HttpState>) -> Response {
    render_not_found_response(&state.metadata.site().name)
}
