use std::time::Instant;

use axum::{
    body::Body,
    http::{HeaderName, HeaderValue, Request},
    middleware::Next,
    response::Response,
};
use tracing::{debug, error, warn};
use uuid::Uuid;

use crate::{application::error::ErrorReport, domain::tags::TagSelection};

pub const REQUEST_ID_HEADER: HeaderName = HeaderName::from_static("x-request-id");

const LOG_TARGET: &str = "notehub::http::response";

#[derive(Clone)]
pub struct RequestContext {
    pub request_id: String,
}

/// What a notes filter render was asked for, attached to its response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotesPageContext {
    pub tag: String,
    pub note: Option<String>,
}

impl NotesPageContext {
    pub fn new(selection: &TagSelection, note: Option<&str>) -> Self {
        Self {
            tag: selection.raw().to_string(),
            note: note.map(str::to_string),
        }
    }

    pub fn attach(self, response: &mut Response) {
        response.extensions_mut().insert(self);
    }
}

pub async fn set_request_context(mut request: Request<Body>, next: Next) -> Response {
    let request_id = Uuid::new_v4().to_string();
    request.extensions_mut().insert(RequestContext {
        request_id: request_id.clone(),
    });

    let mut response = next.run(request).await;
    if let Ok(value) = HeaderValue::from_str(&request_id) {
        response.headers_mut().insert(REQUEST_ID_HEADER, value);
    }
    response
}

/// Logs each notes render at debug and every failed response at warn/error,
/// carrying the requested tag and note when the handler recorded them.
pub async fn log_responses(request: Request<Body>, next: Next) -> Response {
    let path = request.uri().path().to_string();
    let started = Instant::now();
    let request_id = request
        .extensions()
        .get::<RequestContext>()
        .map(|ctx| ctx.request_id.clone())
        .unwrap_or_default();

    let mut response = next.run(request).await;
    let status = response.status();
    let elapsed_ms = started.elapsed().as_millis();

    let page = response.extensions().get::<NotesPageContext>().cloned();
    let tag = page.as_ref().map(|page| page.tag.as_str());
    let note = page.as_ref().and_then(|page| page.note.as_deref());

    if !(status.is_client_error() || status.is_server_error()) {
        if page.is_some() {
            debug!(
                target: LOG_TARGET,
                status = status.as_u16(),
                path = %path,
                tag = ?tag,
                note = ?note,
                elapsed_ms,
                request_id = %request_id,
                "notes page rendered",
            );
        }
        return response;
    }

    let (source, chain) = match response.extensions_mut().remove::<ErrorReport>() {
        Some(report) => (report.source, report.messages),
        None => ("unrouted", Vec::new()),
    };
    let detail = chain.first().map(String::as_str).unwrap_or("none");

    if status.is_client_error() {
        warn!(
            target: LOG_TARGET,
            status = status.as_u16(),
            path = %path,
            tag = ?tag,
            note = ?note,
            source,
            detail,
            elapsed_ms,
            request_id = %request_id,
            "request rejected",
        );
    } else {
        error!(
            target: LOG_TARGET,
            status = status.as_u16(),
            path = %path,
            tag = ?tag,
            note = ?note,
            source,
            detail,
            chain = ?chain,
            elapsed_ms,
            request_id = %request_id,
            "notes page failed",
        );
    }

    response
}
