//! HTTP adapter for the remote NoteHub notes API.

use std::time::Instant;

use async_trait::async_trait;
use metrics::counter;
use reqwest::{Client, Response, header::AUTHORIZATION};
use serde::de::DeserializeOwned;
use tracing::debug;
use url::Url;

use crate::application::repos::{NotesRepo, RepoError};
use crate::config::UpstreamSettings;
use crate::domain::notes::{ListingQuery, Note, NotesPage};
use crate::infra::error::InfraError;

const ENDPOINT_NOTE: &str = "note";
const ENDPOINT_LISTING: &str = "listing";

#[derive(Clone)]
pub struct NotehubClient {
    client: Client,
    base: Url,
    token: Option<String>,
}

impl NotehubClient {
    pub fn new(settings: &UpstreamSettings) -> Result<Self, InfraError> {
        let mut builder = Client::builder().user_agent(Self::user_agent());
        if let Some(timeout) = settings.timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder.build().map_err(|err| {
            InfraError::configuration(format!("failed to build notes API client: {err}"))
        })?;

        Ok(Self {
            client,
            base: settings.base_url.clone(),
            token: settings.token.clone(),
        })
    }

    pub fn user_agent() -> &'static str {
        concat!("notehub/", env!("CARGO_PKG_VERSION"))
    }

    /// `{base}/notes[/segments..]`, each segment percent-encoded on its own.
    fn notes_url(&self, segments: &[&str]) -> Result<Url, RepoError> {
        let mut url = self.base.clone();
        {
            let mut path = url
                .path_segments_mut()
                .map_err(|()| RepoError::invalid_input("notes API base URL cannot be a base"))?;
            path.pop_if_empty().push("notes").extend(segments);
        }
        Ok(url)
    }

    async fn decode<T: DeserializeOwned>(
        endpoint: &'static str,
        response: Response,
    ) -> Result<T, RepoError> {
        let status = response.status();
        let bytes = response
            .bytes()
            .await
            .map_err(RepoError::from_transport)?;
        if !status.is_success() {
            counter!("notehub_upstream_requests_total", "endpoint" => endpoint, "outcome" => "status")
                .increment(1);
            return Err(RepoError::Status {
                status: status.as_u16(),
                body: String::from_utf8_lossy(&bytes).into_owned(),
            });
        }
        let value = serde_json::from_slice(&bytes).map_err(|err| {
            counter!("notehub_upstream_requests_total", "endpoint" => endpoint, "outcome" => "decode")
                .increment(1);
            RepoError::Decode(err.to_string())
        })?;
        counter!("notehub_upstream_requests_total", "endpoint" => endpoint, "outcome" => "ok")
            .increment(1);
        Ok(value)
    }

    fn transport_failure(endpoint: &'static str, err: reqwest::Error) -> RepoError {
        counter!("notehub_upstream_requests_total", "endpoint" => endpoint, "outcome" => "transport")
            .increment(1);
        RepoError::from_transport(err)
    }
}

#[async_trait]
impl NotesRepo for NotehubClient {
    async fn find_note(&self, id: &str) -> Result<Note, RepoError> {
        let url = self.notes_url(&[id])?;
        let started = Instant::now();

        let mut request = self.client.get(url);
        if let Some(token) = &self.token {
            request = request.header(AUTHORIZATION, format!("Bearer {token}"));
        }
        let response = request
            .send()
            .await
            .map_err(|err| Self::transport_failure(ENDPOINT_NOTE, err))?;

        debug!(
            target = "notehub::infra::notehub",
            note_id = id,
            status = response.status().as_u16(),
            elapsed_ms = started.elapsed().as_millis(),
            "note lookup completed"
        );
        Self::decode(ENDPOINT_NOTE, response).await
    }

    async fn list_notes(&self, query: &ListingQuery) -> Result<NotesPage, RepoError> {
        let mut url = self.notes_url(&[])?;
        url.query_pairs_mut().extend_pairs(query.to_query_pairs());
        let started = Instant::now();

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|err| Self::transport_failure(ENDPOINT_LISTING, err))?;

        debug!(
            target = "notehub::infra::notehub",
            tag = query.tag.as_deref().unwrap_or(""),
            page = query.page,
            status = response.status().as_u16(),
            elapsed_ms = started.elapsed().as_millis(),
            "notes listing completed"
        );
        Self::decode(ENDPOINT_LISTING, response).await
    }
}

#[cfg(test)]
mod tests {
    use httpmock::prelude::*;

    use super::*;

    fn client(server: &MockServer, token: Option<&str>) -> NotehubClient {
        let settings = UpstreamSettings {
            base_url: Url::parse(&server.url("/api")).expect("base url"),
            token: token.map(str::to_string),
            timeout: None,
        };
        NotehubClient::new(&settings).expect("client")
    }

    #[tokio::test]
    async fn find_note_sends_bearer_token() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(GET)
                .path("/api/notes/42")
                .header("authorization", "Bearer secret");
            then.status(200)
                .header("content-type", "application/json")
                .body(r#"{"id":"42","title":"Plan","content":"hello","tag":"Work"}"#);
        });

        let note = client(&server, Some("secret"))
            .find_note("42")
            .await
            .expect("note");

        mock.assert();
        assert_eq!(note.title, "Plan");
        assert_eq!(note.content, "hello");
    }

    #[tokio::test]
    async fn find_note_maps_non_success_to_status_error() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/api/notes/missing");
            then.status(404).body("Not Found");
        });

        let err = client(&server, Some("secret"))
            .find_note("missing")
            .await
            .expect_err("404 must fail");

        assert!(matches!(err, RepoError::Status { status: 404, .. }));
    }

    #[tokio::test]
    async fn find_note_reports_undecodable_bodies() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/api/notes/1");
            then.status(200).body("<html>oops</html>");
        });

        let err = client(&server, None)
            .find_note("1")
            .await
            .expect_err("html must fail to decode");

        assert!(matches!(err, RepoError::Decode(_)));
    }

    #[tokio::test]
    async fn list_notes_sends_listing_parameters() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(GET)
                .path("/api/notes")
                .query_param("page", "1")
                .query_param("perPage", "12")
                .query_param("search", "")
                .query_param("tag", "Work");
            then.status(200)
                .header("content-type", "application/json")
                .body(r#"{"notes":[{"title":"a","content":"b"}],"totalPages":2}"#);
        });

        let page = client(&server, None)
            .list_notes(&ListingQuery {
                page: 1,
                per_page: 12,
                search: String::new(),
                tag: Some("Work".to_string()),
            })
            .await
            .expect("listing");

        mock.assert();
        assert_eq!(page.total_pages, 2);
        assert_eq!(page.notes.len(), 1);
    }

    #[tokio::test]
    async fn list_notes_propagates_server_errors() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/api/notes");
            then.status(500).body("boom");
        });

        let err = client(&server, None)
            .list_notes(&ListingQuery {
                page: 1,
                per_page: 12,
                search: String::new(),
                tag: None,
            })
            .await
            .expect_err("500 must fail");

        assert!(matches!(err, RepoError::Status { status: 500, ref body } if body == "boom"));
    }

    #[test]
    fn note_ids_are_encoded_as_one_segment() {
        let settings = UpstreamSettings {
            base_url: Url::parse("https://notehub-public.goit.study/api/").expect("url"),
            token: None,
            timeout: None,
        };
        let client = NotehubClient::new(&settings).expect("client");
        let url = client.notes_url(&["a/b c"]).expect("url");
        assert_eq!(
            url.as_str(),
            "https://notehub-public.goit.study/api/notes/a%2Fb%20c"
        );
    }
}
