use std::error::Error as StdError;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

use crate::{application::prefetch::PrefetchError, infra::error::InfraError};

/// Diagnostic chain attached to a response for the logging middleware.
#[derive(Debug, Clone)]
pub struct ErrorReport {
    pub source: &'static str,
    pub status: StatusCode,
    pub messages: Vec<String>,
}

impl ErrorReport {
    pub fn from_error(source: &'static str, status: StatusCode, error: &dyn StdError) -> Self {
        let mut messages = vec![error.to_string()];
        let mut current = error.source();
        while let Some(inner) = current {
            messages.push(inner.to_string());
            current = inner.source();
        }
        Self {
            source,
            status,
            messages,
        }
    }

    pub fn from_message(
        source: &'static str,
        status: StatusCode,
        message: impl Into<String>,
    ) -> Self {
        Self {
            source,
            status,
            messages: vec![message.into()],
        }
    }

    pub fn attach(self, response: &mut Response) {
        response.extensions_mut().insert(self);
    }
}

#[derive(Debug)]
pub struct HttpError {
    status: StatusCode,
    public_message: &'static str,
    report: ErrorReport,
}

impl HttpError {
    pub fn new(
        source: &'static str,
        status: StatusCode,
        public_message: &'static str,
        detail: impl Into<String>,
    ) -> Self {
        let report = ErrorReport::from_message(source, status, detail);
        Self {
            status,
            public_message,
            report,
        }
    }

    pub fn from_error(
        source: &'static str,
        status: StatusCode,
        public_message: &'static str,
        error: &dyn StdError,
    ) -> Self {
        let report = ErrorReport::from_error(source, status, error);
        Self {
            status,
            public_message,
            report,
        }
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn public_message(&self) -> &'static str {
        self.public_message
    }

    pub fn into_report(self) -> ErrorReport {
        self.report
    }
}

impl IntoResponse for HttpError {
    fn into_response(self) -> Response {
        let mut response = (self.status, self.public_message).into_response();
        self.report.attach(&mut response);
        response
    }
}

impl From<PrefetchError> for HttpError {
    fn from(error: PrefetchError) -> Self {
        match &error {
            PrefetchError::Upstream(_) => HttpError::from_error(
                "application::prefetch::PrefetchService",
                StatusCode::BAD_GATEWAY,
                "Notes are temporarily unavailable",
                &error,
            ),
            PrefetchError::Encode(_) => HttpError::from_error(
                "application::prefetch::PrefetchService",
                StatusCode::INTERNAL_SERVER_ERROR,
                "Internal server error",
                &error,
            ),
        }
    }
}

#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Infra(#[from] InfraError),
    #[error("unexpected error: {0}")]
    Unexpected(String),
}

impl AppError {
    pub fn unexpected(message: impl Into<String>) -> Self {
        Self::Unexpected(message.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::repos::RepoError;

    #[test]
    fn upstream_prefetch_failure_maps_to_bad_gateway() {
        let error: HttpError = PrefetchError::Upstream(RepoError::Status {
            status: 503,
            body: "maintenance".to_string(),
        })
        .into();

        assert_eq!(error.status(), StatusCode::BAD_GATEWAY);
        assert_eq!(error.public_message(), "Notes are temporarily unavailable");
        let report = error.into_report();
        assert!(report.messages[0].contains("503"));
    }

    #[test]
    fn report_collects_source_chain() {
        let inner = std::io::Error::other("socket closed");
        let outer = InfraError::Io(inner);
        let report = ErrorReport::from_error("test", StatusCode::INTERNAL_SERVER_ERROR, &outer);

        assert_eq!(report.messages.len(), 2);
        assert_eq!(report.messages[1], "socket closed");
    }
}
