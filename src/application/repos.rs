//! Repository traits describing the upstream notes adapters.

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::notes::{ListingQuery, Note, NotesPage};

#[derive(Debug, Error)]
pub enum RepoError {
    #[error("upstream transport error: {0}")]
    Transport(String),
    #[error("upstream responded with status {status}: {body}")]
    Status { status: u16, body: String },
    #[error("failed to decode upstream body: {0}")]
    Decode(String),
    #[error("invalid input: {message}")]
    InvalidInput { message: String },
}

impl RepoError {
    pub fn from_transport(err: impl std::fmt::Display) -> Self {
        Self::Transport(err.to_string())
    }

    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::InvalidInput {
            message: message.into(),
        }
    }
}

/// Read access to notes owned by the remote API.
#[async_trait]
pub trait NotesRepo: Send + Sync {
    /// Authenticated lookup of one note.
    async fn find_note(&self, id: &str) -> Result<Note, RepoError>;

    /// One page of the notes listing.
    async fn list_notes(&self, query: &ListingQuery) -> Result<NotesPage, RepoError>;
}
