//! Server-rendered NoteHub notes filter page.
//!
//! A request to `/notes/filter/{tag}` resolves head metadata from one note
//! lookup and, concurrently, prefetches the first listing page for the tag
//! into a request-scoped query cache. The dehydrated cache is embedded in the
//! page so the client view mounts without refetching.

pub mod application;
pub mod config;
pub mod domain;
pub mod infra;
pub mod presentation;
