//! Application services: metadata resolution and listing prefetch.

pub mod error;
pub mod metadata;
pub mod prefetch;
pub mod query_cache;
pub mod repos;

#[cfg(test)]
pub(crate) mod testing;
