//! Domain layer types and invariants.

pub mod notes;
pub mod tags;
