//! Core trait abstractions for the extraction pipeline.

pub mod fallback;
pub mod inference;
pub mod observer;
