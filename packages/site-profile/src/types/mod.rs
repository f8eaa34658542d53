//! Domain types for site profile extraction.

pub mod config;
pub mod page;
pub mod phase;
pub mod profile;
pub mod result;
