//! Inference gateway implementations and schema helpers.

pub mod openai;
pub mod schema;

pub use openai::OpenAiGateway;
pub use schema::{phase_schema, strict_schema};
