//! Run orchestration: fan-out over phases, merge, page context and summary.
//!
//! ```text
//! Init -> PreconditionCheck -> {ParallelExtraction | FallbackOnly} -> Merge -> Summarize -> Done
//! ```

pub mod merge;
pub mod orchestrator;
pub mod pages;
pub mod summary;

pub use merge::{category_fields, merge, Candidate, Merged, METADATA_FIELDS};
pub use orchestrator::Analyzer;
pub use pages::{page_contents, recommended_pages};
pub use summary::content_summary;
