//! Algorithmic fallback extractor trait.

use crate::types::profile::ExtractedBusinessInfo;

/// Deterministic, non-inference business profile extractor.
///
/// Fills the same [`ExtractedBusinessInfo`] fields the inference phases do,
/// so the orchestrator can substitute any category field by field. Must not
/// perform I/O.
pub trait FallbackExtractor: Send + Sync {
    fn extract_business_info(&self, html: &str, base_url: &str) -> ExtractedBusinessInfo;
}

impl<F> FallbackExtractor for F
where
    F: Fn(&str, &str) -> ExtractedBusinessInfo + Send + Sync,
{
    fn extract_business_info(&self, html: &str, base_url: &str) -> ExtractedBusinessInfo {
        self(html, base_url)
    }
}
