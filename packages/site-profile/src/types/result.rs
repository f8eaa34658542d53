//! Run outputs - phase envelopes, run metadata and the final deliverable.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use uuid::Uuid;

use crate::types::{
    page::{PageType, RecommendedPage},
    phase::{FieldSource, Phase},
    profile::{ExtractedBusinessInfo, ProfileField},
};

/// Uniform envelope returned by every phase, whichever path produced it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PhaseResult<T> {
    /// Parsed payload. `T::default()` when no response could be parsed.
    pub data: T,

    /// Self-reported confidence, 0..=1. Missing confidence counts as 0.
    pub confidence: f32,

    /// Passed the phase's minimum-data gate
    pub succeeded: bool,

    /// Data came from the algorithmic extractor
    pub used_fallback: bool,

    /// Why the phase call failed
    #[serde(default)]
    pub errors: Vec<String>,

    /// Why a parsed result was rejected by the gate
    #[serde(default)]
    pub warnings: Vec<String>,

    /// Wall-clock time including retries and backoff
    pub duration_ms: u64,

    /// Calls issued to the gateway
    pub attempts: u32,

    /// Token usage summed over all attempts that returned
    #[serde(default)]
    pub prompt_tokens: u32,
    #[serde(default)]
    pub completion_tokens: u32,
}

impl<T: Default> PhaseResult<T> {
    /// A phase that produced nothing usable.
    pub fn failed(error: impl Into<String>, attempts: u32, duration_ms: u64) -> Self {
        Self {
            data: T::default(),
            confidence: 0.0,
            succeeded: false,
            used_fallback: false,
            errors: vec![error.into()],
            warnings: Vec::new(),
            duration_ms,
            attempts,
            prompt_tokens: 0,
            completion_tokens: 0,
        }
    }
}

impl<T> PhaseResult<T> {
    /// Drop the payload, keeping the bookkeeping.
    pub fn report(&self, phase: Phase) -> PhaseReport {
        PhaseReport {
            phase,
            succeeded: self.succeeded,
            used_fallback: self.used_fallback,
            confidence: self.confidence,
            attempts: self.attempts,
            duration_ms: self.duration_ms,
            errors: self.errors.clone(),
            warnings: self.warnings.clone(),
        }
    }
}

/// Payload-free summary of one phase, kept in run metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PhaseReport {
    pub phase: Phase,
    pub succeeded: bool,
    pub used_fallback: bool,
    pub confidence: f32,
    pub attempts: u32,
    pub duration_ms: u64,
    #[serde(default)]
    pub errors: Vec<String>,
    #[serde(default)]
    pub warnings: Vec<String>,
}

/// Observability record for one run. Not business data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractionMetadata {
    pub run_id: Uuid,
    pub phase1_complete: bool,
    pub phase2a_complete: bool,
    pub phase2b_complete: bool,
    pub phase2c_complete: bool,
    pub phase2d_complete: bool,
    pub phase2e_complete: bool,

    /// A profile was produced
    pub success: bool,

    /// At least one category was sourced from the algorithmic extractor
    pub used_fallback: bool,

    pub duration_ms: u64,

    /// Estimated inference spend for the run
    pub estimated_cost_usd: f64,

    #[serde(default)]
    pub phases: Vec<PhaseReport>,

    /// Which source each merged field came from
    #[serde(default)]
    pub provenance: BTreeMap<ProfileField, FieldSource>,

    #[serde(default)]
    pub errors: Vec<String>,

    #[serde(default)]
    pub warnings: Vec<String>,
}

impl ExtractionMetadata {
    pub fn new(run_id: Uuid) -> Self {
        Self {
            run_id,
            phase1_complete: false,
            phase2a_complete: false,
            phase2b_complete: false,
            phase2c_complete: false,
            phase2d_complete: false,
            phase2e_complete: false,
            success: false,
            used_fallback: false,
            duration_ms: 0,
            estimated_cost_usd: 0.0,
            phases: Vec::new(),
            provenance: BTreeMap::new(),
            errors: Vec::new(),
            warnings: Vec::new(),
        }
    }

    /// Record whether a phase's inference result was accepted.
    pub fn mark_complete(&mut self, phase: Phase, complete: bool) {
        let slot = match phase {
            Phase::Brand => &mut self.phase1_complete,
            Phase::Contact => &mut self.phase2a_complete,
            Phase::Content => &mut self.phase2b_complete,
            Phase::SocialProof => &mut self.phase2c_complete,
            Phase::Images => &mut self.phase2d_complete,
            Phase::SocialMedia => &mut self.phase2e_complete,
        };
        *slot = complete;
    }

    pub fn is_complete(&self, phase: Phase) -> bool {
        match phase {
            Phase::Brand => self.phase1_complete,
            Phase::Contact => self.phase2a_complete,
            Phase::Content => self.phase2b_complete,
            Phase::SocialProof => self.phase2c_complete,
            Phase::Images => self.phase2d_complete,
            Phase::SocialMedia => self.phase2e_complete,
        }
    }
}

/// Final deliverable handed to the site generator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalyzedWebsite {
    pub base_url: String,
    pub business_info: ExtractedBusinessInfo,

    /// Cleaned text of non-homepage pages, keyed by page type
    pub page_contents: BTreeMap<PageType, String>,

    /// Pages to generate, canonical order, no duplicates, `home` first
    pub recommended_pages: Vec<RecommendedPage>,

    /// Plain-text digest for downstream prompts
    pub content_summary: String,
}

/// What [`Analyzer::analyze`](crate::pipeline::Analyzer::analyze) returns.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisOutcome {
    pub website: AnalyzedWebsite,
    pub metadata: ExtractionMetadata,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_failed_result_defaults() {
        let result: PhaseResult<Vec<String>> = PhaseResult::failed("timed out", 3, 1200);
        assert!(!result.succeeded);
        assert_eq!(result.confidence, 0.0);
        assert!(result.data.is_empty());
        assert_eq!(result.errors, vec!["timed out".to_string()]);
    }

    #[test]
    fn test_mark_complete_round_trips() {
        let mut meta = ExtractionMetadata::new(Uuid::now_v7());
        for phase in Phase::ALL {
            assert!(!meta.is_complete(phase));
            meta.mark_complete(phase, true);
            assert!(meta.is_complete(phase));
        }
        assert!(meta.phase2e_complete);
    }

    #[test]
    fn test_page_contents_serialize_with_type_keys() {
        let mut contents = BTreeMap::new();
        contents.insert(PageType::About, "We grow flowers".to_string());
        let json = serde_json::to_value(&contents).unwrap();
        assert_eq!(json["about"], "We grow flowers");
    }
}
