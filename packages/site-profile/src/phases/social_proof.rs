//! Phase 2c: services, testimonials, FAQ and other structured content.

use super::{dedupe_strings, prompts, PhaseSpec};
use crate::preprocess::ReduceMode;
use crate::types::phase::Phase;
use crate::types::profile::{non_blank, ExtractedBusinessInfo, FooterContent, StructuredContent};

pub struct SocialProofPhase;

impl PhaseSpec for SocialProofPhase {
    const PHASE: Phase = Phase::SocialProof;
    const MODE: ReduceMode = ReduceMode::PageText;
    const INSTRUCTIONS: &'static str = prompts::SOCIAL_PROOF_PROMPT;
    type Payload = StructuredContent;

    fn has_minimum_data(data: &StructuredContent) -> bool {
        data.has_social_proof()
    }

    fn into_fragment(data: StructuredContent, _base_url: &str) -> ExtractedBusinessInfo {
        let content = normalize_structured(data);
        ExtractedBusinessInfo {
            structured_content: (!content.is_empty()).then_some(content),
            ..Default::default()
        }
    }
}

/// Drop blank entries and clamp ratings.
pub(crate) fn normalize_structured(data: StructuredContent) -> StructuredContent {
    let mut services = data.services;
    services.retain(|s| !s.name.trim().is_empty());

    let mut testimonials = data.testimonials;
    testimonials.retain(|t| !t.quote.trim().is_empty());
    for t in &mut testimonials {
        t.rating = t.rating.filter(|r| r.is_finite()).map(|r| r.clamp(0.0, 5.0));
    }

    let mut faq = data.faq;
    faq.retain(|f| !f.question.trim().is_empty() && !f.answer.trim().is_empty());

    let footer = data
        .footer
        .map(|f| FooterContent {
            text: non_blank(f.text),
            copyright: non_blank(f.copyright),
            links: dedupe_strings(f.links),
        })
        .filter(|f| !f.is_empty());

    StructuredContent {
        services,
        testimonials,
        faq,
        hours: dedupe_strings(data.hours),
        footer,
    }
}
