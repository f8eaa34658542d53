//! Field-level merge of phase fragments and fallback data.
//!
//! Every profile field belongs to exactly one phase's category, so the
//! order candidates arrive in never changes the outcome. Each merged field
//! is tagged with the source it came from.

use std::collections::{BTreeMap, BTreeSet};
use tracing::{debug, warn};

use crate::types::phase::{FieldSource, Phase};
use crate::types::profile::{ExtractedBusinessInfo, ProfileField};

/// Page metadata. No phase produces these; they always come from fallback.
pub const METADATA_FIELDS: [ProfileField; 3] = [
    ProfileField::SiteTitle,
    ProfileField::SiteDescription,
    ProfileField::Favicon,
];

/// Profile fields owned by a phase's category.
pub fn category_fields(phase: Phase) -> &'static [ProfileField] {
    match phase {
        Phase::Brand => &[
            ProfileField::BrandColors,
            ProfileField::Fonts,
            ProfileField::Typography,
            ProfileField::DesignTokens,
            ProfileField::LogoUrl,
        ],
        Phase::Contact => &[ProfileField::ContactInfo],
        Phase::Content => &[
            ProfileField::Tagline,
            ProfileField::BusinessDescription,
            ProfileField::KeyFeatures,
            ProfileField::Hero,
        ],
        Phase::SocialProof => &[ProfileField::StructuredContent],
        Phase::Images => &[ProfileField::Images, ProfileField::Galleries],
        Phase::SocialMedia => &[ProfileField::SocialMedia],
    }
}

/// One settled inference phase, reduced to what the merge needs.
#[derive(Debug, Clone, PartialEq)]
pub struct Candidate {
    pub phase: Phase,
    /// Profile fields built from the phase payload
    pub fragment: ExtractedBusinessInfo,
    pub confidence: f32,
    /// Passed the phase's confidence and minimum-data gate
    pub accepted: bool,
}

/// Result of [`merge`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Merged {
    pub info: ExtractedBusinessInfo,
    pub provenance: BTreeMap<ProfileField, FieldSource>,

    /// Phases whose category was sourced from fallback instead
    pub substituted: BTreeSet<Phase>,

    pub warnings: Vec<String>,
}

impl Merged {
    /// Whether any category field came from the algorithmic extractor.
    pub fn used_fallback(&self) -> bool {
        self.provenance
            .iter()
            .any(|(field, source)| !METADATA_FIELDS.contains(field) && *source == FieldSource::Fallback)
    }
}

/// Merge phase candidates with the fallback profile.
///
/// Per category:
/// - an accepted candidate at or above `prefer_inference` supplies the
///   category;
/// - an accepted candidate below it supplies the category only when
///   fallback found nothing for it;
/// - otherwise fallback supplies the category.
///
/// Fields the winning candidate left empty are filled from fallback one
/// by one. Inside structured content, empty parts (footer, hours, ...) are
/// filled the same way; the field keeps the winner's provenance. A phase with no candidate (inference off) is sourced from
/// fallback without a warning. At most one candidate per phase is
/// expected; with duplicates the most confident accepted one counts.
pub fn merge(
    candidates: Vec<Candidate>,
    mut fallback: ExtractedBusinessInfo,
    prefer_inference: f32,
) -> Merged {
    let mut by_phase: BTreeMap<Phase, Candidate> = BTreeMap::new();
    for candidate in candidates {
        match by_phase.get(&candidate.phase) {
            Some(existing) if rank(existing) >= rank(&candidate) => {}
            _ => {
                by_phase.insert(candidate.phase, candidate);
            }
        }
    }

    let mut merged = Merged::default();

    for field in METADATA_FIELDS {
        if field.transfer(&mut fallback, &mut merged.info) {
            merged.provenance.insert(field, FieldSource::Fallback);
        }
    }

    for phase in Phase::ALL {
        let fields = category_fields(phase);
        let fallback_has_data = fields.iter().any(|f| f.is_present(&fallback));

        match by_phase.remove(&phase) {
            Some(mut candidate)
                if candidate.accepted
                    && (candidate.confidence >= prefer_inference || !fallback_has_data) =>
            {
                for field in fields {
                    if field.transfer(&mut candidate.fragment, &mut merged.info) {
                        merged.provenance.insert(*field, FieldSource::Inference(phase));
                        if field.fill_parts(&mut fallback, &mut merged.info) {
                            debug!(phase = phase.label(), field = %field, "Empty parts filled from fallback");
                        }
                    } else if field.transfer(&mut fallback, &mut merged.info) {
                        merged.provenance.insert(*field, FieldSource::Fallback);
                    }
                }
            }
            attempted => {
                let mut filled = false;
                for field in fields {
                    if field.transfer(&mut fallback, &mut merged.info) {
                        merged.provenance.insert(*field, FieldSource::Fallback);
                        filled = true;
                    }
                }

                let Some(candidate) = attempted else {
                    continue;
                };
                merged.substituted.insert(phase);

                let reason = if candidate.accepted {
                    format!(
                        "confidence {:.2} below preference {:.2}",
                        candidate.confidence, prefer_inference
                    )
                } else {
                    "result rejected".to_string()
                };
                let warning = if filled {
                    format!("{} {}, {} fields taken from fallback", phase.label(), reason, phase.name())
                } else {
                    format!("{} {}, fallback found no {} data", phase.label(), reason, phase.name())
                };
                warn!(phase = phase.label(), filled = filled, "{}", warning);
                merged.warnings.push(warning);
            }
        }
    }

    merged
}

/// Ordering key for duplicate candidates of one phase.
fn rank(candidate: &Candidate) -> (bool, u32) {
    // f32 has no total order; compare scaled confidence instead
    (candidate.accepted, (candidate.confidence * 1_000_000.0) as u32)
}
