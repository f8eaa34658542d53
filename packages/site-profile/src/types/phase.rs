//! Phase identifiers and provenance tags.

use serde::{Deserialize, Serialize};
use std::fmt;

/// One inference-backed extraction phase.
///
/// `Brand` is the visual phase 1; the others are the independent phase 2
/// extractors (2a through 2e, in declaration order).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    Brand,
    Contact,
    Content,
    SocialProof,
    Images,
    SocialMedia,
}

impl Phase {
    pub const ALL: [Phase; 6] = [
        Self::Brand,
        Self::Contact,
        Self::Content,
        Self::SocialProof,
        Self::Images,
        Self::SocialMedia,
    ];

    /// Short stage label ("phase1", "phase2a", ...).
    pub fn label(&self) -> &'static str {
        match self {
            Self::Brand => "phase1",
            Self::Contact => "phase2a",
            Self::Content => "phase2b",
            Self::SocialProof => "phase2c",
            Self::Images => "phase2d",
            Self::SocialMedia => "phase2e",
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Brand => "brand",
            Self::Contact => "contact",
            Self::Content => "content",
            Self::SocialProof => "social_proof",
            Self::Images => "images",
            Self::SocialMedia => "social_media",
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.label(), self.name())
    }
}

/// Where a merged profile field came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind", content = "phase")]
pub enum FieldSource {
    /// Accepted inference result of the given phase
    Inference(Phase),
    /// The algorithmic extractor
    Fallback,
}

impl fmt::Display for FieldSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Inference(phase) => f.write_str(phase.label()),
            Self::Fallback => f.write_str("fallback"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_labels_are_distinct() {
        let mut labels: Vec<_> = Phase::ALL.iter().map(|p| p.label()).collect();
        labels.sort();
        labels.dedup();
        assert_eq!(labels.len(), Phase::ALL.len());
    }

    #[test]
    fn test_source_display() {
        assert_eq!(FieldSource::Inference(Phase::Images).to_string(), "phase2d");
        assert_eq!(FieldSource::Fallback.to_string(), "fallback");
    }
}
