//! Phase 2b: copy and hero section.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use super::{dedupe_strings, prompts, PhaseSpec};
use crate::links;
use crate::preprocess::ReduceMode;
use crate::types::phase::Phase;
use crate::types::profile::{non_blank, non_empty, ExtractedBusinessInfo, HeroSection};

/// Most key features kept from one extraction.
const MAX_KEY_FEATURES: usize = 8;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ContentExtraction {
    pub tagline: Option<String>,
    pub business_description: Option<String>,
    #[serde(default)]
    pub key_features: Vec<String>,
    pub hero: Option<HeroSection>,
}

pub struct ContentPhase;

impl PhaseSpec for ContentPhase {
    const PHASE: Phase = Phase::Content;
    const MODE: ReduceMode = ReduceMode::Text;
    const INSTRUCTIONS: &'static str = prompts::CONTENT_PROMPT;
    type Payload = ContentExtraction;

    fn has_minimum_data(data: &ContentExtraction) -> bool {
        let filled = |s: &Option<String>| s.as_deref().is_some_and(|s| !s.trim().is_empty());
        filled(&data.tagline)
            || filled(&data.business_description)
            || data.hero.as_ref().is_some_and(|h| filled(&h.headline))
    }

    fn into_fragment(data: ContentExtraction, base_url: &str) -> ExtractedBusinessInfo {
        let mut features = dedupe_strings(data.key_features);
        features.truncate(MAX_KEY_FEATURES);

        ExtractedBusinessInfo {
            tagline: non_blank(data.tagline),
            business_description: non_blank(data.business_description),
            key_features: non_empty(features),
            hero: data.hero.map(|h| normalize_hero(h, base_url)).filter(|h| !h.is_empty()),
            ..Default::default()
        }
    }
}

/// Trim text and resolve link and image URLs of a hero block.
pub(crate) fn normalize_hero(hero: HeroSection, base_url: &str) -> HeroSection {
    HeroSection {
        headline: non_blank(hero.headline),
        subheadline: non_blank(hero.subheadline),
        cta_text: non_blank(hero.cta_text),
        cta_link: non_blank(hero.cta_link).and_then(|href| {
            // Keep in-page anchors and tel/mailto CTAs as written
            links::resolve(base_url, &href).or(Some(href))
        }),
        background_image: non_blank(hero.background_image)
            .and_then(|src| links::resolve(base_url, &src)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gate_accepts_any_copy() {
        assert!(!ContentPhase::has_minimum_data(&ContentExtraction::default()));

        let headline_only = ContentExtraction {
            hero: Some(HeroSection {
                headline: Some("Fresh flowers daily".into()),
                ..Default::default()
            }),
            ..Default::default()
        };
        assert!(ContentPhase::has_minimum_data(&headline_only));

        let blank = ContentExtraction {
            tagline: Some("   ".into()),
            ..Default::default()
        };
        assert!(!ContentPhase::has_minimum_data(&blank));
    }

    #[test]
    fn test_fragment_resolves_hero_urls() {
        let data = ContentExtraction {
            tagline: Some(" Local blooms ".into()),
            key_features: vec!["Same-day delivery".into(), "same-day delivery".into()],
            hero: Some(HeroSection {
                headline: Some("Acme Flowers".into()),
                cta_text: Some("Order".into()),
                cta_link: Some("/shop".into()),
                background_image: Some("img/hero.jpg".into()),
                ..Default::default()
            }),
            ..Default::default()
        };

        let info = ContentPhase::into_fragment(data, "https://acme.test/");
        assert_eq!(info.tagline.as_deref(), Some("Local blooms"));
        assert_eq!(info.key_features.as_ref().map(Vec::len), Some(1));
        let hero = info.hero.unwrap();
        assert_eq!(hero.cta_link.as_deref(), Some("https://acme.test/shop"));
        assert_eq!(hero.background_image.as_deref(), Some("https://acme.test/img/hero.jpg"));
        assert!(info.business_description.is_none());
    }
}
