//! Phase 2e: social media profiles.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use super::contact::normalize_social_links;
use super::{prompts, PhaseSpec};
use crate::preprocess::ReduceMode;
use crate::types::phase::Phase;
use crate::types::profile::{non_empty, ExtractedBusinessInfo, SocialLink};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct SocialMediaExtraction {
    #[serde(default)]
    pub profiles: Vec<SocialLink>,
}

pub struct SocialMediaPhase;

impl PhaseSpec for SocialMediaPhase {
    const PHASE: Phase = Phase::SocialMedia;
    const MODE: ReduceMode = ReduceMode::Image;
    const INSTRUCTIONS: &'static str = prompts::SOCIAL_MEDIA_PROMPT;
    type Payload = SocialMediaExtraction;

    fn has_minimum_data(data: &SocialMediaExtraction) -> bool {
        data.profiles.iter().any(|p| !p.url.trim().is_empty())
    }

    fn into_fragment(data: SocialMediaExtraction, base_url: &str) -> ExtractedBusinessInfo {
        ExtractedBusinessInfo {
            social_media: non_empty(normalize_social_links(data.profiles, base_url)),
            ..Default::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fragment_uses_host_platform_name() {
        let data = SocialMediaExtraction {
            profiles: vec![
                SocialLink {
                    platform: "Twitter".into(),
                    url: "https://twitter.com/acmeflowers".into(),
                },
                SocialLink {
                    platform: "facebook".into(),
                    url: "javascript:void(0)".into(),
                },
            ],
        };

        let info = SocialMediaPhase::into_fragment(data, "https://acme.test");
        let profiles = info.social_media.unwrap();
        assert_eq!(profiles.len(), 1);
        assert_eq!(profiles[0].platform, "x");
    }

    #[test]
    fn test_empty_profiles_fail_gate() {
        assert!(!SocialMediaPhase::has_minimum_data(&SocialMediaExtraction::default()));
    }
}
