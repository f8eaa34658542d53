//! Phase 1: visual brand analysis.

use lazy_static::lazy_static;
use regex::Regex;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use super::{dedupe_strings, prompts, PhaseSpec};
use crate::links;
use crate::preprocess::ReduceMode;
use crate::types::phase::Phase;
use crate::types::profile::{non_blank, non_empty, DesignTokens, ExtractedBusinessInfo, Typography};

/// Brand identity as read from the homepage markup and CSS.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct BrandAnalysis {
    /// Hex colors, most prominent first
    #[serde(default)]
    pub brand_colors: Vec<String>,
    #[serde(default)]
    pub fonts: Vec<String>,
    pub typography: Option<Typography>,
    pub design_tokens: Option<DesignTokens>,
    pub logo_url: Option<String>,
}

pub struct BrandPhase;

impl PhaseSpec for BrandPhase {
    const PHASE: Phase = Phase::Brand;
    const MODE: ReduceMode = ReduceMode::Visual;
    const INSTRUCTIONS: &'static str = prompts::BRAND_PROMPT;
    type Payload = BrandAnalysis;

    fn has_minimum_data(data: &BrandAnalysis) -> bool {
        data.brand_colors.iter().any(|c| normalize_hex(c).is_some())
    }

    fn into_fragment(data: BrandAnalysis, base_url: &str) -> ExtractedBusinessInfo {
        let colors = dedupe_strings(data.brand_colors.iter().filter_map(|c| normalize_hex(c)).collect());

        ExtractedBusinessInfo {
            brand_colors: non_empty(colors),
            fonts: non_empty(dedupe_strings(data.fonts)),
            typography: data.typography.filter(|t| !t.is_empty()),
            design_tokens: data.design_tokens.filter(|t| !t.is_empty()),
            logo_url: non_blank(data.logo_url).and_then(|href| links::resolve(base_url, &href)),
            ..Default::default()
        }
    }
}

lazy_static! {
    static ref HEX_COLOR: Regex = Regex::new(r"^#?([0-9a-fA-F]{3}|[0-9a-fA-F]{6})$").unwrap();
}

/// Lowercase `#rrggbb` form of a hex color, expanding the 3-digit form.
pub(crate) fn normalize_hex(color: &str) -> Option<String> {
    let caps = HEX_COLOR.captures(color.trim())?;
    let digits = caps.get(1)?.as_str().to_ascii_lowercase();
    if digits.len() == 3 {
        let expanded: String = digits.chars().flat_map(|c| [c, c]).collect();
        Some(format!("#{}", expanded))
    } else {
        Some(format!("#{}", digits))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_hex() {
        assert_eq!(normalize_hex("#FFF").as_deref(), Some("#ffffff"));
        assert_eq!(normalize_hex(" 1a2B3c ").as_deref(), Some("#1a2b3c"));
        assert_eq!(normalize_hex("rgb(0,0,0)"), None);
        assert_eq!(normalize_hex("#12345"), None);
    }

    #[test]
    fn test_gate_requires_a_color() {
        let mut data = BrandAnalysis::default();
        assert!(!BrandPhase::has_minimum_data(&data));
        data.brand_colors.push("blue".into());
        assert!(!BrandPhase::has_minimum_data(&data));
        data.brand_colors.push("#0000ff".into());
        assert!(BrandPhase::has_minimum_data(&data));
    }

    #[test]
    fn test_fragment_resolves_logo_and_dedupes() {
        let data = BrandAnalysis {
            brand_colors: vec!["#112233".into(), "#112233".into(), "#ABC".into()],
            fonts: vec!["Lato".into()],
            typography: Some(Typography::default()),
            design_tokens: None,
            logo_url: Some("/img/logo.svg".into()),
        };

        let info = BrandPhase::into_fragment(data, "https://acme.test");
        assert_eq!(
            info.brand_colors,
            Some(vec!["#112233".to_string(), "#aabbcc".to_string()])
        );
        assert_eq!(info.logo_url.as_deref(), Some("https://acme.test/img/logo.svg"));
        assert!(info.typography.is_none());
        assert!(info.contact_info.is_none());
    }
}
