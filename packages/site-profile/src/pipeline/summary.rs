//! Plain-text digest of a site for downstream prompts.

use std::collections::BTreeMap;

use crate::preprocess::preview;
use crate::types::config::PreprocessLimits;
use crate::types::page::PageType;
use crate::types::profile::ExtractedBusinessInfo;

/// Key features listed in the summary.
const SUMMARY_FEATURES: usize = 5;

/// Build the content summary.
///
/// Profile highlights first, then one labeled preview per secondary page
/// type. The whole document is capped at `summary_max_chars`.
pub fn content_summary(
    info: &ExtractedBusinessInfo,
    page_contents: &BTreeMap<PageType, String>,
    limits: &PreprocessLimits,
) -> String {
    let mut lines: Vec<String> = Vec::new();
    let mut push = |label: &str, value: Option<&str>| {
        if let Some(value) = value.map(str::trim).filter(|v| !v.is_empty()) {
            lines.push(format!("{}: {}", label, value));
        }
    };

    push("Site", info.site_title.as_deref());
    if let Some(hero) = &info.hero {
        push("Headline", hero.headline.as_deref());
        push("Subheadline", hero.subheadline.as_deref());
        push("Call to action", hero.cta_text.as_deref());
    }
    push("Tagline", info.tagline.as_deref());
    push("Description", info.business_description.as_deref());

    if let Some(features) = info.key_features.as_ref().filter(|f| !f.is_empty()) {
        lines.push("Key features:".to_string());
        lines.extend(
            features
                .iter()
                .take(SUMMARY_FEATURES)
                .map(|f| format!("- {}", f.trim())),
        );
    }

    let mut sections = vec![lines.join("\n")];
    for (page_type, text) in page_contents {
        sections.push(format!(
            "[{}]\n{}",
            page_type,
            preview(text, limits.preview_chars)
        ));
    }

    let summary = sections
        .into_iter()
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join("\n\n");

    preview(&summary, limits.summary_max_chars)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::profile::HeroSection;

    fn info() -> ExtractedBusinessInfo {
        ExtractedBusinessInfo {
            site_title: Some("Acme Flowers".into()),
            hero: Some(HeroSection {
                headline: Some("Flowers for every day".into()),
                cta_text: Some("Order now".into()),
                ..Default::default()
            }),
            tagline: Some("Fresh every morning".into()),
            key_features: Some((1..=7).map(|i| format!("Feature {}", i)).collect()),
            ..Default::default()
        }
    }

    #[test]
    fn test_highlights_in_order() {
        let summary = content_summary(&info(), &BTreeMap::new(), &PreprocessLimits::default());
        assert_eq!(
            summary,
            "Site: Acme Flowers\nHeadline: Flowers for every day\nCall to action: Order now\n\
             Tagline: Fresh every morning\nKey features:\n- Feature 1\n- Feature 2\n\
             - Feature 3\n- Feature 4\n- Feature 5"
        );
    }

    #[test]
    fn test_page_previews_labeled_and_bounded() {
        let mut pages = BTreeMap::new();
        pages.insert(PageType::About, "word ".repeat(400));
        pages.insert(PageType::Faq, "Do you deliver? Yes, across the metro.".to_string());

        let limits = PreprocessLimits::default();
        let summary = content_summary(&ExtractedBusinessInfo::default(), &pages, &limits);

        let about = summary.split("\n\n").find(|s| s.starts_with("[about]")).unwrap();
        let preview_text = about.trim_start_matches("[about]\n");
        assert!(preview_text.chars().count() <= limits.preview_chars);
        assert!(preview_text.ends_with("..."));
        assert!(summary.contains("[faq]\nDo you deliver?"));
    }

    #[test]
    fn test_summary_capped() {
        let mut pages = BTreeMap::new();
        pages.insert(PageType::About, "a".repeat(1_000));
        pages.insert(PageType::Services, "b".repeat(1_000));
        let limits = PreprocessLimits {
            summary_max_chars: 300,
            ..Default::default()
        };

        let summary = content_summary(&info(), &pages, &limits);
        assert!(summary.chars().count() <= 300);
    }

    #[test]
    fn test_empty_profile_empty_summary() {
        let summary = content_summary(
            &ExtractedBusinessInfo::default(),
            &BTreeMap::new(),
            &PreprocessLimits::default(),
        );
        assert!(summary.is_empty());
    }
}
