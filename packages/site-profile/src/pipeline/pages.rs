//! Page-scoped context: cleaned text of secondary pages and the list of
//! pages the generator should build.

use std::collections::{BTreeMap, BTreeSet};
use tracing::debug;

use crate::preprocess::clean_text;
use crate::types::config::PreprocessLimits;
use crate::types::page::{DiscoveredPage, PageType, RecommendedPage};

/// Cleaned text of every non-homepage page, keyed by page type.
///
/// Pages whose text is shorter than `page_text_min_chars` are dropped.
/// Several pages of one type are joined with a blank line, in input order.
pub fn page_contents(pages: &[DiscoveredPage], limits: &PreprocessLimits) -> BTreeMap<PageType, String> {
    let mut contents: BTreeMap<PageType, String> = BTreeMap::new();

    for page in pages.iter().filter(|p| p.page_type != PageType::Homepage) {
        let text = clean_text(&page.html, limits);
        let chars = text.chars().count();
        if chars < limits.page_text_min_chars {
            debug!(url = %page.url, chars = chars, "Page text too short, skipped");
            continue;
        }

        contents
            .entry(page.page_type)
            .and_modify(|existing| {
                existing.push_str("\n\n");
                existing.push_str(&text);
            })
            .or_insert(text);
    }

    contents
}

/// Pages to generate, in canonical order without duplicates.
///
/// Always contains home, about and contact.
pub fn recommended_pages(pages: &[DiscoveredPage]) -> Vec<RecommendedPage> {
    let mut recommended: BTreeSet<RecommendedPage> = RecommendedPage::REQUIRED.into_iter().collect();
    recommended.extend(pages.iter().filter_map(|p| p.page_type.recommended()));
    recommended.into_iter().collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const LONG_ABOUT: &str = "<main><p>Acme Flowers was founded in 1998 by two sisters who loved peonies.</p></main>";

    fn page(page_type: PageType, html: &str) -> DiscoveredPage {
        DiscoveredPage::new(format!("https://acme.test/{}", page_type), page_type, html)
    }

    #[test]
    fn test_required_pages_always_present() {
        let pages = vec![DiscoveredPage::homepage("https://acme.test", "<p>hi</p>")];
        assert_eq!(
            recommended_pages(&pages),
            vec![RecommendedPage::Home, RecommendedPage::About, RecommendedPage::Contact]
        );
    }

    #[test]
    fn test_discovered_pages_canonical_order() {
        let pages = vec![
            page(PageType::Faq, ""),
            page(PageType::Other, ""),
            page(PageType::Services, ""),
            page(PageType::Services, ""),
            DiscoveredPage::homepage("https://acme.test", ""),
        ];
        assert_eq!(
            recommended_pages(&pages),
            vec![
                RecommendedPage::Home,
                RecommendedPage::About,
                RecommendedPage::Contact,
                RecommendedPage::Services,
                RecommendedPage::Faq,
            ]
        );
    }

    #[test]
    fn test_homepage_and_short_pages_excluded() {
        let pages = vec![
            DiscoveredPage::homepage("https://acme.test", LONG_ABOUT),
            page(PageType::About, LONG_ABOUT),
            page(PageType::Contact, "<p>Call us</p>"),
        ];

        let contents = page_contents(&pages, &PreprocessLimits::default());
        assert_eq!(contents.len(), 1);
        assert!(contents[&PageType::About].starts_with("Acme Flowers was founded"));
        assert!(!contents.contains_key(&PageType::Homepage));
    }

    #[test]
    fn test_same_type_pages_joined() {
        let pages = vec![
            page(PageType::Other, LONG_ABOUT),
            page(
                PageType::Other,
                "<main><p>Our greenhouse in St Paul grows tulips, lilies and seasonal greens.</p></main>",
            ),
        ];

        let contents = page_contents(&pages, &PreprocessLimits::default());
        let other = &contents[&PageType::Other];
        assert!(other.contains("peonies.\n\nOur greenhouse"));
    }
}
