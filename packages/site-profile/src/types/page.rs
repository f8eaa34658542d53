//! Page types - discovered input pages and recommended output pages.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;

/// Classification assigned to a page by the crawler.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PageType {
    Homepage,
    About,
    Contact,
    Services,
    Team,
    Faq,
    Other,
}

impl PageType {
    /// Stable lowercase label, also used as the serde name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Homepage => "homepage",
            Self::About => "about",
            Self::Contact => "contact",
            Self::Services => "services",
            Self::Team => "team",
            Self::Faq => "faq",
            Self::Other => "other",
        }
    }

    /// The page the downstream generator should build for this type, if any.
    pub fn recommended(&self) -> Option<RecommendedPage> {
        match self {
            Self::Homepage => Some(RecommendedPage::Home),
            Self::About => Some(RecommendedPage::About),
            Self::Contact => Some(RecommendedPage::Contact),
            Self::Services => Some(RecommendedPage::Services),
            Self::Team => Some(RecommendedPage::Team),
            Self::Faq => Some(RecommendedPage::Faq),
            Self::Other => None,
        }
    }
}

impl fmt::Display for PageType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A page produced by the crawler. Immutable input to a run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiscoveredPage {
    /// URL the HTML was fetched from
    pub url: String,

    /// Crawler's classification of the page
    pub page_type: PageType,

    /// Raw HTML as fetched
    pub html: String,
}

impl DiscoveredPage {
    /// Create a new discovered page.
    pub fn new(url: impl Into<String>, page_type: PageType, html: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            page_type,
            html: html.into(),
        }
    }

    /// Create a homepage.
    pub fn homepage(url: impl Into<String>, html: impl Into<String>) -> Self {
        Self::new(url, PageType::Homepage, html)
    }

    /// SHA-256 of the raw HTML, hex encoded.
    pub fn content_hash(&self) -> String {
        let mut hasher = Sha256::new();
        hasher.update(self.html.as_bytes());
        format!("{:x}", hasher.finalize())
    }
}

/// Page kinds the downstream site generator can produce.
///
/// The derived ordering is the canonical ordering of
/// [`AnalyzedWebsite::recommended_pages`](crate::types::result::AnalyzedWebsite).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecommendedPage {
    Home,
    About,
    Contact,
    Services,
    Team,
    Faq,
}

impl RecommendedPage {
    /// Pages the generator needs whether or not they were discovered.
    pub const REQUIRED: [RecommendedPage; 3] = [Self::Home, Self::About, Self::Contact];
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_type_serde_names() {
        let json = serde_json::to_string(&PageType::Homepage).unwrap();
        assert_eq!(json, "\"homepage\"");
        let parsed: PageType = serde_json::from_str("\"faq\"").unwrap();
        assert_eq!(parsed, PageType::Faq);
    }

    #[test]
    fn test_recommended_ordering() {
        let mut pages = vec![
            RecommendedPage::Faq,
            RecommendedPage::Contact,
            RecommendedPage::Home,
            RecommendedPage::About,
        ];
        pages.sort();
        assert_eq!(
            pages,
            vec![
                RecommendedPage::Home,
                RecommendedPage::About,
                RecommendedPage::Contact,
                RecommendedPage::Faq
            ]
        );
    }

    #[test]
    fn test_other_has_no_recommendation() {
        assert_eq!(PageType::Other.recommended(), None);
        assert_eq!(PageType::Homepage.recommended(), Some(RecommendedPage::Home));
    }

    #[test]
    fn test_content_hash_is_stable() {
        let a = DiscoveredPage::homepage("https://a.test", "<html></html>");
        let b = DiscoveredPage::homepage("https://b.test", "<html></html>");
        assert_eq!(a.content_hash(), b.content_hash());
        assert_eq!(a.content_hash().len(), 64);
    }
}
