//! Deterministic DOM-heuristic business profile extractor.
//!
//! [`HeuristicExtractor`] fills every [`ExtractedBusinessInfo`] category the
//! inference phases do, using CSS selectors, a few regexes and any JSON-LD
//! the page carries. No network access, no randomness: the same HTML always
//! gives the same profile.
//!
//! # Example
//!
//! ```rust
//! use site_profile::fallback::HeuristicExtractor;
//! use site_profile::traits::fallback::FallbackExtractor;
//!
//! let html = "<html><head><title>Acme Flowers</title></head>\
//!             <body><footer>Write to hello@acme.test</footer></body></html>";
//! let info = HeuristicExtractor::new().extract_business_info(html, "https://acme.test");
//!
//! assert_eq!(info.site_title.as_deref(), Some("Acme Flowers"));
//! assert_eq!(info.emails(), ["hello@acme.test".to_string()]);
//! ```

mod brand;
mod contact;
mod content;
mod jsonld;
mod media;

use scraper::{node::Node, ElementRef, Html, Selector};
use tracing::debug;

use crate::links;
use crate::preprocess::collapse_whitespace;
use crate::traits::fallback::FallbackExtractor;
use crate::types::profile::{non_blank, ExtractedBusinessInfo};

/// Elements whose text never counts as page copy.
const INVISIBLE: &[&str] = &["script", "style", "noscript", "template", "svg", "head"];

/// DOM-heuristic implementation of [`FallbackExtractor`].
#[derive(Debug, Clone, Copy, Default)]
pub struct HeuristicExtractor;

impl HeuristicExtractor {
    pub fn new() -> Self {
        Self
    }
}

impl FallbackExtractor for HeuristicExtractor {
    fn extract_business_info(&self, html: &str, base_url: &str) -> ExtractedBusinessInfo {
        let doc = Html::parse_document(html);
        let page = PageView::new(&doc, base_url);

        let brand = brand::extract(&page);
        let contact = contact::extract(&page);
        let copy = content::extract(&page);
        let media = media::extract(&page);

        let info = ExtractedBusinessInfo {
            site_title: site_title(&page),
            site_description: meta_description(&page),
            favicon: favicon(&page),
            tagline: copy.tagline,
            business_description: copy.business_description,
            key_features: copy.key_features,
            hero: copy.hero,
            brand_colors: brand.colors,
            fonts: brand.fonts,
            typography: brand.typography,
            design_tokens: None,
            logo_url: brand.logo_url,
            contact_info: contact,
            galleries: media.galleries,
            structured_content: copy.structured,
            images: media.images,
            social_media: media.social_media,
        };

        debug!(
            base_url = base_url,
            fields = info.present_fields().len(),
            "Heuristic extraction complete"
        );

        info
    }
}

/// A parsed page plus everything the heuristics share.
pub(crate) struct PageView<'a> {
    pub doc: &'a Html,
    pub base_url: &'a str,
    /// Visible text of the whole document, whitespace-collapsed
    pub text: String,
    /// Parsed JSON-LD objects, `@graph` flattened
    pub jsonld: Vec<serde_json::Map<String, serde_json::Value>>,
}

impl<'a> PageView<'a> {
    fn new(doc: &'a Html, base_url: &'a str) -> Self {
        let mut text = String::new();
        visible_text(doc.root_element(), &mut text);

        Self {
            doc,
            base_url,
            text: collapse_whitespace(&text),
            jsonld: jsonld::collect(doc),
        }
    }

    /// All elements matching `css`, in document order.
    pub fn select(&self, css: &str) -> Vec<ElementRef<'a>> {
        select_in(self.doc.root_element(), css)
    }

    /// First element matching `css`.
    pub fn first(&self, css: &str) -> Option<ElementRef<'a>> {
        self.select(css).into_iter().next()
    }

    /// `content` of the first matching `<meta>`, trimmed.
    pub fn meta(&self, css: &str) -> Option<String> {
        self.select(css)
            .into_iter()
            .find_map(|m| non_blank(m.value().attr("content").map(str::to_string)))
    }

    pub fn resolve(&self, href: &str) -> Option<String> {
        links::resolve(self.base_url, href)
    }
}

/// Elements under `root` matching `css`. An unparsable selector matches nothing.
pub(crate) fn select_in<'a>(root: ElementRef<'a>, css: &str) -> Vec<ElementRef<'a>> {
    match Selector::parse(css) {
        Ok(selector) => root.select(&selector).collect(),
        Err(_) => Vec::new(),
    }
}

/// Visible, whitespace-collapsed text of an element.
pub(crate) fn text_of(el: ElementRef<'_>) -> String {
    let mut out = String::new();
    visible_text(el, &mut out);
    collapse_whitespace(&out)
}

/// Lowercased `class` and `id` of an element, for marker matching.
pub(crate) fn markers(el: ElementRef<'_>) -> String {
    let value = el.value();
    format!(
        "{} {}",
        value.attr("class").unwrap_or_default(),
        value.attr("id").unwrap_or_default()
    )
    .to_lowercase()
}

/// Whether `el` or one of its ancestors carries any of `needles` in its
/// class or id.
pub(crate) fn within_marked(el: ElementRef<'_>, needles: &[&str]) -> bool {
    std::iter::once(el)
        .chain(el.ancestors().filter_map(ElementRef::wrap))
        .any(|e| {
            let m = markers(e);
            needles.iter().any(|n| m.contains(n))
        })
}

fn visible_text(el: ElementRef<'_>, out: &mut String) {
    for child in el.children() {
        match child.value() {
            Node::Text(text) => out.push_str(text),
            Node::Element(element) => {
                if INVISIBLE.contains(&element.name()) {
                    continue;
                }
                if let Some(child_el) = ElementRef::wrap(child) {
                    out.push(' ');
                    visible_text(child_el, out);
                    out.push(' ');
                }
            }
            _ => {}
        }
    }
}

fn site_title(page: &PageView<'_>) -> Option<String> {
    page.first("title")
        .and_then(|t| non_blank(Some(text_of_raw(t))))
        .or_else(|| page.meta("meta[property='og:title']"))
        .or_else(|| page.meta("meta[property='og:site_name']"))
}

/// `<title>` lives in `<head>`, which `text_of` treats as invisible.
fn text_of_raw(el: ElementRef<'_>) -> String {
    collapse_whitespace(&el.text().collect::<String>())
}

fn meta_description(page: &PageView<'_>) -> Option<String> {
    page.meta("meta[name='description']")
        .or_else(|| page.meta("meta[property='og:description']"))
}

fn favicon(page: &PageView<'_>) -> Option<String> {
    page.select("link[rel~='icon'], link[rel='apple-touch-icon']")
        .into_iter()
        .filter_map(|l| l.value().attr("href"))
        .find_map(|href| page.resolve(href))
}

#[cfg(test)]
mod tests {
    use super::*;

    const ACME: &str = r#"<!doctype html>
<html>
<head>
  <title>Acme Flowers</title>
  <meta name="description" content="Hand-tied bouquets delivered across Minneapolis.">
  <link rel="shortcut icon" href="/favicon.png">
</head>
<body>
  <main><h1>Fresh flowers, every day</h1></main>
  <footer>Questions? hello@acme.test</footer>
</body>
</html>"#;

    #[test]
    fn test_acme_example() {
        let info = HeuristicExtractor::new().extract_business_info(ACME, "https://acme.test");
        assert_eq!(info.site_title.as_deref(), Some("Acme Flowers"));
        assert_eq!(info.emails(), ["hello@acme.test".to_string()]);
        assert_eq!(info.favicon.as_deref(), Some("https://acme.test/favicon.png"));
        assert_eq!(
            info.site_description.as_deref(),
            Some("Hand-tied bouquets delivered across Minneapolis.")
        );
    }

    #[test]
    fn test_deterministic() {
        let extractor = HeuristicExtractor::new();
        let a = extractor.extract_business_info(ACME, "https://acme.test");
        let b = extractor.extract_business_info(ACME, "https://acme.test");
        assert_eq!(a, b);
    }

    #[test]
    fn test_empty_document_has_no_fields() {
        let info = HeuristicExtractor::new().extract_business_info("", "https://acme.test");
        assert!(info.present_fields().is_empty());
    }

    #[test]
    fn test_visible_text_skips_scripts() {
        let doc = Html::parse_document("<body><p>Hi</p><script>var x = 'a@b.co';</script></body>");
        let page = PageView::new(&doc, "https://acme.test");
        assert_eq!(page.text, "Hi");
    }

    #[test]
    fn test_within_marked() {
        let doc = Html::parse_document(r#"<div class="Hero-Banner"><p><img src="a.jpg"></p></div>"#);
        let page = PageView::new(&doc, "https://acme.test");
        let img = page.first("img").unwrap();
        assert!(within_marked(img, &["hero"]));
        assert!(!within_marked(img, &["gallery"]));
    }
}
