//! HTML reduction ahead of inference calls.
//!
//! Each phase gets a differently shaped, size-bounded view of the page:
//! - `Visual` keeps structural tags with class/style attributes and CSS
//! - `Text` keeps readable text from hero sections and the main content area
//! - `PageText` keeps readable text of the whole body, header and footer included
//! - `Image` keeps structure plus every attribute that can carry an image URL
//!
//! Everything here is pure. The same input always gives the same output.

use scraper::{node::Node, ElementRef, Html, Selector};

use crate::types::config::PreprocessLimits;

/// Shape of the reduced document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ReduceMode {
    Visual,
    Text,
    PageText,
    Image,
}

/// Elements dropped from every mode, with their content.
const ALWAYS_DROPPED: &[&str] = &["script", "noscript", "iframe", "template", "object", "embed"];

/// Extra elements dropped from main-content text.
const TEXT_DROPPED: &[&str] = &["style", "nav", "header", "footer", "svg", "form", "button", "select"];

/// Extra elements dropped from whole-page and hero text. Header, footer
/// and button text stay: contact details, hours and calls to action live there.
const PAGE_TEXT_DROPPED: &[&str] = &["style", "nav", "svg", "select"];

/// Hero and banner sections, kept ahead of the main content in `Text` mode.
const HERO_SELECTOR: &str = "[class*='hero'], [id*='hero'], [class*='banner'], [id*='banner'], [class*='jumbotron']";

/// Main-content containers, tried before falling back to `<body>`.
const MAIN_CANDIDATES: &[&str] = &["main", "[role='main']", "#content", ".content", "article"];

const BLOCK_TAGS: &[&str] = &[
    "address", "article", "aside", "blockquote", "br", "dd", "div", "dl", "dt", "figcaption",
    "figure", "h1", "h2", "h3", "h4", "h5", "h6", "hr", "li", "main", "ol", "p", "pre",
    "section", "table", "td", "th", "tr", "ul",
];

const VOID_TAGS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "source",
    "track", "wbr",
];

const VISUAL_ATTRS: &[&str] = &["class", "id", "style", "role", "src", "alt", "rel", "name", "content"];

const IMAGE_ATTRS: &[&str] = &[
    "class", "id", "style", "role", "src", "srcset", "data-src", "data-srcset", "data-bg",
    "alt", "title", "href", "rel", "name", "property", "content", "poster",
];

/// Longest text node kept in markup modes. Visual analysis cares about
/// structure, image analysis about captions.
const VISUAL_TEXT_NODE_CHARS: usize = 80;
const IMAGE_TEXT_NODE_CHARS: usize = 120;

/// Reduce `html` for the given mode, capped at that mode's byte limit.
pub fn reduce(html: &str, mode: ReduceMode, limits: &PreprocessLimits) -> String {
    let document = Html::parse_document(html);
    let cap = limits.max_bytes(mode);

    match mode {
        ReduceMode::Text => {
            let text = content_text(&document, limits.main_content_min_chars);
            truncate_text(&text, cap).to_string()
        }
        ReduceMode::PageText => {
            let text = page_text(&document);
            truncate_text(&text, cap).to_string()
        }
        ReduceMode::Visual | ReduceMode::Image => {
            let mut out = String::with_capacity(html.len().min(cap * 2));
            write_markup(document.root_element(), mode, &mut out);
            let normalized = collapse_whitespace(&out);
            truncate_markup(&normalized, cap).to_string()
        }
    }
}

/// Clean readable text of a page, capped at the text-mode byte limit.
///
/// Used for page-scoped context text kept alongside the profile.
pub fn clean_text(html: &str, limits: &PreprocessLimits) -> String {
    let document = Html::parse_document(html);
    let text = main_text(&document, limits.main_content_min_chars);
    truncate_text(&text, limits.text_max_bytes).to_string()
}

/// Shorten already-clean text to at most `max_chars` characters.
///
/// Cuts at the last word boundary when one is close, and marks the cut
/// with "...".
pub fn preview(text: &str, max_chars: usize) -> String {
    let text = text.trim();
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    if max_chars <= 3 {
        return text.chars().take(max_chars).collect();
    }

    let budget = max_chars - 3;
    let cut: String = text.chars().take(budget).collect();
    let trimmed = match cut.rfind(char::is_whitespace) {
        Some(idx) if idx >= cut.len() * 3 / 4 => cut[..idx].trim_end(),
        _ => cut.trim_end(),
    };
    format!("{}...", trimmed)
}

/// Hero and banner text not already part of the main content, followed
/// by the main content.
fn content_text(document: &Html, min_chars: usize) -> String {
    let main = main_text(document, min_chars);
    let mut sections: Vec<String> = Vec::new();

    if let Ok(selector) = Selector::parse(HERO_SELECTOR) {
        for element in document.select(&selector) {
            let text = element_text_keeping(element, PAGE_TEXT_DROPPED);
            if text.is_empty()
                || main.contains(&text)
                || sections.iter().any(|s| s.contains(&text))
            {
                continue;
            }
            sections.push(text);
        }
    }

    if !main.is_empty() {
        sections.push(main);
    }
    sections.join(" ")
}

/// Text of the whole `<body>`, page chrome included.
fn page_text(document: &Html) -> String {
    let body = Selector::parse("body")
        .ok()
        .and_then(|s| document.select(&s).next());
    let root = body.unwrap_or_else(|| document.root_element());
    element_text_keeping(root, PAGE_TEXT_DROPPED)
}

/// Text of the largest main-content candidate, or of `<body>`.
fn main_text(document: &Html, min_chars: usize) -> String {
    let mut best = String::new();
    let mut best_len = 0;

    for selector_str in MAIN_CANDIDATES {
        let Ok(selector) = Selector::parse(selector_str) else {
            continue;
        };
        for element in document.select(&selector) {
            let text = element_text(element);
            let len = text.chars().count();
            if len > best_len {
                best_len = len;
                best = text;
            }
        }
    }

    if best_len >= min_chars {
        return best;
    }

    let body = Selector::parse("body")
        .ok()
        .and_then(|s| document.select(&s).next());
    match body {
        Some(body) => element_text(body),
        None => element_text(document.root_element()),
    }
}

fn element_text(element: ElementRef<'_>) -> String {
    element_text_keeping(element, TEXT_DROPPED)
}

fn element_text_keeping(element: ElementRef<'_>, dropped: &[&str]) -> String {
    let mut out = String::new();
    collect_text(element, dropped, &mut out);
    collapse_whitespace(&out)
}

fn collect_text(element: ElementRef<'_>, dropped: &[&str], out: &mut String) {
    let el = element.value();
    let name = el.name();
    if ALWAYS_DROPPED.contains(&name) || dropped.contains(&name) || is_hidden(element) {
        return;
    }

    let block = BLOCK_TAGS.contains(&name);
    if block {
        out.push(' ');
    }

    for child in element.children() {
        match child.value() {
            Node::Text(text) => out.push_str(text),
            Node::Element(_) => {
                if let Some(child_el) = ElementRef::wrap(child) {
                    collect_text(child_el, dropped, out);
                }
            }
            _ => {}
        }
    }

    if block {
        out.push(' ');
    }
}

fn is_hidden(element: ElementRef<'_>) -> bool {
    let el = element.value();
    if el.attr("hidden").is_some() || el.attr("aria-hidden") == Some("true") {
        return true;
    }
    el.attr("style").is_some_and(|style| {
        let compact: String = style.chars().filter(|c| !c.is_whitespace()).collect();
        compact.to_ascii_lowercase().contains("display:none")
    })
}

/// Re-serialize `element` with only the attributes `mode` keeps.
fn write_markup(element: ElementRef<'_>, mode: ReduceMode, out: &mut String) {
    let el = element.value();
    let name = el.name();
    if ALWAYS_DROPPED.contains(&name) {
        return;
    }
    // Inline SVG is mostly path data
    if name == "svg" {
        out.push_str("<svg/>");
        return;
    }

    let mut attrs: Vec<(&str, &str)> = el
        .attrs()
        .filter(|(attr, _)| keeps_attr(mode, name, attr))
        .collect();
    attrs.sort_unstable();

    out.push('<');
    out.push_str(name);
    for (attr, value) in attrs {
        out.push(' ');
        out.push_str(attr);
        out.push_str("=\"");
        escape_into(value, true, out);
        out.push('"');
    }
    out.push('>');

    if VOID_TAGS.contains(&name) {
        return;
    }

    let text_limit = match mode {
        ReduceMode::Visual => VISUAL_TEXT_NODE_CHARS,
        _ => IMAGE_TEXT_NODE_CHARS,
    };

    for child in element.children() {
        match child.value() {
            Node::Text(text) if name == "style" => escape_into(text, false, out),
            Node::Text(text) => {
                let trimmed = text.trim();
                if trimmed.is_empty() {
                    out.push(' ');
                } else {
                    let clipped: String = trimmed.chars().take(text_limit).collect();
                    escape_into(&clipped, false, out);
                }
            }
            Node::Element(_) => {
                if let Some(child_el) = ElementRef::wrap(child) {
                    write_markup(child_el, mode, out);
                }
            }
            _ => {}
        }
    }

    out.push_str("</");
    out.push_str(name);
    out.push('>');
}

fn keeps_attr(mode: ReduceMode, tag: &str, attr: &str) -> bool {
    match mode {
        ReduceMode::Visual => VISUAL_ATTRS.contains(&attr) || (tag == "link" && attr == "href"),
        ReduceMode::Image => IMAGE_ATTRS.contains(&attr),
        ReduceMode::Text | ReduceMode::PageText => false,
    }
}

fn escape_into(s: &str, attribute: bool, out: &mut String) {
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' if attribute => out.push_str("&quot;"),
            _ => out.push(c),
        }
    }
}

/// Collapse every whitespace run to one space and trim the ends.
pub fn collapse_whitespace(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut pending_space = false;
    for c in s.chars() {
        if c.is_whitespace() {
            pending_space = !out.is_empty();
        } else {
            if pending_space {
                out.push(' ');
                pending_space = false;
            }
            out.push(c);
        }
    }
    out
}

/// Largest char boundary not above `max`.
fn floor_boundary(s: &str, max: usize) -> usize {
    if max >= s.len() {
        return s.len();
    }
    let mut end = max;
    while end > 0 && !s.is_char_boundary(end) {
        end -= 1;
    }
    end
}

/// Cut text to at most `max_bytes` without splitting a character.
pub fn truncate_text(s: &str, max_bytes: usize) -> &str {
    let end = floor_boundary(s, max_bytes);
    s[..end].trim_end()
}

/// Cut markup to at most `max_bytes` without splitting a character or
/// leaving a tag half-written.
pub fn truncate_markup(s: &str, max_bytes: usize) -> &str {
    if s.len() <= max_bytes {
        return s;
    }
    let mut end = floor_boundary(s, max_bytes);
    let head = &s[..end];
    if let Some(open) = head.rfind('<') {
        if !head[open..].contains('>') {
            end = open;
        }
    }
    s[..end].trim_end()
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn limits() -> PreprocessLimits {
        PreprocessLimits::default()
    }

    const PAGE: &str = r#"
        <html>
          <head>
            <title>Acme Flowers</title>
            <style>.hero { background: #c0ffee; }</style>
            <script>var tracking = "secret";</script>
          </head>
          <body>
            <header class="site-header"><nav>Home About Contact</nav></header>
            <main class="main" data-x="1">
              <h1 class="hero" style="color: #123456">Fresh flowers daily</h1>
              <p>We deliver   hand-tied bouquets
              across the city every morning, seven days a week, rain or shine.</p>
              <img src="/img/shop.jpg" srcset="/img/shop@2x.jpg 2x" alt="Our shop">
            </main>
            <footer>hello@acme.test</footer>
          </body>
        </html>
    "#;

    #[test]
    fn test_text_mode_strips_chrome() {
        let text = reduce(PAGE, ReduceMode::Text, &limits());
        assert!(text.contains("Fresh flowers daily"));
        assert!(text.contains("We deliver hand-tied bouquets across the city"));
        assert!(!text.contains("tracking"));
        assert!(!text.contains("Home About Contact"));
        assert!(!text.contains("hello@acme.test"));
        assert!(!text.contains("#c0ffee"));
    }

    const STOREFRONT: &str = r#"
        <html><body>
          <header><a href="/">Acme</a><nav>Home About</nav></header>
          <section class="hero-banner">
            <h1>Flowers for every day</h1>
            <a class="button" href="/order">Order today</a>
          </section>
          <main>
            <p>Acme Flowers is a family-run florist in Minneapolis. We design seasonal
            arrangements for weddings, birthdays and quiet Tuesdays alike.</p>
          </main>
          <footer>
            <p>Open Mon-Sat 9am-6pm</p>
            <p>Write to hello@acme.test or call (612) 555-0142</p>
            <p>&copy; 2024 Acme Flowers</p>
          </footer>
        </body></html>
    "#;

    #[test]
    fn test_text_mode_keeps_hero_outside_main() {
        let text = reduce(STOREFRONT, ReduceMode::Text, &limits());
        assert!(text.starts_with("Flowers for every day"));
        assert!(text.contains("Order today"));
        assert!(text.contains("family-run florist"));
        assert!(!text.contains("hello@acme.test"));
    }

    #[test]
    fn test_text_mode_does_not_repeat_hero_inside_main() {
        let text = reduce(PAGE, ReduceMode::Text, &limits());
        assert_eq!(text.matches("Fresh flowers daily").count(), 1);
    }

    #[test]
    fn test_page_text_keeps_header_and_footer() {
        let text = reduce(STOREFRONT, ReduceMode::PageText, &limits());
        assert!(text.contains("hello@acme.test"));
        assert!(text.contains("(612) 555-0142"));
        assert!(text.contains("Open Mon-Sat 9am-6pm"));
        assert!(text.contains("\u{a9} 2024 Acme Flowers"));
        assert!(text.contains("Flowers for every day"));
        assert!(text.contains("family-run florist"));
        assert!(!text.contains("Home About"));
    }

    #[test]
    fn test_text_mode_falls_back_to_body_for_small_main() {
        let html = r#"<body><main>Tiny</main><div>Body text that is outside the main element</div></body>"#;
        let text = reduce(html, ReduceMode::Text, &limits());
        assert!(text.contains("Tiny"));
        assert!(text.contains("Body text that is outside"));
    }

    #[test]
    fn test_text_mode_prefers_largest_candidate() {
        let long = "word ".repeat(40);
        let html = format!(
            r#"<body><article>{long}</article><div class="content">short content</div><p>sidebar</p></body>"#
        );
        let text = reduce(&html, ReduceMode::Text, &limits());
        assert!(text.starts_with("word word"));
        assert!(!text.contains("sidebar"));
    }

    #[test]
    fn test_text_mode_skips_hidden() {
        let html = r#"<body><p>shown</p><p hidden>gone</p><div style="display: none">also gone</div></body>"#;
        let text = reduce(html, ReduceMode::Text, &limits());
        assert_eq!(text, "shown");
    }

    #[test]
    fn test_visual_mode_keeps_structure_and_styles() {
        let out = reduce(PAGE, ReduceMode::Visual, &limits());
        assert!(out.contains(r#"<h1 class="hero" style="color: #123456">"#));
        assert!(out.contains("#c0ffee"));
        assert!(out.contains(r#"<img alt="Our shop" src="/img/shop.jpg">"#));
        assert!(!out.contains("data-x"));
        assert!(!out.contains("srcset"));
        assert!(!out.contains("tracking"));
    }

    #[test]
    fn test_image_mode_keeps_srcset() {
        let out = reduce(PAGE, ReduceMode::Image, &limits());
        assert!(out.contains("srcset=\"/img/shop@2x.jpg 2x\""));
    }

    #[test]
    fn test_markup_truncation_does_not_split_tag() {
        let s = "<div class=\"a\">hello</div><span class=\"b\">world</span>";
        let cut = truncate_markup(s, 34);
        assert_eq!(cut, "<div class=\"a\">hello</div>");
    }

    #[test]
    fn test_text_truncation_respects_char_boundary() {
        let s = "caf\u{e9}\u{e9}\u{e9}";
        let cut = truncate_text(s, 5);
        assert_eq!(cut, "caf\u{e9}");
    }

    #[test]
    fn test_preview_caps_length() {
        let text = "lorem ipsum dolor sit amet ".repeat(50);
        let p = preview(&text, 500);
        assert!(p.chars().count() <= 500);
        assert!(p.ends_with("..."));
        assert_eq!(preview("short", 500), "short");
    }

    #[test]
    fn test_collapse_whitespace() {
        assert_eq!(collapse_whitespace("  a \n\n\t b  "), "a b");
    }

    #[test]
    fn test_reduce_is_deterministic() {
        let a = reduce(PAGE, ReduceMode::Visual, &limits());
        let b = reduce(PAGE, ReduceMode::Visual, &limits());
        assert_eq!(a, b);
    }

    proptest! {
        #[test]
        fn prop_output_within_cap(body in "\\PC{0,2000}", cap in 16usize..512) {
            let html = format!("<html><body><div class=\"x\"><p>{}</p>\u{1F600}</div></body></html>", body);
            let limits = PreprocessLimits {
                visual_max_bytes: cap,
                text_max_bytes: cap,
                image_max_bytes: cap,
                ..PreprocessLimits::default()
            };
            for mode in [ReduceMode::Visual, ReduceMode::Text, ReduceMode::PageText, ReduceMode::Image] {
                let out = reduce(&html, mode, &limits);
                prop_assert!(out.len() <= cap);
                prop_assert!(std::str::from_utf8(out.as_bytes()).is_ok());
            }
        }
    }
}
