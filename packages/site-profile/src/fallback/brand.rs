//! Colors, fonts and logo from markup and inline CSS.

use lazy_static::lazy_static;
use regex::Regex;

use super::{markers, PageView};
use crate::phases::brand::normalize_hex;
use crate::phases::dedupe_strings;
use crate::types::profile::{non_empty, Typography};

/// Most colors reported.
const MAX_COLORS: usize = 6;

/// `theme-color` is an explicit brand statement; it outranks usage counts.
const THEME_COLOR_WEIGHT: usize = 100;

const GENERIC_FAMILIES: &[&str] = &[
    "serif", "sans-serif", "monospace", "cursive", "fantasy", "system-ui", "-apple-system",
    "blinkmacsystemfont", "ui-sans-serif", "ui-serif", "ui-monospace", "inherit", "initial",
    "unset", "emoji", "math",
];

lazy_static! {
    static ref HEX_IN_CSS: Regex = Regex::new(r"#([0-9a-fA-F]{6}|[0-9a-fA-F]{3})\b").unwrap();
    static ref FONT_FAMILY: Regex = Regex::new(r"(?i)font-family\s*:\s*([^;}]+)").unwrap();
    static ref GOOGLE_FAMILY: Regex = Regex::new(r"family=([^&]+)").unwrap();
    static ref HEADING_RULE: Regex =
        Regex::new(r"(?i)(?:^|[},\s])h[1-3]\b[^{]*\{([^}]*)\}").unwrap();
    static ref BODY_RULE: Regex = Regex::new(r"(?i)(?:^|[},\s])(?:html|body)\b[^{]*\{([^}]*)\}").unwrap();
    static ref FONT_SIZE: Regex = Regex::new(r"(?i)font-size\s*:\s*([0-9.]+(?:px|rem|em|pt|%))").unwrap();
}

pub(super) struct BrandFields {
    pub colors: Option<Vec<String>>,
    pub fonts: Option<Vec<String>>,
    pub typography: Option<Typography>,
    pub logo_url: Option<String>,
}

pub(super) fn extract(page: &PageView<'_>) -> BrandFields {
    let css = collect_css(page);
    let typography = typography(&css);

    BrandFields {
        colors: non_empty(colors(page, &css)),
        fonts: non_empty(fonts(page, &css)),
        typography: Some(typography).filter(|t| !t.is_empty()),
        logo_url: logo(page),
    }
}

/// `<style>` blocks and inline `style` attributes, in document order.
fn collect_css(page: &PageView<'_>) -> String {
    let mut css = String::new();
    for style in page.select("style") {
        css.extend(style.text());
        css.push('\n');
    }
    for el in page.select("[style]") {
        if let Some(style) = el.value().attr("style") {
            css.push_str(style);
            css.push_str(";\n");
        }
    }
    css
}

fn colors(page: &PageView<'_>, css: &str) -> Vec<String> {
    // (color, score, first index)
    let mut tally: Vec<(String, usize, usize)> = Vec::new();
    let mut bump = |color: String, weight: usize| {
        let next = tally.len();
        match tally.iter_mut().find(|(c, _, _)| *c == color) {
            Some(entry) => entry.1 += weight,
            None => tally.push((color, weight, next)),
        }
    };

    if let Some(theme) = page.meta("meta[name='theme-color']").and_then(|c| normalize_hex(&c)) {
        if !is_neutral(&theme) {
            bump(theme, THEME_COLOR_WEIGHT);
        }
    }

    for cap in HEX_IN_CSS.captures_iter(css) {
        if let Some(color) = cap.get(0).and_then(|m| normalize_hex(m.as_str())) {
            if !is_neutral(&color) {
                bump(color, 1);
            }
        }
    }

    tally.sort_by(|a, b| b.1.cmp(&a.1).then(a.2.cmp(&b.2)));
    tally.into_iter().take(MAX_COLORS).map(|(c, _, _)| c).collect()
}

/// Near-white, near-black and flat greys say nothing about a brand.
fn is_neutral(hex: &str) -> bool {
    let channel = |i: usize| u8::from_str_radix(hex.get(i..i + 2).unwrap_or("00"), 16).unwrap_or(0);
    let (r, g, b) = (channel(1), channel(3), channel(5));
    let max = r.max(g).max(b);
    let min = r.min(g).min(b);

    let near_white = min >= 0xf0;
    let near_black = max <= 0x1a;
    let grey = max - min <= 0x08;
    near_white || near_black || grey
}

fn fonts(page: &PageView<'_>, css: &str) -> Vec<String> {
    let mut found = Vec::new();

    for link in page.select("link[href*='fonts.googleapis.com']") {
        let Some(href) = link.value().attr("href") else {
            continue;
        };
        for cap in GOOGLE_FAMILY.captures_iter(href) {
            for family in cap[1].split('|') {
                let family = family.split(':').next().unwrap_or_default();
                found.push(family.replace('+', " "));
            }
        }
    }

    for cap in FONT_FAMILY.captures_iter(css) {
        if let Some(family) = primary_family(&cap[1]) {
            found.push(family);
        }
    }

    dedupe_strings(found)
}

/// First non-generic family of a `font-family` list.
fn primary_family(list: &str) -> Option<String> {
    list.split(',')
        .map(|f| f.trim().trim_matches(|c: char| c == '\'' || c == '"').trim())
        .find(|f| {
            !f.is_empty()
                && !f.starts_with("var(")
                && !f.contains("!important")
                && !GENERIC_FAMILIES.contains(&f.to_lowercase().as_str())
        })
        .map(str::to_string)
}

fn typography(css: &str) -> Typography {
    let rule_font = |rule: &Regex| {
        rule.captures_iter(css).find_map(|cap| {
            FONT_FAMILY
                .captures(&cap[1])
                .and_then(|f| primary_family(&f[1]))
        })
    };

    Typography {
        heading_font: rule_font(&*HEADING_RULE),
        body_font: rule_font(&*BODY_RULE),
        base_font_size: BODY_RULE
            .captures_iter(css)
            .find_map(|cap| FONT_SIZE.captures(&cap[1]).map(|s| s[1].to_string())),
    }
}

fn logo(page: &PageView<'_>) -> Option<String> {
    if let Some(url) = page
        .meta("meta[property='og:logo'], meta[itemprop='logo']")
        .and_then(|u| page.resolve(&u))
    {
        return Some(url);
    }

    let from_jsonld = page.jsonld.iter().find_map(|obj| match obj.get("logo") {
        Some(serde_json::Value::String(url)) => Some(url.clone()),
        Some(serde_json::Value::Object(img)) => img.get("url").and_then(|u| u.as_str()).map(str::to_string),
        _ => None,
    });
    if let Some(url) = from_jsonld.and_then(|u| page.resolve(&u)) {
        return Some(url);
    }

    page.select("img").into_iter().find_map(|img| {
        let value = img.value();
        let src = value.attr("src").or_else(|| value.attr("data-src"))?;
        let alt = value.attr("alt").unwrap_or_default().to_lowercase();
        let parent_marked = img
            .ancestors()
            .take(2)
            .filter_map(scraper::ElementRef::wrap)
            .any(|p| markers(p).contains("logo"));

        let is_logo = markers(img).contains("logo")
            || alt.contains("logo")
            || src.to_lowercase().contains("logo")
            || parent_marked;
        if is_logo {
            page.resolve(src)
        } else {
            None
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use scraper::Html;

    fn fields(html: &str) -> BrandFields {
        let doc = Html::parse_document(html);
        let page = PageView::new(&doc, "https://acme.test");
        extract(&page)
    }

    #[test]
    fn test_colors_ranked_by_use() {
        let html = r#"<html><head>
            <style>.a{color:#112233} .b{background:#112233} .c{color:#445566} body{color:#fff}</style>
            </head><body><p style="color:#000000">x</p></body></html>"#;

        let brand = fields(html);
        assert_eq!(
            brand.colors,
            Some(vec!["#112233".to_string(), "#445566".to_string()])
        );
    }

    #[test]
    fn test_theme_color_ranks_first() {
        let html = r##"<html><head><meta name="theme-color" content="#E63946">
            <style>.a{color:#112233}.b{color:#112233}</style></head></html>"##;
        let colors = fields(html).colors.unwrap();
        assert_eq!(colors[0], "#e63946");
    }

    #[test]
    fn test_fonts_and_typography() {
        let html = r#"<html><head>
            <link href="https://fonts.googleapis.com/css?family=Playfair+Display:700|Lato" rel="stylesheet">
            <style>
              body { font-family: "Lato", sans-serif; font-size: 16px; }
              h1, h2 { font-family: 'Playfair Display', serif; }
            </style></head></html>"#;

        let brand = fields(html);
        assert_eq!(
            brand.fonts,
            Some(vec!["Playfair Display".to_string(), "Lato".to_string()])
        );
        let typography = brand.typography.unwrap();
        assert_eq!(typography.heading_font.as_deref(), Some("Playfair Display"));
        assert_eq!(typography.body_font.as_deref(), Some("Lato"));
        assert_eq!(typography.base_font_size.as_deref(), Some("16px"));
    }

    #[test]
    fn test_logo_from_marked_container() {
        let html = r#"<body><a class="site-logo" href="/"><img src="/img/brand.svg"></a></body>"#;
        assert_eq!(
            fields(html).logo_url.as_deref(),
            Some("https://acme.test/img/brand.svg")
        );
    }

    #[test]
    fn test_neutrals() {
        assert!(is_neutral("#ffffff"));
        assert!(is_neutral("#0a0a0a"));
        assert!(is_neutral("#777777"));
        assert!(!is_neutral("#e63946"));
    }
}
