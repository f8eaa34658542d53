//! Copy, hero block and structured content (FAQ, testimonials, services,
//! footer).

use lazy_static::lazy_static;
use regex::Regex;
use scraper::ElementRef;
use serde_json::Value;

use super::jsonld;
use super::{markers, select_in, text_of, within_marked, PageView};
use crate::phases::content::normalize_hero;
use crate::phases::dedupe_strings;
use crate::phases::social_proof::normalize_structured;
use crate::preprocess::preview;
use crate::types::profile::{
    non_blank, non_empty, FaqItem, FooterContent, HeroSection, Service, StructuredContent,
    Testimonial,
};

const MAX_KEY_FEATURES: usize = 8;
const FEATURE_MARKERS: &[&str] = &["feature", "benefit", "why-", "highlight"];
const HERO_MARKERS: &[&str] = &["hero", "banner", "jumbotron", "masthead", "splash"];
const CTA_MARKERS: &[&str] = &["btn", "button", "cta"];

/// Paragraphs shorter than this are not a business description.
const DESCRIPTION_MIN_CHARS: usize = 80;
const FOOTER_TEXT_CHARS: usize = 500;

lazy_static! {
    static ref COPYRIGHT: Regex = Regex::new(r"(?i)(?:©|\(c\)|copyright)\s*[^|•\n]{0,100}").unwrap();
    static ref BACKGROUND_URL: Regex =
        Regex::new(r#"(?i)background(?:-image)?\s*:[^;]*url\(\s*['"]?([^'")]+)['"]?\s*\)"#).unwrap();
}

pub(super) struct CopyFields {
    pub tagline: Option<String>,
    pub business_description: Option<String>,
    pub key_features: Option<Vec<String>>,
    pub hero: Option<HeroSection>,
    pub structured: Option<StructuredContent>,
}

pub(super) fn extract(page: &PageView<'_>) -> CopyFields {
    let structured = normalize_structured(StructuredContent {
        services: services(page),
        testimonials: testimonials(page),
        faq: faq(page),
        hours: Vec::new(),
        footer: footer(page),
    });

    CopyFields {
        tagline: tagline(page),
        business_description: description(page),
        key_features: non_empty(key_features(page)),
        hero: Some(normalize_hero(hero(page), page.base_url)).filter(|h| !h.is_empty()),
        structured: (!structured.is_empty()).then_some(structured),
    }
}

fn hero(page: &PageView<'_>) -> HeroSection {
    let Some(h1) = page.first("h1") else {
        return HeroSection::default();
    };
    let headline = text_of(h1);

    // Nearest marked hero container, else the heading's parent
    let container = h1
        .ancestors()
        .filter_map(ElementRef::wrap)
        .take(4)
        .find(|e| HERO_MARKERS.iter().any(|m| markers(*e).contains(m)))
        .or_else(|| h1.parent().and_then(ElementRef::wrap));

    let subheadline = h1
        .next_siblings()
        .filter_map(ElementRef::wrap)
        .find(|e| matches!(e.value().name(), "p" | "h2" | "h3"))
        .map(text_of);

    let cta = container
        .into_iter()
        .flat_map(|c| select_in(c, "a[href]"))
        .find(|a| {
            a.value().attr("role") == Some("button")
                || CTA_MARKERS.iter().any(|m| markers(*a).contains(m))
        });

    let background_image = container.and_then(|c| {
        std::iter::once(c)
            .chain(c.ancestors().filter_map(ElementRef::wrap).take(2))
            .filter_map(|e| e.value().attr("style"))
            .find_map(|style| BACKGROUND_URL.captures(style).map(|cap| cap[1].to_string()))
    });

    HeroSection {
        headline: Some(headline),
        subheadline,
        cta_text: cta.map(text_of),
        cta_link: cta.and_then(|a| a.value().attr("href")).map(str::to_string),
        background_image,
    }
}

fn tagline(page: &PageView<'_>) -> Option<String> {
    page.select("[class*='tagline'], [class*='slogan'], [id*='tagline']")
        .into_iter()
        .map(text_of)
        .find(|t| !t.is_empty() && t.len() <= 160)
}

fn description(page: &PageView<'_>) -> Option<String> {
    page.meta("meta[name='description']")
        .or_else(|| page.meta("meta[property='og:description']"))
        .or_else(|| {
            page.jsonld
                .iter()
                .find_map(|obj| jsonld::string(obj, "description"))
        })
        .or_else(|| {
            page.select("main p, article p")
                .into_iter()
                .chain(page.select("p"))
                .map(text_of)
                .find(|p| p.len() >= DESCRIPTION_MIN_CHARS)
        })
}

fn key_features(page: &PageView<'_>) -> Vec<String> {
    let mut features = Vec::new();
    for section in page.select("section, div, ul") {
        let m = markers(section);
        if !FEATURE_MARKERS.iter().any(|f| m.contains(f)) {
            continue;
        }
        for item in select_in(section, "li, h3, h4") {
            let text = text_of(item);
            if (3..=120).contains(&text.len()) {
                features.push(text);
            }
        }
    }

    let mut features = dedupe_strings(features);
    features.truncate(MAX_KEY_FEATURES);
    features
}

fn faq(page: &PageView<'_>) -> Vec<FaqItem> {
    let mut items = Vec::new();

    for obj in page.jsonld.iter().filter(|o| jsonld::has_type(o, "FAQPage")) {
        for entity in jsonld::many(obj.get("mainEntity")) {
            let Value::Object(q) = entity else {
                continue;
            };
            let answer = q
                .get("acceptedAnswer")
                .and_then(Value::as_object)
                .and_then(|a| jsonld::string(a, "text"));
            if let (Some(question), Some(answer)) = (jsonld::string(q, "name"), answer) {
                items.push(FaqItem {
                    question,
                    answer: strip_tags(&answer),
                });
            }
        }
    }

    for details in page.select("details") {
        let Some(summary) = select_in(details, "summary").into_iter().next() else {
            continue;
        };
        let question = text_of(summary);
        let full = text_of(details);
        let answer = full
            .strip_prefix(question.as_str())
            .unwrap_or(&full)
            .trim()
            .to_string();
        items.push(FaqItem { question, answer });
    }

    let mut seen = Vec::new();
    items.retain(|item: &FaqItem| {
        let key = item.question.to_lowercase();
        if seen.contains(&key) {
            false
        } else {
            seen.push(key);
            true
        }
    });
    items
}

fn testimonials(page: &PageView<'_>) -> Vec<Testimonial> {
    let mut out: Vec<Testimonial> = Vec::new();

    for quote_el in page.select("blockquote, [class*='testimonial'], [class*='review']") {
        // Outer wrappers repeat the blockquote they contain
        if quote_el.value().name() != "blockquote" && !select_in(quote_el, "blockquote").is_empty() {
            continue;
        }

        let author_el = select_in(quote_el, "cite, footer, [class*='author'], [class*='name']")
            .into_iter()
            .next();
        let author = author_el.map(text_of).filter(|a| !a.is_empty());

        let quote = select_in(quote_el, "p")
            .into_iter()
            .map(text_of)
            .find(|p| !p.is_empty())
            .unwrap_or_else(|| {
                let full = text_of(quote_el);
                match &author {
                    Some(a) => full.replace(a.as_str(), "").trim().to_string(),
                    None => full,
                }
            });
        let quote = quote.trim_matches(|c: char| c == '"' || c == '“' || c == '”').trim().to_string();

        if quote.len() < 10 || out.iter().any(|t| t.quote == quote) {
            continue;
        }
        out.push(Testimonial {
            quote,
            author: author.map(|a| a.trim_start_matches(['-', '—', '–']).trim().to_string()),
            rating: None,
        });
    }

    out
}

fn services(page: &PageView<'_>) -> Vec<Service> {
    let mut out: Vec<Service> = Vec::new();

    for obj in page.jsonld.iter().filter(|o| jsonld::has_type(o, "Service")) {
        if let Some(name) = jsonld::string(obj, "name") {
            out.push(Service {
                name,
                description: jsonld::string(obj, "description"),
                price: obj
                    .get("offers")
                    .and_then(Value::as_object)
                    .and_then(|o| jsonld::string(o, "price")),
            });
        }
    }

    for heading in page.select("h3, h4") {
        if !within_marked(heading, &["service"]) {
            continue;
        }
        let name = text_of(heading);
        if name.is_empty() || name.len() > 80 || out.iter().any(|s| s.name.eq_ignore_ascii_case(&name)) {
            continue;
        }
        let description = heading
            .next_siblings()
            .filter_map(ElementRef::wrap)
            .find(|e| e.value().name() == "p")
            .map(text_of)
            .filter(|d| !d.is_empty());
        out.push(Service {
            name,
            description,
            price: None,
        });
    }

    out
}

fn footer(page: &PageView<'_>) -> Option<FooterContent> {
    let footer = page
        .first("footer")
        .or_else(|| page.first("[role='contentinfo'], #footer, .footer"))?;

    let text = text_of(footer);

    // Smallest element carrying the notice, so neighbouring links stay out
    let copyright = select_in(footer, "p, small, span, div, li")
        .into_iter()
        .map(text_of)
        .filter(|t| COPYRIGHT.is_match(t))
        .min_by_key(|t| t.len())
        .or_else(|| Some(text.clone()))
        .and_then(|t| COPYRIGHT.find(&t).map(|m| m.as_str().trim().to_string()));
    let links = select_in(footer, "a")
        .into_iter()
        .map(text_of)
        .filter(|l| !l.is_empty() && l.len() <= 60)
        .collect();

    Some(FooterContent {
        text: non_blank(Some(preview(&text, FOOTER_TEXT_CHARS))),
        copyright,
        links: dedupe_strings(links),
    })
}

/// JSON-LD answers are often HTML fragments.
fn strip_tags(s: &str) -> String {
    let fragment = scraper::Html::parse_fragment(s);
    crate::preprocess::collapse_whitespace(&fragment.root_element().text().collect::<String>())
}
