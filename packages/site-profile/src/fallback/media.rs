//! Images, galleries and social media profile links.

use scraper::ElementRef;

use super::{markers, select_in, text_of, within_marked, PageView};
use crate::links;
use crate::phases::contact::normalize_social_links;
use crate::phases::images::normalize_images;
use crate::types::profile::{non_blank, non_empty, ExtractedImage, Gallery, SocialLink};

/// Most images reported for one page.
const MAX_IMAGES: usize = 50;

/// A gallery needs at least this many images.
const MIN_GALLERY_IMAGES: usize = 2;

const TRACKING_MARKERS: &[&str] = &["pixel", "tracking", "spacer", "blank.gif", "analytics"];

/// Role markers checked against the image and its ancestors, first match wins.
const ROLE_MARKERS: &[(&str, &[&str])] = &[
    ("logo", &["logo"]),
    ("hero", &["hero", "banner", "jumbotron", "masthead"]),
    ("gallery", &["gallery", "carousel", "slider", "portfolio"]),
    ("team", &["team", "staff", "people"]),
    ("product", &["product", "shop-item"]),
];

pub(super) struct MediaFields {
    pub images: Option<Vec<ExtractedImage>>,
    pub galleries: Option<Vec<Gallery>>,
    pub social_media: Option<Vec<SocialLink>>,
}

pub(super) fn extract(page: &PageView<'_>) -> MediaFields {
    MediaFields {
        images: non_empty(images(page)),
        galleries: non_empty(galleries(page)),
        social_media: non_empty(social_media(page)),
    }
}

fn images(page: &PageView<'_>) -> Vec<ExtractedImage> {
    let raw = page
        .select("img")
        .into_iter()
        .filter(|img| !is_tracking_pixel(*img))
        .filter_map(|img| {
            let src = image_source(img)?;
            let alt = img.value().attr("alt").map(str::to_string);
            Some(ExtractedImage {
                url: src,
                alt,
                role: role_of(img, &src_and_alt(img)).to_string(),
            })
        })
        .collect();

    let mut images = normalize_images(raw, page.base_url);
    images.truncate(MAX_IMAGES);
    images
}

/// `src`, lazy-loading attributes, or the first `srcset` candidate.
fn image_source(img: ElementRef<'_>) -> Option<String> {
    let value = img.value();
    let direct = ["src", "data-src", "data-lazy-src"]
        .iter()
        .filter_map(|a| value.attr(a))
        .map(str::trim)
        .find(|s| !s.is_empty() && !links::is_data_uri(s));
    if let Some(src) = direct {
        return Some(src.to_string());
    }

    ["srcset", "data-srcset"]
        .iter()
        .filter_map(|a| value.attr(a))
        .find_map(|set| {
            set.split(',')
                .next()
                .and_then(|candidate| candidate.split_whitespace().next())
                .map(str::to_string)
        })
}

fn is_tracking_pixel(img: ElementRef<'_>) -> bool {
    let value = img.value();
    let tiny = |attr: &str| {
        value
            .attr(attr)
            .and_then(|v| v.trim().trim_end_matches("px").parse::<u32>().ok())
            .is_some_and(|v| v <= 2)
    };
    let src = value.attr("src").unwrap_or_default().to_lowercase();
    tiny("width") || tiny("height") || TRACKING_MARKERS.iter().any(|m| src.contains(m))
}

fn src_and_alt(img: ElementRef<'_>) -> String {
    let value = img.value();
    format!(
        "{} {}",
        value.attr("src").unwrap_or_default(),
        value.attr("alt").unwrap_or_default()
    )
    .to_lowercase()
}

fn role_of(img: ElementRef<'_>, src_and_alt: &str) -> &'static str {
    for (role, needles) in ROLE_MARKERS {
        if needles.iter().any(|n| src_and_alt.contains(n)) || within_marked(img, needles) {
            return *role;
        }
    }
    "content"
}

fn galleries(page: &PageView<'_>) -> Vec<Gallery> {
    let mut out: Vec<Gallery> = Vec::new();

    for container in page.select("section, div, ul, figure") {
        let m = markers(container);
        if !["gallery", "portfolio", "carousel"].iter().any(|n| m.contains(n)) {
            continue;
        }
        // Nested gallery wrappers describe the same images
        let nested = container
            .ancestors()
            .filter_map(ElementRef::wrap)
            .any(|a| ["gallery", "portfolio", "carousel"].iter().any(|n| markers(a).contains(n)));
        if nested {
            continue;
        }

        let images: Vec<String> = select_in(container, "img")
            .into_iter()
            .filter(|img| !is_tracking_pixel(*img))
            .filter_map(image_source)
            .filter_map(|src| page.resolve(&src))
            .fold(Vec::new(), |mut acc, url| {
                if !acc.contains(&url) {
                    acc.push(url);
                }
                acc
            });
        if images.len() < MIN_GALLERY_IMAGES {
            continue;
        }

        let title = container
            .value()
            .attr("aria-label")
            .map(str::to_string)
            .or_else(|| select_in(container, "h2, h3, figcaption").into_iter().next().map(text_of));

        out.push(Gallery {
            title: non_blank(title),
            images,
        });
    }

    out
}

fn social_media(page: &PageView<'_>) -> Vec<SocialLink> {
    let raw = page
        .select("a[href]")
        .into_iter()
        .filter_map(|a| {
            let url = page.resolve(a.value().attr("href")?)?;
            let platform = links::social_platform(&url)?;
            Some(SocialLink {
                platform: platform.to_string(),
                url,
            })
        })
        .collect();
    normalize_social_links(raw, page.base_url)
}
