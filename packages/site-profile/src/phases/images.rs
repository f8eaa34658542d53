//! Phase 2d: image catalogue.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use super::{prompts, PhaseSpec};
use crate::links;
use crate::preprocess::ReduceMode;
use crate::types::phase::Phase;
use crate::types::profile::{non_blank, non_empty, ExtractedBusinessInfo, ExtractedImage, Gallery};

/// Roles an image may be tagged with. Anything else becomes "content".
pub const IMAGE_ROLES: &[&str] = &["logo", "hero", "gallery", "team", "product", "content"];

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ImageExtraction {
    #[serde(default)]
    pub images: Vec<ExtractedImage>,
    #[serde(default)]
    pub galleries: Vec<Gallery>,
}

pub struct ImagesPhase;

impl PhaseSpec for ImagesPhase {
    const PHASE: Phase = Phase::Images;
    const MODE: ReduceMode = ReduceMode::Image;
    const INSTRUCTIONS: &'static str = prompts::IMAGES_PROMPT;
    type Payload = ImageExtraction;

    fn has_minimum_data(data: &ImageExtraction) -> bool {
        data.images.iter().any(|i| !i.url.trim().is_empty() && !links::is_data_uri(&i.url))
    }

    fn into_fragment(data: ImageExtraction, base_url: &str) -> ExtractedBusinessInfo {
        let galleries = data
            .galleries
            .into_iter()
            .filter_map(|g| {
                let images = resolve_all(g.images, base_url);
                (!images.is_empty()).then(|| Gallery {
                    title: non_blank(g.title),
                    images,
                })
            })
            .collect();

        ExtractedBusinessInfo {
            images: non_empty(normalize_images(data.images, base_url)),
            galleries: non_empty(galleries),
            ..Default::default()
        }
    }
}

/// Resolve URLs, drop data URIs and duplicates, and coerce roles.
pub(crate) fn normalize_images(images: Vec<ExtractedImage>, base_url: &str) -> Vec<ExtractedImage> {
    let mut out: Vec<ExtractedImage> = Vec::new();
    for image in images {
        if links::is_data_uri(&image.url) {
            continue;
        }
        let Some(url) = links::resolve(base_url, &image.url) else {
            continue;
        };
        if out.iter().any(|i| i.url == url) {
            continue;
        }
        let role = image.role.trim().to_lowercase();
        let role = if IMAGE_ROLES.contains(&role.as_str()) {
            role
        } else {
            "content".to_string()
        };
        out.push(ExtractedImage {
            url,
            alt: non_blank(image.alt),
            role,
        });
    }
    out
}

fn resolve_all(urls: Vec<String>, base_url: &str) -> Vec<String> {
    let mut out: Vec<String> = Vec::new();
    for url in urls {
        if links::is_data_uri(&url) {
            continue;
        }
        if let Some(resolved) = links::resolve(base_url, &url) {
            if !out.contains(&resolved) {
                out.push(resolved);
            }
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn image(url: &str, role: &str) -> ExtractedImage {
        ExtractedImage {
            url: url.into(),
            alt: None,
            role: role.into(),
        }
    }

    #[test]
    fn test_gate_ignores_data_uris() {
        let data = ImageExtraction {
            images: vec![image("data:image/gif;base64,R0lG", "content")],
            galleries: vec![],
        };
        assert!(!ImagesPhase::has_minimum_data(&data));
    }

    #[test]
    fn test_fragment_normalizes_images() {
        let data = ImageExtraction {
            images: vec![
                image("/img/hero.jpg", "Hero"),
                image("/img/hero.jpg", "hero"),
                image("shop.jpg", "storefront"),
            ],
            galleries: vec![Gallery {
                title: Some("Weddings".into()),
                images: vec!["/g/1.jpg".into(), "data:image/png;base64,AA".into()],
            }],
        };

        let info = ImagesPhase::into_fragment(data, "https://acme.test/");
        let images = info.images.unwrap();
        assert_eq!(images.len(), 2);
        assert_eq!(images[0].role, "hero");
        assert_eq!(images[1].role, "content");
        assert_eq!(images[1].url, "https://acme.test/shop.jpg");
        let galleries = info.galleries.unwrap();
        assert_eq!(galleries[0].images, vec!["https://acme.test/g/1.jpg".to_string()]);
    }
}
