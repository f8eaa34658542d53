//! The merged business profile and its component types.
//!
//! Component types double as structured-output payloads for the inference
//! phases, so they derive `JsonSchema` alongside serde.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Above-the-fold hero block.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct HeroSection {
    pub headline: Option<String>,
    pub subheadline: Option<String>,
    pub cta_text: Option<String>,
    pub cta_link: Option<String>,
    pub background_image: Option<String>,
}

impl HeroSection {
    pub fn is_empty(&self) -> bool {
        self.headline.is_none()
            && self.subheadline.is_none()
            && self.cta_text.is_none()
            && self.cta_link.is_none()
            && self.background_image.is_none()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Typography {
    pub heading_font: Option<String>,
    pub body_font: Option<String>,
    /// CSS size of body text, e.g. "16px"
    pub base_font_size: Option<String>,
}

impl Typography {
    pub fn is_empty(&self) -> bool {
        self.heading_font.is_none() && self.body_font.is_none() && self.base_font_size.is_none()
    }
}

/// Coarse visual style tokens observed on the site.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct DesignTokens {
    pub border_radius: Option<String>,
    pub spacing: Option<String>,
    pub shadow_style: Option<String>,
    pub button_style: Option<String>,
}

impl DesignTokens {
    pub fn is_empty(&self) -> bool {
        self.border_radius.is_none()
            && self.spacing.is_none()
            && self.shadow_style.is_none()
            && self.button_style.is_none()
    }
}

/// A profile on a social platform.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
pub struct SocialLink {
    /// Lowercase platform name ("facebook", "instagram", ...)
    pub platform: String,
    pub url: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ContactInfo {
    #[serde(default)]
    pub emails: Vec<String>,
    #[serde(default)]
    pub phones: Vec<String>,
    #[serde(default)]
    pub addresses: Vec<String>,
    /// Free-form opening hours lines ("Mon-Fri 9am-5pm")
    #[serde(default)]
    pub hours: Vec<String>,
    #[serde(default)]
    pub social_links: Vec<SocialLink>,
    pub coordinates: Option<Coordinates>,
}

impl ContactInfo {
    /// At least one way to reach the business.
    pub fn has_reachable_channel(&self) -> bool {
        !self.emails.is_empty() || !self.phones.is_empty() || !self.addresses.is_empty()
    }

    pub fn is_empty(&self) -> bool {
        !self.has_reachable_channel()
            && self.hours.is_empty()
            && self.social_links.is_empty()
            && self.coordinates.is_none()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Service {
    pub name: String,
    pub description: Option<String>,
    pub price: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Testimonial {
    pub quote: String,
    pub author: Option<String>,
    /// Star rating on a 0-5 scale when shown
    pub rating: Option<f32>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct FaqItem {
    pub question: String,
    pub answer: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct FooterContent {
    pub text: Option<String>,
    pub copyright: Option<String>,
    #[serde(default)]
    pub links: Vec<String>,
}

impl FooterContent {
    pub fn is_empty(&self) -> bool {
        self.text.is_none() && self.copyright.is_none() && self.links.is_empty()
    }
}

/// Services, social proof and other structured page content.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct StructuredContent {
    #[serde(default)]
    pub services: Vec<Service>,
    #[serde(default)]
    pub testimonials: Vec<Testimonial>,
    #[serde(default)]
    pub faq: Vec<FaqItem>,
    #[serde(default)]
    pub hours: Vec<String>,
    pub footer: Option<FooterContent>,
}

impl StructuredContent {
    /// Has at least one services, testimonials or FAQ entry.
    pub fn has_social_proof(&self) -> bool {
        !self.services.is_empty() || !self.testimonials.is_empty() || !self.faq.is_empty()
    }

    pub fn is_empty(&self) -> bool {
        !self.has_social_proof()
            && self.hours.is_empty()
            && self.footer.as_ref().map_or(true, FooterContent::is_empty)
    }

    /// Take every part that is empty here from `other`.
    ///
    /// Returns true when anything was taken.
    pub fn fill_missing(&mut self, other: StructuredContent) -> bool {
        fn fill<T>(dst: &mut Vec<T>, src: Vec<T>) -> bool {
            if dst.is_empty() && !src.is_empty() {
                *dst = src;
                true
            } else {
                false
            }
        }

        let mut filled = fill(&mut self.services, other.services);
        filled |= fill(&mut self.testimonials, other.testimonials);
        filled |= fill(&mut self.faq, other.faq);
        filled |= fill(&mut self.hours, other.hours);

        let footer_missing = self.footer.as_ref().map_or(true, FooterContent::is_empty);
        if let Some(footer) = other.footer.filter(|f| footer_missing && !f.is_empty()) {
            self.footer = Some(footer);
            filled = true;
        }
        filled
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ExtractedImage {
    /// Absolute URL
    pub url: String,
    pub alt: Option<String>,
    /// One of "logo", "hero", "gallery", "team", "product", "content"
    pub role: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Gallery {
    pub title: Option<String>,
    #[serde(default)]
    pub images: Vec<String>,
}

/// The merged business profile.
///
/// Every field is optional. `None` means no accepted source found the data;
/// an empty value is never stored in its place.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExtractedBusinessInfo {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub site_title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub site_description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub favicon: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tagline: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub business_description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key_features: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hero: Option<HeroSection>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub brand_colors: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fonts: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub typography: Option<Typography>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub design_tokens: Option<DesignTokens>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub logo_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contact_info: Option<ContactInfo>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub galleries: Option<Vec<Gallery>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub structured_content: Option<StructuredContent>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub images: Option<Vec<ExtractedImage>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub social_media: Option<Vec<SocialLink>>,
}

impl ExtractedBusinessInfo {
    /// Emails from the contact block, or an empty slice.
    pub fn emails(&self) -> &[String] {
        self.contact_info
            .as_ref()
            .map(|c| c.emails.as_slice())
            .unwrap_or_default()
    }

    /// Hero headline, if any.
    pub fn headline(&self) -> Option<&str> {
        self.hero.as_ref().and_then(|h| h.headline.as_deref())
    }

    /// Fields currently present on this profile.
    pub fn present_fields(&self) -> Vec<ProfileField> {
        ProfileField::ALL
            .into_iter()
            .filter(|f| f.is_present(self))
            .collect()
    }
}

/// Names every field of [`ExtractedBusinessInfo`].
///
/// Lets merge logic move single fields between profiles without
/// knowing their types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProfileField {
    SiteTitle,
    SiteDescription,
    Favicon,
    Tagline,
    BusinessDescription,
    KeyFeatures,
    Hero,
    BrandColors,
    Fonts,
    Typography,
    DesignTokens,
    LogoUrl,
    ContactInfo,
    Galleries,
    StructuredContent,
    Images,
    SocialMedia,
}

impl ProfileField {
    pub const ALL: [ProfileField; 17] = [
        Self::SiteTitle,
        Self::SiteDescription,
        Self::Favicon,
        Self::Tagline,
        Self::BusinessDescription,
        Self::KeyFeatures,
        Self::Hero,
        Self::BrandColors,
        Self::Fonts,
        Self::Typography,
        Self::DesignTokens,
        Self::LogoUrl,
        Self::ContactInfo,
        Self::Galleries,
        Self::StructuredContent,
        Self::Images,
        Self::SocialMedia,
    ];

    pub fn is_present(&self, info: &ExtractedBusinessInfo) -> bool {
        match self {
            Self::SiteTitle => info.site_title.is_some(),
            Self::SiteDescription => info.site_description.is_some(),
            Self::Favicon => info.favicon.is_some(),
            Self::Tagline => info.tagline.is_some(),
            Self::BusinessDescription => info.business_description.is_some(),
            Self::KeyFeatures => info.key_features.is_some(),
            Self::Hero => info.hero.is_some(),
            Self::BrandColors => info.brand_colors.is_some(),
            Self::Fonts => info.fonts.is_some(),
            Self::Typography => info.typography.is_some(),
            Self::DesignTokens => info.design_tokens.is_some(),
            Self::LogoUrl => info.logo_url.is_some(),
            Self::ContactInfo => info.contact_info.is_some(),
            Self::Galleries => info.galleries.is_some(),
            Self::StructuredContent => info.structured_content.is_some(),
            Self::Images => info.images.is_some(),
            Self::SocialMedia => info.social_media.is_some(),
        }
    }

    /// Move this field from `from` into `into`.
    ///
    /// Returns true when a value was moved. An absent source value leaves
    /// `into` untouched.
    pub fn transfer(&self, from: &mut ExtractedBusinessInfo, into: &mut ExtractedBusinessInfo) -> bool {
        fn mv<T>(src: &mut Option<T>, dst: &mut Option<T>) -> bool {
            match src.take() {
                Some(v) => {
                    *dst = Some(v);
                    true
                }
                None => false,
            }
        }

        match self {
            Self::SiteTitle => mv(&mut from.site_title, &mut into.site_title),
            Self::SiteDescription => mv(&mut from.site_description, &mut into.site_description),
            Self::Favicon => mv(&mut from.favicon, &mut into.favicon),
            Self::Tagline => mv(&mut from.tagline, &mut into.tagline),
            Self::BusinessDescription => {
                mv(&mut from.business_description, &mut into.business_description)
            }
            Self::KeyFeatures => mv(&mut from.key_features, &mut into.key_features),
            Self::Hero => mv(&mut from.hero, &mut into.hero),
            Self::BrandColors => mv(&mut from.brand_colors, &mut into.brand_colors),
            Self::Fonts => mv(&mut from.fonts, &mut into.fonts),
            Self::Typography => mv(&mut from.typography, &mut into.typography),
            Self::DesignTokens => mv(&mut from.design_tokens, &mut into.design_tokens),
            Self::LogoUrl => mv(&mut from.logo_url, &mut into.logo_url),
            Self::ContactInfo => mv(&mut from.contact_info, &mut into.contact_info),
            Self::Galleries => mv(&mut from.galleries, &mut into.galleries),
            Self::StructuredContent => {
                mv(&mut from.structured_content, &mut into.structured_content)
            }
            Self::Images => mv(&mut from.images, &mut into.images),
            Self::SocialMedia => mv(&mut from.social_media, &mut into.social_media),
        }
    }
}

impl ProfileField {
    /// Complete a field already present in `into` with the parts it lacks
    /// from `from`.
    ///
    /// Only composite fields whose parts are extracted independently are
    /// completed. Returns true when anything was taken.
    pub fn fill_parts(&self, from: &mut ExtractedBusinessInfo, into: &mut ExtractedBusinessInfo) -> bool {
        match self {
            Self::StructuredContent => match (into.structured_content.as_mut(), from.structured_content.take()) {
                (Some(target), Some(source)) => target.fill_missing(source),
                (_, source) => {
                    from.structured_content = source;
                    false
                }
            },
            _ => false,
        }
    }
}

impl fmt::Display for ProfileField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::SiteTitle => "site_title",
            Self::SiteDescription => "site_description",
            Self::Favicon => "favicon",
            Self::Tagline => "tagline",
            Self::BusinessDescription => "business_description",
            Self::KeyFeatures => "key_features",
            Self::Hero => "hero",
            Self::BrandColors => "brand_colors",
            Self::Fonts => "fonts",
            Self::Typography => "typography",
            Self::DesignTokens => "design_tokens",
            Self::LogoUrl => "logo_url",
            Self::ContactInfo => "contact_info",
            Self::Galleries => "galleries",
            Self::StructuredContent => "structured_content",
            Self::Images => "images",
            Self::SocialMedia => "social_media",
        };
        f.write_str(name)
    }
}

/// `Some(v)` unless `v` is empty.
pub(crate) fn non_empty<T>(v: Vec<T>) -> Option<Vec<T>> {
    if v.is_empty() {
        None
    } else {
        Some(v)
    }
}

/// Trimmed `Some(s)` unless `s` is blank.
pub(crate) fn non_blank(s: Option<String>) -> Option<String> {
    s.map(|s| s.trim().to_string()).filter(|s| !s.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_absent_fields_not_serialized() {
        let info = ExtractedBusinessInfo {
            site_title: Some("Acme".into()),
            ..Default::default()
        };
        let json = serde_json::to_value(&info).unwrap();
        let obj = json.as_object().unwrap();
        assert_eq!(obj.len(), 1);
        assert_eq!(obj["site_title"], "Acme");
    }

    #[test]
    fn test_transfer_moves_only_named_field() {
        let mut from = ExtractedBusinessInfo {
            brand_colors: Some(vec!["#112233".into()]),
            logo_url: Some("https://a.test/logo.png".into()),
            ..Default::default()
        };
        let mut into = ExtractedBusinessInfo::default();

        assert!(ProfileField::BrandColors.transfer(&mut from, &mut into));
        assert_eq!(into.brand_colors, Some(vec!["#112233".to_string()]));
        assert!(into.logo_url.is_none());
        assert!(from.brand_colors.is_none());
        assert!(from.logo_url.is_some());
    }

    #[test]
    fn test_transfer_absent_keeps_destination() {
        let mut from = ExtractedBusinessInfo::default();
        let mut into = ExtractedBusinessInfo {
            tagline: Some("kept".into()),
            ..Default::default()
        };
        assert!(!ProfileField::Tagline.transfer(&mut from, &mut into));
        assert_eq!(into.tagline.as_deref(), Some("kept"));
    }

    #[test]
    fn test_present_fields() {
        let info = ExtractedBusinessInfo {
            favicon: Some("/favicon.ico".into()),
            social_media: Some(vec![]),
            ..Default::default()
        };
        assert_eq!(
            info.present_fields(),
            vec![ProfileField::Favicon, ProfileField::SocialMedia]
        );
    }

    #[test]
    fn test_contact_reachability() {
        let mut contact = ContactInfo::default();
        assert!(contact.is_empty());
        contact.hours.push("Mon 9-5".into());
        assert!(!contact.is_empty());
        assert!(!contact.has_reachable_channel());
        contact.phones.push("555-0100".into());
        assert!(contact.has_reachable_channel());
    }

    #[test]
    fn test_non_blank() {
        assert_eq!(non_blank(Some("  ".into())), None);
        assert_eq!(non_blank(Some(" x ".into())), Some("x".into()));
        assert_eq!(non_empty::<u8>(vec![]), None);
    }
}
