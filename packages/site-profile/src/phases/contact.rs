//! Phase 2a: contact details.

use super::{dedupe_strings, prompts, PhaseSpec};
use crate::links;
use crate::preprocess::ReduceMode;
use crate::types::phase::Phase;
use crate::types::profile::{ContactInfo, ExtractedBusinessInfo, SocialLink};

pub struct ContactPhase;

impl PhaseSpec for ContactPhase {
    const PHASE: Phase = Phase::Contact;
    const MODE: ReduceMode = ReduceMode::PageText;
    const INSTRUCTIONS: &'static str = prompts::CONTACT_PROMPT;
    type Payload = ContactInfo;

    fn has_minimum_data(data: &ContactInfo) -> bool {
        data.has_reachable_channel()
    }

    fn into_fragment(data: ContactInfo, base_url: &str) -> ExtractedBusinessInfo {
        let contact = normalize_contact(data, base_url);
        ExtractedBusinessInfo {
            contact_info: (!contact.is_empty()).then_some(contact),
            ..Default::default()
        }
    }
}

/// Clean up a contact block from any source.
pub(crate) fn normalize_contact(data: ContactInfo, base_url: &str) -> ContactInfo {
    let emails = dedupe_strings(
        data.emails
            .into_iter()
            .map(|e| e.trim().trim_start_matches("mailto:").to_lowercase())
            .filter(|e| e.contains('@'))
            .collect(),
    );

    ContactInfo {
        emails,
        phones: dedupe_strings(data.phones),
        addresses: dedupe_strings(data.addresses),
        hours: dedupe_strings(data.hours),
        social_links: normalize_social_links(data.social_links, base_url),
        coordinates: data.coordinates.filter(|c| {
            (-90.0..=90.0).contains(&c.latitude) && (-180.0..=180.0).contains(&c.longitude)
        }),
    }
}

/// Resolve, lowercase and dedupe social links by URL.
pub(crate) fn normalize_social_links(links_in: Vec<SocialLink>, base_url: &str) -> Vec<SocialLink> {
    let mut out: Vec<SocialLink> = Vec::new();
    for link in links_in {
        let Some(url) = links::resolve(base_url, &link.url) else {
            continue;
        };
        let platform = links::social_platform(&url)
            .map(str::to_string)
            .unwrap_or_else(|| link.platform.trim().to_lowercase());
        if platform.is_empty() || out.iter().any(|l| l.url == url) {
            continue;
        }
        out.push(SocialLink { platform, url });
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::profile::Coordinates;

    #[test]
    fn test_gate_needs_reachable_channel() {
        let mut data = ContactInfo {
            hours: vec!["Mon-Fri 9-5".into()],
            ..Default::default()
        };
        assert!(!ContactPhase::has_minimum_data(&data));
        data.phones.push("(612) 555-0100".into());
        assert!(ContactPhase::has_minimum_data(&data));
    }

    #[test]
    fn test_fragment_normalizes() {
        let data = ContactInfo {
            emails: vec!["mailto:Hello@Acme.test".into(), "hello@acme.test".into(), "n/a".into()],
            social_links: vec![SocialLink {
                platform: "Instagram".into(),
                url: "https://instagram.com/acme".into(),
            }],
            coordinates: Some(Coordinates {
                latitude: 200.0,
                longitude: 0.0,
            }),
            ..Default::default()
        };

        let info = ContactPhase::into_fragment(data, "https://acme.test");
        let contact = info.contact_info.unwrap();
        assert_eq!(contact.emails, vec!["hello@acme.test".to_string()]);
        assert_eq!(contact.social_links[0].platform, "instagram");
        assert!(contact.coordinates.is_none());
    }

    #[test]
    fn test_empty_contact_is_absent() {
        let info = ContactPhase::into_fragment(ContactInfo::default(), "https://acme.test");
        assert!(info.contact_info.is_none());
    }
}
