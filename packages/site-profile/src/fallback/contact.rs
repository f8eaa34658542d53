//! Emails, phones, addresses, hours and coordinates.

use lazy_static::lazy_static;
use regex::Regex;
use serde_json::Value;

use super::jsonld::{self, Object};
use super::{text_of, PageView};
use crate::links;
use crate::phases::contact::normalize_contact;
use crate::types::profile::{ContactInfo, Coordinates, SocialLink};

/// File extensions that look like email TLDs in `logo@2x.png`.
const IMAGE_SUFFIXES: &[&str] = &[".png", ".jpg", ".jpeg", ".gif", ".svg", ".webp"];

lazy_static! {
    // Email pattern - RFC 5322 simplified
    static ref EMAIL_REGEX: Regex = Regex::new(
        r"(?i)\b[A-Z0-9._%+-]+@[A-Z0-9.-]+\.[A-Z]{2,}\b"
    ).unwrap();

    // Phone patterns - North American and international
    static ref PHONE_REGEX: Regex = Regex::new(
        r"(?:\+\d{1,3}[\s.-]?)?\(?\d{3}\)?[\s.-]?\d{3}[\s.-]?\d{4}\b"
    ).unwrap();
}

pub(super) fn extract(page: &PageView<'_>) -> Option<ContactInfo> {
    let mut emails = Vec::new();
    for link in page.select("a[href^='mailto:'], a[href^='MAILTO:']") {
        if let Some(href) = link.value().attr("href") {
            let address = href[7..].split('?').next().unwrap_or_default();
            emails.push(address.to_string());
        }
    }
    emails.extend(
        EMAIL_REGEX
            .find_iter(&page.text)
            .map(|m| m.as_str().to_string())
            .filter(|e| !IMAGE_SUFFIXES.iter().any(|s| e.to_lowercase().ends_with(s))),
    );

    let mut phones = Vec::new();
    for link in page.select("a[href^='tel:']") {
        let shown = text_of(link);
        if digit_count(&shown) >= 7 {
            phones.push(shown);
        } else if let Some(href) = link.value().attr("href") {
            phones.push(href[4..].to_string());
        }
    }
    phones.extend(
        PHONE_REGEX
            .find_iter(&page.text)
            .map(|m| m.as_str().to_string())
            .filter(|p| (10..=15).contains(&digit_count(p))),
    );
    let mut phones = dedupe_by_digits(phones);

    let mut addresses: Vec<String> = page
        .select("address")
        .into_iter()
        .map(text_of)
        .filter(|a| a.len() >= 8)
        .collect();

    let mut hours = Vec::new();
    let mut coordinates = None;
    for obj in &page.jsonld {
        for address in jsonld::many(obj.get("address")) {
            if let Some(formatted) = format_address(address) {
                addresses.push(formatted);
            }
        }
        hours.extend(opening_hours(obj));
        if coordinates.is_none() {
            coordinates = geo(obj);
        }
        if let Some(phone) = jsonld::string(obj, "telephone") {
            if !phones.iter().any(|p| same_digits(p, &phone)) {
                phones.push(phone);
            }
        }
        if let Some(email) = jsonld::string(obj, "email") {
            emails.push(email);
        }
    }

    let social_links = page
        .select("a[href]")
        .into_iter()
        .filter_map(|a| a.value().attr("href"))
        .filter_map(|href| {
            let url = page.resolve(href)?;
            let platform = links::social_platform(&url)?;
            Some(SocialLink {
                platform: platform.to_string(),
                url,
            })
        })
        .collect();

    let contact = normalize_contact(
        ContactInfo {
            emails,
            phones,
            addresses,
            hours,
            social_links,
            coordinates,
        },
        page.base_url,
    );

    (!contact.is_empty()).then_some(contact)
}

fn digit_count(s: &str) -> usize {
    s.chars().filter(char::is_ascii_digit).count()
}

fn digits(s: &str) -> String {
    s.chars().filter(char::is_ascii_digit).collect()
}

/// Equal once formatting is stripped, ignoring a leading country code.
fn same_digits(a: &str, b: &str) -> bool {
    let (a, b) = (digits(a), digits(b));
    !a.is_empty() && !b.is_empty() && (a == b || a.ends_with(&b) || b.ends_with(&a))
}

fn dedupe_by_digits(phones: Vec<String>) -> Vec<String> {
    let mut out: Vec<String> = Vec::new();
    for phone in phones {
        let phone = phone.trim().to_string();
        if !phone.is_empty() && !out.iter().any(|p| same_digits(p, &phone)) {
            out.push(phone);
        }
    }
    out
}

fn format_address(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.trim().to_string()).filter(|s| !s.is_empty()),
        Value::Object(obj) => {
            let parts: Vec<String> = [
                "streetAddress",
                "addressLocality",
                "addressRegion",
                "postalCode",
                "addressCountry",
            ]
            .iter()
            .filter_map(|key| jsonld::string(obj, key))
            .collect();
            (!parts.is_empty()).then(|| parts.join(", "))
        }
        _ => None,
    }
}

fn opening_hours(obj: &Object) -> Vec<String> {
    let mut lines: Vec<String> = jsonld::many(obj.get("openingHours"))
        .into_iter()
        .filter_map(Value::as_str)
        .map(|s| s.trim().to_string())
        .collect();

    for spec in jsonld::many(obj.get("openingHoursSpecification")) {
        let Value::Object(spec) = spec else {
            continue;
        };
        let days: Vec<String> = jsonld::many(spec.get("dayOfWeek"))
            .into_iter()
            .filter_map(Value::as_str)
            .map(|d| d.rsplit('/').next().unwrap_or(d).to_string())
            .collect();
        if let (Some(opens), Some(closes)) = (jsonld::string(spec, "opens"), jsonld::string(spec, "closes")) {
            let days = if days.is_empty() {
                "Daily".to_string()
            } else {
                days.join(", ")
            };
            lines.push(format!("{} {}-{}", days, opens, closes));
        }
    }

    lines
}

fn geo(obj: &Object) -> Option<Coordinates> {
    let Some(Value::Object(geo)) = obj.get("geo") else {
        return None;
    };
    Some(Coordinates {
        latitude: jsonld::number(geo.get("latitude"))?,
        longitude: jsonld::number(geo.get("longitude"))?,
    })
}
