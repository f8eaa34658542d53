//! URL helpers shared by the phase extractors and the fallback extractor.

use url::Url;

/// Social platforms recognised by host, with their canonical name.
const SOCIAL_HOSTS: &[(&str, &str)] = &[
    ("facebook.com", "facebook"),
    ("fb.com", "facebook"),
    ("instagram.com", "instagram"),
    ("twitter.com", "x"),
    ("x.com", "x"),
    ("linkedin.com", "linkedin"),
    ("youtube.com", "youtube"),
    ("youtu.be", "youtube"),
    ("tiktok.com", "tiktok"),
    ("pinterest.com", "pinterest"),
    ("yelp.com", "yelp"),
    ("threads.net", "threads"),
    ("nextdoor.com", "nextdoor"),
];

/// Path fragments that mark share/intent links rather than profiles.
const SHARE_MARKERS: &[&str] = &["/sharer", "/share", "/intent/", "/dialog/", "shareArticle"];

/// Resolve `href` against `base` into an absolute http(s) URL.
///
/// Returns `None` for empty, fragment-only, `javascript:`, `data:` and
/// other non-web references.
pub fn resolve(base: &str, href: &str) -> Option<String> {
    let href = href.trim();
    if href.is_empty() || href.starts_with('#') {
        return None;
    }

    let resolved = match Url::parse(href) {
        Ok(url) => url,
        Err(url::ParseError::RelativeUrlWithoutBase) => Url::parse(base).ok()?.join(href).ok()?,
        Err(_) => return None,
    };

    match resolved.scheme() {
        "http" | "https" => Some(resolved.to_string()),
        _ => None,
    }
}

/// True for inline `data:` URIs.
pub fn is_data_uri(src: &str) -> bool {
    src.trim_start().get(..5).is_some_and(|p| p.eq_ignore_ascii_case("data:"))
}

/// Canonical platform name for a profile URL, if it points at a known
/// social host and is not a share link.
pub fn social_platform(url: &str) -> Option<&'static str> {
    let parsed = Url::parse(url).ok()?;
    let host = parsed.host_str()?.to_ascii_lowercase();
    let host = host.strip_prefix("www.").unwrap_or(&host);
    let host = host.strip_prefix("m.").unwrap_or(host);

    if SHARE_MARKERS.iter().any(|m| url.contains(m)) {
        return None;
    }
    // Bare platform homepages are not profiles
    if parsed.path().trim_matches('/').is_empty() {
        return None;
    }

    SOCIAL_HOSTS
        .iter()
        .find(|(domain, _)| host == *domain || host.ends_with(&format!(".{}", domain)))
        .map(|(_, name)| *name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_relative() {
        assert_eq!(
            resolve("https://acme.test/about/", "../img/logo.png").as_deref(),
            Some("https://acme.test/img/logo.png")
        );
        assert_eq!(
            resolve("https://acme.test", "//cdn.acme.test/a.jpg").as_deref(),
            Some("https://cdn.acme.test/a.jpg")
        );
    }

    #[test]
    fn test_resolve_rejects_non_web() {
        assert!(resolve("https://acme.test", "mailto:hi@acme.test").is_none());
        assert!(resolve("https://acme.test", "javascript:void(0)").is_none());
        assert!(resolve("https://acme.test", "#top").is_none());
        assert!(resolve("not a url", "/relative").is_none());
    }

    #[test]
    fn test_social_platform() {
        assert_eq!(social_platform("https://www.instagram.com/acmeflowers"), Some("instagram"));
        assert_eq!(social_platform("https://twitter.com/acme"), Some("x"));
        assert_eq!(social_platform("https://www.facebook.com/sharer/sharer.php?u=x"), None);
        assert_eq!(social_platform("https://facebook.com/"), None);
        assert_eq!(social_platform("https://acme.test/facebook"), None);
    }

    #[test]
    fn test_data_uri() {
        assert!(is_data_uri("data:image/png;base64,AAAA"));
        assert!(is_data_uri("  DATA:image/gif"));
        assert!(!is_data_uri("/img/a.png"));
    }
}
