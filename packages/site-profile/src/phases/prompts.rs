//! Fixed prompt templates for each extraction phase.
//!
//! Every phase shares the same user prompt shape; only the system prompt
//! and the response schema differ.

/// User prompt wrapping the page URL and its reduced HTML.
pub const PAGE_PROMPT: &str = r#"Page URL: {url}

Page content:
{content}"#;

/// Shared tail appended to every system prompt.
const CONFIDENCE_RULES: &str = r#"
Rules:
- Only report what is actually present on the page. Never invent data.
- Use null or an empty list when something is not found.
- Set "confidence" between 0.0 and 1.0 to reflect how complete and certain the extraction is. Use a value below 0.3 when the page gives little to go on."#;

pub const BRAND_PROMPT: &str = r#"You are a brand designer analyzing the markup and CSS of a business website's homepage.

Identify the visual brand identity:
1. brand_colors: the 2-6 most prominent brand colors as hex codes (#rrggbb), primary first. Ignore plain white, black and default greys unless they clearly define the brand.
2. fonts: font families used for headings and body text.
3. typography: heading font, body font and base font size.
4. design_tokens: border radius, spacing density, shadow style and button style, each as a short description.
5. logo_url: the URL of the site logo image, as written in the markup."#;

pub const CONTACT_PROMPT: &str = r#"You are extracting contact details from a business website.

Extract:
1. emails: every business email address.
2. phones: every phone number, formatted as shown on the page.
3. addresses: full postal addresses, one string each.
4. hours: opening hours, one line per day or range.
5. social_links: links to social media profiles with their platform name in lowercase.
6. coordinates: latitude and longitude if the page embeds them (maps, structured data)."#;

pub const CONTENT_PROMPT: &str = r#"You are a copywriter reading a business website to understand what the business does.

Extract:
1. tagline: the short slogan or value proposition, if one exists.
2. business_description: 1-3 sentences describing the business in its own words.
3. key_features: up to 8 short phrases naming what sets the business apart.
4. hero: the above-the-fold hero block - headline, subheadline, call-to-action text and link, background image URL."#;

pub const SOCIAL_PROOF_PROMPT: &str = r#"You are extracting structured content from a business website.

Extract:
1. services: each service or product offered, with a short description and price when shown.
2. testimonials: customer quotes with the author name and star rating when shown.
3. faq: question and answer pairs.
4. hours: opening hours lines.
5. footer: footer text, copyright line and footer link labels."#;

pub const IMAGES_PROMPT: &str = r#"You are cataloguing the images of a business website.

Extract:
1. images: every meaningful image with its URL as written in the markup, alt text, and role. Role is one of "logo", "hero", "gallery", "team", "product" or "content". Skip icons, tracking pixels and data URIs.
2. galleries: groups of related images shown together, with the gallery title when present."#;

pub const SOCIAL_MEDIA_PROMPT: &str = r#"You are finding the official social media profiles of a business website.

Extract profiles: each link to the business's own profile on a social platform (facebook, instagram, x, linkedin, youtube, tiktok, pinterest, yelp and similar). Use the platform name in lowercase. Skip share buttons and links to other businesses."#;

/// Full system prompt: phase instructions plus the shared rules.
pub fn system_prompt(instructions: &str) -> String {
    format!("{}\n{}", instructions, CONFIDENCE_RULES)
}

/// Format the user prompt for a page.
pub fn format_page_prompt(url: &str, content: &str) -> String {
    let mut out = String::with_capacity(PAGE_PROMPT.len() + url.len() + content.len());
    let mut rest = PAGE_PROMPT;
    while let Some(start) = rest.find('{') {
        out.push_str(&rest[..start]);
        let tail = &rest[start..];
        if let Some(after) = tail.strip_prefix("{url}") {
            out.push_str(url);
            rest = after;
        } else if let Some(after) = tail.strip_prefix("{content}") {
            out.push_str(content);
            rest = after;
        } else {
            out.push('{');
            rest = &tail[1..];
        }
    }
    out.push_str(rest);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_page_prompt() {
        let prompt = format_page_prompt("https://acme.test", "<h1>Acme</h1>");
        assert!(prompt.contains("Page URL: https://acme.test"));
        assert!(prompt.contains("<h1>Acme</h1>"));
        assert!(!prompt.contains("{content}"));
    }

    #[test]
    fn test_placeholders_in_values_are_left_alone() {
        let prompt = format_page_prompt("https://acme.test/{content}", "body with {url} inside");
        assert!(prompt.contains("Page URL: https://acme.test/{content}"));
        assert!(prompt.contains("body with {url} inside"));
        assert_eq!(prompt.matches("body with").count(), 1);
    }

    #[test]
    fn test_system_prompt_mentions_confidence() {
        let prompt = system_prompt(CONTACT_PROMPT);
        assert!(prompt.starts_with("You are extracting contact details"));
        assert!(prompt.contains("\"confidence\""));
    }
}
