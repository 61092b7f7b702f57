//! Pure text utilities shared by the extraction pipeline.

use regex::Regex;
use std::sync::OnceLock;
use url::Url;

/// Origin used to absolutise relative links found on the listings site.
pub const SITE_ORIGIN: &str = "https://www.linkedin.com";

/// Path segment that marks a member profile URL.
pub const PROFILE_MARKER: &str = "/in/";

/// Boilerplate removed from descriptions, in removal order.
const DESCRIPTION_BOILERPLATE: &[&str] = &[
    "Об этой вакансии",
    "About this job",
    "…Показать еще",
    "...Показать еще",
    "Показать еще",
    "Показать ещё",
    "Show more",
    "See more",
];

/// Collapse every run of whitespace (newlines included) to one space and trim.
#[must_use]
pub fn normalize_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Canonicalise a link found on the site.
///
/// Drops query and fragment, and resolves relative and scheme-relative hrefs
/// against [`SITE_ORIGIN`]. Input that cannot be parsed as a URL is returned
/// trimmed, with anything after `?` or `#` removed.
#[must_use]
pub fn canonicalize_url(href: &str) -> String {
    let href = href.trim();
    if href.is_empty() {
        return String::new();
    }

    let parsed = Url::parse(href).or_else(|_| {
        Url::parse(SITE_ORIGIN).and_then(|origin| origin.join(href))
    });

    match parsed {
        Ok(mut url) => {
            url.set_query(None);
            url.set_fragment(None);
            url.to_string()
        }
        Err(_) => href
            .split(['?', '#'])
            .next()
            .unwrap_or_default()
            .to_string(),
    }
}

/// Canonicalise a recruiter profile URL.
///
/// Same as [`canonicalize_url`], plus a trailing slash when the path contains
/// the profile marker. Idempotent.
#[must_use]
pub fn normalize_profile_url(href: &str) -> String {
    let mut url = canonicalize_url(href);
    if url.contains(PROFILE_MARKER) && !url.ends_with('/') {
        url.push('/');
    }
    url
}

/// Leftmost `local@domain.tld` match in the text, or an empty string.
#[must_use]
pub fn extract_email(text: &str) -> String {
    static EMAIL_REGEX: OnceLock<Regex> = OnceLock::new();
    let regex = EMAIL_REGEX.get_or_init(|| {
        Regex::new(r"[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}").expect("valid regex")
    });

    regex
        .find(text)
        .map(|m| m.as_str().to_string())
        .unwrap_or_default()
}

/// Strip section headers and "show more" affordances from a description,
/// then collapse three or more consecutive newlines to two.
#[must_use]
pub fn clean_description(text: &str) -> String {
    static NEWLINES_REGEX: OnceLock<Regex> = OnceLock::new();
    if text.is_empty() {
        return String::new();
    }

    let mut cleaned = text.to_string();
    for phrase in DESCRIPTION_BOILERPLATE {
        cleaned = cleaned.replace(phrase, "");
    }

    let regex = NEWLINES_REGEX.get_or_init(|| Regex::new(r"\n{3,}").expect("valid regex"));
    regex.replace_all(&cleaned, "\n\n").trim().to_string()
}

/// Text between the first start marker found and the first end marker after it.
///
/// Start markers are tried in priority order, then end markers in priority
/// order. Without an end marker the remainder is taken. Returns an empty string
/// when no start marker occurs. The result is whitespace-normalised.
#[must_use]
pub fn extract_between(text: &str, start_markers: &[&str], end_markers: &[&str]) -> String {
    if text.is_empty() {
        return String::new();
    }

    let Some(start) = start_markers
        .iter()
        .find_map(|marker| text.find(marker).map(|i| i + marker.len()))
    else {
        return String::new();
    };

    let tail = &text[start..];
    let chunk = end_markers
        .iter()
        .find_map(|marker| tail.find(marker))
        .map_or(tail, |end| &tail[..end]);

    normalize_whitespace(chunk)
}
