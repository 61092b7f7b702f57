//! Deduplication fingerprints.
//!
//! Two postings with equal fingerprints are treated as the same real-world
//! posting. The description key is truncated, so long descriptions sharing a
//! common prefix collide.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;

/// Number of characters of the normalised description kept in the key.
pub const DESCRIPTION_KEY_CHARS: usize = 200;

/// Dedup key `(description, contact)`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Fingerprint {
    /// Normalised description, truncated to [`DESCRIPTION_KEY_CHARS`]
    pub description: String,
    /// Normalised contact string
    pub contact: String,
}

impl Fingerprint {
    /// Derive the fingerprint of a description and its dedup contact.
    #[must_use]
    pub fn of(description: &str, contact: &str) -> Self {
        Self {
            description: normalize_key(description)
                .chars()
                .take(DESCRIPTION_KEY_CHARS)
                .collect(),
            contact: normalize_key(contact),
        }
    }
}

/// Lowercase, drop everything but word characters, whitespace and `@+.$₸-`,
/// then collapse whitespace.
#[must_use]
pub fn normalize_key(text: &str) -> String {
    static STRIP_REGEX: OnceLock<Regex> = OnceLock::new();
    let regex =
        STRIP_REGEX.get_or_init(|| Regex::new(r"[^\w\s@+.$₸-]").expect("valid regex"));

    let lowered = text.trim().to_lowercase();
    let stripped = regex.replace_all(&lowered, "");
    stripped.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_equal_for_surface_differences() {
        let a = Fingerprint::of("Great Job!! Apply now", "x@y.com");
        let b = Fingerprint::of("great   job apply\nnow", "X@Y.COM");
        assert_eq!(a, b);
        assert_eq!(a.description, "great job apply now");
        assert_eq!(a.contact, "x@y.com");
    }

    #[test]
    fn test_keeps_compensation_symbols() {
        assert_eq!(normalize_key("Salary: $1.500+ / 600 000 ₸ (net)"), "salary $1.500+ 600 000 ₸ net");
    }

    #[test]
    fn test_keeps_non_latin_words() {
        assert_eq!(normalize_key("Ищем QA-инженера!"), "ищем qa-инженера");
    }

    #[test]
    fn test_description_truncated_to_200_chars() {
        let shared = "x".repeat(DESCRIPTION_KEY_CHARS);
        let a = Fingerprint::of(&format!("{shared} first ending"), "c");
        let b = Fingerprint::of(&format!("{shared} second ending"), "c");
        assert_eq!(a.description.chars().count(), DESCRIPTION_KEY_CHARS);
        assert_eq!(a, b);
    }

    #[test]
    fn test_contact_differs() {
        let a = Fingerprint::of("same text", "a@b.com");
        let b = Fingerprint::of("same text", "c@d.com");
        assert_ne!(a, b);
    }
}
