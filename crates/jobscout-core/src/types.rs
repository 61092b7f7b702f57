//! Shared types used across jobscout.
//!
//! A [`JobRecord`] is materialised once per successfully extracted detail
//! page. A [`SearchFacet`] is one (role, location) combination that drives a
//! single search query.

use crate::error::CoreError;
use serde::{Deserialize, Serialize};

/// Tag identifying the listings site every record originates from.
pub const SOURCE_TAG: &str = "LinkedIn";

/// Salary value used when the posting does not expose compensation.
pub const SALARY_NOT_SPECIFIED: &str = "not specified";

/// Minimum number of characters a cleaned description must have.
///
/// Shorter content is an extraction failure, not a valid short posting.
pub const MIN_DESCRIPTION_CHARS: usize = 40;

/// One discovered job posting.
///
/// Serialized field names match the JSON output format exactly.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobRecord {
    /// Canonical detail-page URL
    pub source_url: String,
    /// Posting title, never empty
    pub title: String,
    /// Cleaned description text
    pub description: String,
    /// Free-text salary or [`SALARY_NOT_SPECIFIED`]
    pub salary: String,
    /// Location label of the facet that discovered the posting
    pub location: String,
    /// Contact email, empty when none was found
    pub contact_email: String,
    /// Canonical recruiter profile URL, empty when none was found
    pub contact_profile_url: String,
    /// Origin site tag
    pub source: String,
}

impl JobRecord {
    /// Check the materialisation invariant.
    ///
    /// # Errors
    /// Returns `CoreError::InvalidRecord` when the title or description is
    /// empty, or the description is shorter than [`MIN_DESCRIPTION_CHARS`].
    pub fn validate(&self) -> Result<(), CoreError> {
        if self.title.trim().is_empty() {
            return Err(CoreError::InvalidRecord("title is empty".to_string()));
        }

        let chars = self.description.chars().count();
        if chars == 0 {
            return Err(CoreError::InvalidRecord("description is empty".to_string()));
        }
        if chars < MIN_DESCRIPTION_CHARS {
            return Err(CoreError::InvalidRecord(format!(
                "description has {chars} characters, need at least {MIN_DESCRIPTION_CHARS}"
            )));
        }

        Ok(())
    }

    /// Contact string used for deduplication: email, else profile URL, else source URL.
    #[must_use]
    pub fn dedup_contact(&self) -> &str {
        [
            self.contact_email.as_str(),
            self.contact_profile_url.as_str(),
            self.source_url.as_str(),
        ]
        .into_iter()
        .find(|c| !c.is_empty())
        .unwrap_or_default()
    }

    /// Human-readable contact line (`email | profile | url`), empty parts omitted.
    #[must_use]
    pub fn contact_summary(&self) -> String {
        [
            self.contact_email.as_str(),
            self.contact_profile_url.as_str(),
            self.source_url.as_str(),
        ]
        .into_iter()
        .filter(|c| !c.is_empty())
        .collect::<Vec<_>>()
        .join(" | ")
    }

    /// Whether the record is relevant to a set of lowercase role keywords.
    ///
    /// Matching is a case-insensitive substring test against title and
    /// description. An empty keyword set accepts every record.
    #[must_use]
    pub fn matches_keywords(&self, keywords: &[String]) -> bool {
        if keywords.is_empty() {
            return true;
        }

        let haystack = format!("{}\n{}", self.title, self.description).to_lowercase();
        keywords
            .iter()
            .any(|keyword| haystack.contains(&keyword.to_lowercase()))
    }
}

/// One (role, location) search combination.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchFacet {
    /// Role label used as the search keywords
    pub role: String,
    /// Location label copied onto every record found under this facet
    pub location: String,
    /// Site-specific location identifier
    pub geo_id: u64,
    /// Lowercase relevance keywords for the role
    pub keywords: Vec<String>,
}

impl std::fmt::Display for SearchFacet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} @ {}", self.role, self.location)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record() -> JobRecord {
        JobRecord {
            source_url: "https://www.linkedin.com/jobs/view/123/".to_string(),
            title: "QA Engineer".to_string(),
            description: "We are looking for a QA engineer to join our platform team.".to_string(),
            salary: SALARY_NOT_SPECIFIED.to_string(),
            location: "Алматы".to_string(),
            contact_email: String::new(),
            contact_profile_url: String::new(),
            source: SOURCE_TAG.to_string(),
        }
    }

    #[test]
    fn test_validate_accepts_complete_record() {
        assert!(record().validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_short_description() {
        let mut job = record();
        job.description = "a".repeat(30);
        let err = job.validate().unwrap_err();
        assert!(err.to_string().contains("30 characters"));

        job.description = "a".repeat(MIN_DESCRIPTION_CHARS);
        assert!(job.validate().is_ok());
    }

    #[test]
    fn test_validate_counts_characters_not_bytes() {
        let mut job = record();
        // 39 Cyrillic characters are 78 bytes
        job.description = "я".repeat(39);
        assert!(job.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_blank_title() {
        let mut job = record();
        job.title = "   ".to_string();
        assert!(job.validate().is_err());
    }

    #[test]
    fn test_dedup_contact_priority() {
        let mut job = record();
        assert_eq!(job.dedup_contact(), "https://www.linkedin.com/jobs/view/123/");

        job.contact_profile_url = "https://www.linkedin.com/in/jane/".to_string();
        assert_eq!(job.dedup_contact(), "https://www.linkedin.com/in/jane/");

        job.contact_email = "hr@acme.com".to_string();
        assert_eq!(job.dedup_contact(), "hr@acme.com");
    }

    #[test]
    fn test_contact_summary_skips_empty_parts() {
        let mut job = record();
        job.contact_email = "hr@acme.com".to_string();
        assert_eq!(
            job.contact_summary(),
            "hr@acme.com | https://www.linkedin.com/jobs/view/123/"
        );
    }

    #[test]
    fn test_matches_keywords() {
        let job = record();
        assert!(job.matches_keywords(&["qa".to_string()]));
        assert!(job.matches_keywords(&["PLATFORM".to_string()]));
        assert!(!job.matches_keywords(&["react".to_string(), "vue".to_string()]));
        assert!(job.matches_keywords(&[]));
    }

    #[test]
    fn test_serialized_field_names() {
        let json = serde_json::to_value(record()).expect("serialize record");
        let mut keys: Vec<_> = json
            .as_object()
            .expect("object")
            .keys()
            .cloned()
            .collect();
        keys.sort();
        assert_eq!(
            keys,
            vec![
                "contactEmail",
                "contactProfileUrl",
                "description",
                "location",
                "salary",
                "source",
                "sourceUrl",
                "title"
            ]
        );
    }
}
