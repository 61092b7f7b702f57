//! Role filtering and in-run duplicate detection for extracted records.

#![allow(clippy::must_use_candidate)]

use jobscout_core::{Fingerprint, JobRecord};
use std::collections::HashSet;

/// What the run should do with an extracted record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    /// New in this run and on-role
    Accept,
    /// None of the facet's keywords appear in the title or description
    OffRole,
    /// Same fingerprint as a record accepted earlier in this run
    Duplicate,
}

/// Role relevance and in-run fingerprint dedup.
#[derive(Debug, Default)]
pub struct RecordFilter {
    seen: HashSet<Fingerprint>,
}

impl RecordFilter {
    /// Filter with nothing seen yet.
    pub fn new() -> Self {
        Self::default()
    }

    /// Classify `record`, remembering its fingerprint when accepted.
    ///
    /// Off-role records are not remembered, so a later facet whose keywords
    /// do match can still accept the same posting.
    pub fn check(&mut self, record: &JobRecord, keywords: &[String]) -> Verdict {
        if !record.matches_keywords(keywords) {
            return Verdict::OffRole;
        }
        let fingerprint = Fingerprint::of(&record.description, record.dedup_contact());
        if self.seen.insert(fingerprint) {
            Verdict::Accept
        } else {
            Verdict::Duplicate
        }
    }

    /// Number of fingerprints remembered.
    pub fn seen(&self) -> usize {
        self.seen.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(url: &str, title: &str, description: &str, email: &str) -> JobRecord {
        JobRecord {
            source_url: url.to_string(),
            title: title.to_string(),
            description: description.to_string(),
            salary: jobscout_core::SALARY_NOT_SPECIFIED.to_string(),
            location: "Астана".to_string(),
            contact_email: email.to_string(),
            contact_profile_url: String::new(),
            source: jobscout_core::SOURCE_TAG.to_string(),
        }
    }

    fn keywords(words: &[&str]) -> Vec<String> {
        words.iter().map(ToString::to_string).collect()
    }

    #[test]
    fn test_off_role_records_rejected() {
        let mut filter = RecordFilter::new();
        let chef = record(
            "https://www.linkedin.com/jobs/view/1/",
            "Sous Chef",
            "Prepare seasonal menus in a busy downtown restaurant kitchen.",
            "",
        );
        assert_eq!(filter.check(&chef, &keywords(&["qa", "tester"])), Verdict::OffRole);
        assert_eq!(filter.seen(), 0);
    }

    #[test]
    fn test_empty_keywords_accept_everything() {
        let mut filter = RecordFilter::new();
        let chef = record(
            "https://www.linkedin.com/jobs/view/1/",
            "Sous Chef",
            "Prepare seasonal menus in a busy downtown restaurant kitchen.",
            "",
        );
        assert_eq!(filter.check(&chef, &[]), Verdict::Accept);
    }

    #[test]
    fn test_duplicate_fingerprints_across_urls() {
        let mut filter = RecordFilter::new();
        let first = record(
            "https://www.linkedin.com/jobs/view/1/",
            "QA Engineer",
            "Looking for a QA Engineer!! Manual, and automated testing",
            "HR@acme.com",
        );
        let repost = record(
            "https://www.linkedin.com/jobs/view/2/",
            "QA engineer",
            "looking for a qa engineer manual and automated testing",
            "hr@acme.com",
        );

        let kw = keywords(&["qa"]);
        assert_eq!(filter.check(&first, &kw), Verdict::Accept);
        assert_eq!(filter.check(&repost, &kw), Verdict::Duplicate);
        assert_eq!(filter.seen(), 1);
    }
}
