//! Per-URL detail page extraction.
//!
//! One call navigates to a detail page and ends in either a [`JobRecord`] or
//! a [`SkipReason`]. Skips are expected outcomes and are never retried; only
//! driver failures come back as errors.

use crate::contact::{ContactResolver, DEFAULT_ELEMENT_TIMEOUT};
use crate::pacing::Pacer;
use crate::probe::{find_labeled, first_match};
use crate::retry::RetryPolicy;
use crate::site::{
    is_bad_redirect, is_detail_url, is_non_content_title, EXPAND_BUTTON_SELECTORS, EXPAND_LABELS,
};
use crate::strategy::{description_chain, title_chain, StrategyChain};
use crate::Result;
use jobscout_browser::PageDriver;
use jobscout_core::normalize::extract_email;
use jobscout_core::{JobRecord, SearchFacet, SALARY_NOT_SPECIFIED, SOURCE_TAG};
use std::fmt;
use std::time::Duration;

const LABELED_BUTTON_SCAN_LIMIT: usize = 40;

/// Why a detail page produced no record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum SkipReason {
    /// The site sent us to a login, checkpoint or notifications page
    Redirected,
    /// Landed somewhere that is not a detail page
    NavigatedAway,
    /// The page is a known placeholder without a posting
    NonContentPage,
    /// Title or description missing or too short
    Incomplete,
}

impl SkipReason {
    /// Stable name used in logs and reports.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Redirected => "redirected",
            Self::NavigatedAway => "navigated-away",
            Self::NonContentPage => "non-content-page",
            Self::Incomplete => "incomplete",
        }
    }
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Terminal outcome of one detail page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DetailOutcome {
    /// A complete, validated record
    Record(JobRecord),
    /// An expected reason the page yields nothing
    Skip(SkipReason),
}

/// Turns one detail URL into a record or a skip.
pub struct DetailExtractor<'a> {
    page: &'a dyn PageDriver,
    pacer: &'a Pacer,
    retry: &'a RetryPolicy,
    contact_scan_limit: usize,
    element_timeout: Duration,
    title: StrategyChain,
    description: StrategyChain,
}

impl<'a> DetailExtractor<'a> {
    /// Extractor with default title and description chains.
    #[must_use]
    pub fn new(
        page: &'a dyn PageDriver,
        pacer: &'a Pacer,
        retry: &'a RetryPolicy,
        contact_scan_limit: usize,
    ) -> Self {
        Self {
            page,
            pacer,
            retry,
            contact_scan_limit,
            element_timeout: DEFAULT_ELEMENT_TIMEOUT,
            title: title_chain(),
            description: description_chain(),
        }
    }

    /// How long contact resolution waits for late-rendering sections.
    #[must_use]
    pub fn with_element_timeout(mut self, timeout: Duration) -> Self {
        self.element_timeout = timeout;
        self
    }

    /// Extract the posting at `url`, labelling it with the facet's location.
    pub async fn extract(&self, url: &str, facet: &SearchFacet) -> Result<DetailOutcome> {
        self.page.navigate(url).await?;
        self.pacer.settle(1200).await;

        let landed = self.page.current_url().await?;
        if is_bad_redirect(&landed) {
            tracing::warn!("Bot-detection redirect on {}: landed on {}", url, landed);
            self.pacer.redirect_cooldown().await;
            return Ok(DetailOutcome::Skip(SkipReason::Redirected));
        }
        if !is_detail_url(&landed) {
            tracing::debug!("{} navigated away to {}", url, landed);
            return Ok(DetailOutcome::Skip(SkipReason::NavigatedAway));
        }

        self.pacer.settle(900).await;
        self.pacer.jitter().await;
        for _ in 0..3 {
            self.page.scroll_by(0, 700).await?;
            self.pacer.settle(400).await;
        }
        self.expand_truncated_text().await;

        let title = self
            .title
            .run(self.page)
            .await
            .map(|found| found.text)
            .unwrap_or_default();
        if is_non_content_title(&title) {
            tracing::debug!("{} is a non-content page: {}", url, title);
            return Ok(DetailOutcome::Skip(SkipReason::NonContentPage));
        }

        let description = self
            .description
            .run(self.page)
            .await
            .map(|found| found.text)
            .unwrap_or_default();
        let mut record = JobRecord {
            source_url: url.to_string(),
            title,
            description,
            salary: SALARY_NOT_SPECIFIED.to_string(),
            location: facet.location.clone(),
            contact_email: String::new(),
            contact_profile_url: String::new(),
            source: SOURCE_TAG.to_string(),
        };
        if let Err(e) = record.validate() {
            tracing::debug!(title = %record.title, "Incomplete posting at {}: {}", url, e);
            return Ok(DetailOutcome::Skip(SkipReason::Incomplete));
        }

        let contact = ContactResolver::new(self.page, self.pacer, self.retry, self.contact_scan_limit)
            .with_element_timeout(self.element_timeout)
            .resolve()
            .await;
        record.contact_email = if contact.email.is_empty() {
            extract_email(&record.description)
        } else {
            contact.email
        };
        record.contact_profile_url = contact.profile_url;

        Ok(DetailOutcome::Record(record))
    }

    /// Click an expand control if one exists. Absence is normal.
    async fn expand_truncated_text(&self) {
        let mut candidates = match first_match(self.page, EXPAND_BUTTON_SELECTORS).await {
            Ok(found) => found.into_iter().collect::<Vec<_>>(),
            Err(e) => {
                tracing::warn!("Expand control lookup failed: {}", e);
                Vec::new()
            }
        };
        match find_labeled(self.page, &["button"], EXPAND_LABELS, LABELED_BUTTON_SCAN_LIMIT).await {
            Ok(found) => candidates.extend(found),
            Err(e) => tracing::warn!("Labeled expand control lookup failed: {}", e),
        }

        for control in &candidates {
            match self.page.click(control).await {
                Ok(()) => {
                    tracing::debug!("Expanded description via {}", control);
                    self.pacer.settle(800).await;
                    return;
                }
                Err(e) => tracing::debug!("Expand control {} not clickable: {}", control, e),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use jobscout_browser::{ElementFixture, PageFixture, ScriptedPage};

    const URL: &str = "https://www.linkedin.com/jobs/view/42/";
    const BODY: &str = "Join our team to build and maintain automated test suites for payments.";

    fn facet() -> SearchFacet {
        SearchFacet {
            role: "QA Engineer".to_string(),
            location: "Алматы".to_string(),
            geo_id: 105_526_356,
            keywords: vec!["qa".to_string()],
        }
    }

    async fn extract(page: &ScriptedPage) -> DetailOutcome {
        let pacer = Pacer::disabled();
        let retry = RetryPolicy::immediate(1);
        DetailExtractor::new(page, &pacer, &retry, 60)
            .extract(URL, &facet())
            .await
            .unwrap()
    }

    #[test]
    fn test_skip_reason_names() {
        assert_eq!(SkipReason::Redirected.to_string(), "redirected");
        assert_eq!(SkipReason::NavigatedAway.as_str(), "navigated-away");
        assert_eq!(SkipReason::NonContentPage.as_str(), "non-content-page");
        assert_eq!(SkipReason::Incomplete.as_str(), "incomplete");
    }

    #[tokio::test]
    async fn test_record_from_page() {
        let page = ScriptedPage::new().page(
            URL,
            PageFixture::new()
                .element("h1", ElementFixture::with_text("QA Engineer"))
                .element("div#job-details", ElementFixture::with_text(BODY)),
        );

        let DetailOutcome::Record(record) = extract(&page).await else {
            panic!("expected a record");
        };
        assert_eq!(record.source_url, URL);
        assert_eq!(record.title, "QA Engineer");
        assert_eq!(record.description, BODY);
        assert_eq!(record.salary, SALARY_NOT_SPECIFIED);
        assert_eq!(record.location, "Алматы");
        assert_eq!(record.source, SOURCE_TAG);
        assert!(record.validate().is_ok());
    }

    #[tokio::test]
    async fn test_expand_control_is_clicked() {
        let page = ScriptedPage::new().page(
            URL,
            PageFixture::new()
                .element("h1", ElementFixture::with_text("QA Engineer"))
                .element("button", ElementFixture::with_text("Apply"))
                .element(
                    "button",
                    ElementFixture::with_text(" Show more ")
                        .reveals("div#job-details", ElementFixture::with_text(BODY)),
                ),
        );

        let DetailOutcome::Record(record) = extract(&page).await else {
            panic!("expected a record");
        };
        assert_eq!(record.description, BODY);
        assert_eq!(page.clicks(), vec!["button[1]".to_string()]);
    }

    #[tokio::test]
    async fn test_bad_redirect_is_skipped() {
        let page = ScriptedPage::new().page(
            URL,
            PageFixture::new().redirect_to("https://www.linkedin.com/checkpoint/challenge/abc"),
        );
        assert_eq!(extract(&page).await, DetailOutcome::Skip(SkipReason::Redirected));
    }

    #[tokio::test]
    async fn test_navigated_away() {
        let page = ScriptedPage::new().page(
            URL,
            PageFixture::new().redirect_to("https://www.linkedin.com/feed/"),
        );
        assert_eq!(extract(&page).await, DetailOutcome::Skip(SkipReason::NavigatedAway));
    }

    #[tokio::test]
    async fn test_non_content_page() {
        let page = ScriptedPage::new().page(
            URL,
            PageFixture::new()
                .title("Manage your notifications | LinkedIn")
                .element("div#job-details", ElementFixture::with_text(BODY)),
        );
        assert_eq!(extract(&page).await, DetailOutcome::Skip(SkipReason::NonContentPage));
    }

    #[tokio::test]
    async fn test_missing_title_is_incomplete() {
        let page = ScriptedPage::new().page(
            URL,
            PageFixture::new().element("div#job-details", ElementFixture::with_text(BODY)),
        );
        assert_eq!(extract(&page).await, DetailOutcome::Skip(SkipReason::Incomplete));
    }

    #[tokio::test]
    async fn test_short_description_skips_contact_lookup() {
        let page = ScriptedPage::new().page(
            URL,
            PageFixture::new()
                .element("h1", ElementFixture::with_text("QA Engineer"))
                .element("div#job-details", ElementFixture::with_text("QA role, apply today!"))
                .element(
                    crate::site::PROFILE_LINK_SELECTOR,
                    ElementFixture::link("https://www.linkedin.com/in/jane-doe", "Jane Doe"),
                ),
        );
        assert_eq!(extract(&page).await, DetailOutcome::Skip(SkipReason::Incomplete));
        assert_eq!(page.visits(), vec![URL.to_string()]);
    }

    #[tokio::test]
    async fn test_unknown_url_is_an_error() {
        let page = ScriptedPage::new();
        let pacer = Pacer::disabled();
        let retry = RetryPolicy::immediate(1);
        let result = DetailExtractor::new(&page, &pacer, &retry, 60)
            .extract(URL, &facet())
            .await;
        assert!(result.is_err());
    }
}
