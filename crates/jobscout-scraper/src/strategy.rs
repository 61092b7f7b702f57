//! Ordered fallback chains of text extraction strategies.
//!
//! Each strategy is one way of reading a field off the page. A chain tries
//! its strategies in order and keeps the first result its acceptance rule
//! allows. A strategy that finds nothing returns `Ok(None)`; a driver failure
//! inside a strategy is logged and the chain moves on.

use crate::probe::first_text;
use crate::site::{
    DESCRIPTION_CONTENT_SELECTORS, DESCRIPTION_END_MARKER_SETS, DESCRIPTION_SECTION_SELECTORS,
    DESCRIPTION_START_MARKERS, PAGE_TEXT_SELECTORS, SECTION_HEADING_SELECTORS,
};
use async_trait::async_trait;
use jobscout_browser::{BrowserError, Locator, PageDriver, Result};
use jobscout_core::normalize::{clean_description, extract_between, normalize_whitespace};
use jobscout_core::MIN_DESCRIPTION_CHARS;

/// Sections inspected per selector when looking for the anchored description.
const SECTION_SCAN_LIMIT: usize = 40;

/// One way of reading a field.
#[async_trait]
pub trait TextStrategy: Send + Sync {
    /// Short name used in logs.
    fn name(&self) -> &'static str;

    /// Read the field, `None` when this strategy finds nothing.
    async fn extract(&self, page: &dyn PageDriver) -> Result<Option<String>>;
}

/// Result of a chain: the text and the strategy that produced it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Extracted {
    /// Name of the strategy that produced the text
    pub strategy: &'static str,
    /// Extracted text
    pub text: String,
}

/// Strategies tried in order; the first accepted result wins.
pub struct StrategyChain {
    field: &'static str,
    strategies: Vec<Box<dyn TextStrategy>>,
    accept: fn(&str) -> bool,
}

impl StrategyChain {
    /// Empty chain accepting any non-empty text.
    #[must_use]
    pub fn new(field: &'static str) -> Self {
        Self {
            field,
            strategies: Vec::new(),
            accept: |text| !text.trim().is_empty(),
        }
    }

    /// Append a strategy.
    #[must_use]
    pub fn then(mut self, strategy: impl TextStrategy + 'static) -> Self {
        self.strategies.push(Box::new(strategy));
        self
    }

    /// Replace the acceptance rule.
    #[must_use]
    pub fn accepting(mut self, accept: fn(&str) -> bool) -> Self {
        self.accept = accept;
        self
    }

    /// Strategy names in the order they are tried.
    #[must_use]
    pub fn names(&self) -> Vec<&'static str> {
        self.strategies.iter().map(|s| s.name()).collect()
    }

    /// Run the chain. `None` when no strategy produced acceptable text.
    pub async fn run(&self, page: &dyn PageDriver) -> Option<Extracted> {
        for strategy in &self.strategies {
            match strategy.extract(page).await {
                Ok(Some(text)) if (self.accept)(&text) => {
                    tracing::debug!(
                        field = self.field,
                        strategy = strategy.name(),
                        chars = text.chars().count(),
                        "Strategy matched"
                    );
                    return Some(Extracted {
                        strategy: strategy.name(),
                        text,
                    });
                }
                Ok(Some(text)) => tracing::debug!(
                    field = self.field,
                    strategy = strategy.name(),
                    chars = text.chars().count(),
                    "Strategy result rejected"
                ),
                Ok(None) => tracing::debug!(
                    field = self.field,
                    strategy = strategy.name(),
                    "Strategy found nothing"
                ),
                Err(e) => tracing::warn!(
                    field = self.field,
                    strategy = strategy.name(),
                    "Strategy failed: {}",
                    e
                ),
            }
        }
        None
    }
}

/// Title from the page heading.
pub struct HeadingTitle;

#[async_trait]
impl TextStrategy for HeadingTitle {
    fn name(&self) -> &'static str {
        "heading"
    }

    async fn extract(&self, page: &dyn PageDriver) -> Result<Option<String>> {
        first_text(page, "h1").await
    }
}

/// Title from the document title, up to the first `|`.
pub struct DocumentTitle;

#[async_trait]
impl TextStrategy for DocumentTitle {
    fn name(&self) -> &'static str {
        "document-title"
    }

    async fn extract(&self, page: &dyn PageDriver) -> Result<Option<String>> {
        let title = page.page_title().await?;
        let head = normalize_whitespace(title.split('|').next().unwrap_or_default());
        Ok((!head.is_empty()).then_some(head))
    }
}

/// Description from the section opened by an "About this job" heading.
///
/// Only sections whose own `h2`/`h3` heading carries a start marker count.
/// Prefers a known content container inside the section, else the section's
/// text from the marker up to the first end marker.
pub struct AnchoredSection;

impl AnchoredSection {
    async fn is_anchored(page: &dyn PageDriver, section: &Locator) -> Result<bool> {
        for selector in SECTION_HEADING_SELECTORS {
            for heading in page.locate_within(section, selector).await? {
                let text = page.read_text(&heading).await?.to_lowercase();
                if DESCRIPTION_START_MARKERS
                    .iter()
                    .any(|marker| text.contains(&marker.to_lowercase()))
                {
                    return Ok(true);
                }
            }
        }
        Ok(false)
    }
}

#[async_trait]
impl TextStrategy for AnchoredSection {
    fn name(&self) -> &'static str {
        "anchored-section"
    }

    async fn extract(&self, page: &dyn PageDriver) -> Result<Option<String>> {
        for selector in DESCRIPTION_SECTION_SELECTORS {
            for section in page.locate(selector).await?.into_iter().take(SECTION_SCAN_LIMIT) {
                match Self::is_anchored(page, &section).await {
                    Ok(true) => {}
                    Ok(false) | Err(BrowserError::SelectorNotFound(_)) => continue,
                    Err(e) => return Err(e),
                }

                for content_selector in DESCRIPTION_CONTENT_SELECTORS {
                    if let Some(content) = page
                        .locate_within(&section, content_selector)
                        .await?
                        .into_iter()
                        .next()
                    {
                        let body = clean_description(&page.read_text(&content).await?);
                        if body.chars().count() >= MIN_DESCRIPTION_CHARS {
                            return Ok(Some(body));
                        }
                    }
                }

                let body = section_body(&page.read_text(&section).await?);
                if !body.is_empty() {
                    return Ok(Some(body));
                }
            }
        }
        Ok(None)
    }
}

/// Section text after the start marker, cut at the first end marker set that
/// occurs in it. Line breaks are kept.
fn section_body(text: &str) -> String {
    let start = DESCRIPTION_START_MARKERS
        .iter()
        .find_map(|marker| text.find(marker).map(|i| i + marker.len()))
        .unwrap_or(0);
    let tail = &text[start..];
    let end = DESCRIPTION_END_MARKER_SETS
        .iter()
        .find_map(|markers| markers.iter().filter_map(|marker| tail.find(marker)).min());
    clean_description(end.map_or(tail, |end| &tail[..end]))
}

/// Description from the first known content container with text.
pub struct KnownContainers;

#[async_trait]
impl TextStrategy for KnownContainers {
    fn name(&self) -> &'static str {
        "known-containers"
    }

    async fn extract(&self, page: &dyn PageDriver) -> Result<Option<String>> {
        for selector in DESCRIPTION_CONTENT_SELECTORS {
            if let Some(element) = page.locate(selector).await?.into_iter().next() {
                let body = clean_description(&page.read_text(&element).await?);
                if !body.is_empty() {
                    return Ok(Some(body));
                }
            }
        }
        Ok(None)
    }
}

/// Description sliced out of the whole page text between marker phrases.
pub struct BodySlice;

#[async_trait]
impl TextStrategy for BodySlice {
    fn name(&self) -> &'static str {
        "body-slice"
    }

    async fn extract(&self, page: &dyn PageDriver) -> Result<Option<String>> {
        let mut page_text = None;
        for selector in PAGE_TEXT_SELECTORS {
            if let Some(text) = first_text(page, selector).await? {
                page_text = Some(text);
                break;
            }
        }
        let Some(page_text) = page_text else {
            return Ok(None);
        };

        let remainder = extract_between(&page_text, DESCRIPTION_START_MARKERS, &[]);
        if remainder.is_empty() {
            return Ok(None);
        }

        // A set only applies when one of its end markers actually cuts the text
        for end_markers in DESCRIPTION_END_MARKER_SETS {
            let slice = extract_between(&page_text, DESCRIPTION_START_MARKERS, end_markers);
            if !slice.is_empty() && slice != remainder {
                return Ok(Some(clean_description(&slice)));
            }
        }
        Ok(Some(clean_description(&remainder)))
    }
}

/// Title chain: page heading, then document title.
#[must_use]
pub fn title_chain() -> StrategyChain {
    StrategyChain::new("title")
        .then(HeadingTitle)
        .then(DocumentTitle)
}

/// Description chain: anchored section, known containers, body slicing.
///
/// Results shorter than [`MIN_DESCRIPTION_CHARS`] fall through to the next
/// strategy.
#[must_use]
pub fn description_chain() -> StrategyChain {
    StrategyChain::new("description")
        .then(AnchoredSection)
        .then(KnownContainers)
        .then(BodySlice)
        .accepting(|text| text.chars().count() >= MIN_DESCRIPTION_CHARS)
}
