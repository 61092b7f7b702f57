//! Lookups whose "nothing there" outcome is an answer, not a failure.
//!
//! Absence comes back as `None`, `false` or an empty list. Only failures of
//! the page driver itself are errors.

use jobscout_browser::{BrowserError, Locator, PageDriver, Result};
use jobscout_core::normalize::normalize_whitespace;

/// First element matching the first selector that matches anything.
pub async fn first_match(page: &dyn PageDriver, selectors: &[&str]) -> Result<Option<Locator>> {
    for selector in selectors {
        if let Some(found) = page.locate(selector).await?.into_iter().next() {
            return Ok(Some(found));
        }
    }
    Ok(None)
}

/// Elements of the given tags whose text matches one of `labels`.
///
/// Matching ignores case and surrounding whitespace. At most `limit` elements
/// per tag are read.
pub async fn find_labeled(
    page: &dyn PageDriver,
    tags: &[&str],
    labels: &[&str],
    limit: usize,
) -> Result<Vec<Locator>> {
    let labels: Vec<String> = labels.iter().map(|l| l.to_lowercase()).collect();
    let mut found = Vec::new();

    for tag in tags {
        for element in page.locate(tag).await?.into_iter().take(limit) {
            let text = match page.read_text(&element).await {
                Ok(text) => normalize_whitespace(&text).to_lowercase(),
                Err(BrowserError::SelectorNotFound(_)) => continue,
                Err(e) => return Err(e),
            };
            if labels.iter().any(|label| text == *label) {
                found.push(element);
            }
        }
    }
    Ok(found)
}

/// Whether `selector` appears within `timeout_ms`.
pub async fn wait_present(page: &dyn PageDriver, selector: &str, timeout_ms: u64) -> Result<bool> {
    match page.wait_for(selector, timeout_ms).await {
        Ok(()) => Ok(true),
        Err(BrowserError::Timeout(_)) => Ok(false),
        Err(e) => Err(e),
    }
}

/// Whitespace-normalised text of the first element matching `selector`.
pub async fn first_text(page: &dyn PageDriver, selector: &str) -> Result<Option<String>> {
    let Some(element) = page.locate(selector).await?.into_iter().next() else {
        return Ok(None);
    };
    let text = normalize_whitespace(&page.read_text(&element).await?);
    Ok((!text.is_empty()).then_some(text))
}
