use crate::error::{BrowserError, Result};
use std::fmt;

/// Stateless handle to an element: a path of `(selector, index)` steps.
///
/// The first step is resolved against the document, each further step
/// against the element matched by the previous one. Handles are re-resolved on
/// every use, so a handle to an element that disappeared yields
/// `BrowserError::SelectorNotFound` instead of acting on a stale node.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Locator {
    steps: Vec<(String, usize)>,
}

impl Locator {
    /// Handle to the `index`-th match of `selector` in the document.
    #[must_use]
    pub fn nth(selector: impl Into<String>, index: usize) -> Self {
        Self {
            steps: vec![(selector.into(), index)],
        }
    }

    /// Handle to the `index`-th match of `selector` inside this element.
    #[must_use]
    pub fn child(&self, selector: impl Into<String>, index: usize) -> Self {
        let mut steps = self.steps.clone();
        steps.push((selector.into(), index));
        Self { steps }
    }

    /// Resolution steps, outermost first.
    #[must_use]
    pub fn steps(&self) -> &[(String, usize)] {
        &self.steps
    }
}

impl fmt::Display for Locator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rendered: Vec<String> = self
            .steps
            .iter()
            .map(|(selector, index)| format!("{selector}[{index}]"))
            .collect();
        write!(f, "{}", rendered.join(" >> "))
    }
}

/// Page automation capability the scraper is written against.
///
/// One implementation drives a real Chromium page, another replays recorded
/// fixtures. Lookups that find nothing return empty results; only failures of
/// the page itself are errors.
#[async_trait::async_trait]
pub trait PageDriver: Send + Sync {
    /// Navigate to a URL and return the URL the page ended up on.
    async fn navigate(&self, url: &str) -> Result<String>;

    /// URL of the current document.
    async fn current_url(&self) -> Result<String>;

    /// Title of the current document, empty if it has none.
    async fn page_title(&self) -> Result<String>;

    /// Handles to every element matching `selector`, in document order.
    async fn locate(&self, selector: &str) -> Result<Vec<Locator>>;

    /// Handles to every descendant of `parent` matching `selector`.
    async fn locate_within(&self, parent: &Locator, selector: &str) -> Result<Vec<Locator>>;

    /// Wait until at least one element matches `selector`.
    async fn wait_for(&self, selector: &str, timeout_ms: u64) -> Result<()>;

    /// Scroll the whole page.
    async fn scroll_by(&self, dx: i64, dy: i64) -> Result<()>;

    /// Scroll inside an element.
    async fn scroll_element_by(&self, element: &Locator, dx: i64, dy: i64) -> Result<()>;

    /// Whether an element has content overflowing its visible height.
    async fn is_scrollable(&self, element: &Locator) -> Result<bool>;

    /// Click an element, scrolling it into view first.
    async fn click(&self, element: &Locator) -> Result<()>;

    /// Rendered text of an element.
    async fn read_text(&self, element: &Locator) -> Result<String>;

    /// Attribute value of an element, `None` when absent.
    async fn attribute(&self, element: &Locator, name: &str) -> Result<Option<String>>;
}

/// Helper to extract domain from URL
pub fn extract_domain(url: &str) -> Result<String> {
    let url = url::Url::parse(url)
        .map_err(|e| BrowserError::NavigationError(format!("Invalid URL: {}", e)))?;

    url.host_str()
        .ok_or_else(|| BrowserError::NavigationError("No host in URL".to_string()))
        .map(|s| s.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_domain() {
        assert_eq!(
            extract_domain("https://www.linkedin.com/jobs/view/1/").unwrap(),
            "www.linkedin.com"
        );
        assert_eq!(
            extract_domain("http://subdomain.example.com:8080/path").unwrap(),
            "subdomain.example.com"
        );
    }

    #[test]
    fn test_extract_domain_invalid() {
        assert!(extract_domain("not-a-url").is_err());
    }

    #[test]
    fn test_locator_display() {
        let section = Locator::nth("section", 2);
        let body = section.child("div.content", 0);
        assert_eq!(body.to_string(), "section[2] >> div.content[0]");
        assert_eq!(body.steps().len(), 2);
        assert_eq!(section.steps().len(), 1);
    }
}
