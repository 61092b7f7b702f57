//! Deterministic page driver that replays recorded pages.
//!
//! Pages are keyed by the URL they are requested with. Selectors are matched
//! by exact string, so fixtures list elements under the same selector strings
//! the scraper queries. Used for offline replay of a run and in tests.

use crate::actions::{Locator, PageDriver};
use crate::error::{BrowserError, Result};
use std::collections::{BTreeMap, HashMap};
use std::sync::Mutex;

/// One element of a recorded page.
#[derive(Debug, Clone, Default)]
pub struct ElementFixture {
    pub text: String,
    pub attributes: HashMap<String, String>,
    pub children: BTreeMap<String, Vec<ElementFixture>>,
    pub scrollable: bool,
    /// Elements added to the page when this element is clicked
    pub reveals: Vec<(String, ElementFixture)>,
    pub click_fails: bool,
}

impl ElementFixture {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Self::default()
        }
    }

    /// Anchor with an `href` and link text.
    pub fn link(href: impl Into<String>, text: impl Into<String>) -> Self {
        Self::with_text(text).attr("href", href)
    }

    pub fn attr(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.insert(name.into(), value.into());
        self
    }

    pub fn child(mut self, selector: impl Into<String>, child: ElementFixture) -> Self {
        self.children.entry(selector.into()).or_default().push(child);
        self
    }

    pub fn scrollable(mut self) -> Self {
        self.scrollable = true;
        self
    }

    pub fn reveals(mut self, selector: impl Into<String>, element: ElementFixture) -> Self {
        self.reveals.push((selector.into(), element));
        self
    }

    pub fn failing_click(mut self) -> Self {
        self.click_fails = true;
        self
    }
}

/// One recorded page.
#[derive(Debug, Clone, Default)]
pub struct PageFixture {
    /// URL the browser lands on instead of the requested one
    pub redirect_to: Option<String>,
    pub title: String,
    pub elements: BTreeMap<String, Vec<ElementFixture>>,
    /// Elements that only exist once the page has been scrolled `n` times
    pub after_scrolls: Vec<(usize, String, ElementFixture)>,
    /// Navigations that fail with a timeout before one succeeds
    pub transient_failures: usize,
}

impl PageFixture {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    pub fn redirect_to(mut self, url: impl Into<String>) -> Self {
        self.redirect_to = Some(url.into());
        self
    }

    pub fn element(mut self, selector: impl Into<String>, element: ElementFixture) -> Self {
        self.elements.entry(selector.into()).or_default().push(element);
        self
    }

    pub fn element_after_scrolls(
        mut self,
        scrolls: usize,
        selector: impl Into<String>,
        element: ElementFixture,
    ) -> Self {
        self.after_scrolls.push((scrolls, selector.into(), element));
        self
    }

    pub fn failing_first(mut self, navigations: usize) -> Self {
        self.transient_failures = navigations;
        self
    }
}

#[derive(Debug, Default)]
struct State {
    url: String,
    page: PageFixture,
    revealed: Vec<(String, ElementFixture)>,
    scrolls: usize,
    visits: Vec<String>,
    clicks: Vec<String>,
    failures: HashMap<String, usize>,
}

impl State {
    fn elements(&self, selector: &str) -> Vec<ElementFixture> {
        let mut found = self.page.elements.get(selector).cloned().unwrap_or_default();
        found.extend(
            self.page
                .after_scrolls
                .iter()
                .filter(|(after, sel, _)| *after <= self.scrolls && sel == selector)
                .map(|(_, _, element)| element.clone()),
        );
        found.extend(
            self.revealed
                .iter()
                .filter(|(sel, _)| sel == selector)
                .map(|(_, element)| element.clone()),
        );
        found
    }

    fn resolve(&self, locator: &Locator) -> Result<ElementFixture> {
        let mut current: Option<ElementFixture> = None;
        for (selector, index) in locator.steps() {
            let candidates = match &current {
                None => self.elements(selector),
                Some(parent) => parent.children.get(selector).cloned().unwrap_or_default(),
            };
            current = Some(
                candidates
                    .into_iter()
                    .nth(*index)
                    .ok_or_else(|| BrowserError::SelectorNotFound(locator.to_string()))?,
            );
        }
        current.ok_or_else(|| BrowserError::SelectorNotFound(locator.to_string()))
    }
}

/// Page driver replaying [`PageFixture`]s.
#[derive(Debug)]
pub struct ScriptedPage {
    pages: HashMap<String, PageFixture>,
    state: Mutex<State>,
}

impl ScriptedPage {
    pub fn new() -> Self {
        Self {
            pages: HashMap::new(),
            state: Mutex::new(State {
                url: "about:blank".to_string(),
                ..State::default()
            }),
        }
    }

    /// Register the page served for `url`.
    pub fn page(mut self, url: impl Into<String>, fixture: PageFixture) -> Self {
        self.pages.insert(url.into(), fixture);
        self
    }

    /// Every URL passed to `navigate`, in order.
    pub fn visits(&self) -> Vec<String> {
        self.lock().visits.clone()
    }

    /// Every clicked element, in order.
    pub fn clicks(&self) -> Vec<String> {
        self.lock().clicks.clone()
    }

    /// Scrolls performed on the current page.
    pub fn scroll_count(&self) -> usize {
        self.lock().scrolls
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, State> {
        self.state
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }
}

impl Default for ScriptedPage {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl PageDriver for ScriptedPage {
    async fn navigate(&self, url: &str) -> Result<String> {
        let mut state = self.lock();
        state.visits.push(url.to_string());

        let fixture = self
            .pages
            .get(url)
            .ok_or_else(|| BrowserError::NavigationError(format!("no recorded page for {url}")))?;

        let failed = state.failures.entry(url.to_string()).or_insert(0);
        if *failed < fixture.transient_failures {
            *failed += 1;
            return Err(BrowserError::Timeout(format!("navigation to {url} timed out")));
        }

        state.url = fixture.redirect_to.clone().unwrap_or_else(|| url.to_string());
        state.page = fixture.clone();
        state.revealed.clear();
        state.scrolls = 0;
        Ok(state.url.clone())
    }

    async fn current_url(&self) -> Result<String> {
        Ok(self.lock().url.clone())
    }

    async fn page_title(&self) -> Result<String> {
        Ok(self.lock().page.title.clone())
    }

    async fn locate(&self, selector: &str) -> Result<Vec<Locator>> {
        let count = self.lock().elements(selector).len();
        Ok((0..count).map(|i| Locator::nth(selector, i)).collect())
    }

    async fn locate_within(&self, parent: &Locator, selector: &str) -> Result<Vec<Locator>> {
        let parent_element = self.lock().resolve(parent)?;
        let count = parent_element.children.get(selector).map_or(0, Vec::len);
        Ok((0..count).map(|i| parent.child(selector, i)).collect())
    }

    async fn wait_for(&self, selector: &str, timeout_ms: u64) -> Result<()> {
        if self.lock().elements(selector).is_empty() {
            return Err(BrowserError::Timeout(format!(
                "{selector} did not appear within {timeout_ms}ms"
            )));
        }
        Ok(())
    }

    async fn scroll_by(&self, _dx: i64, _dy: i64) -> Result<()> {
        self.lock().scrolls += 1;
        Ok(())
    }

    async fn scroll_element_by(&self, element: &Locator, _dx: i64, _dy: i64) -> Result<()> {
        let mut state = self.lock();
        state.resolve(element)?;
        state.scrolls += 1;
        Ok(())
    }

    async fn is_scrollable(&self, element: &Locator) -> Result<bool> {
        Ok(self.lock().resolve(element)?.scrollable)
    }

    async fn click(&self, element: &Locator) -> Result<()> {
        let mut state = self.lock();
        let clicked = state.resolve(element)?;
        if clicked.click_fails {
            return Err(BrowserError::ChromiumError(format!(
                "click on {element} was intercepted"
            )));
        }
        state.clicks.push(element.to_string());
        state.revealed.extend(clicked.reveals);
        Ok(())
    }

    async fn read_text(&self, element: &Locator) -> Result<String> {
        Ok(self.lock().resolve(element)?.text)
    }

    async fn attribute(&self, element: &Locator, name: &str) -> Result<Option<String>> {
        Ok(self.lock().resolve(element)?.attributes.get(name).cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn site() -> ScriptedPage {
        ScriptedPage::new()
            .page(
                "https://site.test/list",
                PageFixture::new()
                    .title("Results | Site")
                    .element("a.card", ElementFixture::link("/jobs/view/1/", "One"))
                    .element_after_scrolls(2, "a.card", ElementFixture::link("/jobs/view/2/", "Two"))
                    .element(
                        "button.more",
                        ElementFixture::with_text("Show more")
                            .reveals("div.extra", ElementFixture::with_text("hidden text")),
                    ),
            )
            .page(
                "https://site.test/private",
                PageFixture::new().redirect_to("https://site.test/login"),
            )
            .page("https://site.test/flaky", PageFixture::new().failing_first(2))
    }

    #[tokio::test]
    async fn test_navigation_and_reads() {
        let page = site();
        let landed = page.navigate("https://site.test/list").await.unwrap();
        assert_eq!(landed, "https://site.test/list");
        assert_eq!(page.page_title().await.unwrap(), "Results | Site");

        let cards = page.locate("a.card").await.unwrap();
        assert_eq!(cards.len(), 1);
        assert_eq!(
            page.attribute(&cards[0], "href").await.unwrap().as_deref(),
            Some("/jobs/view/1/")
        );
        assert_eq!(page.attribute(&cards[0], "title").await.unwrap(), None);
        assert!(page.locate("h1").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_scroll_reveals_elements() {
        let page = site();
        page.navigate("https://site.test/list").await.unwrap();
        page.scroll_by(0, 800).await.unwrap();
        assert_eq!(page.locate("a.card").await.unwrap().len(), 1);
        page.scroll_by(0, 800).await.unwrap();
        assert_eq!(page.locate("a.card").await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_click_reveals_elements() {
        let page = site();
        page.navigate("https://site.test/list").await.unwrap();
        assert!(page.wait_for("div.extra", 100).await.is_err());

        let more = page.locate("button.more").await.unwrap();
        page.click(&more[0]).await.unwrap();

        page.wait_for("div.extra", 100).await.unwrap();
        let extra = page.locate("div.extra").await.unwrap();
        assert_eq!(page.read_text(&extra[0]).await.unwrap(), "hidden text");
        assert_eq!(page.clicks(), vec!["button.more[0]".to_string()]);
    }

    #[tokio::test]
    async fn test_redirect_and_transient_failures() {
        let page = site();
        let landed = page.navigate("https://site.test/private").await.unwrap();
        assert_eq!(landed, "https://site.test/login");

        assert!(page.navigate("https://site.test/flaky").await.is_err());
        assert!(page.navigate("https://site.test/flaky").await.is_err());
        assert!(page.navigate("https://site.test/flaky").await.is_ok());

        let err = page.navigate("https://site.test/unknown").await.unwrap_err();
        assert!(matches!(err, BrowserError::NavigationError(_)));
        assert_eq!(page.visits().len(), 5);
    }

    #[tokio::test]
    async fn test_stale_locator_is_selector_not_found() {
        let page = site();
        page.navigate("https://site.test/list").await.unwrap();
        let err = page.read_text(&Locator::nth("a.card", 7)).await.unwrap_err();
        assert!(matches!(err, BrowserError::SelectorNotFound(_)));
    }

    #[tokio::test]
    async fn test_nested_lookup() {
        let page = ScriptedPage::new().page(
            "https://site.test/detail",
            PageFixture::new().element(
                "section",
                ElementFixture::with_text("About this job body").child(
                    "div.content",
                    ElementFixture::with_text("body"),
                ),
            ),
        );
        page.navigate("https://site.test/detail").await.unwrap();
        let sections = page.locate("section").await.unwrap();
        let content = page.locate_within(&sections[0], "div.content").await.unwrap();
        assert_eq!(content.len(), 1);
        assert_eq!(page.read_text(&content[0]).await.unwrap(), "body");
        assert!(page.locate_within(&sections[0], "p").await.unwrap().is_empty());
    }
}
