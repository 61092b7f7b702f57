use crate::actions::{extract_domain, Locator, PageDriver};
use crate::error::{BrowserError, Result};
use crate::launch::LaunchOptions;
use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::element::Element;
use chromiumoxide::Page;
use futures_util::stream::StreamExt;
use std::collections::HashMap;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio::time::Instant;

/// Poll interval while waiting for a selector
const WAIT_POLL_MS: u64 = 250;

/// Spaces out navigations per domain
#[derive(Debug)]
struct RateLimiter {
    last_access: HashMap<String, Instant>,
    min_delay: Duration,
}

impl RateLimiter {
    fn new(min_delay: Duration) -> Self {
        Self {
            last_access: HashMap::new(),
            min_delay,
        }
    }

    /// Record an access and return how long the caller must wait before it.
    fn reserve(&mut self, domain: &str) -> Duration {
        let now = Instant::now();
        let wait = self
            .last_access
            .get(domain)
            .map(|last| (*last + self.min_delay).saturating_duration_since(now))
            .unwrap_or_default();
        self.last_access.insert(domain.to_string(), now + wait);
        wait
    }
}

/// Chromium-backed page driver holding one page for the whole run.
pub struct BrowserEngine {
    browser: Mutex<Option<Browser>>,
    page: Page,
    handler: JoinHandle<()>,
    options: LaunchOptions,
    rate_limiter: Mutex<RateLimiter>,
}

impl BrowserEngine {
    /// Launch a browser with randomized defaults
    pub async fn new() -> Result<Self> {
        Self::launch(LaunchOptions::randomized()).await
    }

    /// Launch a browser with explicit options and open the working page
    pub async fn launch(options: LaunchOptions) -> Result<Self> {
        let mut builder = BrowserConfig::builder()
            .no_sandbox()
            .window_size(options.viewport_width, options.viewport_height)
            .request_timeout(options.navigation_timeout)
            .args(options.chromium_args());
        if !options.headless {
            builder = builder.with_head();
        }
        if let Some(dir) = &options.user_data_dir {
            builder = builder.user_data_dir(dir);
        }
        let config = builder.build().map_err(BrowserError::ChromiumError)?;

        let (browser, mut handler) = Browser::launch(config)
            .await
            .map_err(|e| BrowserError::ChromiumError(e.to_string()))?;

        // The handler drives the CDP connection and must be polled for the browser's lifetime
        let handler = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if let Err(e) = event {
                    tracing::debug!("CDP handler event error: {}", e);
                }
            }
        });

        let page = browser
            .new_page("about:blank")
            .await
            .map_err(|e| BrowserError::ChromiumError(e.to_string()))?;

        tracing::info!(
            headless = options.headless,
            proxy = options.proxy_server.is_some(),
            "Browser launched"
        );

        Ok(Self {
            browser: Mutex::new(Some(browser)),
            page,
            handler,
            rate_limiter: Mutex::new(RateLimiter::new(options.min_navigation_interval)),
            options,
        })
    }

    /// Close the browser and stop the CDP handler.
    pub async fn close(self) -> Result<()> {
        if let Some(mut browser) = self.browser.lock().await.take() {
            browser.close().await?;
            let _ = browser.wait().await;
        }
        self.handler.abort();
        tracing::info!("Browser closed");
        Ok(())
    }

    async fn resolve(&self, locator: &Locator) -> Result<Element> {
        let mut current: Option<Element> = None;
        for (selector, index) in locator.steps() {
            let mut matches = match &current {
                None => self.page.find_elements(selector.as_str()).await?,
                Some(parent) => parent.find_elements(selector.as_str()).await?,
            };
            if *index >= matches.len() {
                return Err(BrowserError::SelectorNotFound(locator.to_string()));
            }
            current = Some(matches.swap_remove(*index));
        }
        current.ok_or_else(|| BrowserError::SelectorNotFound(locator.to_string()))
    }

    async fn call_on(&self, element: &Locator, function: String) -> Result<Option<serde_json::Value>> {
        let resolved = self.resolve(element).await?;
        let returns = resolved
            .call_js_fn(function, false)
            .await
            .map_err(|e| BrowserError::ScriptError(e.to_string()))?;
        Ok(returns.result.value)
    }
}

#[async_trait::async_trait]
impl PageDriver for BrowserEngine {
    async fn navigate(&self, url: &str) -> Result<String> {
        if let Ok(domain) = extract_domain(url) {
            let wait = self.rate_limiter.lock().await.reserve(&domain);
            if !wait.is_zero() {
                tokio::time::sleep(wait).await;
            }
        }

        match tokio::time::timeout(self.options.navigation_timeout, self.page.goto(url)).await {
            Err(_) => {
                return Err(BrowserError::Timeout(format!(
                    "navigation to {url} exceeded {:?}",
                    self.options.navigation_timeout
                )))
            }
            Ok(Err(e)) => return Err(BrowserError::NavigationError(format!("{url}: {e}"))),
            Ok(Ok(_)) => {}
        }

        self.current_url().await
    }

    async fn current_url(&self) -> Result<String> {
        Ok(self.page.url().await?.unwrap_or_default())
    }

    async fn page_title(&self) -> Result<String> {
        Ok(self.page.get_title().await?.unwrap_or_default())
    }

    async fn locate(&self, selector: &str) -> Result<Vec<Locator>> {
        let count = self.page.find_elements(selector).await?.len();
        Ok((0..count).map(|i| Locator::nth(selector, i)).collect())
    }

    async fn locate_within(&self, parent: &Locator, selector: &str) -> Result<Vec<Locator>> {
        let count = self.resolve(parent).await?.find_elements(selector).await?.len();
        Ok((0..count).map(|i| parent.child(selector, i)).collect())
    }

    async fn wait_for(&self, selector: &str, timeout_ms: u64) -> Result<()> {
        let deadline = Instant::now() + Duration::from_millis(timeout_ms);
        loop {
            if !self.page.find_elements(selector).await?.is_empty() {
                return Ok(());
            }
            if Instant::now() >= deadline {
                return Err(BrowserError::Timeout(format!(
                    "{selector} did not appear within {timeout_ms}ms"
                )));
            }
            tokio::time::sleep(Duration::from_millis(WAIT_POLL_MS)).await;
        }
    }

    async fn scroll_by(&self, dx: i64, dy: i64) -> Result<()> {
        self.page
            .evaluate(format!("window.scrollBy({dx}, {dy})"))
            .await
            .map_err(|e| BrowserError::ScriptError(e.to_string()))?;
        Ok(())
    }

    async fn scroll_element_by(&self, element: &Locator, dx: i64, dy: i64) -> Result<()> {
        self.call_on(element, format!("function() {{ this.scrollBy({dx}, {dy}); }}"))
            .await?;
        Ok(())
    }

    async fn is_scrollable(&self, element: &Locator) -> Result<bool> {
        let value = self
            .call_on(
                element,
                "function() { return this.scrollHeight > this.clientHeight; }".to_string(),
            )
            .await?;
        Ok(value.and_then(|v| v.as_bool()).unwrap_or(false))
    }

    async fn click(&self, element: &Locator) -> Result<()> {
        self.resolve(element).await?.click().await?;
        Ok(())
    }

    async fn read_text(&self, element: &Locator) -> Result<String> {
        Ok(self
            .resolve(element)
            .await?
            .inner_text()
            .await?
            .unwrap_or_default())
    }

    async fn attribute(&self, element: &Locator, name: &str) -> Result<Option<String>> {
        Ok(self.resolve(element).await?.attribute(name).await?)
    }
}
