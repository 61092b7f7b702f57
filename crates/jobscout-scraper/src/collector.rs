//! Harvesting detail-page links from a virtualized search results list.

use crate::pacing::Pacer;
use crate::site::{
    is_detail_url, DETAIL_LINK_SELECTOR, JOB_CARD_SELECTORS, RESULTS_CONTAINER_SELECTORS,
};
use jobscout_browser::{BrowserError, Locator, PageDriver, Result};
use jobscout_core::normalize::canonicalize_url;
use std::collections::HashSet;

/// How long the results list gets to render its first detail link.
const INITIAL_WAIT_MS: u64 = 15_000;
/// Anchors read per selector in one harvest pass.
const MAX_ANCHORS_PER_PASS: usize = 300;
const CONTAINER_SCROLL_PX: i64 = 1400;
const PAGE_SCROLL_PX: i64 = 1600;
const SETTLE_MS: u64 = 500;

/// Collects unique detail-page URLs from the current search results view.
pub struct LinkCollector<'a> {
    page: &'a dyn PageDriver,
    pacer: &'a Pacer,
    max_links: usize,
    max_iterations: usize,
}

impl<'a> LinkCollector<'a> {
    /// Collector over the search results open on `page`.
    #[must_use]
    pub fn new(page: &'a dyn PageDriver, pacer: &'a Pacer, max_links: usize, max_iterations: usize) -> Self {
        Self {
            page,
            pacer,
            max_links,
            max_iterations,
        }
    }

    /// Scroll the results and return up to `max_links` URLs in first-seen order.
    ///
    /// A view that never renders a detail link yields an empty list.
    pub async fn collect(&self) -> Result<Vec<String>> {
        self.pacer.settle(800).await;

        match self.page.wait_for(DETAIL_LINK_SELECTOR, INITIAL_WAIT_MS).await {
            Ok(()) => {}
            Err(BrowserError::Timeout(_)) => {
                tracing::info!("No job links rendered on {}", self.page.current_url().await?);
                return Ok(Vec::new());
            }
            Err(e) => return Err(e),
        }

        let container = self.scrollable_container().await;
        if container.is_none() {
            tracing::debug!("No scrollable results container, scrolling the page");
        }

        let mut links = Vec::new();
        let mut seen = HashSet::new();

        for iteration in 0..self.max_iterations {
            self.harvest(&mut links, &mut seen).await?;
            if links.len() >= self.max_links {
                break;
            }

            tracing::debug!(iteration, collected = links.len(), "Scrolling results");
            self.scroll(container.as_ref()).await?;
            self.pacer.settle(SETTLE_MS).await;
        }

        links.truncate(self.max_links);
        Ok(links)
    }

    async fn scrollable_container(&self) -> Option<Locator> {
        for selector in RESULTS_CONTAINER_SELECTORS {
            let candidate = match self.page.locate(selector).await {
                Ok(found) => found.into_iter().next(),
                Err(e) => {
                    tracing::warn!("Failed to look up {}: {}", selector, e);
                    None
                }
            };
            let Some(candidate) = candidate else { continue };
            match self.page.is_scrollable(&candidate).await {
                Ok(true) => return Some(candidate),
                Ok(false) => {}
                Err(e) => tracing::warn!("Failed to inspect {}: {}", candidate, e),
            }
        }
        None
    }

    /// One pass over the first anchor selector that matches anything.
    async fn harvest(&self, links: &mut Vec<String>, seen: &mut HashSet<String>) -> Result<()> {
        for selector in JOB_CARD_SELECTORS {
            let anchors = self.page.locate(selector).await?;
            if anchors.is_empty() {
                continue;
            }

            for anchor in anchors.iter().take(MAX_ANCHORS_PER_PASS) {
                let href = match self.page.attribute(anchor, "href").await {
                    Ok(Some(href)) => href,
                    Ok(None) | Err(BrowserError::SelectorNotFound(_)) => continue,
                    Err(e) => return Err(e),
                };
                let url = canonicalize_url(&href);
                if is_detail_url(&url) && seen.insert(url.clone()) {
                    links.push(url);
                }
            }
            return Ok(());
        }
        Ok(())
    }

    async fn scroll(&self, container: Option<&Locator>) -> Result<()> {
        if let Some(container) = container {
            match self.page.scroll_element_by(container, 0, CONTAINER_SCROLL_PX).await {
                Ok(()) => return Ok(()),
                Err(e) => tracing::debug!("Container scroll failed, scrolling the page: {}", e),
            }
        }
        self.page.scroll_by(0, PAGE_SCROLL_PX).await
    }
}
