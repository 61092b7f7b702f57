//! Recruiter contact resolution.
//!
//! Finds the poster's profile link on a detail page, then tries to read the
//! profile's contact details: first through the contact-info overlay URL,
//! then by opening the contact-info modal on the profile itself.

use crate::pacing::Pacer;
use crate::probe::{find_labeled, first_match, first_text, wait_present};
use crate::retry::{retry_with_backoff, RetryPolicy};
use crate::site::{
    contact_overlay_url, is_auth_wall, CONTACT_INFO_CONTROL_SELECTORS, CONTACT_INFO_LABELS,
    CONTACT_INFO_SECTION, DISMISS_SELECTORS, PROFILE_LINK_SELECTOR, PROFILE_MARKER,
};
use crate::Result;
use jobscout_browser::PageDriver;
use jobscout_core::normalize::{extract_email, normalize_profile_url, normalize_whitespace};
use std::time::Duration;

const REVEAL_SCROLL_STEPS: usize = 6;
const REVEAL_SCROLL_PX: i64 = 850;
const REVEAL_SETTLE_MS: u64 = 450;

/// Wait for the contact-info section unless configured otherwise.
pub const DEFAULT_ELEMENT_TIMEOUT: Duration = Duration::from_secs(8);

/// Ways of reaching a profile's contact details, in the order they are tried.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContactRoute {
    /// The contact-info overlay URL under the profile
    Overlay,
    /// The profile page, then its contact-info control
    Modal,
}

impl ContactRoute {
    /// Routes in the order they are tried.
    pub const ORDER: [Self; 2] = [Self::Overlay, Self::Modal];

    /// Short name used in logs.
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::Overlay => "overlay",
            Self::Modal => "modal",
        }
    }
}

/// Contact details of a posting's recruiter. Empty fields mean unknown.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContactInfo {
    /// Canonical profile URL, empty when no profile link was found
    pub profile_url: String,
    /// Display name from the profile link
    pub name: String,
    /// First email in the contact-info section
    pub email: String,
    /// Text of the contact-info section the email was read from
    pub raw_text: String,
}

/// Reads recruiter contact details off the detail page that is open.
pub struct ContactResolver<'a> {
    page: &'a dyn PageDriver,
    pacer: &'a Pacer,
    retry: &'a RetryPolicy,
    scan_limit: usize,
    element_timeout: Duration,
}

impl<'a> ContactResolver<'a> {
    /// Resolver scanning at most `scan_limit` candidate links and controls.
    #[must_use]
    pub fn new(page: &'a dyn PageDriver, pacer: &'a Pacer, retry: &'a RetryPolicy, scan_limit: usize) -> Self {
        Self {
            page,
            pacer,
            retry,
            scan_limit,
            element_timeout: DEFAULT_ELEMENT_TIMEOUT,
        }
    }

    /// How long to wait for the contact-info section to appear.
    #[must_use]
    pub fn with_element_timeout(mut self, timeout: Duration) -> Self {
        self.element_timeout = timeout;
        self
    }

    /// Resolve contact details for the detail page currently open.
    ///
    /// Never fails: without a profile link the result is empty, and when both
    /// strategies fail it carries only the profile URL and name.
    pub async fn resolve(&self) -> ContactInfo {
        self.reveal_poster().await;

        let (name, profile_url) = match self.find_profile().await {
            Ok(Some(found)) => found,
            Ok(None) => {
                tracing::debug!("No recruiter profile on page");
                return ContactInfo::default();
            }
            Err(e) => {
                tracing::warn!("Recruiter lookup failed: {}", e);
                return ContactInfo::default();
            }
        };
        tracing::debug!(recruiter = %name, profile = %profile_url, "Found recruiter");

        for route in ContactRoute::ORDER {
            let strategy = route.name();
            let attempt = match route {
                ContactRoute::Overlay => self.via_overlay(&profile_url).await,
                ContactRoute::Modal => self.via_modal(&profile_url).await,
            };
            match attempt {
                Ok(Some(raw_text)) => {
                    tracing::debug!(strategy, "Read contact info");
                    return ContactInfo {
                        email: extract_email(&raw_text),
                        profile_url,
                        name,
                        raw_text,
                    };
                }
                Ok(None) => tracing::debug!(strategy, "Contact info unavailable"),
                Err(e) => tracing::warn!(strategy, "Contact info lookup failed: {}", e),
            }
        }

        ContactInfo {
            profile_url,
            name,
            ..ContactInfo::default()
        }
    }

    async fn reveal_poster(&self) {
        for _ in 0..REVEAL_SCROLL_STEPS {
            if let Err(e) = self.page.scroll_by(0, REVEAL_SCROLL_PX).await {
                tracing::warn!("Scroll failed: {}", e);
                return;
            }
            self.pacer.settle(REVEAL_SETTLE_MS).await;
        }
    }

    /// First profile-style anchor: `(display name, canonical profile URL)`.
    async fn find_profile(&self) -> Result<Option<(String, String)>> {
        let anchors = self.page.locate(PROFILE_LINK_SELECTOR).await?;
        for anchor in anchors.iter().take(self.scan_limit) {
            let Some(href) = self.page.attribute(anchor, "href").await? else {
                continue;
            };
            if !href.contains(PROFILE_MARKER) {
                continue;
            }
            let name = match self.page.read_text(anchor).await {
                Ok(text) => normalize_whitespace(&text),
                Err(e) => {
                    tracing::debug!("Could not read recruiter name: {}", e);
                    String::new()
                }
            };
            return Ok(Some((name, normalize_profile_url(&href))));
        }
        Ok(None)
    }

    /// Navigate under the retry policy, returning the landed URL.
    async fn open(&self, label: &str, url: &str) -> Result<String> {
        let page = self.page;
        retry_with_backoff(self.retry, label, move |_| async move {
            Ok(page.navigate(url).await?)
        })
        .await
    }

    async fn via_overlay(&self, profile_url: &str) -> Result<Option<String>> {
        let landed = self
            .open("contact overlay", &contact_overlay_url(profile_url))
            .await?;
        self.pacer.settle(1200).await;

        if is_auth_wall(&landed) {
            tracing::debug!("Contact overlay hit an auth wall: {}", landed);
            return Ok(None);
        }
        self.read_contact_section().await
    }

    async fn via_modal(&self, profile_url: &str) -> Result<Option<String>> {
        self.open("recruiter profile", profile_url).await?;
        self.pacer.settle(1500).await;
        self.page.scroll_by(0, 500).await?;
        self.pacer.settle(600).await;

        let mut controls: Vec<_> = first_match(self.page, CONTACT_INFO_CONTROL_SELECTORS)
            .await?
            .into_iter()
            .collect();
        controls.extend(
            find_labeled(self.page, &["a", "button"], CONTACT_INFO_LABELS, self.scan_limit).await?,
        );

        let mut clicked = false;
        for control in &controls {
            match self.page.click(control).await {
                Ok(()) => {
                    clicked = true;
                    break;
                }
                Err(e) => tracing::debug!("Contact info control {} not clickable: {}", control, e),
            }
        }
        if !clicked {
            return Ok(None);
        }

        let text = self.read_contact_section().await?;
        if text.is_some() {
            self.dismiss_modal().await;
        }
        Ok(text)
    }

    async fn read_contact_section(&self) -> Result<Option<String>> {
        let timeout_ms = u64::try_from(self.element_timeout.as_millis()).unwrap_or(u64::MAX);
        if !wait_present(self.page, CONTACT_INFO_SECTION, timeout_ms).await? {
            return Ok(None);
        }
        Ok(first_text(self.page, CONTACT_INFO_SECTION).await?)
    }

    async fn dismiss_modal(&self) {
        for selector in DISMISS_SELECTORS {
            let Ok(Some(button)) = first_match(self.page, &[selector]).await else {
                continue;
            };
            match self.page.click(&button).await {
                Ok(()) => return,
                Err(e) => tracing::debug!("Dismiss via {} failed: {}", selector, e),
            }
        }
    }
}
