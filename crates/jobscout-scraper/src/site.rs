//! Facts about the listings site: URL shapes, redirect markers and selectors.

use crate::error::{Result, ScrapeError};
pub use jobscout_core::normalize::{PROFILE_MARKER, SITE_ORIGIN};
use url::Url;

/// Path segment of a posting's detail page.
pub const DETAIL_PATH_MARKER: &str = "/jobs/view/";

/// URL fragments the site redirects automated sessions to.
pub const BOT_REDIRECT_MARKERS: &[&str] = &["/notifications", "/checkpoint", "/authwall", "/login"];

/// URL fragments of pages that demand a login.
pub const AUTH_WALL_MARKERS: &[&str] = &["login", "checkpoint", "authwall"];

/// Anchors pointing at any detail page.
pub const DETAIL_LINK_SELECTOR: &str = r#"a[href*="/jobs/view/"]"#;

/// Scrollable containers of the search results list, in priority order.
pub const RESULTS_CONTAINER_SELECTORS: &[&str] = &[
    "div.jobs-search-results-list",
    "div.scaffold-layout__list-container",
    "div.jobs-search__left-rail",
    "div.scaffold-layout__list",
];

/// Job card anchors, in priority order.
pub const JOB_CARD_SELECTORS: &[&str] = &[
    "a.job-card-container__link",
    r#"a[data-control-name="job_card_click"]"#,
    DETAIL_LINK_SELECTOR,
];

/// Markers of a signed-in navigation bar.
pub const SIGNED_IN_SELECTORS: &[&str] = &[
    "img.global-nav__me-photo",
    "button.global-nav__primary-link-me-menu-trigger",
    r#"a.global-nav__primary-link[href*="/in/"]"#,
];

/// Controls that may carry a "Sign in" label.
pub const SIGN_IN_CONTROL_SELECTORS: &[&str] = &["a", "button"];

/// Expand controls for truncated descriptions.
pub const EXPAND_BUTTON_SELECTORS: &[&str] = &[
    r#"button[data-testid="expandable-text-button"]"#,
    "button.jobs-description__footer-button",
    "button.show-more-less-html__button",
];

/// Labels of generic buttons that reveal truncated text.
pub const EXPAND_LABELS: &[&str] = &["Show more", "See more", "Показать еще", "Показать ещё"];

/// Heading-anchored sections that may hold the description.
pub const DESCRIPTION_SECTION_SELECTORS: &[&str] = &["section", "div.jobs-description"];

/// Headings that may anchor a description section, in lookup order.
pub const SECTION_HEADING_SELECTORS: &[&str] = &["h2", "h3"];

/// Phrases that open the description section.
pub const DESCRIPTION_START_MARKERS: &[&str] = &["Об этой вакансии", "About this job"];

/// Phrases that close the description when slicing body text, tried as two sets.
pub const DESCRIPTION_END_MARKER_SETS: &[&[&str]] = &[
    &[
        "О компании",
        "About the company",
        "© LinkedIn",
        "Похожие вакансии",
        "Similar jobs",
    ],
    &["Отправлять оповещения", "Send me alerts", "© LinkedIn"],
];

/// Known containers of the description body.
pub const DESCRIPTION_CONTENT_SELECTORS: &[&str] = &[
    "div.jobs-description__content",
    "div.jobs-description-content__text",
    "div.jobs-box__html-content",
    "article.jobs-description__container",
    "div.show-more-less-html__markup",
    "div#job-details",
];

/// Elements whose text is the whole readable page, in priority order.
pub const PAGE_TEXT_SELECTORS: &[&str] = &["main", "body"];

/// Titles of pages that carry no posting.
pub const NON_CONTENT_TITLES: &[&str] = &["manage your notifications", "управляйте своими уведомлениями"];

/// Anchors that may point at the poster's profile.
pub const PROFILE_LINK_SELECTOR: &str = r#"a[href*="/in/"], a[href*="linkedin.com/in/"]"#;

/// Section holding a member's contact details.
pub const CONTACT_INFO_SECTION: &str = "section.pv-contact-info";

/// Contact-info controls on a profile page with a fixed identity.
pub const CONTACT_INFO_CONTROL_SELECTORS: &[&str] = &[
    "a#top-card-text-details-contact-info",
    r#"a[data-control-name="topcard_contact_info"]"#,
];

/// Labels of a contact-info control.
pub const CONTACT_INFO_LABELS: &[&str] = &["Контактные сведения", "Contact info"];

/// Buttons that close the contact-info modal.
pub const DISMISS_SELECTORS: &[&str] = &[
    r#"button[aria-label="Dismiss"]"#,
    r#"button[aria-label="Закрыть"]"#,
];

/// Build the search URL of one facet.
///
/// # Errors
/// Returns `ScrapeError::InvalidSearchUrl` when `base` is not an absolute URL.
pub fn build_search_url(base: &str, keywords: &str, geo_id: u64) -> Result<String> {
    let url = Url::parse_with_params(
        base,
        &[("keywords", keywords), ("geoId", &geo_id.to_string())],
    )
    .map_err(|e| ScrapeError::InvalidSearchUrl {
        url: base.to_string(),
        reason: e.to_string(),
    })?;
    Ok(url.to_string())
}

/// Whether the URL is one the site sends suspected bots to.
#[must_use]
pub fn is_bad_redirect(url: &str) -> bool {
    let url = url.to_lowercase();
    BOT_REDIRECT_MARKERS.iter().any(|marker| url.contains(marker))
}

/// Whether the URL demands a login.
#[must_use]
pub fn is_auth_wall(url: &str) -> bool {
    let url = url.to_lowercase();
    AUTH_WALL_MARKERS.iter().any(|marker| url.contains(marker))
}

/// Whether the URL has the shape of a posting's detail page.
#[must_use]
pub fn is_detail_url(url: &str) -> bool {
    url.contains(DETAIL_PATH_MARKER)
}

/// URL of the contact-info overlay of a profile.
#[must_use]
pub fn contact_overlay_url(profile_url: &str) -> String {
    format!("{}/overlay/contact-info/", profile_url.trim_end_matches('/'))
}

/// Whether a title names a page without a posting.
#[must_use]
pub fn is_non_content_title(title: &str) -> bool {
    let title = title.trim().to_lowercase();
    NON_CONTENT_TITLES.iter().any(|sentinel| title == *sentinel)
}
