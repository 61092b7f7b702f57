//! Signed-in session detection.

use crate::probe::{find_labeled, first_match};
use crate::site::{SIGNED_IN_SELECTORS, SIGN_IN_CONTROL_SELECTORS};
use jobscout_browser::{PageDriver, Result};

/// URL fragments of pages shown to signed-out visitors.
const SIGNED_OUT_PATHS: &[&str] = &["/login", "/checkpoint", "/authwall"];

/// Controls read while looking for a "Sign in" prompt.
const SIGN_IN_SCAN_LIMIT: usize = 40;

/// Whether the current page belongs to a signed-in session.
///
/// Login, checkpoint and auth-wall URLs mean signed out. A signed-in
/// navigation marker means signed in. Otherwise a visible "Sign in" control
/// means signed out, and anything else is taken as signed in.
pub async fn is_authenticated(page: &dyn PageDriver) -> Result<bool> {
    let url = page.current_url().await?.to_lowercase();
    if SIGNED_OUT_PATHS.iter().any(|path| url.contains(path)) {
        tracing::debug!("Signed-out URL: {}", url);
        return Ok(false);
    }

    if first_match(page, SIGNED_IN_SELECTORS).await?.is_some() {
        return Ok(true);
    }

    let sign_in = find_labeled(page, SIGN_IN_CONTROL_SELECTORS, &["Sign in"], SIGN_IN_SCAN_LIMIT).await?;
    if !sign_in.is_empty() {
        tracing::debug!("Found a sign-in control on {}", url);
        return Ok(false);
    }

    Ok(true)
}
