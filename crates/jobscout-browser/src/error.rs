use thiserror::Error;

pub type Result<T> = std::result::Result<T, BrowserError>;

#[derive(Debug, Error)]
pub enum BrowserError {
    #[error("chromium error: {0}")]
    ChromiumError(String),

    #[error("navigation failed: {0}")]
    NavigationError(String),

    #[error("selector not found: {0}")]
    SelectorNotFound(String),

    #[error("timeout: {0}")]
    Timeout(String),

    #[error("script evaluation failed: {0}")]
    ScriptError(String),

    #[error("browser is closed")]
    Closed,
}

impl BrowserError {
    /// Whether retrying the same operation may succeed.
    ///
    /// Navigation failures, timeouts and elements that vanished between
    /// locating and using them are transient. A crashed or closed browser is not.
    #[must_use]
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            Self::NavigationError(_) | Self::SelectorNotFound(_) | Self::Timeout(_)
        )
    }
}

impl From<chromiumoxide::error::CdpError> for BrowserError {
    fn from(err: chromiumoxide::error::CdpError) -> Self {
        match err {
            chromiumoxide::error::CdpError::Timeout => {
                Self::Timeout("CDP request timed out".to_string())
            }
            other => Self::ChromiumError(other.to_string()),
        }
    }
}
