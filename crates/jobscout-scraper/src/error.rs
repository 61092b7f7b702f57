//! Error types for the scraping pipeline.

use jobscout_browser::BrowserError;
use jobscout_db::DatabaseError;
use thiserror::Error;

/// Errors raised while scraping or writing output.
#[derive(Debug, Error)]
pub enum ScrapeError {
    /// Page driver failure
    #[error("Browser error: {0}")]
    Browser(#[from] BrowserError),

    /// Store failure
    #[error("Database error: {0}")]
    Database(#[from] DatabaseError),

    /// The configured search base URL or facet did not form a URL
    #[error("Invalid search URL {url}: {reason}")]
    InvalidSearchUrl {
        /// URL or base that failed to parse
        url: String,
        /// Parser message
        reason: String,
    },

    /// The caller dropped its [`RunControl`](crate::RunControl) during a login wait
    #[error("Resume channel closed while waiting for manual login")]
    ResumeChannelClosed,

    /// Writing the output file failed
    #[error("Failed to write output to {path}: {source}")]
    Output {
        /// Destination file
        path: String,
        /// Underlying I/O failure
        #[source]
        source: std::io::Error,
    },

    /// A record arrived after the sink was finalized
    #[error("Output sink already finalized")]
    SinkFinalized,

    /// Records could not be encoded as JSON
    #[error("Failed to serialize records: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl ScrapeError {
    /// Whether the failed operation is worth retrying.
    #[must_use]
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Browser(e) if e.is_transient())
    }
}

/// Result type alias using `ScrapeError`.
pub type Result<T> = std::result::Result<T, ScrapeError>;
