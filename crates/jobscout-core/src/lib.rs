//! Jobscout Core - Foundation crate for the jobscout scraper.
//!
//! This crate provides shared types, error handling, configuration management
//! and the pure text utilities that every other jobscout crate depends on.
//!
//! # Modules
//!
//! - [`error`] - Central error types using thiserror
//! - [`config`] - TOML-based configuration with XDG paths and env overrides
//! - [`types`] - Job records, search facets and their invariants
//! - [`normalize`] - Whitespace, URL, email and description clean-up
//! - [`fingerprint`] - Deduplication keys derived from record content
//!
//! # Example
//!
//! ```rust
//! use jobscout_core::{AppConfig, Fingerprint};
//!
//! let config = AppConfig::default();
//! assert!(!config.facets().is_empty());
//!
//! let a = Fingerprint::of("Great Job!! Apply now", "x@y.com");
//! let b = Fingerprint::of("great job apply now", "X@Y.COM");
//! assert_eq!(a, b);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]

pub mod config;
pub mod error;
pub mod fingerprint;
pub mod normalize;
pub mod types;

// Re-export commonly used types
pub use config::{
    AppConfig, BrowserConfig, LocationConfig, OutputConfig, OutputMode, PacingConfig,
    RetryConfig, ScrapingConfig, SearchConfig,
};
pub use error::{ConfigError, ConfigResult, CoreError, Result};
pub use fingerprint::Fingerprint;
pub use types::{JobRecord, SearchFacet, MIN_DESCRIPTION_CHARS, SALARY_NOT_SPECIFIED, SOURCE_TAG};
