//! Configuration management for jobscout.
//!
//! Provides TOML-based configuration with XDG-compliant paths and
//! environment variable overrides. Every value is static for the duration of
//! a run.

use crate::error::{ConfigError, ConfigResult};
use crate::types::SearchFacet;
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Main application configuration.
///
/// This is loaded from `~/.config/jobscout/config.toml` (or platform equivalent).
/// If the file doesn't exist, default values are used.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Roles, keywords and locations to search
    pub search: SearchConfig,
    /// Link collection and extraction limits
    pub scraping: ScrapingConfig,
    /// Retry budget and backoff schedule
    pub retry: RetryConfig,
    /// Human-like pacing delays
    pub pacing: PacingConfig,
    /// Browser launch settings
    pub browser: BrowserConfig,
    /// Where accepted records go
    pub output: OutputConfig,
}

impl AppConfig {
    /// Load configuration from the default location, falling back to defaults if not found.
    ///
    /// # Errors
    /// Returns error if:
    /// - Config directory cannot be determined
    /// - File exists but cannot be read
    /// - File contents are not valid TOML
    pub fn load() -> ConfigResult<Self> {
        Self::load_from(&Self::config_path()?)
    }

    /// Load configuration from an explicit path, falling back to defaults if not found.
    pub fn load_from(path: &Path) -> ConfigResult<Self> {
        if path.exists() {
            tracing::debug!("Loading config from {}", path.display());
            let contents = fs::read_to_string(path)?;
            let config = toml::from_str(&contents)?;
            Ok(config)
        } else {
            tracing::debug!("Config file not found at {}, using defaults", path.display());
            Ok(Self::default())
        }
    }

    /// Apply environment variable overrides.
    ///
    /// Supports the following environment variables:
    /// - `JOBSCOUT_HEADLESS`: Override browser headless mode (true/false)
    /// - `JOBSCOUT_PROXY_SERVER`: Proxy server for the browser
    /// - `DATABASE_URL`: Path of the `SQLite` database file
    /// - `SAVE_TO_JSON`: `true` selects the JSON file output
    /// - `JOBSCOUT_OUTPUT`: `store` or `json`
    #[must_use]
    pub fn with_env_overrides(mut self) -> Self {
        if let Ok(val) = std::env::var("JOBSCOUT_HEADLESS") {
            if let Ok(headless) = val.parse() {
                self.browser.headless = headless;
                tracing::debug!("Override browser.headless from env: {}", headless);
            }
        }

        if let Ok(val) = std::env::var("JOBSCOUT_PROXY_SERVER") {
            if !val.trim().is_empty() {
                tracing::debug!("Override browser.proxy_server from env");
                self.browser.proxy_server = Some(val);
            }
        }

        if let Ok(val) = std::env::var("DATABASE_URL") {
            let path = val.strip_prefix("sqlite://").unwrap_or(&val).to_string();
            tracing::debug!("Override output.database_path from env: {}", path);
            self.output.database_path = path;
        }

        if let Ok(val) = std::env::var("SAVE_TO_JSON") {
            if val.eq_ignore_ascii_case("true") {
                self.output.mode = OutputMode::Json;
                tracing::debug!("SAVE_TO_JSON set, writing records to JSON");
            }
        }

        if let Ok(val) = std::env::var("JOBSCOUT_OUTPUT") {
            match val.to_ascii_lowercase().as_str() {
                "json" => self.output.mode = OutputMode::Json,
                "store" => self.output.mode = OutputMode::Store,
                other => tracing::warn!("Ignoring unknown JOBSCOUT_OUTPUT value '{}'", other),
            }
        }

        self
    }

    /// Check values that would make a run meaningless.
    pub fn validate(&self) -> ConfigResult<()> {
        if self.retry.attempts == 0 {
            return Err(invalid("retry.attempts", "must be at least 1"));
        }
        if self.retry.delays_secs.is_empty() {
            return Err(invalid("retry.delays_secs", "must contain at least one delay"));
        }
        if self.pacing.min_delay_ms > self.pacing.max_delay_ms {
            return Err(invalid("pacing.min_delay_ms", "must not exceed pacing.max_delay_ms"));
        }
        if self.pacing.cooldown_min_ms > self.pacing.cooldown_max_ms {
            return Err(invalid(
                "pacing.cooldown_min_ms",
                "must not exceed pacing.cooldown_max_ms",
            ));
        }
        if self.pacing.redirect_cooldown_min_ms > self.pacing.redirect_cooldown_max_ms {
            return Err(invalid(
                "pacing.redirect_cooldown_min_ms",
                "must not exceed pacing.redirect_cooldown_max_ms",
            ));
        }
        if self.output.batch_size == 0 {
            return Err(invalid("output.batch_size", "must be at least 1"));
        }
        if self.scraping.max_links_per_facet == 0 {
            return Err(invalid("scraping.max_links_per_facet", "must be at least 1"));
        }
        if self.search.locations.is_empty() {
            return Err(invalid("search.locations", "at least one location is required"));
        }
        if self.search.roles.is_empty() {
            return Err(invalid("search.roles", "at least one role is required"));
        }
        Ok(())
    }

    /// Search facets in run order: locations outer, roles inner.
    #[must_use]
    pub fn facets(&self) -> Vec<SearchFacet> {
        self.search
            .locations
            .iter()
            .flat_map(|location| {
                self.search.roles.iter().map(move |role| SearchFacet {
                    role: role.clone(),
                    location: location.name.clone(),
                    geo_id: location.geo_id,
                    keywords: self.search.keywords_for(role),
                })
            })
            .collect()
    }

    /// Get the path to the configuration file.
    ///
    /// Uses XDG base directories: `~/.config/jobscout/config.toml`
    pub fn config_path() -> ConfigResult<PathBuf> {
        let dirs =
            ProjectDirs::from("com", "jobscout", "jobscout").ok_or(ConfigError::NoConfigDir)?;
        Ok(dirs.config_dir().join("config.toml"))
    }
}

fn invalid(field: &str, reason: &str) -> ConfigError {
    ConfigError::InvalidValue {
        field: field.to_string(),
        reason: reason.to_string(),
    }
}

/// A location searched by every role.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocationConfig {
    /// Label copied onto records
    pub name: String,
    /// Site-specific location identifier
    pub geo_id: u64,
}

/// Roles, relevance keywords and locations.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    /// Role labels, searched in order
    pub roles: Vec<String>,
    /// Role label to lowercase relevance keywords
    pub role_keywords: BTreeMap<String, Vec<String>>,
    /// Locations, searched in order
    pub locations: Vec<LocationConfig>,
}

impl SearchConfig {
    /// Lowercase keywords for a role; empty when none are configured.
    #[must_use]
    pub fn keywords_for(&self, role: &str) -> Vec<String> {
        self.role_keywords
            .get(role)
            .map(|keywords| keywords.iter().map(|k| k.to_lowercase()).collect())
            .unwrap_or_default()
    }
}

impl Default for SearchConfig {
    fn default() -> Self {
        let keywords = |list: &[&str]| list.iter().map(ToString::to_string).collect::<Vec<_>>();

        let role_keywords = BTreeMap::from([
            (
                "QA Engineer".to_string(),
                keywords(&["qa", "test", "tester", "quality", "automation", "aqa", "sdet"]),
            ),
            (
                "Frontend Developer".to_string(),
                keywords(&[
                    "frontend",
                    "front-end",
                    "react",
                    "javascript",
                    "typescript",
                    "vue",
                    "angular",
                ]),
            ),
            (
                "Product Manager".to_string(),
                keywords(&["product manager", "product owner", "product lead", "head of product"]),
            ),
            (
                "Project Manager".to_string(),
                keywords(&[
                    "project manager",
                    "руководитель проекта",
                    "проектный менеджер",
                    "delivery manager",
                ]),
            ),
            (
                "UX UI Designer".to_string(),
                keywords(&[
                    "ux",
                    "ui",
                    "designer",
                    "product designer",
                    "ux/ui",
                    "ux designer",
                    "ui designer",
                ]),
            ),
        ]);

        Self {
            roles: keywords(&[
                "QA Engineer",
                "Frontend Developer",
                "Product Manager",
                "Project Manager",
                "UX UI Designer",
            ]),
            role_keywords,
            locations: vec![
                LocationConfig {
                    name: "Алматы".to_string(),
                    geo_id: 105_526_356,
                },
                LocationConfig {
                    name: "Астана".to_string(),
                    geo_id: 100_184_048,
                },
                LocationConfig {
                    name: "Караганда".to_string(),
                    geo_id: 106_399_239,
                },
            ],
        }
    }
}

/// Link collection and extraction limits.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScrapingConfig {
    /// Search results page the facet query is appended to
    pub search_base_url: String,
    /// Maximum detail links collected per facet
    pub max_links_per_facet: usize,
    /// Hard cap on scroll iterations while collecting links
    pub max_scroll_iterations: usize,
    /// Maximum profile-style anchors inspected when resolving a recruiter
    pub contact_scan_limit: usize,
}

impl Default for ScrapingConfig {
    fn default() -> Self {
        Self {
            search_base_url: "https://www.linkedin.com/jobs/search/".to_string(),
            max_links_per_facet: 30,
            max_scroll_iterations: 30,
            contact_scan_limit: 60,
        }
    }
}

/// Retry budget shared by navigation and extraction.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
    /// Total attempts, including the first
    pub attempts: u32,
    /// Delay after each failed attempt; the last value repeats
    pub delays_secs: Vec<u64>,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            attempts: 3,
            delays_secs: vec![1, 5, 15],
        }
    }
}

/// Human-like pacing delays.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PacingConfig {
    /// Lower bound of the jitter between interactions
    pub min_delay_ms: u64,
    /// Upper bound of the jitter between interactions
    pub max_delay_ms: u64,
    /// Insert a cooldown after this many processed links (0 disables)
    pub cooldown_every: usize,
    /// Lower bound of the periodic cooldown
    pub cooldown_min_ms: u64,
    /// Upper bound of the periodic cooldown
    pub cooldown_max_ms: u64,
    /// Lower bound of the cooldown after a bot-detection redirect
    pub redirect_cooldown_min_ms: u64,
    /// Upper bound of the cooldown after a bot-detection redirect
    pub redirect_cooldown_max_ms: u64,
}

impl Default for PacingConfig {
    fn default() -> Self {
        Self {
            min_delay_ms: 2_000,
            max_delay_ms: 5_000,
            cooldown_every: 5,
            cooldown_min_ms: 6_000,
            cooldown_max_ms: 10_000,
            redirect_cooldown_min_ms: 8_000,
            redirect_cooldown_max_ms: 15_000,
        }
    }
}

/// Browser automation settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BrowserConfig {
    /// Run browser in headless mode
    pub headless: bool,
    /// Persistent profile directory holding the signed-in session
    pub user_data_dir: PathBuf,
    /// Browser window width
    pub window_width: u32,
    /// Browser window height
    pub window_height: u32,
    /// Navigation timeout in seconds
    pub navigation_timeout_secs: u64,
    /// How long to wait for late-rendering elements, in seconds
    pub element_timeout_secs: u64,
    /// Proxy server, e.g. `http://host:8080`
    pub proxy_server: Option<String>,
    /// Proxy user name
    pub proxy_username: Option<String>,
    /// Proxy password
    pub proxy_password: Option<String>,
}

impl BrowserConfig {
    /// Navigation timeout as a `Duration`.
    #[must_use]
    pub fn navigation_timeout(&self) -> Duration {
        Duration::from_secs(self.navigation_timeout_secs)
    }

    /// Element wait timeout as a `Duration`.
    #[must_use]
    pub fn element_timeout(&self) -> Duration {
        Duration::from_secs(self.element_timeout_secs)
    }
}

impl Default for BrowserConfig {
    fn default() -> Self {
        Self {
            headless: false,
            user_data_dir: PathBuf::from("linkedin_profile"),
            window_width: 1440,
            window_height: 900,
            navigation_timeout_secs: 20,
            element_timeout_secs: 20,
            proxy_server: None,
            proxy_username: None,
            proxy_password: None,
        }
    }
}

/// Output destination selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputMode {
    /// Upsert into the `SQLite` store
    #[default]
    Store,
    /// Write a JSON array file at the end of the run
    Json,
}

/// Output settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Store or JSON file
    pub mode: OutputMode,
    /// `SQLite` database file
    pub database_path: String,
    /// JSON output file
    pub json_path: PathBuf,
    /// Accepted records per commit
    pub batch_size: usize,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            mode: OutputMode::Store,
            database_path: "jobscout.db".to_string(),
            json_path: PathBuf::from("output_linkedin.json"),
            batch_size: 10,
        }
    }
}
