//! Page automation for jobscout.
//!
//! Provides the [`PageDriver`] capability the scraper is written against,
//! a Chromium implementation with a persistent profile and randomized launch
//! options, and a scripted implementation that replays recorded pages.

pub mod actions;
pub mod engine;
pub mod error;
pub mod launch;
pub mod scripted;

pub use actions::{Locator, PageDriver};
pub use engine::BrowserEngine;
pub use error::{BrowserError, Result};
pub use launch::LaunchOptions;
pub use scripted::{ElementFixture, PageFixture, ScriptedPage};
