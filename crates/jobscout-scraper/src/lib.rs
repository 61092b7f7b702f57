//! Jobscout Scraper - the extraction-and-dedup pipeline.
//!
//! This crate drives a [`PageDriver`](jobscout_browser::PageDriver) through
//! the listings site: it collects detail links from search results, extracts
//! one record per detail page through ordered strategy chains, resolves the
//! recruiter's contact details, filters and deduplicates records, and hands
//! the survivors to an output sink.
//!
//! # Features
//!
//! - Link harvesting from a virtualized results list with a per-facet cap
//! - Title and description extraction through named fallback strategies
//! - Bot-detection redirect handling with randomized cooldowns
//! - Bounded retry with a backoff schedule for transient driver failures
//! - Suspension for manual login, resumed through [`RunControl`]
//! - SQLite or JSON file output through [`RecordSink`]
//!
//! # Example
//!
//! ```rust,ignore
//! use jobscout_scraper::{JsonFileSink, Orchestrator};
//! use std::sync::Arc;
//!
//! let (mut orchestrator, control) = Orchestrator::new(Arc::new(engine), &config);
//! let mut sink = JsonFileSink::new("output_linkedin.json");
//! let report = orchestrator.run(&mut sink).await?;
//! println!("{} records", report.records.len());
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]

pub mod collector;
pub mod contact;
pub mod error;
pub mod extractor;
pub mod filter;
pub mod orchestrator;
pub mod pacing;
pub mod probe;
pub mod retry;
pub mod session;
pub mod sink;
pub mod site;
pub mod strategy;

// Re-export commonly used types
pub use collector::LinkCollector;
pub use contact::{ContactInfo, ContactResolver, ContactRoute};
pub use error::{Result, ScrapeError};
pub use extractor::{DetailExtractor, DetailOutcome, SkipReason};
pub use filter::{RecordFilter, Verdict};
pub use orchestrator::{Orchestrator, RunControl, RunReport, RunStatus};
pub use pacing::Pacer;
pub use retry::{retry_with_backoff, RetryPolicy};
pub use sink::{JsonFileSink, RecordSink, SinkOutcome, StoreSink};
pub use strategy::{Extracted, StrategyChain, TextStrategy};
