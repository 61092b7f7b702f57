//! Run orchestrator driving the scrape across every search facet.
//!
//! For each facet the orchestrator opens the search page, makes sure the
//! session is signed in, collects detail links and extracts them one by one.
//! Accepted records go to a [`RecordSink`], which is finalized exactly once
//! when the run ends, including when it ends with an error.
//!
//! A signed-out session suspends the run: the orchestrator publishes
//! [`RunStatus::NeedsAuthentication`] and waits for [`RunControl::resume`].
//! [`Orchestrator::run_until`] stops early when its shutdown future resolves,
//! still finalizing the sink.

use crate::collector::LinkCollector;
use crate::error::{Result, ScrapeError};
use crate::extractor::{DetailExtractor, DetailOutcome, SkipReason};
use crate::filter::{RecordFilter, Verdict};
use crate::pacing::Pacer;
use crate::retry::{retry_with_backoff, RetryPolicy};
use crate::session::is_authenticated;
use crate::sink::{RecordSink, SinkOutcome};
use crate::site::build_search_url;
use jobscout_browser::PageDriver;
use jobscout_core::{AppConfig, JobRecord, ScrapingConfig, SearchFacet};
use std::collections::{BTreeMap, HashSet};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, watch};

/// Where the run currently is, as seen by its caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunStatus {
    /// Working through facets
    Running,
    /// Waiting for someone to sign in to the browser and call [`RunControl::resume`]
    NeedsAuthentication {
        /// Facet being searched, as displayed
        facet: String,
        /// Search URL that showed the signed-out page
        url: String,
    },
    /// Interrupted before all facets were processed
    Stopped,
    /// All facets done and the sink finalized
    Finished,
}

/// Caller-side handle of a run.
#[derive(Debug, Clone)]
pub struct RunControl {
    resume: mpsc::Sender<()>,
    status: watch::Receiver<RunStatus>,
}

impl RunControl {
    /// Signal that the manual login is done.
    ///
    /// Returns `false` when the orchestrator no longer exists.
    pub async fn resume(&self) -> bool {
        self.resume.send(()).await.is_ok()
    }

    /// Subscribe to status changes.
    #[must_use]
    pub fn status(&self) -> watch::Receiver<RunStatus> {
        self.status.clone()
    }
}

/// Counters and accepted records of one run.
#[derive(Debug, Clone, Default)]
pub struct RunReport {
    /// The run was stopped before all facets were processed
    pub interrupted: bool,
    /// Facets that ran to completion
    pub facets_processed: usize,
    /// Facets that ended in an error
    pub facets_failed: usize,
    /// Detail links harvested across facets
    pub links_collected: usize,
    /// Links extracted, after run-wide URL dedup
    pub links_processed: usize,
    /// Accepted records in discovery order
    pub records: Vec<JobRecord>,
    /// Skip count per reason
    pub skipped: BTreeMap<SkipReason, usize>,
    /// Records dropped for not matching the facet's keywords
    pub role_filtered: usize,
    /// Records already accepted earlier in the run
    pub duplicates: usize,
    /// Links given up on after retries
    pub extraction_failures: usize,
    /// Records new to the store
    pub store_inserted: usize,
    /// Records the store already held
    pub store_updated: usize,
    /// Records the store failed to write
    pub store_failures: usize,
}

impl RunReport {
    /// Skips recorded for `reason`.
    #[must_use]
    pub fn skipped(&self, reason: SkipReason) -> usize {
        self.skipped.get(&reason).copied().unwrap_or(0)
    }

    /// Skips across all reasons.
    #[must_use]
    pub fn skipped_total(&self) -> usize {
        self.skipped.values().sum()
    }
}

/// Drives one scrape across every search facet.
pub struct Orchestrator {
    page: Arc<dyn PageDriver>,
    facets: Vec<SearchFacet>,
    scraping: ScrapingConfig,
    element_timeout: Duration,
    pacer: Pacer,
    retry: RetryPolicy,
    status: watch::Sender<RunStatus>,
    resume: mpsc::Receiver<()>,
    processed_urls: HashSet<String>,
    filter: RecordFilter,
}

impl Orchestrator {
    /// Create an orchestrator over `page` and the handle that controls it.
    #[must_use]
    pub fn new(page: Arc<dyn PageDriver>, config: &AppConfig) -> (Self, RunControl) {
        let (resume_tx, resume_rx) = mpsc::channel(1);
        let (status_tx, status_rx) = watch::channel(RunStatus::Running);

        let orchestrator = Self {
            page,
            facets: config.facets(),
            scraping: config.scraping.clone(),
            element_timeout: config.browser.element_timeout(),
            pacer: Pacer::from_config(&config.pacing),
            retry: RetryPolicy::from_config(&config.retry),
            status: status_tx,
            resume: resume_rx,
            processed_urls: HashSet::new(),
            filter: RecordFilter::new(),
        };
        let control = RunControl {
            resume: resume_tx,
            status: status_rx,
        };
        (orchestrator, control)
    }

    /// Replace the pacing delays.
    #[must_use]
    pub fn with_pacer(mut self, pacer: Pacer) -> Self {
        self.pacer = pacer;
        self
    }

    /// Replace the retry policy.
    #[must_use]
    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Replace the facets built from configuration.
    #[must_use]
    pub fn with_facets(mut self, facets: Vec<SearchFacet>) -> Self {
        self.facets = facets;
        self
    }

    /// Run every facet in order and finalize `sink`.
    ///
    /// A failing facet is logged and counted; the run continues with the
    /// next one. The run only aborts when the resume channel closes during a
    /// login wait. The sink is finalized in every case.
    pub async fn run(&mut self, sink: &mut dyn RecordSink) -> Result<RunReport> {
        self.run_until(sink, std::future::pending()).await
    }

    /// Like [`run`](Self::run), but stops as soon as `shutdown` resolves.
    ///
    /// An interrupted run publishes [`RunStatus::Stopped`], finalizes the sink
    /// with what was accepted so far and returns a report marked
    /// `interrupted`.
    pub async fn run_until<F>(&mut self, sink: &mut dyn RecordSink, shutdown: F) -> Result<RunReport>
    where
        F: Future<Output = ()>,
    {
        self.status.send_replace(RunStatus::Running);
        tracing::info!("Starting run over {} facets", self.facets.len());

        let mut report = RunReport::default();
        let outcome = tokio::select! {
            biased;
            () = shutdown => None,
            outcome = self.run_facets(sink, &mut report) => Some(outcome),
        };

        let (outcome, final_status) = match outcome {
            Some(outcome) => (outcome, RunStatus::Finished),
            None => {
                tracing::warn!("Run interrupted, finalizing output");
                report.interrupted = true;
                self.status.send_replace(RunStatus::Stopped);
                (Ok(()), RunStatus::Stopped)
            }
        };

        let finalized = sink.finalize().await;
        self.status.send_replace(final_status);

        match (outcome, finalized) {
            (Err(e), Err(finalize_err)) => {
                tracing::error!("Failed to finalize output: {}", finalize_err);
                Err(e)
            }
            (Err(e), Ok(())) | (Ok(()), Err(e)) => Err(e),
            (Ok(()), Ok(())) => {
                tracing::info!(
                    facets = report.facets_processed,
                    links = report.links_processed,
                    records = report.records.len(),
                    skipped = report.skipped_total(),
                    failures = report.extraction_failures,
                    interrupted = report.interrupted,
                    "Run finished"
                );
                Ok(report)
            }
        }
    }

    async fn run_facets(&mut self, sink: &mut dyn RecordSink, report: &mut RunReport) -> Result<()> {
        let facets = self.facets.clone();
        for facet in &facets {
            match self.run_facet(facet, sink, report).await {
                Ok(()) => report.facets_processed += 1,
                Err(ScrapeError::ResumeChannelClosed) => return Err(ScrapeError::ResumeChannelClosed),
                Err(e) => {
                    tracing::error!(facet = %facet, "Facet failed: {}", e);
                    report.facets_failed += 1;
                }
            }
        }
        Ok(())
    }

    async fn run_facet(
        &mut self,
        facet: &SearchFacet,
        sink: &mut dyn RecordSink,
        report: &mut RunReport,
    ) -> Result<()> {
        let page_handle = Arc::clone(&self.page);
        let page: &dyn PageDriver = page_handle.as_ref();

        let url = build_search_url(&self.scraping.search_base_url, &facet.role, facet.geo_id)?;
        tracing::info!(facet = %facet, "Searching {}", url);

        open_search(page, &self.retry, &url).await?;
        if !is_authenticated(page).await? {
            self.wait_for_login(facet, &url).await?;
            open_search(page, &self.retry, &url).await?;
            if !is_authenticated(page).await? {
                tracing::warn!(facet = %facet, "Session still looks signed out, continuing");
            }
        }

        let links = LinkCollector::new(
            page,
            &self.pacer,
            self.scraping.max_links_per_facet,
            self.scraping.max_scroll_iterations,
        )
        .collect()
        .await?;
        tracing::info!(facet = %facet, "Collected {} links", links.len());
        report.links_collected += links.len();

        let extractor = DetailExtractor::new(
            page,
            &self.pacer,
            &self.retry,
            self.scraping.contact_scan_limit,
        )
        .with_element_timeout(self.element_timeout);

        for link in links {
            if !self.processed_urls.insert(link.clone()) {
                tracing::debug!("Already processed {}", link);
                continue;
            }
            report.links_processed += 1;
            self.pacer.periodic_cooldown(report.links_processed).await;

            let (pacer, extractor, target) = (&self.pacer, &extractor, link.as_str());
            let outcome = retry_with_backoff(&self.retry, "detail extraction", move |_| async move {
                pacer.jitter().await;
                extractor.extract(target, facet).await
            })
            .await;

            match outcome {
                Ok(DetailOutcome::Record(record)) => {
                    match self.filter.check(&record, &facet.keywords) {
                        Verdict::OffRole => {
                            tracing::debug!(title = %record.title, "Off-role posting {}", link);
                            report.role_filtered += 1;
                        }
                        Verdict::Duplicate => {
                            tracing::debug!(title = %record.title, "Duplicate posting {}", link);
                            report.duplicates += 1;
                        }
                        Verdict::Accept => {
                            tracing::info!(
                                title = %record.title,
                                contact = %record.contact_summary(),
                                "Accepted {}",
                                link
                            );
                            match sink.accept(&record).await {
                                Ok(SinkOutcome::Inserted) => report.store_inserted += 1,
                                Ok(SinkOutcome::Updated) => report.store_updated += 1,
                                Ok(SinkOutcome::Buffered) => {}
                                Err(e) => {
                                    tracing::warn!("Failed to store {}: {}", link, e);
                                    report.store_failures += 1;
                                }
                            }
                            report.records.push(record);
                        }
                    }
                }
                Ok(DetailOutcome::Skip(reason)) => {
                    tracing::warn!("Skipped {} ({})", link, reason);
                    *report.skipped.entry(reason).or_default() += 1;
                }
                Err(e) => {
                    tracing::warn!("Giving up on {}: {}", link, e);
                    report.extraction_failures += 1;
                }
            }
        }

        Ok(())
    }

    /// Publish `NeedsAuthentication` and block until resumed.
    async fn wait_for_login(&mut self, facet: &SearchFacet, url: &str) -> Result<()> {
        // Signals sent before this wait began are stale
        while self.resume.try_recv().is_ok() {}

        tracing::warn!(facet = %facet, "Session is signed out, waiting for manual login");
        self.status.send_replace(RunStatus::NeedsAuthentication {
            facet: facet.to_string(),
            url: url.to_string(),
        });

        let resumed = self.resume.recv().await;
        self.status.send_replace(RunStatus::Running);
        match resumed {
            Some(()) => {
                tracing::info!("Resuming after manual login");
                Ok(())
            }
            None => Err(ScrapeError::ResumeChannelClosed),
        }
    }
}

async fn open_search(page: &dyn PageDriver, retry: &RetryPolicy, url: &str) -> Result<()> {
    retry_with_backoff(retry, "search page", move |_| async move {
        Ok(page.navigate(url).await?)
    })
    .await?;
    Ok(())
}
