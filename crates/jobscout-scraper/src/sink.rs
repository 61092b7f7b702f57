//! Destinations for accepted records.
//!
//! The run hands every accepted record to a [`RecordSink`] and finalizes it
//! exactly once at the end, whether the run succeeded or not.

use crate::error::{Result, ScrapeError};
use async_trait::async_trait;
use jobscout_core::JobRecord;
use jobscout_db::{JobStore, UpsertOutcome};
use std::path::{Path, PathBuf};

/// What a sink did with one record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SinkOutcome {
    /// Stored as a new posting
    Inserted,
    /// Already stored; only its last-seen time changed
    Updated,
    /// Held in memory until finalize
    Buffered,
}

/// Destination of accepted records.
#[async_trait]
pub trait RecordSink: Send {
    /// Hand over one accepted record.
    async fn accept(&mut self, record: &JobRecord) -> Result<SinkOutcome>;

    /// Flush everything still held and release resources. Idempotent.
    async fn finalize(&mut self) -> Result<()>;
}

/// Sink writing into the postings table.
#[derive(Debug)]
pub struct StoreSink {
    store: JobStore,
}

impl StoreSink {
    /// Sink writing through `store`.
    #[must_use]
    pub fn new(store: JobStore) -> Self {
        Self { store }
    }
}

#[async_trait]
impl RecordSink for StoreSink {
    async fn accept(&mut self, record: &JobRecord) -> Result<SinkOutcome> {
        let outcome = self.store.upsert(record, record.dedup_contact()).await?;
        Ok(match outcome {
            UpsertOutcome::Inserted => SinkOutcome::Inserted,
            UpsertOutcome::Updated => SinkOutcome::Updated,
        })
    }

    async fn finalize(&mut self) -> Result<()> {
        Ok(self.store.finalize().await?)
    }
}

/// Sink writing all records as one pretty-printed JSON array.
///
/// Records are buffered and written on finalize to a temporary file next to
/// the destination, which is then renamed over it.
#[derive(Debug)]
pub struct JsonFileSink {
    path: PathBuf,
    records: Vec<JobRecord>,
    finalized: bool,
}

impl JsonFileSink {
    /// Sink that will write to `path`.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            records: Vec::new(),
            finalized: false,
        }
    }

    /// Destination file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temp_path(&self) -> PathBuf {
        let name = self
            .path
            .file_name()
            .map_or_else(|| "records.json".into(), |n| n.to_string_lossy().into_owned());
        self.path.with_file_name(format!(".{name}.tmp"))
    }

    fn output_error(&self, source: std::io::Error) -> ScrapeError {
        ScrapeError::Output {
            path: self.path.display().to_string(),
            source,
        }
    }
}

#[async_trait]
impl RecordSink for JsonFileSink {
    async fn accept(&mut self, record: &JobRecord) -> Result<SinkOutcome> {
        if self.finalized {
            return Err(ScrapeError::SinkFinalized);
        }
        self.records.push(record.clone());
        Ok(SinkOutcome::Buffered)
    }

    async fn finalize(&mut self) -> Result<()> {
        if self.finalized {
            return Ok(());
        }
        self.finalized = true;

        let json = serde_json::to_vec_pretty(&self.records)?;
        let temp = self.temp_path();
        tokio::fs::write(&temp, &json)
            .await
            .map_err(|e| self.output_error(e))?;
        if let Err(e) = tokio::fs::rename(&temp, &self.path).await {
            let _ = tokio::fs::remove_file(&temp).await;
            return Err(self.output_error(e));
        }

        tracing::info!(
            "Wrote {} records to {}",
            self.records.len(),
            self.path.display()
        );
        Ok(())
    }
}
