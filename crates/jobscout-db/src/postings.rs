//! Job posting persistence.
//!
//! [`JobStore`] writes postings keyed by their dedup fingerprint. A repeated
//! sighting of the same posting only bumps `updated_at`; content columns are
//! written once. Writes are grouped into batches that commit together, and
//! each upsert runs inside its own savepoint so a failed write rolls back only
//! itself.

use crate::error::{DatabaseError, Result};
use chrono::Utc;
use jobscout_core::{Fingerprint, JobRecord};
use serde::Serialize;
use sqlx::{Acquire, Pool, Sqlite, Transaction};

/// Result of a single upsert.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpsertOutcome {
    /// A new posting row was created
    Inserted,
    /// The posting was already stored; only its last-seen timestamp changed
    Updated,
}

/// Batched, idempotent writer for job postings.
pub struct JobStore {
    pool: Pool<Sqlite>,
    tx: Option<Transaction<'static, Sqlite>>,
    batch_size: usize,
    pending: usize,
    finalized: bool,
}

impl JobStore {
    /// Create a store that commits every `batch_size` accepted upserts.
    ///
    /// No connection is taken from the pool until the first upsert.
    #[must_use]
    pub fn new(pool: Pool<Sqlite>, batch_size: usize) -> Self {
        Self {
            pool,
            tx: None,
            batch_size: batch_size.max(1),
            pending: 0,
            finalized: false,
        }
    }

    /// Upserts written since the last commit.
    #[must_use]
    pub fn pending(&self) -> usize {
        self.pending
    }

    /// Insert a posting, or touch `updated_at` if its fingerprint is already stored.
    ///
    /// The fingerprint is computed from the record's description and
    /// `dedup_contact`. On failure the write is rolled back and earlier
    /// uncommitted upserts of the batch are kept.
    ///
    /// # Errors
    /// Returns `DatabaseError::Finalized` after [`JobStore::finalize`], or the
    /// underlying database error.
    pub async fn upsert(&mut self, record: &JobRecord, dedup_contact: &str) -> Result<UpsertOutcome> {
        if self.finalized {
            return Err(DatabaseError::Finalized);
        }

        if self.tx.is_none() {
            let tx = self.pool.begin().await?;
            self.tx = Some(tx);
        }
        let Some(tx) = self.tx.as_mut() else {
            return Err(DatabaseError::Open("no transaction available".to_string()));
        };

        let fingerprint = Fingerprint::of(&record.description, dedup_contact);
        let now = Utc::now().to_rfc3339();

        let mut savepoint = Acquire::begin(&mut *tx).await?;

        let existing: Option<i64> = sqlx::query_scalar(
            "SELECT id FROM job_postings
             WHERE source = ? AND desc_fingerprint = ? AND contact_fingerprint = ?",
        )
        .bind(&record.source)
        .bind(&fingerprint.description)
        .bind(&fingerprint.contact)
        .fetch_optional(&mut *savepoint)
        .await?;

        sqlx::query(
            r"
            INSERT INTO job_postings (
                source, title, company, location, url, description, salary, contact,
                contact_email, contact_profile_url, desc_fingerprint, contact_fingerprint,
                created_at, updated_at
            )
            VALUES (?, ?, '', ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT(source, desc_fingerprint, contact_fingerprint) DO UPDATE SET
                updated_at = excluded.updated_at
            ",
        )
        .bind(&record.source)
        .bind(&record.title)
        .bind(&record.location)
        .bind(&record.source_url)
        .bind(&record.description)
        .bind(&record.salary)
        .bind(record.contact_summary())
        .bind(&record.contact_email)
        .bind(&record.contact_profile_url)
        .bind(&fingerprint.description)
        .bind(&fingerprint.contact)
        .bind(&now)
        .bind(&now)
        .execute(&mut *savepoint)
        .await?;

        savepoint.commit().await?;

        self.pending += 1;
        if self.pending >= self.batch_size {
            self.commit_batch().await?;
        }

        Ok(match existing {
            Some(_) => UpsertOutcome::Updated,
            None => UpsertOutcome::Inserted,
        })
    }

    /// Commit the open batch, if any.
    ///
    /// # Errors
    /// Returns the commit error; the batch is rolled back in that case.
    pub async fn commit_batch(&mut self) -> Result<()> {
        if let Some(tx) = self.tx.take() {
            let records = std::mem::take(&mut self.pending);
            tx.commit().await?;
            tracing::debug!(records, "Committed posting batch");
        }
        Ok(())
    }

    /// Flush the remaining batch and release the connection.
    ///
    /// Safe to call more than once; only the first call does any work.
    ///
    /// # Errors
    /// Returns the commit error of the final batch.
    pub async fn finalize(&mut self) -> Result<()> {
        if self.finalized {
            return Ok(());
        }
        self.finalized = true;
        let result = self.commit_batch().await;
        tracing::info!("Posting store finalized");
        result
    }
}

impl std::fmt::Debug for JobStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JobStore")
            .field("batch_size", &self.batch_size)
            .field("pending", &self.pending)
            .field("in_transaction", &self.tx.is_some())
            .field("finalized", &self.finalized)
            .finish_non_exhaustive()
    }
}

/// A stored posting as listed by reports.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StoredPosting {
    /// Row id
    pub id: i64,
    /// Posting title
    pub title: String,
    /// Location label of the facet that found it
    pub location: String,
    /// Detail page URL
    pub url: String,
    /// Contact summary
    pub contact: String,
    /// First seen, as stored by SQLite
    pub created_at: String,
    /// Last seen, as stored by SQLite
    pub updated_at: String,
}

/// Number of stored postings.
///
/// # Errors
/// Returns `sqlx::Error` if the query fails.
pub async fn count_postings(pool: &Pool<Sqlite>) -> Result<i64> {
    Ok(sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM job_postings")
        .fetch_one(pool)
        .await?)
}

/// The most recently created postings, newest first.
///
/// # Errors
/// Returns `sqlx::Error` if the query fails.
pub async fn recent_postings(pool: &Pool<Sqlite>, limit: u32) -> Result<Vec<StoredPosting>> {
    let rows = sqlx::query_as::<_, (i64, String, String, String, String, String, String)>(
        "SELECT id, title, location, url, contact, created_at, updated_at
         FROM job_postings ORDER BY created_at DESC, id DESC LIMIT ?",
    )
    .bind(i64::from(limit))
    .fetch_all(pool)
    .await?;

    Ok(rows
        .into_iter()
        .map(
            |(id, title, location, url, contact, created_at, updated_at)| StoredPosting {
                id,
                title,
                location,
                url,
                contact,
                created_at,
                updated_at,
            },
        )
        .collect())
}
