//! Jobscout Database Layer
//!
//! Provides `SQLite` storage for discovered job postings. Uses `SQLx` for
//! connection pooling and embedded migrations.
//!
//! # Architecture
//!
//! - **Migrations**: SQL migrations are embedded and versioned using `SQLx`
//! - **Deduplication**: postings are unique per `(source, desc_fingerprint, contact_fingerprint)`
//! - **Batching**: [`JobStore`] commits every N upserts and flushes on finalize
//!
//! # Example
//!
//! ```ignore
//! use jobscout_db::{Database, JobStore};
//!
//! let db = Database::new("jobscout.db").await?;
//! db.run_migrations().await?;
//! let mut store = JobStore::new(db.pool().clone(), 10);
//! store.upsert(&record, record.dedup_contact()).await?;
//! store.finalize().await?;
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]

pub mod connection;
pub mod error;
pub mod migrations;
pub mod postings;

// Re-export commonly used types
pub use error::{DatabaseError, Result};
pub use postings::{count_postings, recent_postings, JobStore, StoredPosting, UpsertOutcome};

use sqlx::{Pool, Sqlite};
use std::path::Path;

/// High-level database handle: a connection pool plus schema management.
#[derive(Debug)]
pub struct Database {
    pool: Pool<Sqlite>,
}

impl Database {
    /// Open the database at `path`, creating the file if needed.
    ///
    /// # Arguments
    /// * `path` - Path to the database file (or `:memory:` for in-memory)
    ///
    /// # Errors
    /// Returns `DatabaseError::Open` if the database cannot be opened.
    pub async fn new(path: impl AsRef<Path>) -> Result<Self> {
        let pool = connection::open_pool(path).await?;
        Ok(Self { pool })
    }

    /// Create the schema, applying every pending migration.
    ///
    /// # Errors
    /// Returns `DatabaseError::Migration` if any migration fails.
    pub async fn run_migrations(&self) -> Result<()> {
        migrations::run_migrations(&self.pool).await
    }

    /// Get the current schema version.
    ///
    /// # Errors
    /// Returns `DatabaseError` if the version cannot be queried.
    pub async fn get_schema_version(&self) -> Result<i64> {
        migrations::get_schema_version(&self.pool).await
    }

    /// Get a reference to the underlying connection pool.
    #[must_use]
    pub fn pool(&self) -> &Pool<Sqlite> {
        &self.pool
    }

    /// Close the database connection gracefully.
    pub async fn close(self) {
        self.pool.close().await;
        tracing::info!("Database pool closed");
    }
}
