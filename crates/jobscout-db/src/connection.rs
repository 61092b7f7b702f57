//! Database connection management.
//!
//! Opens a `SQLx` `SQLite` pool for either a database file or `:memory:`.

use crate::error::{DatabaseError, Result};
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions};
use sqlx::{Pool, Sqlite};
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

/// Special path selecting a private in-memory database.
pub const IN_MEMORY: &str = ":memory:";

/// Open a connection pool, creating the database file if it is missing.
///
/// An in-memory database is limited to a single connection so every query
/// sees the same data, including rows of a transaction that is still open.
///
/// # Errors
/// Returns `DatabaseError::Open` if the path is not valid UTF-8 or the
/// database cannot be opened.
pub async fn open_pool(path: impl AsRef<Path>) -> Result<Pool<Sqlite>> {
    let path_str = path.as_ref().to_str().ok_or_else(|| {
        DatabaseError::Open("invalid database path: not valid UTF-8".to_string())
    })?;

    let (connect_options, max_connections) = if path_str == IN_MEMORY {
        let options = SqliteConnectOptions::from_str(IN_MEMORY)
            .map_err(|e| DatabaseError::Open(format!("invalid connection string: {e}")))?;
        (options, 1)
    } else {
        let options = SqliteConnectOptions::new()
            .filename(path_str)
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .busy_timeout(Duration::from_secs(5));
        (options, 5)
    };

    let pool = SqlitePoolOptions::new()
        .max_connections(max_connections)
        .connect_with(connect_options)
        .await
        .map_err(|e| DatabaseError::Open(format!("{path_str}: {e}")))?;

    tracing::info!("Database pool created at {}", path_str);
    Ok(pool)
}
