use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions};
use sqlx::SqlitePool;
use thiserror::Error;

use crate::repository::{PerformanceStore, Storage};

mod mapping;
mod migrate;
mod performance_repo;

/// Default bound on waiting for a connection or a write lock.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);

/// `SQLite`-backed performance store.
///
/// One row per ordered operand pair in the `performances` table.
#[derive(Clone)]
pub struct SqlitePerformanceStore {
    pool: SqlitePool,
    timeout: Duration,
}

#[derive(Debug, Error)]
#[non_exhaustive]
pub enum SqliteInitError {
    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),
}

impl SqlitePerformanceStore {
    /// Connect to `SQLite` using the given URL and the default timeout.
    ///
    /// # Errors
    ///
    /// Returns `SqliteInitError` if the connection cannot be established.
    pub async fn connect(database_url: &str) -> Result<Self, SqliteInitError> {
        Self::connect_with_timeout(database_url, DEFAULT_TIMEOUT).await
    }

    /// Connect with an explicit bound on connection acquisition and lock waits.
    ///
    /// The database file is created if it does not exist.
    ///
    /// # Errors
    ///
    /// Returns `SqliteInitError` if the URL is invalid or the connection fails.
    pub async fn connect_with_timeout(
        database_url: &str,
        timeout: Duration,
    ) -> Result<Self, SqliteInitError> {
        let options = SqliteConnectOptions::from_str(database_url)?
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .busy_timeout(timeout);

        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .acquire_timeout(timeout)
            .connect_with(options)
            .await?;

        tracing::debug!(url = database_url, ?timeout, "connected to sqlite");
        Ok(Self { pool, timeout })
    }

    #[must_use]
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    #[must_use]
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Create tables if they do not exist.
    ///
    /// # Errors
    ///
    /// Returns `SqliteInitError` if migration queries fail.
    pub async fn migrate(&self) -> Result<(), SqliteInitError> {
        migrate::run_migrations(&self.pool).await
    }
}

impl Storage {
    /// Build a `Storage` backed by `SQLite`.
    ///
    /// # Errors
    ///
    /// Returns `SqliteInitError` if connection or migrations cannot be
    /// completed.
    pub async fn sqlite(database_url: &str, timeout: Duration) -> Result<Self, SqliteInitError> {
        let repo = SqlitePerformanceStore::connect_with_timeout(database_url, timeout).await?;
        repo.migrate().await?;
        let performance: Arc<dyn PerformanceStore> = Arc::new(repo);
        Ok(Self { performance })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn repository_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<SqlitePerformanceStore>();
    }

    #[tokio::test]
    async fn invalid_url_is_an_init_error() {
        let err = SqlitePerformanceStore::connect("sqlite://drill.db?mode=bogus").await;
        assert!(matches!(err, Err(SqliteInitError::Sqlx(_))));
    }
}
