use async_trait::async_trait;
use drill_core::model::{PerformanceRecord, ProblemKey};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use thiserror::Error;

/// Errors surfaced by storage adapters.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum StorageError {
    #[error("storage unavailable: {0}")]
    Unavailable(String),

    #[error("storage timed out after {0:?}")]
    Timeout(Duration),

    #[error("serialization error: {0}")]
    Serialization(String),
}

/// Record returned by `PerformanceStore::update`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UpdatedRecord {
    pub record: PerformanceRecord,
    /// This submission lowered the best time, or was the first one.
    pub improved: bool,
}

/// Persistence contract for per-problem performance records.
///
/// Implementations must apply `update` atomically per key: two concurrent
/// submissions for the same problem both count, and the best time is the
/// minimum of everything submitted.
#[async_trait]
pub trait PerformanceStore: Send + Sync {
    /// Fetch the record for a key.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the backend cannot be read. An unseen key is
    /// `Ok(None)`.
    async fn get(&self, key: ProblemKey) -> Result<Option<PerformanceRecord>, StorageError>;

    /// Record one submission and return the updated record.
    ///
    /// `improved` is decided against the same state the update was applied
    /// to, so it stays exact under concurrent submissions.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the update could not be persisted.
    async fn update(
        &self,
        key: ProblemKey,
        elapsed_ms: u64,
        correct: bool,
    ) -> Result<UpdatedRecord, StorageError>;

    /// Snapshot of every record. Iteration order carries no meaning.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the backend cannot be read.
    async fn get_all(&self) -> Result<HashMap<ProblemKey, PerformanceRecord>, StorageError>;

    /// Irreversibly delete every record.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the backend cannot be written.
    async fn reset(&self) -> Result<(), StorageError>;

    /// Release backend resources. Further calls may fail with `Unavailable`.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if pending data could not be flushed.
    async fn close(&self) -> Result<(), StorageError> {
        Ok(())
    }
}

/// Simple in-memory store for testing and prototyping.
#[derive(Clone, Default)]
pub struct InMemoryPerformanceStore {
    records: Arc<Mutex<HashMap<ProblemKey, PerformanceRecord>>>,
}

impl InMemoryPerformanceStore {
    #[must_use]
    pub fn new() -> Self {
        Self {
            records: Arc::new(Mutex::new(HashMap::new())),
        }
    }
}

#[async_trait]
impl PerformanceStore for InMemoryPerformanceStore {
    async fn get(&self, key: ProblemKey) -> Result<Option<PerformanceRecord>, StorageError> {
        let guard = self
            .records
            .lock()
            .map_err(|e| StorageError::Unavailable(e.to_string()))?;
        Ok(guard.get(&key).copied())
    }

    async fn update(
        &self,
        key: ProblemKey,
        elapsed_ms: u64,
        correct: bool,
    ) -> Result<UpdatedRecord, StorageError> {
        let mut guard = self
            .records
            .lock()
            .map_err(|e| StorageError::Unavailable(e.to_string()))?;
        let existing = guard.get(&key).copied();
        let (record, improved) =
            PerformanceRecord::record_attempt_improving(existing, elapsed_ms, correct);
        guard.insert(key, record);
        Ok(UpdatedRecord { record, improved })
    }

    async fn get_all(&self) -> Result<HashMap<ProblemKey, PerformanceRecord>, StorageError> {
        let guard = self
            .records
            .lock()
            .map_err(|e| StorageError::Unavailable(e.to_string()))?;
        Ok(guard.clone())
    }

    async fn reset(&self) -> Result<(), StorageError> {
        let mut guard = self
            .records
            .lock()
            .map_err(|e| StorageError::Unavailable(e.to_string()))?;
        guard.clear();
        Ok(())
    }
}

/// Holds the active store behind a trait object for easy backend swapping.
#[derive(Clone)]
pub struct Storage {
    pub performance: Arc<dyn PerformanceStore>,
}

impl Storage {
    #[must_use]
    pub fn in_memory() -> Self {
        let performance: Arc<dyn PerformanceStore> = Arc::new(InMemoryPerformanceStore::new());
        Self { performance }
    }

    /// Close the underlying store.
    ///
    /// # Errors
    ///
    /// Propagates the backend's `close` error.
    pub async fn close(&self) -> Result<(), StorageError> {
        self.performance.close().await
    }
}
