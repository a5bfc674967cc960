use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use drill_core::model::{PerformanceRecord, ProblemKey};
use tokio::sync::Mutex;

use crate::repository::{PerformanceStore, Storage, StorageError, UpdatedRecord};

/// Performance store persisted as one JSON object keyed by `"AxB"`.
///
/// The whole map is held in memory and rewritten on every change through a
/// temporary file and a rename, so a crash never leaves a half-written file.
/// File writes run on the blocking pool while the map lock is held, which
/// keeps saves in update order.
#[derive(Clone)]
pub struct JsonFileStore {
    path: PathBuf,
    records: Arc<Mutex<HashMap<ProblemKey, PerformanceRecord>>>,
}

impl JsonFileStore {
    /// Open the store at `path`. A missing file is an empty store.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Unavailable` if the file cannot be read and
    /// `StorageError::Serialization` if its contents are not a valid record map.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, StorageError> {
        let path = path.into();
        let records = load(&path)?;
        tracing::debug!(path = %path.display(), records = records.len(), "opened json store");
        Ok(Self {
            path,
            records: Arc::new(Mutex::new(records)),
        })
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn save(
        &self,
        records: &HashMap<ProblemKey, PerformanceRecord>,
    ) -> Result<(), StorageError> {
        let ordered: BTreeMap<&ProblemKey, &PerformanceRecord> = records.iter().collect();
        let json = serde_json::to_string_pretty(&ordered)
            .map_err(|e| StorageError::Serialization(e.to_string()))?;

        let path = self.path.clone();
        tokio::task::spawn_blocking(move || write_atomic(&path, json.as_bytes()))
            .await
            .map_err(|e| StorageError::Unavailable(e.to_string()))?
    }
}

fn load(path: &Path) -> Result<HashMap<ProblemKey, PerformanceRecord>, StorageError> {
    let content = match fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(HashMap::new()),
        Err(e) => return Err(StorageError::Unavailable(e.to_string())),
    };
    if content.trim().is_empty() {
        return Ok(HashMap::new());
    }

    let raw: BTreeMap<ProblemKey, PerformanceRecord> = serde_json::from_str(&content)
        .map_err(|e| StorageError::Serialization(format!("{}: {e}", path.display())))?;

    raw.into_iter()
        .map(|(key, r)| {
            PerformanceRecord::from_persisted(
                r.stored_best_time_ms(),
                r.previous_best_time_ms(),
                r.attempts(),
                r.incorrect_attempts(),
            )
            .map(|record| (key, record))
            .map_err(|e| StorageError::Serialization(format!("{key}: {e}")))
        })
        .collect()
}

fn write_atomic(path: &Path, bytes: &[u8]) -> Result<(), StorageError> {
    let tmp_path = path.with_extension("tmp");
    let write = || -> std::io::Result<()> {
        let mut file = fs::File::create(&tmp_path)?;
        file.write_all(bytes)?;
        file.sync_all()?;
        fs::rename(&tmp_path, path)
    };
    write().map_err(|e| StorageError::Unavailable(format!("{}: {e}", path.display())))
}

#[async_trait]
impl PerformanceStore for JsonFileStore {
    async fn get(&self, key: ProblemKey) -> Result<Option<PerformanceRecord>, StorageError> {
        Ok(self.records.lock().await.get(&key).copied())
    }

    async fn update(
        &self,
        key: ProblemKey,
        elapsed_ms: u64,
        correct: bool,
    ) -> Result<UpdatedRecord, StorageError> {
        let mut guard = self.records.lock().await;
        let previous = guard.get(&key).copied();
        let (record, improved) =
            PerformanceRecord::record_attempt_improving(previous, elapsed_ms, correct);
        guard.insert(key, record);

        if let Err(e) = self.save(&guard).await {
            match previous {
                Some(record) => guard.insert(key, record),
                None => guard.remove(&key),
            };
            return Err(e);
        }
        Ok(UpdatedRecord { record, improved })
    }

    async fn get_all(&self) -> Result<HashMap<ProblemKey, PerformanceRecord>, StorageError> {
        Ok(self.records.lock().await.clone())
    }

    async fn reset(&self) -> Result<(), StorageError> {
        let mut guard = self.records.lock().await;
        self.save(&HashMap::new()).await?;
        guard.clear();
        tracing::info!(path = %self.path.display(), "performance records reset");
        Ok(())
    }
}

impl Storage {
    /// Build a `Storage` backed by a JSON file.
    ///
    /// # Errors
    ///
    /// Propagates `JsonFileStore::open` errors.
    pub fn json_file(path: impl Into<PathBuf>) -> Result<Self, StorageError> {
        let performance: Arc<dyn PerformanceStore> = Arc::new(JsonFileStore::open(path)?);
        Ok(Self { performance })
    }
}
