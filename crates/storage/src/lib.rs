#![forbid(unsafe_code)]

pub mod json_store;
pub mod repository;
pub mod sqlite;

pub use json_store::JsonFileStore;
pub use repository::{
    InMemoryPerformanceStore, PerformanceStore, Storage, StorageError, UpdatedRecord,
};
pub use sqlite::{SqliteInitError, SqlitePerformanceStore};
