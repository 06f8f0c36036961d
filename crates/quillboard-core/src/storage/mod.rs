//! Storage abstraction for persistence.

mod file;
mod memory;

pub use file::FileStore;
pub use memory::MemoryStore;

use thiserror::Error;

/// Storage errors.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Serialization error: {0}")]
    Serialization(String),
    #[error("IO error: {0}")]
    Io(String),
    #[error("Storage error: {0}")]
    Other(String),
}

/// Result type for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;

/// A string-keyed, string-valued persistence backend.
///
/// This is the durable store the page collection serializes into: one
/// value per key, written synchronously. Implementations can keep values
/// in memory or on the filesystem.
pub trait KeyValueStore: Send + Sync {
    /// Read the value under `key`, or `None` if absent.
    fn get(&self, key: &str) -> StorageResult<Option<String>>;

    /// Write `value` under `key`, replacing any existing value.
    fn set(&mut self, key: &str, value: &str) -> StorageResult<()>;

    /// Remove the value under `key`. Removing an absent key is not an
    /// error.
    fn remove(&mut self, key: &str) -> StorageResult<()>;

    /// List all present keys.
    fn keys(&self) -> StorageResult<Vec<String>>;
}
