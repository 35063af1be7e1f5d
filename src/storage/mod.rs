//! Key-value storage backends for persisted study records.
//!
//! Every backend stores opaque string values under string keys, mirroring the
//! origin-scoped storage a browser offers. Records are serialized by the
//! caller; backends never look inside a value.

mod error;
mod file;
mod memory;
#[cfg(feature = "sqlite-storage")]
pub mod sqlite;

pub use error::{StorageError, StorageResult};
pub use file::FileStore;
pub use memory::{MemoryStore, UnavailableStore};
#[cfg(feature = "sqlite-storage")]
pub use sqlite::{SqliteConfig, SqlitePath, SqliteStore};

/// Synchronous string key-value store.
pub trait KeyValueStore: Send + Sync {
    /// Returns `Ok(None)` when nothing is stored under `key`.
    fn get_item(&self, key: &str) -> StorageResult<Option<String>>;

    fn set_item(&self, key: &str, value: &str) -> StorageResult<()>;

    /// Removing a missing key is not an error.
    fn remove_item(&self, key: &str) -> StorageResult<()>;

    fn backend_name(&self) -> &'static str;
}

/// Keys are restricted to `[A-Za-z0-9_-]` so every backend can map them to
/// file names or table rows without escaping.
pub(crate) fn validate_key(key: &str) -> StorageResult<()> {
    let valid = !key.is_empty()
        && key
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
    if valid {
        Ok(())
    } else {
        Err(StorageError::InvalidKey(key.to_string()))
    }
}
