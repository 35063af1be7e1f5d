use thiserror::Error;

/// Faults raised by a [`KeyValueStore`](super::KeyValueStore) backend.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("storage is unavailable in this execution context")]
    Unavailable,
    #[error("storage quota of {limit} bytes exceeded while writing {key}")]
    QuotaExceeded { key: String, limit: usize },
    #[error("invalid storage key: {0:?}")]
    InvalidKey(String),
    #[error("failed to encode or decode record {key}: {source}")]
    Serialization {
        key: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("storage i/o failed: {0}")]
    Io(#[from] std::io::Error),
    #[error("storage lock poisoned")]
    Poisoned,
    #[cfg(feature = "sqlite-storage")]
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),
    #[cfg(feature = "sqlite-storage")]
    #[error("connection pool error: {0}")]
    Pool(#[from] r2d2::Error),
}

impl StorageError {
    pub fn serialization<S: Into<String>>(key: S, source: serde_json::Error) -> Self {
        Self::Serialization {
            key: key.into(),
            source,
        }
    }

    /// Short machine-readable code used in telemetry payloads.
    pub fn code(&self) -> &'static str {
        match self {
            StorageError::Unavailable => "unavailable",
            StorageError::QuotaExceeded { .. } => "quota_exceeded",
            StorageError::InvalidKey(_) => "invalid_key",
            StorageError::Serialization { .. } => "serialization",
            StorageError::Io(_) => "io",
            StorageError::Poisoned => "poisoned",
            #[cfg(feature = "sqlite-storage")]
            StorageError::Database(_) => "database",
            #[cfg(feature = "sqlite-storage")]
            StorageError::Pool(_) => "pool",
        }
    }
}

pub type StorageResult<T> = Result<T, StorageError>;
