//! Process configuration, resolved from `TAGALOG_*` environment variables.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use thiserror::Error;
use tracing::{info, warn};

use crate::audio::{AudioSequencer, MediaBackend, SequencerConfig};
use crate::dirs_compat::app_data_dir;
use crate::storage::{FileStore, KeyValueStore, MemoryStore, UnavailableStore};

pub const STORAGE_ENV: &str = "TAGALOG_STORAGE";
pub const DATA_DIR_ENV: &str = "TAGALOG_DATA_DIR";
pub const CLIP_DELAY_ENV: &str = "TAGALOG_CLIP_DELAY_MS";

const DATABASE_FILE: &str = "study.db";
const TARGET: &str = "config";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("unknown storage backend {0:?}; expected memory, file or sqlite")]
    UnknownBackend(String),
    #[error("{CLIP_DELAY_ENV} must be a whole number of milliseconds, got {0:?}")]
    InvalidDelay(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StorageConfig {
    Memory,
    /// One JSON file per record under this directory.
    File(PathBuf),
    /// SQLite database file.
    Sqlite(PathBuf),
    /// No location could be resolved; every read falls back to defaults.
    Unavailable,
}

impl StorageConfig {
    pub fn open(&self) -> anyhow::Result<Arc<dyn KeyValueStore>> {
        let store: Arc<dyn KeyValueStore> = match self {
            StorageConfig::Memory => Arc::new(MemoryStore::new()),
            StorageConfig::File(dir) => Arc::new(
                FileStore::open(dir.clone())
                    .with_context(|| format!("failed to open record directory {dir:?}"))?,
            ),
            StorageConfig::Sqlite(path) => open_sqlite(path)?,
            StorageConfig::Unavailable => {
                warn!(target: TARGET, "no data directory; study records will not persist");
                Arc::new(UnavailableStore)
            }
        };
        info!(target: TARGET, backend = store.backend_name(), "storage opened");
        Ok(store)
    }
}

#[cfg(feature = "sqlite-storage")]
fn open_sqlite(path: &std::path::Path) -> anyhow::Result<Arc<dyn KeyValueStore>> {
    use crate::storage::{SqliteConfig, SqliteStore};

    if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create data directory {parent:?}"))?;
    }
    Ok(Arc::new(SqliteStore::bootstrap(SqliteConfig::file(path))?))
}

#[cfg(not(feature = "sqlite-storage"))]
fn open_sqlite(path: &std::path::Path) -> anyhow::Result<Arc<dyn KeyValueStore>> {
    anyhow::bail!("cannot open {path:?}: built without the sqlite-storage feature")
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub storage: StorageConfig,
    /// Pacing for hosts that embed playback; the maintenance binary has no
    /// media backend and ignores it.
    pub sequencer: SequencerConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            storage: app_data_dir().map_or(StorageConfig::Unavailable, StorageConfig::File),
            sequencer: SequencerConfig::default(),
        }
    }
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok(), app_data_dir())
    }

    /// Builds the sequencer over a host media backend with the configured
    /// pacing.
    pub fn audio_sequencer(&self, backend: Arc<dyn MediaBackend>) -> AudioSequencer {
        AudioSequencer::with_config(backend, self.sequencer.clone())
    }

    fn from_lookup<F>(lookup: F, default_dir: Option<PathBuf>) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let data_dir = lookup(DATA_DIR_ENV)
            .filter(|dir| !dir.trim().is_empty())
            .map(PathBuf::from)
            .or(default_dir);

        let backend = lookup(STORAGE_ENV).map(|value| value.trim().to_ascii_lowercase());
        let storage = match backend.as_deref() {
            Some("memory") => StorageConfig::Memory,
            None | Some("") | Some("file") => {
                data_dir.map_or(StorageConfig::Unavailable, StorageConfig::File)
            }
            Some("sqlite") => data_dir.map_or(StorageConfig::Unavailable, |dir| {
                StorageConfig::Sqlite(dir.join(DATABASE_FILE))
            }),
            Some(other) => return Err(ConfigError::UnknownBackend(other.to_string())),
        };

        let mut sequencer = SequencerConfig::default();
        if let Some(raw) = lookup(CLIP_DELAY_ENV) {
            let millis = raw
                .trim()
                .parse::<u64>()
                .map_err(|_| ConfigError::InvalidDelay(raw.clone()))?;
            sequencer.inter_clip_delay = Duration::from_millis(millis);
        }

        Ok(Self { storage, sequencer })
    }
}
