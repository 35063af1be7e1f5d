use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use r2d2::{Pool, PooledConnection};
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::{params, Connection, OpenFlags, OptionalExtension};
use tracing::debug;

use super::{validate_key, KeyValueStore, StorageResult};

const TARGET: &str = "storage::sqlite";

/// Storage location for the SQLite database.
#[derive(Debug, Clone)]
pub enum SqlitePath {
    File(PathBuf),
    Memory,
}

impl SqlitePath {
    fn to_manager(&self) -> SqliteConnectionManager {
        match self {
            SqlitePath::File(path) => {
                SqliteConnectionManager::file(path).with_flags(Self::open_flags())
            }
            SqlitePath::Memory => SqliteConnectionManager::memory().with_flags(Self::open_flags()),
        }
    }

    fn open_flags() -> OpenFlags {
        OpenFlags::SQLITE_OPEN_CREATE
            | OpenFlags::SQLITE_OPEN_READ_WRITE
            | OpenFlags::SQLITE_OPEN_FULL_MUTEX
    }

    fn as_path(&self) -> Option<&Path> {
        match self {
            SqlitePath::File(path) => Some(path.as_path()),
            SqlitePath::Memory => None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct SqliteConfig {
    pub path: SqlitePath,
    pub pool_size: u32,
    pub busy_timeout: Duration,
}

impl SqliteConfig {
    pub fn file<P: Into<PathBuf>>(path: P) -> Self {
        Self {
            path: SqlitePath::File(path.into()),
            pool_size: 4,
            busy_timeout: Duration::from_millis(250),
        }
    }

    pub fn memory() -> Self {
        Self {
            path: SqlitePath::Memory,
            pool_size: 1,
            busy_timeout: Duration::from_millis(250),
        }
    }
}

/// Key-value records kept in a single `kv_store` table.
#[derive(Clone)]
pub struct SqliteStore {
    pool: Pool<SqliteConnectionManager>,
    db_path: Option<PathBuf>,
}

impl std::fmt::Debug for SqliteStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SqliteStore")
            .field("db_path", &self.db_path)
            .finish_non_exhaustive()
    }
}

impl SqliteStore {
    /// Builds the connection pool and runs the schema migration.
    pub fn bootstrap(config: SqliteConfig) -> Result<Self> {
        let busy_timeout = config.busy_timeout;
        let manager = config
            .path
            .to_manager()
            .with_init(move |conn| Self::configure_connection(conn, busy_timeout));

        // Every pooled connection to `:memory:` opens its own database.
        let pool_size = match config.path {
            SqlitePath::Memory => 1,
            SqlitePath::File(_) => config.pool_size.max(1),
        };

        let pool = Pool::builder()
            .max_size(pool_size)
            .connection_timeout(Duration::from_secs(5))
            .build(manager)
            .context("failed to create SQLite connection pool")?;

        {
            let mut conn = pool
                .get()
                .context("failed to acquire SQLite bootstrap connection")?;
            Self::run_migrations(&mut conn)?;
        }

        Ok(Self {
            pool,
            db_path: config.path.as_path().map(Path::to_path_buf),
        })
    }

    fn connection(&self) -> StorageResult<PooledConnection<SqliteConnectionManager>> {
        Ok(self.pool.get()?)
    }

    fn configure_connection(conn: &mut Connection, busy_timeout: Duration) -> rusqlite::Result<()> {
        conn.busy_timeout(busy_timeout)?;
        conn.execute_batch("PRAGMA journal_mode=WAL;")?;
        conn.execute_batch("PRAGMA synchronous=NORMAL;")?;
        Ok(())
    }

    fn run_migrations(conn: &mut Connection) -> Result<()> {
        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS kv_store (
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL,
                updated_at_ms INTEGER NOT NULL
            );
            "#,
        )
        .context("failed to run SQLite migrations")?;
        Ok(())
    }

    pub fn database_path(&self) -> Option<&Path> {
        self.db_path.as_deref()
    }
}

impl KeyValueStore for SqliteStore {
    fn get_item(&self, key: &str) -> StorageResult<Option<String>> {
        validate_key(key)?;
        let conn = self.connection()?;
        let value = conn
            .query_row(
                "SELECT value FROM kv_store WHERE key = ?1",
                params![key],
                |row| row.get::<_, String>(0),
            )
            .optional()?;
        Ok(value)
    }

    fn set_item(&self, key: &str, value: &str) -> StorageResult<()> {
        validate_key(key)?;
        let conn = self.connection()?;
        conn.execute(
            "INSERT INTO kv_store (key, value, updated_at_ms) VALUES (?1, ?2, ?3)
             ON CONFLICT(key) DO UPDATE SET
                value = excluded.value,
                updated_at_ms = excluded.updated_at_ms",
            params![key, value, chrono::Utc::now().timestamp_millis()],
        )?;
        debug!(target: TARGET, key, bytes = value.len(), "record upserted");
        Ok(())
    }

    fn remove_item(&self, key: &str) -> StorageResult<()> {
        validate_key(key)?;
        let conn = self.connection()?;
        conn.execute("DELETE FROM kv_store WHERE key = ?1", params![key])?;
        Ok(())
    }

    fn backend_name(&self) -> &'static str {
        "sqlite"
    }
}

#[cfg(test)]
impl SqliteStore {
    pub(crate) fn run_migrations_for_tests(&self) -> Result<()> {
        let mut conn = self.pool.get()?;
        Self::run_migrations(&mut conn)
    }
}
