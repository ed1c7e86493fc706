//! Storage layer for lrstore.
//!
//! This module provides `SQLite`-based persistent storage for the document
//! collections. A single [`Storage`] handle owns the connection; collection
//! adapters ([`SqliteRecordStore`], [`ItemStore`], [`UserStore`]) borrow it.
//!
//! `rusqlite` is blocking, so every database call is dispatched to tokio's
//! blocking pool through [`Storage::call`].

pub mod items;
pub mod migrations;
pub mod records;
pub mod schema;
pub mod users;

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use rusqlite::Connection;
use tracing::{debug, info};

use crate::error::{Error, Result};

pub use items::ItemStore;
pub use records::{RecordStore, SqliteRecordStore};
pub use users::UserStore;

/// Path reported for in-memory databases.
const IN_MEMORY_PATH: &str = ":memory:";

/// Handle to the lrstore database.
///
/// Cloning the handle is cheap; all clones share one connection.
#[derive(Debug, Clone)]
pub struct Storage {
    /// Path to the database file.
    path: PathBuf,
    /// Database connection.
    conn: Arc<Mutex<Connection>>,
}

impl Storage {
    /// Open or create a storage database at the given path.
    ///
    /// Creates the parent directories and database file if they don't exist.
    /// Initializes the schema if this is a new database.
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be opened or schema initialization fails.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                std::fs::create_dir_all(parent).map_err(|source| Error::DirectoryCreate {
                    path: parent.to_path_buf(),
                    source,
                })?;
            }
        }

        debug!("Opening database at {}", path.display());
        let mut conn = Connection::open(&path).map_err(|source| Error::DatabaseOpen {
            path: path.clone(),
            source,
        })?;

        // WAL keeps readers from blocking the writer
        conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA synchronous=NORMAL;")?;

        migrations::initialize_schema(&mut conn)?;

        info!("Database opened successfully at {}", path.display());
        Ok(Self {
            path,
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Create an in-memory storage instance for testing.
    ///
    /// # Errors
    ///
    /// Returns an error if the in-memory database cannot be created.
    pub fn open_in_memory() -> Result<Self> {
        let mut conn = Connection::open_in_memory().map_err(|source| Error::DatabaseOpen {
            path: PathBuf::from(IN_MEMORY_PATH),
            source,
        })?;

        migrations::initialize_schema(&mut conn)?;

        Ok(Self {
            path: PathBuf::from(IN_MEMORY_PATH),
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Get the path to the database file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Check whether this storage lives only in memory.
    #[must_use]
    pub fn is_in_memory(&self) -> bool {
        self.path.as_os_str() == IN_MEMORY_PATH
    }

    /// Run a closure against the connection on the blocking pool.
    ///
    /// Calls are serialized by the connection mutex; the calling task is
    /// suspended, not blocked, while it waits.
    ///
    /// # Errors
    ///
    /// Returns whatever the closure returns, or [`Error::Internal`] if the
    /// connection lock is poisoned or the blocking task fails.
    pub async fn call<F, T>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&mut Connection) -> Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let conn = Arc::clone(&self.conn);
        tokio::task::spawn_blocking(move || {
            let mut guard = conn
                .lock()
                .map_err(|_| Error::internal("database connection lock poisoned"))?;
            f(&mut *guard)
        })
        .await
        .map_err(|e| Error::internal(format!("database task failed: {e}")))?
    }

    /// Get database statistics.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub async fn stats(&self) -> Result<StorageStats> {
        let db_size_bytes = if self.is_in_memory() {
            0
        } else {
            std::fs::metadata(&self.path).map_or(0, |m| m.len())
        };

        self.call(move |conn| {
            let count = |table: &str| -> Result<i64> {
                Ok(conn.query_row(&format!("SELECT COUNT(*) FROM {table}"), [], |row| {
                    row.get(0)
                })?)
            };

            Ok(StorageStats {
                lr_records: count("lr_records")?,
                items: count("items")?,
                users: count("users")?,
                db_size_bytes,
            })
        })
        .await
    }

    /// Flush the write-ahead log and release the connection's resources.
    ///
    /// Called once by the server after it stops accepting requests. Other
    /// clones of the handle remain usable.
    ///
    /// # Errors
    ///
    /// Returns an error if the checkpoint fails.
    pub async fn close(&self) -> Result<()> {
        if self.is_in_memory() {
            return Ok(());
        }

        let path = self.path.clone();
        self.call(|conn| {
            conn.execute_batch("PRAGMA optimize;")?;
            conn.query_row("PRAGMA wal_checkpoint(TRUNCATE)", [], |_| Ok(()))?;
            Ok(())
        })
        .await?;
        info!("Database closed at {}", path.display());
        Ok(())
    }
}

/// Statistics about the storage.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct StorageStats {
    /// Number of live LR records.
    pub lr_records: i64,
    /// Number of items.
    pub items: i64,
    /// Number of users.
    pub users: i64,
    /// Size of the database file in bytes.
    pub db_size_bytes: u64,
}
