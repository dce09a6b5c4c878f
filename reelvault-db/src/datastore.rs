//! Connection pool.
//!
//! Every repository call checks a connection out for its own duration and
//! the [`PooledConnection`] guard hands it back on drop, whichever way the
//! call exits. File databases open connections lazily up to the pool size.
//! An in-memory database only exists inside its one connection, so its pool
//! holds exactly one and never recycles it.

use std::path::{Path, PathBuf};
use std::time::Duration;

use r2d2::Pool;
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::Connection;

use crate::error::OperationError;
use crate::schema::{self, SchemaError};

/// Default number of connections for a file database.
pub const DEFAULT_POOL_SIZE: usize = 4;

const BUSY_TIMEOUT: Duration = Duration::from_secs(5);
const CHECKOUT_TIMEOUT: Duration = Duration::from_secs(30);

/// A checked-out connection. Returned to the pool on drop.
pub type PooledConnection = r2d2::PooledConnection<SqliteConnectionManager>;

/// A pooled SQLite library database. Clones share the pool.
#[derive(Clone)]
pub struct Database {
    pool: Pool<SqliteConnectionManager>,
    path: Option<PathBuf>,
}

impl std::fmt::Debug for Database {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Database")
            .field("path", &self.path)
            .field("size", &self.pool.max_size())
            .finish()
    }
}

impl Database {
    /// Open or create a library database at `path` and bring its schema up
    /// to date.
    pub fn open(path: &Path, pool_size: usize) -> Result<Self, SchemaError> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let manager = SqliteConnectionManager::file(path).with_init(|conn| {
            conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA synchronous=NORMAL;")?;
            init_connection(conn)
        });
        let pool = Pool::builder()
            .max_size(pool_size.max(1) as u32)
            .min_idle(Some(1))
            .connection_timeout(CHECKOUT_TIMEOUT)
            .build(manager)?;

        let found = schema::migrate_to_current(&*pool.get()?)?;
        log::info!(
            "Opened library database {} (schema version {})",
            path.display(),
            found.max(schema::CURRENT_VERSION)
        );
        Ok(Self {
            pool,
            path: Some(path.to_path_buf()),
        })
    }

    /// An empty in-memory library database with the full schema.
    pub fn open_memory() -> Result<Self, SchemaError> {
        let manager = SqliteConnectionManager::memory().with_init(init_connection);
        let pool = Pool::builder()
            .max_size(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connection_timeout(CHECKOUT_TIMEOUT)
            .build(manager)?;

        schema::create_schema(&*pool.get()?)?;
        Ok(Self { pool, path: None })
    }

    /// Path of a file database, `None` in memory.
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn pool_size(&self) -> usize {
        self.pool.max_size() as usize
    }

    /// Check out a connection, waiting for one if the pool is exhausted.
    pub fn connection(&self) -> Result<PooledConnection, OperationError> {
        Ok(self.pool.get()?)
    }

    /// Run `f` on a checked-out connection.
    pub fn with_conn<F, T>(&self, f: F) -> Result<T, OperationError>
    where
        F: FnOnce(&Connection) -> Result<T, OperationError>,
    {
        let conn = self.connection()?;
        f(&conn)
    }

    /// Run `f` inside one transaction, committed only if it succeeds.
    pub fn with_transaction<F, T>(&self, f: F) -> Result<T, OperationError>
    where
        F: FnOnce(&rusqlite::Transaction<'_>) -> Result<T, OperationError>,
    {
        let mut conn = self.connection()?;
        let tx = conn.transaction()?;
        let out = f(&tx)?;
        tx.commit()?;
        Ok(out)
    }
}

/// Per-connection setup shared by file and memory databases.
fn init_connection(conn: &mut Connection) -> Result<(), rusqlite::Error> {
    conn.execute_batch("PRAGMA foreign_keys=ON;")?;
    conn.busy_timeout(BUSY_TIMEOUT)?;
    rusqlite::vtab::array::load_module(conn)
}
