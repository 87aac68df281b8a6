//! Storage engine.
//!
//! A [`Database`] owns the one SQLite connection for an installation. Work is
//! handed to it as closures which run on tokio's blocking pool, bounded by a
//! semaphore, and serialized by the connection mutex. Writes run inside a
//! transaction and, once committed, publish a [`Change`] naming the tables they
//! touched so live queries can re-run.

mod books;
mod entities;
mod journal;
mod projects;
pub mod schema;
mod tasks;
mod writing;

pub use books::BookDao;
pub use entities::{
    BookRow, JournalEntryRow, ProjectRow, ProjectTodoRow, TaskCategoryRow, TaskRow, WritingEntryRow,
};
pub use journal::JournalEntryDao;
pub use projects::{ProjectDao, ProjectTodoDao};
pub use tasks::{TaskCategoryDao, TaskDao};
pub use writing::WritingEntryDao;

use once_cell::sync::OnceCell;
use rusqlite::Connection;
use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use thiserror::Error;
use tokio::sync::{OwnedSemaphorePermit, Semaphore, broadcast};
use tracing::{debug, info, trace, warn};

/// Default bound on concurrently running storage jobs
pub const DEFAULT_STORAGE_WORKERS: usize = 4;

const CHANGE_BUFFER: usize = 256;
const IN_MEMORY: &str = ":memory:";

static ENGINE: OnceCell<Database> = OnceCell::new();

#[derive(Debug, Error)]
pub enum DatabaseError {
    #[error("SQLite error: {0}")]
    SqliteError(rusqlite::Error),
    #[error("Failed to create database directory: {0}")]
    DirectoryError(String),
    #[error("Storage unavailable at {path}: {reason}")]
    StorageUnavailable { path: String, reason: String },
    #[error("Constraint violation: {0}")]
    ConstraintViolation(String),
    #[error("Database schema version {found} is newer than supported version {supported}")]
    SchemaTooNew { found: u32, supported: u32 },
    #[error("Storage engine already initialized at {0}")]
    AlreadyInitialized(String),
    #[error("Database lock poisoned")]
    LockPoisoned,
    #[error("Storage worker failed: {0}")]
    Worker(String),
}

impl DatabaseError {
    /// A write referenced a parent row that does not exist
    pub fn is_foreign_key_violation(&self) -> bool {
        matches!(self, DatabaseError::ConstraintViolation(message) if message.contains("FOREIGN KEY"))
    }
}

impl From<rusqlite::Error> for DatabaseError {
    fn from(err: rusqlite::Error) -> Self {
        match &err {
            rusqlite::Error::SqliteFailure(failure, message)
                if failure.code == rusqlite::ErrorCode::ConstraintViolation =>
            {
                DatabaseError::ConstraintViolation(
                    message.clone().unwrap_or_else(|| failure.to_string()),
                )
            }
            _ => DatabaseError::SqliteError(err),
        }
    }
}

/// Tables a write can touch
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Table {
    Tasks,
    TaskCategories,
    Projects,
    ProjectTodos,
    Books,
    JournalEntries,
    WritingEntries,
}

/// Published after every committed write
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Change {
    /// Commit order, starting at 1 for each engine
    pub sequence: u64,
    pub tables: &'static [Table],
}

impl Change {
    pub fn touches(&self, tables: &[Table]) -> bool {
        self.tables.iter().any(|t| tables.contains(t))
    }
}

struct Inner {
    conn: Mutex<Connection>,
    location: String,
    changes: broadcast::Sender<Change>,
    workers: Arc<Semaphore>,
    sequence: AtomicU64,
}

/// Handle to the storage engine. Cloning is cheap and every clone shares the
/// same connection.
#[derive(Clone)]
pub struct Database {
    inner: Arc<Inner>,
}

impl std::fmt::Debug for Database {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Database")
            .field("location", &self.inner.location)
            .finish_non_exhaustive()
    }
}

impl Database {
    /// Open or create the database file and bring its schema up to date
    pub fn new(path: &str) -> Result<Self, DatabaseError> {
        Self::with_workers(path, DEFAULT_STORAGE_WORKERS)
    }

    /// Like [`Database::new`] with an explicit bound on concurrent storage jobs
    pub fn with_workers(path: &str, workers: usize) -> Result<Self, DatabaseError> {
        let db_path = PathBuf::from(path);

        // Create parent directory if it doesn't exist
        if let Some(parent) = db_path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                std::fs::create_dir_all(parent)
                    .map_err(|e| DatabaseError::DirectoryError(e.to_string()))?;
            }
        }

        let conn = Connection::open(&db_path).map_err(|e| unavailable(path, e.into()))?;
        Self::from_connection(conn, path, workers)
    }

    /// Private in-memory database, mostly for tests
    pub fn open_in_memory() -> Result<Self, DatabaseError> {
        let conn = Connection::open_in_memory().map_err(|e| unavailable(IN_MEMORY, e.into()))?;
        Self::from_connection(conn, IN_MEMORY, DEFAULT_STORAGE_WORKERS)
    }

    fn from_connection(mut conn: Connection, location: &str, workers: usize) -> Result<Self, DatabaseError> {
        schema::configure(&conn).map_err(|e| unavailable(location, e))?;
        let found = schema::migrate(&mut conn).map_err(|e| unavailable(location, e))?;
        info!(
            location,
            from_version = found,
            version = schema::SCHEMA_VERSION,
            "storage engine opened"
        );

        let (changes, _) = broadcast::channel(CHANGE_BUFFER);
        Ok(Database {
            inner: Arc::new(Inner {
                conn: Mutex::new(conn),
                location: location.to_string(),
                changes,
                workers: Arc::new(Semaphore::new(workers.max(1))),
                sequence: AtomicU64::new(0),
            }),
        })
    }

    /// Initialize the process-wide engine. Concurrent first calls open the file
    /// once and all receive the same handle. Later calls with the same path
    /// return that handle; a different path is rejected.
    pub fn init(path: &str, workers: usize) -> Result<Database, DatabaseError> {
        let engine = ENGINE.get_or_try_init(|| {
            debug!(path, "initializing process storage engine");
            Database::with_workers(path, workers)
        })?;

        if engine.location() != path {
            warn!(
                requested = path,
                existing = engine.location(),
                "storage engine already initialized elsewhere"
            );
            return Err(DatabaseError::AlreadyInitialized(engine.location().to_string()));
        }
        Ok(engine.clone())
    }

    /// The process-wide engine, if [`Database::init`] has succeeded
    pub fn instance() -> Option<Database> {
        ENGINE.get().cloned()
    }

    /// Path the engine was opened with, or `:memory:`
    pub fn location(&self) -> &str {
        &self.inner.location
    }

    /// Whether two handles refer to the same engine
    pub fn same_engine(&self, other: &Database) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    /// Receive a [`Change`] for every committed write from now on
    pub fn subscribe_changes(&self) -> broadcast::Receiver<Change> {
        self.inner.changes.subscribe()
    }

    pub async fn schema_version(&self) -> Result<u32, DatabaseError> {
        self.read(|conn| schema::user_version(conn)).await
    }

    /// Run a read-only closure against the connection on the storage pool
    pub async fn read<T, E, F>(&self, f: F) -> Result<T, E>
    where
        T: Send + 'static,
        E: From<DatabaseError> + Send + 'static,
        F: FnOnce(&Connection) -> Result<T, E> + Send + 'static,
    {
        let permit = self.acquire().await?;
        let inner = Arc::clone(&self.inner);
        let handle = tokio::task::spawn_blocking(move || -> Result<T, E> {
            let _permit = permit;
            let conn = inner.conn.lock().map_err(|_| DatabaseError::LockPoisoned)?;
            f(&conn)
        });
        match handle.await {
            Ok(result) => result,
            Err(e) => Err(DatabaseError::Worker(e.to_string()).into()),
        }
    }

    /// Run a closure inside a transaction on the storage pool. On success the
    /// transaction commits and a [`Change`] for `tables` is published; on error
    /// it rolls back and nothing is published.
    pub async fn write<T, E, F>(&self, tables: &'static [Table], f: F) -> Result<T, E>
    where
        T: Send + 'static,
        E: From<DatabaseError> + Send + 'static,
        F: FnOnce(&Connection) -> Result<T, E> + Send + 'static,
    {
        let permit = self.acquire().await?;
        let inner = Arc::clone(&self.inner);
        let handle = tokio::task::spawn_blocking(move || -> Result<T, E> {
            let _permit = permit;
            let mut conn = inner.conn.lock().map_err(|_| DatabaseError::LockPoisoned)?;
            let tx = conn.transaction().map_err(DatabaseError::from)?;
            let value = f(&tx)?;
            tx.commit().map_err(DatabaseError::from)?;
            // Published while the lock is held so subscribers see commit order
            inner.publish(tables);
            Ok(value)
        });
        match handle.await {
            Ok(result) => result,
            Err(e) => Err(DatabaseError::Worker(e.to_string()).into()),
        }
    }

    async fn acquire(&self) -> Result<OwnedSemaphorePermit, DatabaseError> {
        Arc::clone(&self.inner.workers)
            .acquire_owned()
            .await
            .map_err(|_| DatabaseError::Worker("storage worker pool closed".to_string()))
    }
}

impl Inner {
    fn publish(&self, tables: &'static [Table]) {
        let sequence = self.sequence.fetch_add(1, Ordering::SeqCst) + 1;
        trace!(sequence, ?tables, "committed");
        // No receivers is fine
        let _ = self.changes.send(Change { sequence, tables });
    }
}

fn unavailable(path: &str, err: DatabaseError) -> DatabaseError {
    DatabaseError::StorageUnavailable {
        path: path.to_string(),
        reason: err.to_string(),
    }
}

/// Schema'd in-memory connection for DAO unit tests
#[cfg(test)]
pub(crate) fn test_connection() -> Connection {
    let mut conn = Connection::open_in_memory().unwrap();
    schema::configure(&conn).unwrap();
    schema::migrate(&mut conn).unwrap();
    conn
}
