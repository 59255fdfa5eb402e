//! SQLite storage handle
//!
//! `Database` is the process-wide storage service. It is constructed once at
//! startup and cloned into every consumer; the connection behind it is opened
//! and migrated lazily, exactly once, by whichever caller gets there first.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use chrono::{DateTime, Utc};
use rusqlite::types::Value;
use rusqlite::{Connection, Row, params_from_iter};
use tokio::sync::OnceCell;

use super::migrate::{self, MigrationReport};
use crate::{Error, Result};

/// Where the database lives
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DbLocation {
    File(PathBuf),
    /// Private in-memory database (for testing)
    Memory,
}

impl DbLocation {
    pub fn path(&self) -> &Path {
        match self {
            DbLocation::File(path) => path,
            DbLocation::Memory => Path::new(":memory:"),
        }
    }
}

/// Outcome of a non-query statement
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExecOutcome {
    pub rows_affected: usize,
    pub inserted_id: i64,
}

/// Shared, ready-to-use connection. Cheap to clone.
#[derive(Clone)]
pub struct DbHandle {
    conn: Arc<Mutex<Connection>>,
}

impl std::fmt::Debug for DbHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DbHandle").finish_non_exhaustive()
    }
}

impl DbHandle {
    fn new(conn: Connection) -> Self {
        Self {
            conn: Arc::new(Mutex::new(conn)),
        }
    }

    /// Run a closure against the connection on the blocking pool.
    ///
    /// Statements on one handle are serialized by the connection lock.
    pub async fn call<F, T>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&mut Connection) -> Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let conn = Arc::clone(&self.conn);
        tokio::task::spawn_blocking(move || {
            let mut guard = conn
                .lock()
                .map_err(|_| Error::Task("database connection lock poisoned".to_string()))?;
            f(&mut guard)
        })
        .await?
    }

    /// Execute a single statement
    pub async fn execute(&self, sql: impl Into<String>, params: Vec<Value>) -> Result<ExecOutcome> {
        let sql = sql.into();
        self.call(move |conn| {
            tracing::debug!(sql = %sql.trim(), "execute");
            let rows_affected = conn.execute(&sql, params_from_iter(params))?;
            Ok(ExecOutcome {
                rows_affected,
                inserted_id: conn.last_insert_rowid(),
            })
        })
        .await
    }

    /// Run a query and map every row
    pub async fn query<T, F>(&self, sql: impl Into<String>, params: Vec<Value>, map: F) -> Result<Vec<T>>
    where
        F: FnMut(&Row<'_>) -> rusqlite::Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let sql = sql.into();
        self.call(move |conn| {
            tracing::debug!(sql = %sql.trim(), "query");
            let mut stmt = conn.prepare(&sql)?;
            let rows = stmt
                .query_map(params_from_iter(params), map)?
                .collect::<rusqlite::Result<Vec<T>>>()?;
            Ok(rows)
        })
        .await
    }

    /// Run a query expected to return at most one row
    pub async fn query_optional<T, F>(&self, sql: impl Into<String>, params: Vec<Value>, map: F) -> Result<Option<T>>
    where
        F: FnMut(&Row<'_>) -> rusqlite::Result<T> + Send + 'static,
        T: Send + 'static,
    {
        Ok(self.query(sql, params, map).await?.into_iter().next())
    }
}

struct Ready {
    handle: DbHandle,
    report: MigrationReport,
}

struct Inner {
    location: DbLocation,
    ready: OnceCell<Ready>,
    /// `initialize` calls currently running
    in_flight: AtomicUsize,
    init_runs: AtomicUsize,
}

/// Lazily-connected storage service.
///
/// Cloning shares the same underlying connection.
#[derive(Clone)]
pub struct Database {
    inner: Arc<Inner>,
}

impl std::fmt::Debug for Database {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Database")
            .field("location", &self.inner.location)
            .field("ready", &self.is_ready())
            .finish()
    }
}

/// Counts an `initialize` call from before it touches the cell until after
/// the cell is published, including when the future is dropped midway
struct InFlight<'a>(&'a AtomicUsize);

impl<'a> InFlight<'a> {
    fn enter(count: &'a AtomicUsize) -> Self {
        count.fetch_add(1, Ordering::SeqCst);
        Self(count)
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

impl Database {
    /// Describe a database file; nothing is opened until `initialize`
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self::with_location(DbLocation::File(path.into()))
    }

    /// Describe a private in-memory database (for testing)
    pub fn in_memory() -> Self {
        Self::with_location(DbLocation::Memory)
    }

    fn with_location(location: DbLocation) -> Self {
        Self {
            inner: Arc::new(Inner {
                location,
                ready: OnceCell::new(),
                in_flight: AtomicUsize::new(0),
                init_runs: AtomicUsize::new(0),
            }),
        }
    }

    pub fn location(&self) -> &DbLocation {
        &self.inner.location
    }

    pub fn is_ready(&self) -> bool {
        self.inner.ready.initialized()
    }

    /// Connect and migrate, exactly once.
    ///
    /// Concurrent callers wait for the first caller's sequence instead of
    /// starting their own. On failure nothing is published and a later call
    /// may try again. Returns the report of the migration pass that ran.
    pub async fn initialize(&self) -> Result<MigrationReport> {
        if let Some(ready) = self.inner.ready.get() {
            return Ok(ready.report.clone());
        }

        let _in_flight = InFlight::enter(&self.inner.in_flight);
        let ready = self
            .inner
            .ready
            .get_or_try_init(|| self.connect_and_migrate())
            .await?;
        Ok(ready.report.clone())
    }

    /// Ready connection for repository calls.
    ///
    /// Waits for an in-flight initialization; fails with `NotInitialized`
    /// when none has completed and none is running.
    pub async fn handle(&self) -> Result<DbHandle> {
        if let Some(ready) = self.inner.ready.get() {
            return Ok(ready.handle.clone());
        }

        // Zero means no initializer is left that could still publish
        while self.inner.in_flight.load(Ordering::SeqCst) > 0 {
            match self
                .inner
                .ready
                .get_or_try_init(|| async { Err(Error::NotInitialized) })
                .await
            {
                Ok(ready) => return Ok(ready.handle.clone()),
                // Took the cell before the initializer did; let it run
                Err(_) => tokio::task::yield_now().await,
            }
        }
        if let Some(ready) = self.inner.ready.get() {
            return Ok(ready.handle.clone());
        }

        tracing::error!(
            path = %self.inner.location.path().display(),
            "repository call before database initialization"
        );
        Err(Error::NotInitialized)
    }

    async fn connect_and_migrate(&self) -> Result<Ready> {
        self.inner.init_runs.fetch_add(1, Ordering::SeqCst);

        let location = self.inner.location.clone();
        tracing::info!(path = %location.path().display(), "Connecting to database");

        let result = tokio::task::spawn_blocking(move || -> Result<(Connection, MigrationReport)> {
            let conn = open_connection(&location)?;
            let report = migrate::run(&conn)?;
            Ok((conn, report))
        })
        .await
        .map_err(Error::from)
        .and_then(|inner| inner);

        match result {
            Ok((conn, report)) => {
                tracing::info!(%report, "Database ready");
                Ok(Ready {
                    handle: DbHandle::new(conn),
                    report,
                })
            }
            Err(e) => {
                tracing::error!(error = %e, "Database initialization failed");
                Err(e)
            }
        }
    }

    /// Number of connect-and-migrate sequences started so far
    pub fn initialization_runs(&self) -> usize {
        self.inner.init_runs.load(Ordering::SeqCst)
    }
}

fn open_connection(location: &DbLocation) -> Result<Connection> {
    let conn = match location {
        DbLocation::Memory => Connection::open_in_memory(),
        DbLocation::File(path) => {
            crate::config::ensure_db_dir(path).map_err(|e| Error::Connection {
                path: path.clone(),
                source: Box::new(e),
            })?;
            Connection::open(path)
        }
    };

    conn.map_err(|e| Error::Connection {
        path: location.path().to_path_buf(),
        source: Box::new(e),
    })
}

/// Current time as stored in `created_at` / `updated_at`
pub fn now() -> DateTime<Utc> {
    Utc::now()
}

/// Timestamp parameter in the text format rusqlite reads back as `DateTime<Utc>`.
///
/// Fixed-width microseconds keep lexicographic order equal to time order.
pub fn timestamp(at: DateTime<Utc>) -> Value {
    Value::Text(at.format("%Y-%m-%d %H:%M:%S%.6f+00:00").to_string())
}
