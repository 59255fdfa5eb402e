//! # iNotes - Sticky-notes persistence core
//!
//! Local persistence layer for a multi-window sticky-notes desktop app.
//!
//! iNotes provides:
//! - A lazily-initialized, exactly-once SQLite storage handle shared by every window
//! - Idempotent, additive schema migration on every boot
//! - Note CRUD + search keyed by numeric id and stable `uid`
//! - Per-window geometry persistence with debounced, flush-on-close tracking

pub mod uid;
pub mod note;
pub mod window;
pub mod storage;
pub mod tracker;
pub mod editor;
pub mod output;
pub mod config;
pub mod ui;

// Re-exports for convenient access
pub use note::{NewNote, Note, NoteKey, NotePatch};
pub use window::{Geometry, Position, Size, WindowConfig};
pub use storage::{Database, NoteRepository, WindowConfigRepository};
pub use tracker::{TrackerHandle, WindowConfigTracker};

use std::path::PathBuf;

/// Result type alias for iNotes operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for iNotes operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Cannot open database at {}: {source}", path.display())]
    Connection {
        path: PathBuf,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("Migration of table '{table}' failed: {source}")]
    Migration {
        table: &'static str,
        #[source]
        source: rusqlite::Error,
    },

    #[error("Database not initialized")]
    NotInitialized,

    #[error("Constraint violation: {0}")]
    Constraint(String),

    #[error("Statement error: {0}")]
    Statement(rusqlite::Error),

    #[error("Window tracking I/O failed: {0}")]
    TrackingIo(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Database task failed: {0}")]
    Task(String),
}

impl From<rusqlite::Error> for Error {
    fn from(err: rusqlite::Error) -> Self {
        match err.sqlite_error_code() {
            Some(rusqlite::ErrorCode::ConstraintViolation) => Error::Constraint(err.to_string()),
            _ => Error::Statement(err),
        }
    }
}

impl From<tokio::task::JoinError> for Error {
    fn from(err: tokio::task::JoinError) -> Self {
        Error::Task(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_constraint_errors_are_classified() {
        let conn = rusqlite::Connection::open_in_memory().unwrap();
        conn.execute("CREATE TABLE t (k TEXT UNIQUE)", []).unwrap();
        conn.execute("INSERT INTO t (k) VALUES ('a')", []).unwrap();

        let err: Error = conn.execute("INSERT INTO t (k) VALUES ('a')", []).unwrap_err().into();
        assert!(matches!(err, Error::Constraint(_)));

        let err: Error = conn.execute("SELEC nonsense", []).unwrap_err().into();
        assert!(matches!(err, Error::Statement(_)));
    }
}
