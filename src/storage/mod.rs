//! Storage Layer - SQLite-backed persistence
//!
//! One database file with two tables:
//! - notes(id, uid, title, content, markdown, color, is_pinned, created_at, updated_at)
//! - window_configs(id, window_id, width, height, x, y, created_at, updated_at)

pub mod schema;
pub mod sqlite;
pub mod migrate;
pub mod notes;
pub mod window_configs;

pub use sqlite::{Database, DbHandle, DbLocation, ExecOutcome};
pub use migrate::MigrationReport;
pub use notes::NoteRepository;
pub use window_configs::WindowConfigRepository;
