//! Database schema definitions
//!
//! Each table is described twice: the full `CREATE TABLE` used on a fresh
//! database, and the list of columns the current schema requires, which the
//! migrator compares against `PRAGMA table_info` on existing databases.

/// SQL to create the notes table
pub const CREATE_NOTES_TABLE: &str = r#"
CREATE TABLE notes (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    uid TEXT NOT NULL UNIQUE,
    title TEXT NOT NULL DEFAULT '',
    content TEXT NOT NULL DEFAULT '',
    markdown TEXT NOT NULL DEFAULT '',
    color TEXT DEFAULT '#ffd54f',
    is_pinned BOOLEAN DEFAULT FALSE,
    created_at DATETIME DEFAULT CURRENT_TIMESTAMP,
    updated_at DATETIME DEFAULT CURRENT_TIMESTAMP
)
"#;

/// SQL to create the window_configs table
pub const CREATE_WINDOW_CONFIGS_TABLE: &str = r#"
CREATE TABLE window_configs (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    window_id TEXT UNIQUE,
    width INTEGER NOT NULL DEFAULT 400,
    height INTEGER NOT NULL DEFAULT 600,
    x INTEGER,
    y INTEGER,
    created_at DATETIME DEFAULT CURRENT_TIMESTAMP,
    updated_at DATETIME DEFAULT CURRENT_TIMESTAMP
)
"#;

/// A column that must exist in the current schema.
///
/// `add_definition` is what `ALTER TABLE .. ADD COLUMN` receives. SQLite
/// cannot add a `UNIQUE` column, or a `NOT NULL` one without a default, so on
/// migrated tables those rules come from the table's `ensure` statements
/// (a unique index and guard triggers) once the column has been backfilled.
#[derive(Debug, Clone, Copy)]
pub struct RequiredColumn {
    pub name: &'static str,
    pub add_definition: &'static str,
}

/// A table managed by the migrator
#[derive(Debug, Clone, Copy)]
pub struct TableSpec {
    pub name: &'static str,
    pub create: &'static str,
    pub columns: &'static [RequiredColumn],
    /// Idempotent statements run on every pass, after columns and backfill
    pub ensure: &'static [&'static str],
}

/// Columns added to `notes` over the schema's history
pub const NOTES_COLUMNS: &[RequiredColumn] = &[
    RequiredColumn { name: "uid", add_definition: "uid TEXT" },
    RequiredColumn { name: "markdown", add_definition: "markdown TEXT NOT NULL DEFAULT ''" },
];

/// `window_configs` has had no additive changes yet
pub const WINDOW_CONFIGS_COLUMNS: &[RequiredColumn] = &[];

/// `uid` is NOT NULL on fresh tables only; the triggers hold migrated ones
/// to the same rule.
pub const NOTES_ENSURE: &[&str] = &[
    "CREATE UNIQUE INDEX IF NOT EXISTS idx_notes_uid ON notes(uid)",
    "CREATE INDEX IF NOT EXISTS idx_notes_order ON notes(is_pinned, updated_at)",
    r#"CREATE TRIGGER IF NOT EXISTS trg_notes_uid_insert
    BEFORE INSERT ON notes WHEN NEW.uid IS NULL OR NEW.uid = ''
    BEGIN SELECT RAISE(ABORT, 'notes.uid must not be empty'); END"#,
    r#"CREATE TRIGGER IF NOT EXISTS trg_notes_uid_update
    BEFORE UPDATE OF uid ON notes WHEN NEW.uid IS NULL OR NEW.uid = ''
    BEGIN SELECT RAISE(ABORT, 'notes.uid must not be empty'); END"#,
];

pub const WINDOW_CONFIGS_ENSURE: &[&str] = &[];

pub const NOTES: TableSpec = TableSpec {
    name: "notes",
    create: CREATE_NOTES_TABLE,
    columns: NOTES_COLUMNS,
    ensure: NOTES_ENSURE,
};

pub const WINDOW_CONFIGS: TableSpec = TableSpec {
    name: "window_configs",
    create: CREATE_WINDOW_CONFIGS_TABLE,
    columns: WINDOW_CONFIGS_COLUMNS,
    ensure: WINDOW_CONFIGS_ENSURE,
};

/// All managed tables, in migration order
pub const ALL_TABLES: &[TableSpec] = &[NOTES, WINDOW_CONFIGS];

/// Column list used by every note SELECT
pub const NOTE_COLUMNS: &str =
    "id, uid, title, content, markdown, color, is_pinned, created_at, updated_at";

/// Column list used by every window config SELECT
pub const WINDOW_CONFIG_COLUMNS: &str = "id, window_id, width, height, x, y, created_at, updated_at";

/// Ordering contract of note listings: pinned first, then most recently updated
pub const NOTE_ORDER: &str = "ORDER BY is_pinned DESC, updated_at DESC, id DESC";
