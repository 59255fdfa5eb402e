//! Schema migrator
//!
//! Runs on every boot, right after the connection opens. Additive only:
//! missing tables are created with their full current schema, missing columns
//! are added one `ALTER TABLE` at a time, and notes without a `uid` get one.
//! Nothing is ever dropped or renamed.

use rusqlite::{Connection, OptionalExtension, params};
use serde::Serialize;

use super::schema::{self, TableSpec};
use crate::{Error, Result, uid};

/// What a migration pass changed
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct MigrationReport {
    pub created_tables: Vec<&'static str>,
    /// `(table, column)` pairs added to existing tables
    pub added_columns: Vec<(&'static str, &'static str)>,
    pub backfilled_uids: usize,
}

impl MigrationReport {
    /// True when the schema was already current
    pub fn is_noop(&self) -> bool {
        self.created_tables.is_empty() && self.added_columns.is_empty() && self.backfilled_uids == 0
    }
}

impl std::fmt::Display for MigrationReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.is_noop() {
            return write!(f, "schema up to date");
        }
        let added: Vec<String> = self
            .added_columns
            .iter()
            .map(|(table, column)| format!("{}.{}", table, column))
            .collect();
        write!(
            f,
            "created [{}], added [{}], backfilled {} uid(s)",
            self.created_tables.join(", "),
            added.join(", "),
            self.backfilled_uids
        )
    }
}

/// Bring every managed table up to the current schema.
///
/// Any failing statement aborts the pass with `Error::Migration`.
pub fn run(conn: &Connection) -> Result<MigrationReport> {
    let mut report = MigrationReport::default();
    for spec in schema::ALL_TABLES {
        migrate_table(conn, spec, &mut report)?;
    }
    Ok(report)
}

fn migrate_table(conn: &Connection, spec: &TableSpec, report: &mut MigrationReport) -> Result<()> {
    let fail = |source| Error::Migration { table: spec.name, source };

    if !table_exists(conn, spec.name).map_err(fail)? {
        conn.execute(spec.create, []).map_err(fail)?;
        tracing::info!(table = spec.name, "Created table");
        report.created_tables.push(spec.name);
    } else {
        let existing = table_columns(conn, spec.name).map_err(fail)?;
        for column in spec.columns {
            if existing.iter().any(|c| c.eq_ignore_ascii_case(column.name)) {
                continue;
            }
            let sql = format!("ALTER TABLE {} ADD COLUMN {}", spec.name, column.add_definition);
            conn.execute(&sql, []).map_err(fail)?;
            tracing::info!(table = spec.name, column = column.name, "Added column");
            report.added_columns.push((spec.name, column.name));
        }
    }

    // Rows left without a uid by an interrupted earlier pass are picked up here too
    if spec.name == schema::NOTES.name {
        report.backfilled_uids += backfill_note_uids(conn).map_err(fail)?;
    }

    for statement in spec.ensure {
        conn.execute(statement, []).map_err(fail)?;
    }

    Ok(())
}

/// Check the system catalog for a table
pub fn table_exists(conn: &Connection, table: &str) -> rusqlite::Result<bool> {
    conn.query_row(
        "SELECT name FROM sqlite_master WHERE type = 'table' AND name = ?1",
        [table],
        |row| row.get::<_, String>(0),
    )
    .optional()
    .map(|name| name.is_some())
}

/// Column names of a table, in declaration order
pub fn table_columns(conn: &Connection, table: &str) -> rusqlite::Result<Vec<String>> {
    let mut stmt = conn.prepare(&format!("PRAGMA table_info({})", table))?;
    let columns = stmt
        .query_map([], |row| row.get::<_, String>(1))?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(columns)
}

/// Give every note lacking a uid a fresh one, one row at a time
fn backfill_note_uids(conn: &Connection) -> rusqlite::Result<usize> {
    let mut stmt = conn.prepare("SELECT id FROM notes WHERE uid IS NULL OR uid = ''")?;
    let ids = stmt
        .query_map([], |row| row.get::<_, i64>(0))?
        .collect::<rusqlite::Result<Vec<_>>>()?;

    for id in &ids {
        conn.execute("UPDATE notes SET uid = ?1 WHERE id = ?2", params![uid::generate(), id])?;
    }

    if !ids.is_empty() {
        tracing::info!(count = ids.len(), "Backfilled note uids");
    }
    Ok(ids.len())
}
