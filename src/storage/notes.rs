//! Note repository
//!
//! CRUD + search over the `notes` table. Every listing uses the same order:
//! pinned first, then most recently updated.

use rusqlite::Row;
use rusqlite::types::Value;

use super::schema::{NOTE_COLUMNS, NOTE_ORDER};
use super::sqlite::{self, Database};
use super::window_configs::WindowConfigRepository;
use crate::note::{DEFAULT_COLOR, NewNote, Note, NoteKey, NotePatch};
use crate::{Error, Result, uid};

/// Stateless view over the `notes` table
#[derive(Debug, Clone)]
pub struct NoteRepository {
    db: Database,
    windows: WindowConfigRepository,
}

impl NoteRepository {
    pub fn new(db: Database) -> Self {
        Self {
            windows: WindowConfigRepository::new(db.clone()),
            db,
        }
    }

    /// Insert a note, applying defaults for omitted fields. Returns the new id.
    ///
    /// A caller-supplied uid that already exists fails with `Error::Constraint`.
    pub async fn create(&self, note: NewNote) -> Result<i64> {
        let uid = match note.uid {
            Some(uid) if uid.trim().is_empty() => {
                return Err(Error::InvalidInput("note uid must not be empty".to_string()));
            }
            Some(uid) if NoteKey::is_id_like(&uid) => {
                return Err(Error::InvalidInput(format!("note uid '{}' would be read as an id", uid)));
            }
            Some(uid) => uid,
            None => uid::generate(),
        };

        let handle = self.db.handle().await?;
        let now = sqlite::timestamp(sqlite::now());
        let outcome = handle
            .execute(
                r#"
                INSERT INTO notes (uid, title, content, markdown, color, is_pinned, created_at, updated_at)
                VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
                "#,
                vec![
                    Value::from(uid.clone()),
                    Value::from(note.title),
                    Value::from(note.content),
                    Value::from(note.markdown.unwrap_or_default()),
                    Value::from(note.color.unwrap_or_else(|| DEFAULT_COLOR.to_string())),
                    Value::from(note.is_pinned.unwrap_or(false)),
                    now.clone(),
                    now,
                ],
            )
            .await?;

        tracing::debug!(id = outcome.inserted_id, %uid, "Note created");
        Ok(outcome.inserted_id)
    }

    pub async fn get_by_id(&self, id: i64) -> Result<Option<Note>> {
        self.get(NoteKey::Id(id)).await
    }

    pub async fn get_by_uid(&self, uid: &str) -> Result<Option<Note>> {
        self.get(NoteKey::Uid(uid.to_string())).await
    }

    /// Point lookup by id or uid
    pub async fn get(&self, key: impl Into<NoteKey>) -> Result<Option<Note>> {
        let (clause, param) = key_clause(key.into());
        let handle = self.db.handle().await?;
        handle
            .query_optional(
                format!("SELECT {} FROM notes WHERE {}", NOTE_COLUMNS, clause),
                vec![param],
                row_to_note,
            )
            .await
    }

    /// All notes, pinned first, then by `updated_at` descending
    pub async fn list(&self) -> Result<Vec<Note>> {
        let handle = self.db.handle().await?;
        handle
            .query(format!("SELECT {} FROM notes {}", NOTE_COLUMNS, NOTE_ORDER), vec![], row_to_note)
            .await
    }

    pub async fn count(&self) -> Result<usize> {
        let handle = self.db.handle().await?;
        let counts: Vec<i64> = handle
            .query("SELECT COUNT(*) FROM notes", vec![], |row| row.get(0))
            .await?;
        Ok(counts.first().copied().unwrap_or(0) as usize)
    }

    /// Apply the fields present in `patch`; `updated_at` is always refreshed.
    /// Returns whether the note exists.
    pub async fn update(&self, key: impl Into<NoteKey>, patch: NotePatch) -> Result<bool> {
        let mut sets: Vec<&str> = Vec::new();
        let mut params: Vec<Value> = Vec::new();

        if let Some(title) = patch.title {
            sets.push("title = ?");
            params.push(Value::from(title));
        }
        if let Some(content) = patch.content {
            sets.push("content = ?");
            params.push(Value::from(content));
        }
        if let Some(markdown) = patch.markdown {
            sets.push("markdown = ?");
            params.push(Value::from(markdown));
        }
        if let Some(color) = patch.color {
            sets.push("color = ?");
            params.push(Value::from(color));
        }
        if let Some(is_pinned) = patch.is_pinned {
            sets.push("is_pinned = ?");
            params.push(Value::from(is_pinned));
        }
        sets.push("updated_at = ?");
        params.push(sqlite::timestamp(sqlite::now()));

        let key = key.into();
        let (clause, key_param) = key_clause(key.clone());
        params.push(key_param);

        let handle = self.db.handle().await?;
        let outcome = handle
            .execute(format!("UPDATE notes SET {} WHERE {}", sets.join(", "), clause), params)
            .await?;

        tracing::debug!(%key, rows = outcome.rows_affected, "Note updated");
        Ok(outcome.rows_affected > 0)
    }

    /// Delete a note and, best-effort, its editor window config.
    ///
    /// A failing config cleanup is logged and does not fail the deletion.
    /// Returns whether a note row was removed.
    pub async fn delete(&self, key: impl Into<NoteKey>) -> Result<bool> {
        let handle = self.db.handle().await?;

        let uid = match key.into() {
            NoteKey::Uid(uid) => uid,
            NoteKey::Id(id) => {
                let uid: Option<String> = handle
                    .query_optional("SELECT uid FROM notes WHERE id = ?1", vec![Value::from(id)], |row| {
                        row.get(0)
                    })
                    .await?;
                match uid {
                    Some(uid) => uid,
                    None => return Ok(false),
                }
            }
        };

        let outcome = handle
            .execute("DELETE FROM notes WHERE uid = ?1", vec![Value::from(uid.clone())])
            .await?;

        let window_id = uid::editor_window_id(&uid);
        if let Err(e) = self.windows.delete(&window_id).await {
            tracing::warn!(%window_id, error = %e, "Failed to remove editor window config");
        }

        tracing::debug!(%uid, removed = outcome.rows_affected, "Note deleted");
        Ok(outcome.rows_affected > 0)
    }

    /// Notes whose title or content contains `keyword`, in list order.
    ///
    /// Matching is case-insensitive for ASCII letters; `%`, `_` and `\` in
    /// the keyword match literally.
    pub async fn search(&self, keyword: &str) -> Result<Vec<Note>> {
        let pattern = Value::from(like_pattern(keyword));
        let handle = self.db.handle().await?;
        handle
            .query(
                format!(
                    r"SELECT {} FROM notes WHERE title LIKE ?1 ESCAPE '\' OR content LIKE ?1 ESCAPE '\' {}",
                    NOTE_COLUMNS, NOTE_ORDER
                ),
                vec![pattern],
                row_to_note,
            )
            .await
    }
}

fn key_clause(key: NoteKey) -> (&'static str, Value) {
    match key {
        NoteKey::Id(id) => ("id = ?", Value::from(id)),
        NoteKey::Uid(uid) => ("uid = ?", Value::from(uid)),
    }
}

fn like_pattern(keyword: &str) -> String {
    let mut escaped = String::with_capacity(keyword.len() + 2);
    escaped.push('%');
    for ch in keyword.chars() {
        if matches!(ch, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(ch);
    }
    escaped.push('%');
    escaped
}

fn row_to_note(row: &Row<'_>) -> rusqlite::Result<Note> {
    let color: Option<String> = row.get(5)?;
    let is_pinned: Option<bool> = row.get(6)?;
    Ok(Note {
        id: row.get(0)?,
        uid: row.get(1)?,
        title: row.get(2)?,
        content: row.get(3)?,
        markdown: row.get(4)?,
        color: color.unwrap_or_else(|| DEFAULT_COLOR.to_string()),
        is_pinned: is_pinned.unwrap_or(false),
        created_at: row.get(7)?,
        updated_at: row.get(8)?,
    })
}
