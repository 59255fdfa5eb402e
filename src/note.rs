//! Note types
//!
//! A note is addressed two ways:
//! - `id`: database-assigned integer, internal to the store
//! - `uid`: stable string handle used by windows and deep-links

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Default note color
pub const DEFAULT_COLOR: &str = "#ffd54f";

/// A persisted note.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Note {
    /// Database-assigned primary key
    pub id: i64,
    /// Stable external identifier
    pub uid: String,
    pub title: String,
    pub content: String,
    pub markdown: String,
    /// Hex color token, e.g. `#ffd54f`
    pub color: String,
    /// Pinned notes sort first
    pub is_pinned: bool,
    /// Set once at insert
    pub created_at: DateTime<Utc>,
    /// Refreshed on every mutation
    pub updated_at: DateTime<Utc>,
}

/// Payload for creating a note. Omitted optional fields get their defaults
/// at insert time.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NewNote {
    /// Caller-supplied uid; generated when absent
    pub uid: Option<String>,
    pub title: String,
    pub content: String,
    pub markdown: Option<String>,
    pub color: Option<String>,
    pub is_pinned: Option<bool>,
}

impl NewNote {
    /// Create a note payload with just a title
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Self::default()
        }
    }

    pub fn with_uid(mut self, uid: impl Into<String>) -> Self {
        self.uid = Some(uid.into());
        self
    }

    pub fn with_content(mut self, content: impl Into<String>) -> Self {
        self.content = content.into();
        self
    }

    pub fn with_markdown(mut self, markdown: impl Into<String>) -> Self {
        self.markdown = Some(markdown.into());
        self
    }

    pub fn with_color(mut self, color: impl Into<String>) -> Self {
        self.color = Some(color.into());
        self
    }

    pub fn pinned(mut self, is_pinned: bool) -> Self {
        self.is_pinned = Some(is_pinned);
        self
    }
}

/// Partial update of a note.
///
/// `None` means "leave untouched"; `Some(String::new())` clears the field.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NotePatch {
    pub title: Option<String>,
    pub content: Option<String>,
    pub markdown: Option<String>,
    pub color: Option<String>,
    pub is_pinned: Option<bool>,
}

impl NotePatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn content(mut self, content: impl Into<String>) -> Self {
        self.content = Some(content.into());
        self
    }

    pub fn markdown(mut self, markdown: impl Into<String>) -> Self {
        self.markdown = Some(markdown.into());
        self
    }

    pub fn color(mut self, color: impl Into<String>) -> Self {
        self.color = Some(color.into());
        self
    }

    pub fn pinned(mut self, is_pinned: bool) -> Self {
        self.is_pinned = Some(is_pinned);
        self
    }

    /// True when no field is set (an update still refreshes `updated_at`)
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.content.is_none()
            && self.markdown.is_none()
            && self.color.is_none()
            && self.is_pinned.is_none()
    }
}

/// Address of a note: internal id or external uid.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum NoteKey {
    Id(i64),
    Uid(String),
}

impl From<i64> for NoteKey {
    fn from(id: i64) -> Self {
        NoteKey::Id(id)
    }
}

impl From<&str> for NoteKey {
    fn from(uid: &str) -> Self {
        NoteKey::Uid(uid.to_string())
    }
}

impl From<String> for NoteKey {
    fn from(uid: String) -> Self {
        NoteKey::Uid(uid)
    }
}

impl FromStr for NoteKey {
    type Err = std::convert::Infallible;

    /// Integer strings are ids, anything else is a uid
    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.parse::<i64>() {
            Ok(id) => Ok(NoteKey::Id(id)),
            Err(_) => Ok(NoteKey::Uid(s.to_string())),
        }
    }
}

impl NoteKey {
    /// True when `s` would parse as an id rather than a uid.
    ///
    /// Such strings are not accepted as uids, so every uid stays addressable
    /// through `FromStr`.
    pub fn is_id_like(s: &str) -> bool {
        s.parse::<i64>().is_ok()
    }
}

impl std::fmt::Display for NoteKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            NoteKey::Id(id) => write!(f, "#{}", id),
            NoteKey::Uid(uid) => write!(f, "{}", uid),
        }
    }
}
