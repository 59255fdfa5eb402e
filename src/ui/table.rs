use tabled::{settings::Style, Table, Tabled};

use crate::note::Note;
use crate::window::WindowConfig;

#[derive(Tabled)]
pub struct NoteRow {
    #[tabled(rename = "Id")]
    pub id: i64,
    #[tabled(rename = "Pin")]
    pub pinned: String,
    #[tabled(rename = "Title")]
    pub title: String,
    #[tabled(rename = "Preview")]
    pub preview: String,
    #[tabled(rename = "Updated")]
    pub updated: String,
    #[tabled(rename = "Uid")]
    pub uid: String,
}

impl From<&Note> for NoteRow {
    fn from(note: &Note) -> Self {
        Self {
            id: note.id,
            pinned: if note.is_pinned { "*".to_string() } else { String::new() },
            title: note.title.clone(),
            preview: preview(&note.content, 40),
            updated: note.updated_at.format("%Y-%m-%d %H:%M").to_string(),
            uid: note.uid.clone(),
        }
    }
}

#[derive(Tabled)]
pub struct TableRow {
    #[tabled(rename = "Field")]
    pub field: String,
    #[tabled(rename = "Value")]
    pub value: String,
}

pub struct TableBuilder {
    rows: Vec<TableRow>,
}

impl TableBuilder {
    pub fn new() -> Self {
        Self { rows: Vec::new() }
    }

    pub fn add_row(&mut self, label: &str, value: &str) {
        self.rows.push(TableRow {
            field: label.to_string(),
            value: value.to_string(),
        });
    }

    pub fn build(&self) -> String {
        if self.rows.is_empty() {
            return String::new();
        }

        Table::new(&self.rows).with(Style::rounded()).to_string()
    }
}

impl Default for TableBuilder {
    fn default() -> Self {
        Self::new()
    }
}

pub fn notes_table(notes: &[Note]) -> String {
    if notes.is_empty() {
        return String::new();
    }
    let rows: Vec<NoteRow> = notes.iter().map(NoteRow::from).collect();
    Table::new(rows).with(Style::rounded()).to_string()
}

pub fn note_detail_table(note: &Note) -> String {
    let mut builder = TableBuilder::new();
    builder.add_row("id", &note.id.to_string());
    builder.add_row("uid", &note.uid);
    builder.add_row("title", &note.title);
    builder.add_row("color", &note.color);
    builder.add_row("pinned", &note.is_pinned.to_string());
    builder.add_row("created", &note.created_at.to_rfc3339());
    builder.add_row("updated", &note.updated_at.to_rfc3339());
    builder.build()
}

pub fn window_config_table(config: &WindowConfig) -> String {
    let mut builder = TableBuilder::new();
    builder.add_row("window", &config.window_id);
    builder.add_row("size", &config.size().to_string());
    let position = config
        .position()
        .map(|p| p.to_string())
        .unwrap_or_else(|| "platform default".to_string());
    builder.add_row("position", &position);
    builder.add_row("updated", &config.updated_at.to_rfc3339());
    builder.build()
}

/// First line of `text`, cut to `max` characters
fn preview(text: &str, max: usize) -> String {
    let line = text.lines().next().unwrap_or("");
    if line.chars().count() <= max {
        return line.to_string();
    }
    let cut: String = line.chars().take(max.saturating_sub(1)).collect();
    format!("{}…", cut)
}
