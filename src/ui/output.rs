use crate::note::Note;
use crate::ui::{theme, Icons, Theme};

fn line(theme: &Theme, icon: &str, text: &str, style: &owo_colors::Style) -> String {
    format!("{} {}", icon, theme.paint(text, style))
}

pub fn header(text: &str) {
    let t = theme();
    println!("{}", line(t, Icons::NOTE, text, &t.title));
}

pub fn success(text: &str) {
    let t = theme();
    println!("{}", line(t, Icons::CHECK, text, &t.success));
}

pub fn error(text: &str) {
    let t = theme();
    eprintln!("{}", line(t, Icons::CROSS, text, &t.error));
}

pub fn warn(text: &str) {
    let t = theme();
    eprintln!("{}", line(t, Icons::WARN, text, &t.warn));
}

/// `icon label: value`
pub fn status(icon: &str, label: &str, value: &str) {
    let t = theme();
    println!("{} {}: {}", icon, t.paint(label, &t.label), value);
}

pub fn info(label: &str, value: &str) {
    status(Icons::INFO, label, value);
}

pub fn section(title: &str) {
    let t = theme();
    println!();
    println!("━{}━", t.paint(title, &t.title));
}

pub fn muted(text: &str) -> String {
    let t = theme();
    t.paint(text, &t.muted)
}

pub fn summary_row(label: &str, value: &str) {
    let t = theme();
    println!("  {} {}", t.paint(label, &t.label), value);
}

/// Title line of `inotes show`
pub fn note_heading(note: &Note) {
    println!("{}", heading_line(note, theme()));
}

pub fn note_deleted(text: &str) {
    let t = theme();
    println!("{}", line(t, Icons::DEL, text, &t.error));
}

fn heading_line(note: &Note, theme: &Theme) -> String {
    let title = if note.title.is_empty() { "(untitled)" } else { note.title.as_str() };
    let (icon, style) = if note.is_pinned {
        (Icons::PIN, &theme.pinned)
    } else {
        (Icons::NOTE, &theme.title)
    };
    format!("{}  {}", line(theme, icon, title, style), theme.swatch(&note.color))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn note(title: &str, pinned: bool) -> Note {
        Note {
            id: 1,
            uid: "u1".to_string(),
            title: title.to_string(),
            content: String::new(),
            markdown: String::new(),
            color: "#ffd54f".to_string(),
            is_pinned: pinned,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_heading_line() {
        let plain = Theme::plain();
        assert_eq!(
            heading_line(&note("Groceries", true), &plain),
            format!("{} Groceries  #ffd54f", Icons::PIN)
        );
        assert_eq!(
            heading_line(&note("", false), &plain),
            format!("{} (untitled)  #ffd54f", Icons::NOTE)
        );
    }
}
