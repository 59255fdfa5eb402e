//! Terminal styles. Everything renders plain when stdout is not a color terminal.

use owo_colors::{OwoColorize, Rgb, Style};
use std::sync::OnceLock;

static THEME: OnceLock<Theme> = OnceLock::new();

#[derive(Debug, Clone)]
pub struct Theme {
    colored: bool,
    pub title: Style,
    pub success: Style,
    pub error: Style,
    pub warn: Style,
    pub label: Style,
    pub muted: Style,
    pub pinned: Style,
}

impl Theme {
    /// Colors only on an interactive terminal that allows them (`NO_COLOR` is honoured)
    pub fn detect() -> Self {
        if console::Term::stdout().is_term() && console::colors_enabled() {
            Self::colored()
        } else {
            Self::plain()
        }
    }

    pub fn colored() -> Self {
        Self {
            colored: true,
            title: Style::new().yellow().bold(),
            success: Style::new().green().bold(),
            error: Style::new().red().bold(),
            warn: Style::new().yellow(),
            label: Style::new().white().dimmed(),
            muted: Style::new().bright_black(),
            pinned: Style::new().bright_yellow().bold(),
        }
    }

    pub fn plain() -> Self {
        Self {
            colored: false,
            title: Style::new(),
            success: Style::new(),
            error: Style::new(),
            warn: Style::new(),
            label: Style::new(),
            muted: Style::new(),
            pinned: Style::new(),
        }
    }

    /// `text` in `style`, or unchanged on a plain theme
    pub fn paint(&self, text: &str, style: &Style) -> String {
        if self.colored {
            text.style(style.clone()).to_string()
        } else {
            text.to_string()
        }
    }

    /// A note's color as `■ #rrggbb`, the square painted in that color.
    /// Malformed colors and plain themes print the raw value.
    pub fn swatch(&self, color: &str) -> String {
        match parse_hex(color) {
            Some(rgb) if self.colored => format!("{} {}", "■".color(rgb), color),
            _ => color.to_string(),
        }
    }
}

/// `#rrggbb` to RGB
fn parse_hex(color: &str) -> Option<Rgb> {
    let digits = color.strip_prefix('#')?;
    if digits.len() != 6 || !digits.chars().all(|c| c.is_ascii_hexdigit()) {
        return None;
    }
    let value = u32::from_str_radix(digits, 16).ok()?;
    Some(Rgb((value >> 16) as u8, (value >> 8) as u8, value as u8))
}

pub fn theme() -> &'static Theme {
    THEME.get_or_init(Theme::detect)
}
