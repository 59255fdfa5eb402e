pub mod icons;
pub mod output;
pub mod table;
pub mod theme;

pub use icons::Icons;
pub use output::{error, header, info, muted, note_deleted, note_heading, section, status, success, summary_row, warn};
pub use table::{note_detail_table, notes_table, window_config_table, TableBuilder};
pub use theme::{theme, Theme};
