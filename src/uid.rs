//! Note uid - stable, externally-referenced identity for every note
//!
//! Generated uids are UUIDv7 strings: a 48-bit millisecond timestamp followed by
//! 74 random bits, rendered in the canonical hyphenated form, e.g.
//! `01890a5d-ac96-774b-bcce-b302099a8057`.
//!
//! With 74 random bits per millisecond, the probability of any collision stays
//! below 1e-9 until roughly 6e6 uids are minted within the *same* millisecond,
//! far beyond what a single desktop process can produce.

use uuid::Uuid;

/// Prefix of the window id used by a note's editor window
pub const EDITOR_WINDOW_PREFIX: &str = "editor_";

/// Generate a new, practically-unique note uid
pub fn generate() -> String {
    Uuid::now_v7().hyphenated().to_string()
}

/// Window id of the editor window that belongs to the note with this uid
pub fn editor_window_id(uid: &str) -> String {
    format!("{}{}", EDITOR_WINDOW_PREFIX, uid)
}

/// Extract the note uid from an editor window id, if it is one
pub fn note_uid_from_window_id(window_id: &str) -> Option<&str> {
    window_id
        .strip_prefix(EDITOR_WINDOW_PREFIX)
        .filter(|uid| !uid.is_empty())
}
