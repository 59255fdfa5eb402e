use serde::Serialize;

/// How CLI results are rendered
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputMode {
    Human,
    Json,
}

impl OutputMode {
    pub fn is_human(&self) -> bool {
        matches!(self, OutputMode::Human)
    }
}

#[derive(Serialize)]
struct Envelope<'a, T: Serialize> {
    ok: bool,
    command: &'a str,
    data: T,
}

/// Print a JSON success envelope (no-op in human mode)
pub fn emit_success<T: Serialize>(mode: OutputMode, command: &str, data: T) -> anyhow::Result<()> {
    if mode.is_human() {
        return Ok(());
    }
    let envelope = Envelope { ok: true, command, data };
    println!("{}", serde_json::to_string_pretty(&envelope)?);
    Ok(())
}

/// Print a JSON error envelope to stderr (no-op in human mode)
pub fn emit_error(mode: OutputMode, command: &str, message: &str) {
    if mode.is_human() {
        return;
    }
    let envelope = Envelope {
        ok: false,
        command,
        data: serde_json::json!({ "error": message }),
    };
    if let Ok(text) = serde_json::to_string_pretty(&envelope) {
        eprintln!("{}", text);
    }
}
