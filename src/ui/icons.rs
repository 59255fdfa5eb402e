pub struct Icons;

impl Icons {
    pub const NOTE: &str = "📝";
    pub const CHECK: &str = "✅";
    pub const CROSS: &str = "❌";
    pub const WARN: &str = "⚠️";
    pub const INFO: &str = "ℹ️";
    pub const SEARCH: &str = "🔍";
    pub const PIN: &str = "📌";
    pub const DEL: &str = "🗑️";
    pub const DATABASE: &str = "🗄️";
    pub const WINDOW: &str = "🪟";
    pub const FOLDER: &str = "📂";
}
