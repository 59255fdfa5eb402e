use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::editor::DEFAULT_EDITOR_SIZE;
use crate::window::Size;

/// Environment variable overriding the application-data directory
pub const DATA_DIR_ENV: &str = "INOTES_DATA_DIR";

const APP_DIR_NAME: &str = "inotes";

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
#[serde(default)]
pub struct AppConfig {
    pub data_dir: Option<String>,
    pub database: Option<String>,
    /// Use the `-dev` database and log files
    pub dev: bool,
    pub tracking: TrackingConfig,
    pub editor: WindowDefaults,
    pub main: WindowDefaults,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct TrackingConfig {
    pub debounce_ms: u64,
}

impl Default for TrackingConfig {
    fn default() -> Self {
        Self { debounce_ms: 1000 }
    }
}

impl TrackingConfig {
    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }
}

/// Size of a window that has no saved config. Zero means "use the built-in default".
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
#[serde(default)]
pub struct WindowDefaults {
    pub width: u32,
    pub height: u32,
}

impl WindowDefaults {
    pub fn size_or(&self, fallback: Size) -> Size {
        let size = Size::new(self.width, self.height);
        if size.is_positive() { size } else { fallback }
    }
}

impl AppConfig {
    pub fn editor_size(&self) -> Size {
        self.editor.size_or(DEFAULT_EDITOR_SIZE)
    }

    pub fn main_size(&self) -> Size {
        self.main.size_or(DEFAULT_MAIN_SIZE)
    }

    /// Size a window opens at when it has no saved config, for the windows
    /// the app knows about
    pub fn default_size_for(&self, window_id: &str) -> Option<Size> {
        if window_id == MAIN_WINDOW_ID {
            Some(self.main_size())
        } else if crate::uid::note_uid_from_window_id(window_id).is_some() {
            Some(self.editor_size())
        } else {
            None
        }
    }
}

/// Window id of the note list window
pub const MAIN_WINDOW_ID: &str = "main";

/// Size of the main window when nothing is saved
pub const DEFAULT_MAIN_SIZE: Size = Size::new(400, 600);

/// Resolved on-disk locations
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AppPaths {
    pub data_dir: PathBuf,
    pub database: PathBuf,
    pub images: PathBuf,
    pub error_log: PathBuf,
}

impl AppPaths {
    /// Resolve paths from config, environment and platform defaults
    pub fn resolve(config: &AppConfig) -> Self {
        let data_dir = config
            .data_dir
            .as_ref()
            .map(PathBuf::from)
            .or_else(|| std::env::var_os(DATA_DIR_ENV).map(PathBuf::from))
            .or_else(|| dirs::data_dir().map(|d| d.join(APP_DIR_NAME)))
            .unwrap_or_else(|| PathBuf::from(".inotes"));
        Self::in_data_dir(&data_dir, config)
    }

    pub fn in_data_dir(data_dir: &Path, config: &AppConfig) -> Self {
        let suffix = if config.dev { "-dev" } else { "" };
        let resources = data_dir.join("resources");
        let database = config
            .database
            .as_ref()
            .map(PathBuf::from)
            .unwrap_or_else(|| resources.join("db").join(format!("notes{}.db", suffix)));

        Self {
            data_dir: data_dir.to_path_buf(),
            database,
            images: resources.join("images"),
            error_log: resources.join(format!("inotesError{}.log", suffix)),
        }
    }
}

pub fn default_config_path() -> PathBuf {
    PathBuf::from("inotes.toml")
}

pub fn load_config(path: Option<&Path>) -> anyhow::Result<Option<AppConfig>> {
    let path = path.map(Path::to_path_buf).unwrap_or_else(default_config_path);
    if !path.exists() {
        return Ok(None);
    }

    let contents = std::fs::read_to_string(&path)?;
    let config: AppConfig = toml::from_str(&contents)?;
    Ok(Some(config))
}

pub fn write_config(path: &Path, config: &AppConfig, force: bool) -> anyhow::Result<()> {
    if path.exists() && !force {
        anyhow::bail!("config already exists at {} (use --force to overwrite)", path.display());
    }

    let contents = toml::to_string_pretty(config)?;
    std::fs::write(path, contents)?;
    Ok(())
}

pub fn ensure_db_dir(db_path: &Path) -> std::io::Result<()> {
    if let Some(parent) = db_path.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            std::fs::create_dir_all(parent)?;
        }
    }
    Ok(())
}
