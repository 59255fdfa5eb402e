//! Note editor windows
//!
//! Each note opens in at most one editor window, labelled `editor_<uid>`.
//! The label doubles as the window id its geometry is saved under.

use std::sync::Arc;

use crate::config::AppConfig;
use crate::tracker::{ConfigStore, ManagedWindow, TrackerHandle, WindowConfigTracker, WindowManager, WindowOptions};
use crate::window::Size;
use crate::{Result, uid};

/// Geometry used when an editor window has never been saved
pub const DEFAULT_EDITOR_SIZE: Size = Size::new(290, 320);

/// Route the editor window loads
pub const EDITOR_ROUTE: &str = "/editor";

/// Window options used for new editor windows
#[derive(Debug, Clone, PartialEq)]
pub struct EditorDefaults {
    pub title: String,
    pub size: Size,
    pub resizable: bool,
    pub decorations: bool,
    pub transparent: bool,
    pub always_on_top: bool,
    pub skip_taskbar: bool,
}

impl Default for EditorDefaults {
    fn default() -> Self {
        Self {
            title: "iNotes".to_string(),
            size: DEFAULT_EDITOR_SIZE,
            resizable: true,
            decorations: true,
            transparent: false,
            always_on_top: false,
            skip_taskbar: false,
        }
    }
}

impl EditorDefaults {
    /// Defaults with the editor size from `[editor]` in the config file
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            size: config.editor_size(),
            ..Self::default()
        }
    }
}

/// Result of asking for a note's editor
pub enum EditorLaunch {
    /// A window for the note was already open; it was shown and focused
    Focused(Arc<dyn ManagedWindow>),
    /// A new window was created and its geometry is being tracked
    Created {
        window: Arc<dyn ManagedWindow>,
        tracker: TrackerHandle,
        /// True when saved geometry was used instead of the defaults
        restored: bool,
    },
}

impl EditorLaunch {
    pub fn window(&self) -> &Arc<dyn ManagedWindow> {
        match self {
            EditorLaunch::Focused(window) => window,
            EditorLaunch::Created { window, .. } => window,
        }
    }
}

/// Open (or focus) the editor window for a note.
pub async fn open_editor_window<S: ConfigStore + 'static>(
    manager: &dyn WindowManager,
    tracker: &WindowConfigTracker<S>,
    note_uid: &str,
    defaults: &EditorDefaults,
) -> Result<EditorLaunch> {
    let label = uid::editor_window_id(note_uid);

    match manager.find_window(&label).await {
        Ok(Some(existing)) => {
            tracing::debug!(%label, "Editor window already open, focusing");
            existing.show().await?;
            existing.set_focus().await?;
            return Ok(EditorLaunch::Focused(existing));
        }
        Ok(None) => {}
        Err(e) => tracing::warn!(%label, error = %e, "Failed to enumerate open windows"),
    }

    let saved = match tracker.saved_config(&label).await {
        Ok(saved) => saved,
        Err(e) => {
            tracing::warn!(%label, error = %e, "Failed to load editor window config");
            None
        }
    };

    let mut options = WindowOptions::new(
        defaults.title.clone(),
        format!("{}?uid={}", EDITOR_ROUTE, note_uid),
        saved.as_ref().map(|c| c.size()).unwrap_or(defaults.size),
    );
    options.position = saved.as_ref().and_then(|c| c.position());
    options.center = saved.is_none();
    options.resizable = defaults.resizable;
    options.decorations = defaults.decorations;
    options.transparent = defaults.transparent;
    options.always_on_top = defaults.always_on_top;
    options.skip_taskbar = defaults.skip_taskbar;

    let position = options.position;
    let window = manager.create_window(&label, options).await?;

    // Some platforms ignore the creation-time position
    if let Some(position) = position {
        window.set_position(position).await?;
    }

    let handle = tracker.track(Arc::clone(&window), label.clone())?;
    tracing::info!(%label, restored = saved.is_some(), "Editor window opened");

    Ok(EditorLaunch::Created {
        window,
        tracker: handle,
        restored: saved.is_some(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::{Database, WindowConfigRepository};
    use crate::tracker::fake::FakeWindowManager;
    use crate::window::Position;

    async fn setup() -> (FakeWindowManager, WindowConfigRepository, WindowConfigTracker) {
        let db = Database::in_memory();
        db.initialize().await.unwrap();
        let repo = WindowConfigRepository::new(db);
        let tracker = WindowConfigTracker::new(repo.clone());
        (FakeWindowManager::default(), repo, tracker)
    }

    #[tokio::test]
    async fn test_new_editor_uses_defaults_and_centers() {
        let (manager, _repo, tracker) = setup().await;

        let launch = open_editor_window(&manager, &tracker, "abc", &EditorDefaults::default())
            .await
            .unwrap();
        let EditorLaunch::Created { restored, .. } = &launch else {
            panic!("expected a new window");
        };
        assert!(!restored);
        assert_eq!(launch.window().label(), "editor_abc");

        let created = manager.created();
        let options = created[0].options.clone().unwrap();
        assert_eq!(options.size, DEFAULT_EDITOR_SIZE);
        assert_eq!(options.position, None);
        assert!(options.center);
        assert_eq!(options.url, "/editor?uid=abc");
    }

    #[tokio::test]
    async fn test_configured_editor_size_is_used() {
        let (manager, _repo, tracker) = setup().await;
        let config: AppConfig = toml::from_str("[editor]\nwidth = 330\nheight = 360\n").unwrap();

        open_editor_window(&manager, &tracker, "abc", &EditorDefaults::from_config(&config))
            .await
            .unwrap();

        let window = &manager.created()[0];
        assert_eq!(window.options.clone().unwrap().size, Size::new(330, 360));
        assert_eq!(window.geometry().size, Size::new(330, 360));
    }

    #[tokio::test]
    async fn test_saved_geometry_is_restored() {
        let (manager, repo, tracker) = setup().await;
        repo.save("editor_abc", 500, 400, Some(30), Some(40)).await.unwrap();

        let launch = open_editor_window(&manager, &tracker, "abc", &EditorDefaults::default())
            .await
            .unwrap();
        assert!(matches!(launch, EditorLaunch::Created { restored: true, .. }));

        let window = &manager.created()[0];
        let options = window.options.clone().unwrap();
        assert_eq!(options.size, Size::new(500, 400));
        assert_eq!(options.position, Some(Position::new(30, 40)));
        assert!(!options.center);
        assert_eq!(window.geometry().position, Some(Position::new(30, 40)));
    }

    #[tokio::test]
    async fn test_already_open_editor_is_focused() {
        let (manager, _repo, tracker) = setup().await;
        let defaults = EditorDefaults::default();

        open_editor_window(&manager, &tracker, "abc", &defaults).await.unwrap();
        let second = open_editor_window(&manager, &tracker, "abc", &defaults).await.unwrap();

        assert!(matches!(second, EditorLaunch::Focused(_)));
        let created = manager.created();
        assert_eq!(created.len(), 1);
        assert_eq!(created[0].shown.load(std::sync::atomic::Ordering::SeqCst), 1);
        assert_eq!(created[0].focused.load(std::sync::atomic::Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_editor_geometry_is_saved_on_close() {
        let (manager, repo, tracker) = setup().await;

        let launch = open_editor_window(&manager, &tracker, "abc", &EditorDefaults::default())
            .await
            .unwrap();
        let EditorLaunch::Created { tracker: handle, .. } = launch else {
            panic!("expected a new window");
        };

        let window = manager.created()[0].clone();
        window.resize(Size::new(360, 380));
        window.move_to(Position::new(9, 9));
        window.request_close().await.unwrap();
        handle.join().await;

        let saved = repo.get("editor_abc").await.unwrap().unwrap();
        assert_eq!(saved.size(), Size::new(360, 380));
        assert_eq!(saved.position(), Some(Position::new(9, 9)));
    }
}
