//! Window-config tracker
//!
//! Persists a window's geometry as the user moves and resizes it. Bursts of
//! notifications are coalesced: every move/resize restarts a debounce timer,
//! and only a timer that runs out saves. A close request cancels the timer,
//! saves once, releases the window and deregisters.
//!
//! ```text
//!   Idle --move/resize--> PendingSave --timer--> Idle
//!   Idle | PendingSave --close--> Closing --saved--> Stopped
//! ```
//!
//! At most one save per window is in flight; saves for different windows
//! interleave freely.

pub mod window;

#[cfg(test)]
pub(crate) mod fake;

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::{Notify, watch};
use tokio::task::JoinHandle;
use tokio::time::Instant;

use crate::config::{AppConfig, MAIN_WINDOW_ID};
use crate::storage::WindowConfigRepository;
use crate::window::{Geometry, Size, WindowConfig};
use crate::{Error, Result};

pub use window::{CloseAck, ManagedWindow, Subscription, WindowEvent, WindowManager, WindowOptions};

/// Quiet period before a burst of geometry changes is saved
pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(1000);

/// Where tracked geometry is loaded from and saved to
#[async_trait]
pub trait ConfigStore: Send + Sync {
    async fn load(&self, window_id: &str) -> Result<Option<WindowConfig>>;
    async fn store(&self, window_id: &str, geometry: Geometry) -> Result<()>;
}

#[async_trait]
impl ConfigStore for WindowConfigRepository {
    async fn load(&self, window_id: &str) -> Result<Option<WindowConfig>> {
        self.get(window_id).await
    }

    async fn store(&self, window_id: &str, geometry: Geometry) -> Result<()> {
        self.save_geometry(window_id, geometry).await
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrackerState {
    Idle,
    PendingSave,
    Closing,
    Stopped,
}

/// What `apply_config` put on the window
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppliedConfig {
    Saved(Geometry),
    Defaults(Size),
}

/// Starts trackers and applies saved geometry to new windows
pub struct WindowConfigTracker<S = WindowConfigRepository> {
    store: Arc<S>,
    debounce: Duration,
}

impl<S> Clone for WindowConfigTracker<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            debounce: self.debounce,
        }
    }
}

impl<S: ConfigStore + 'static> WindowConfigTracker<S> {
    pub fn new(store: S) -> Self {
        Self {
            store: Arc::new(store),
            debounce: DEFAULT_DEBOUNCE,
        }
    }

    /// Tracker using `[tracking] debounce_ms` from the config file
    pub fn from_config(store: S, config: &AppConfig) -> Self {
        Self::new(store).with_debounce(config.tracking.debounce())
    }

    pub fn with_debounce(mut self, debounce: Duration) -> Self {
        self.debounce = debounce;
        self
    }

    pub fn debounce(&self) -> Duration {
        self.debounce
    }

    /// Saved config for a window id
    pub async fn saved_config(&self, window_id: &str) -> Result<Option<WindowConfig>> {
        self.store.load(window_id).await
    }

    /// Apply the saved geometry for `window_id`, or `defaults` when nothing is
    /// saved. A saved position is applied only when both coordinates exist.
    pub async fn apply_config(
        &self,
        window: &dyn ManagedWindow,
        window_id: &str,
        defaults: Size,
    ) -> Result<AppliedConfig> {
        match self.saved_config(window_id).await? {
            Some(config) => {
                let geometry = config.geometry();
                window.set_size(geometry.size).await?;
                if let Some(position) = geometry.position {
                    window.set_position(position).await?;
                }
                tracing::info!(window_id, size = %geometry.size, "Applied saved window config");
                Ok(AppliedConfig::Saved(geometry))
            }
            None => {
                window.set_size(defaults).await?;
                tracing::info!(window_id, size = %defaults, "Applied default window config");
                Ok(AppliedConfig::Defaults(defaults))
            }
        }
    }

    /// Put the main window at its saved geometry, or the configured default
    /// size, and start tracking it.
    pub async fn restore_main_window(
        &self,
        window: Arc<dyn ManagedWindow>,
        config: &AppConfig,
    ) -> Result<(AppliedConfig, TrackerHandle)> {
        let applied = self
            .apply_config(&*window, MAIN_WINDOW_ID, config.main_size())
            .await?;
        let handle = self.track(window, MAIN_WINDOW_ID)?;
        Ok((applied, handle))
    }

    /// Subscribe to `window` and persist its geometry under `window_id` until
    /// it closes or the returned handle is stopped.
    pub fn track(&self, window: Arc<dyn ManagedWindow>, window_id: impl Into<String>) -> Result<TrackerHandle> {
        let window_id = window_id.into();
        let subscription = window.subscribe()?;
        let (state_tx, state_rx) = watch::channel(TrackerState::Idle);
        let stop = Arc::new(Notify::new());

        let run = TrackerRun {
            store: Arc::clone(&self.store),
            window,
            window_id: window_id.clone(),
            debounce: self.debounce,
            state: state_tx,
        };
        let task = tokio::spawn(run.run(subscription, Arc::clone(&stop)));

        tracing::info!(%window_id, "Window config tracking started");
        Ok(TrackerHandle {
            window_id,
            state: state_rx,
            stop,
            task,
        })
    }
}

/// Control over one running tracker.
///
/// Dropping the handle leaves the tracker running until its window closes.
#[derive(Debug)]
pub struct TrackerHandle {
    window_id: String,
    state: watch::Receiver<TrackerState>,
    stop: Arc<Notify>,
    task: JoinHandle<()>,
}

impl TrackerHandle {
    pub fn window_id(&self) -> &str {
        &self.window_id
    }

    pub fn state(&self) -> TrackerState {
        *self.state.borrow()
    }

    /// Cancel any pending save and deregister, without a final save
    pub async fn stop(self) {
        self.stop.notify_one();
        self.join().await;
    }

    /// Wait for the tracker to finish (after its window closes)
    pub async fn join(self) {
        if let Err(e) = self.task.await {
            tracing::error!(window_id = %self.window_id, error = %e, "Tracker task failed");
        }
    }
}

struct TrackerRun<S> {
    store: Arc<S>,
    window: Arc<dyn ManagedWindow>,
    window_id: String,
    debounce: Duration,
    state: watch::Sender<TrackerState>,
}

impl<S: ConfigStore> TrackerRun<S> {
    async fn run(self, mut subscription: Subscription, stop: Arc<Notify>) {
        let mut deadline: Option<Instant> = None;

        loop {
            let pending_until = deadline;
            let timer = async move {
                match pending_until {
                    Some(at) => tokio::time::sleep_until(at).await,
                    None => std::future::pending().await,
                }
            };

            tokio::select! {
                event = subscription.next() => match event {
                    Some(WindowEvent::Moved) | Some(WindowEvent::Resized) => {
                        deadline = Some(Instant::now() + self.debounce);
                        self.set_state(TrackerState::PendingSave);
                    }
                    Some(WindowEvent::CloseRequested(ack)) => {
                        self.set_state(TrackerState::Closing);
                        self.persist().await;
                        ack.ack();
                        break;
                    }
                    None => {
                        tracing::debug!(window_id = %self.window_id, "Notification source closed");
                        break;
                    }
                },
                _ = timer => {
                    deadline = None;
                    self.persist().await;
                    self.set_state(TrackerState::Idle);
                }
                _ = stop.notified() => break,
            }
        }

        subscription.unsubscribe();
        self.set_state(TrackerState::Stopped);
        tracing::info!(window_id = %self.window_id, "Window config tracking stopped");
    }

    fn set_state(&self, state: TrackerState) {
        self.state.send_replace(state);
    }

    /// Read the window's geometry and save it. Failures are logged only.
    async fn persist(&self) {
        let result = async {
            let size = self.window.inner_size().await?;
            let position = self.window.inner_position().await?;
            self.store
                .store(&self.window_id, Geometry::new(size, Some(position)))
                .await
        }
        .await;

        if let Err(e) = result {
            let e = match e {
                Error::TrackingIo(_) => e,
                other => Error::TrackingIo(other.to_string()),
            };
            tracing::warn!(window_id = %self.window_id, error = %e, "Failed to save window config");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::fake::FakeWindow;
    use super::*;
    use crate::storage::Database;
    use crate::window::Position;
    use std::sync::Mutex;
    use std::sync::atomic::Ordering;

    #[derive(Default)]
    struct RecordingStore {
        saved: Mutex<Vec<(String, Geometry, Instant)>>,
        existing: Mutex<Option<WindowConfig>>,
    }

    impl RecordingStore {
        fn saves(&self) -> Vec<(String, Geometry, Instant)> {
            self.saved.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl ConfigStore for Arc<RecordingStore> {
        async fn load(&self, _window_id: &str) -> Result<Option<WindowConfig>> {
            Ok(self.existing.lock().unwrap().clone())
        }

        async fn store(&self, window_id: &str, geometry: Geometry) -> Result<()> {
            self.saved
                .lock()
                .unwrap()
                .push((window_id.to_string(), geometry, Instant::now()));
            Ok(())
        }
    }

    fn setup() -> (Arc<RecordingStore>, WindowConfigTracker<Arc<RecordingStore>>, Arc<FakeWindow>) {
        let store = Arc::new(RecordingStore::default());
        let tracker = WindowConfigTracker::new(Arc::clone(&store));
        let window = FakeWindow::new("editor_abc", Size::new(290, 320), Position::new(100, 100));
        (store, tracker, window)
    }

    fn ms(n: u64) -> Duration {
        Duration::from_millis(n)
    }

    #[tokio::test(start_paused = true)]
    async fn test_burst_is_coalesced_into_one_save() {
        let (store, tracker, window) = setup();
        let _handle = tracker.track(window.clone(), "editor_abc").unwrap();

        window.resize(Size::new(300, 330));
        tokio::time::sleep(ms(100)).await;
        window.resize(Size::new(310, 340));
        tokio::time::sleep(ms(100)).await;
        window.resize(Size::new(320, 350));
        let last_event = Instant::now();

        tokio::time::sleep(ms(900)).await;
        assert!(store.saves().is_empty(), "saved before the quiet period elapsed");

        tokio::time::sleep(ms(200)).await;
        let saves = store.saves();
        assert_eq!(saves.len(), 1);
        assert_eq!(saves[0].0, "editor_abc");
        assert_eq!(saves[0].1.size, Size::new(320, 350));
        assert!(saves[0].2 - last_event >= DEFAULT_DEBOUNCE);
    }

    #[tokio::test(start_paused = true)]
    async fn test_separate_bursts_save_separately() {
        let (store, tracker, window) = setup();
        let handle = tracker.track(window.clone(), "editor_abc").unwrap();

        window.move_to(Position::new(5, 6));
        tokio::time::sleep(ms(1500)).await;
        assert_eq!(handle.state(), TrackerState::Idle);

        window.move_to(Position::new(7, 8));
        tokio::time::sleep(ms(10)).await;
        assert_eq!(handle.state(), TrackerState::PendingSave);
        tokio::time::sleep(ms(1500)).await;

        let saves = store.saves();
        assert_eq!(saves.len(), 2);
        assert_eq!(saves[0].1.position, Some(Position::new(5, 6)));
        assert_eq!(saves[1].1.position, Some(Position::new(7, 8)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_close_flushes_pending_save_once() {
        let (store, tracker, window) = setup();
        let handle = tracker.track(window.clone(), "editor_abc").unwrap();

        window.resize(Size::new(500, 600));
        tokio::time::sleep(ms(100)).await;
        window.move_to(Position::new(40, 50));
        window.request_close().await.unwrap();

        let saves = store.saves();
        assert_eq!(saves.len(), 1);
        assert_eq!(saves[0].1, Geometry::new(Size::new(500, 600), Some(Position::new(40, 50))));

        handle.join().await;
        assert_eq!(window.unsubscribed.load(Ordering::SeqCst), 1);
        assert!(!window.is_subscribed());

        // Nothing reaches the tracker after deregistration
        assert!(!window.resize(Size::new(1, 1)));
        tokio::time::sleep(ms(5000)).await;
        assert_eq!(store.saves().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_close_without_pending_save_still_saves() {
        let (store, tracker, window) = setup();
        let handle = tracker.track(window.clone(), "editor_abc").unwrap();

        window.request_close().await.unwrap();
        assert_eq!(store.saves().len(), 1);
        assert_eq!(store.saves()[0].1.size, Size::new(290, 320));

        handle.join().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_stop_cancels_pending_save() {
        let (store, tracker, window) = setup();
        let handle = tracker.track(window.clone(), "editor_abc").unwrap();

        window.resize(Size::new(800, 900));
        tokio::time::sleep(ms(10)).await;
        handle.stop().await;

        tokio::time::sleep(ms(5000)).await;
        assert!(store.saves().is_empty());
        assert_eq!(window.unsubscribed.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_read_failure_is_swallowed() {
        let (store, tracker, window) = setup();
        let handle = tracker.track(window.clone(), "editor_abc").unwrap();

        window.fail_reads.store(true, Ordering::SeqCst);
        window.resize(Size::new(10, 10));
        tokio::time::sleep(ms(1500)).await;
        assert!(store.saves().is_empty());
        assert_eq!(handle.state(), TrackerState::Idle);

        window.fail_reads.store(false, Ordering::SeqCst);
        window.resize(Size::new(20, 20));
        tokio::time::sleep(ms(1500)).await;
        assert_eq!(store.saves().len(), 1);
        assert_eq!(store.saves()[0].1.size, Size::new(20, 20));
    }

    #[tokio::test(start_paused = true)]
    async fn test_custom_debounce() {
        let (store, tracker, window) = setup();
        let tracker = tracker.with_debounce(ms(250));
        let _handle = tracker.track(window.clone(), "editor_abc").unwrap();

        window.resize(Size::new(300, 300));
        tokio::time::sleep(ms(200)).await;
        assert!(store.saves().is_empty());
        tokio::time::sleep(ms(100)).await;
        assert_eq!(store.saves().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_debounce_comes_from_config() {
        let (store, _, window) = setup();
        let config: AppConfig = toml::from_str("[tracking]\ndebounce_ms = 250\n").unwrap();
        let tracker = WindowConfigTracker::from_config(Arc::clone(&store), &config);
        assert_eq!(tracker.debounce(), ms(250));
        let _handle = tracker.track(window.clone(), "editor_abc").unwrap();

        let started = Instant::now();
        window.resize(Size::new(300, 300));
        tokio::time::sleep(ms(200)).await;
        assert!(store.saves().is_empty());
        tokio::time::sleep(ms(100)).await;

        let saves = store.saves();
        assert_eq!(saves.len(), 1);
        assert!(saves[0].2 - started < DEFAULT_DEBOUNCE);
    }

    #[tokio::test(start_paused = true)]
    async fn test_main_window_opens_at_configured_size() {
        let (store, _, _) = setup();
        let config: AppConfig = toml::from_str("[main]\nwidth = 420\nheight = 640\n").unwrap();
        let tracker = WindowConfigTracker::from_config(Arc::clone(&store), &config);
        let window = FakeWindow::new("main", Size::new(100, 100), Position::new(0, 0));

        let (applied, handle) = tracker.restore_main_window(window.clone(), &config).await.unwrap();
        assert_eq!(applied, AppliedConfig::Defaults(Size::new(420, 640)));
        assert_eq!(window.geometry().size, Size::new(420, 640));
        assert_eq!(handle.window_id(), "main");

        window.request_close().await.unwrap();
        handle.join().await;
        assert_eq!(store.saves()[0].0, "main");
    }

    #[tokio::test(start_paused = true)]
    async fn test_windows_are_tracked_independently() {
        let (store, tracker, first) = setup();
        let second = FakeWindow::new("main", Size::new(400, 600), Position::new(0, 0));
        let _a = tracker.track(first.clone(), "editor_abc").unwrap();
        let _b = tracker.track(second.clone(), "main").unwrap();

        first.resize(Size::new(111, 111));
        tokio::time::sleep(ms(500)).await;
        second.resize(Size::new(222, 222));
        tokio::time::sleep(ms(2000)).await;

        let ids: Vec<String> = store.saves().into_iter().map(|(id, _, _)| id).collect();
        assert_eq!(ids, vec!["editor_abc", "main"]);
    }

    #[tokio::test]
    async fn test_apply_saved_config() {
        let (store, tracker, window) = setup();
        let now = chrono::Utc::now();
        *store.existing.lock().unwrap() = Some(WindowConfig {
            id: 1,
            window_id: "editor_abc".to_string(),
            width: 640,
            height: 480,
            x: Some(12),
            y: Some(34),
            created_at: now,
            updated_at: now,
        });

        let applied = tracker
            .apply_config(window.as_ref(), "editor_abc", Size::new(290, 320))
            .await
            .unwrap();
        let expected = Geometry::new(Size::new(640, 480), Some(Position::new(12, 34)));
        assert_eq!(applied, AppliedConfig::Saved(expected));
        assert_eq!(window.geometry(), expected);
    }

    #[tokio::test]
    async fn test_apply_saved_size_without_position() {
        let (store, tracker, window) = setup();
        let now = chrono::Utc::now();
        *store.existing.lock().unwrap() = Some(WindowConfig {
            id: 1,
            window_id: "editor_abc".to_string(),
            width: 640,
            height: 480,
            x: Some(12),
            y: None,
            created_at: now,
            updated_at: now,
        });

        tracker
            .apply_config(window.as_ref(), "editor_abc", Size::new(290, 320))
            .await
            .unwrap();
        assert_eq!(window.geometry().size, Size::new(640, 480));
        assert_eq!(window.geometry().position, Some(Position::new(100, 100)));
    }

    #[tokio::test]
    async fn test_apply_defaults_when_nothing_saved() {
        let (_store, tracker, window) = setup();
        let applied = tracker
            .apply_config(window.as_ref(), "editor_abc", Size::new(333, 444))
            .await
            .unwrap();
        assert_eq!(applied, AppliedConfig::Defaults(Size::new(333, 444)));
        assert_eq!(window.geometry().size, Size::new(333, 444));
    }

    #[tokio::test]
    async fn test_close_flush_persists_to_database() {
        let db = Database::in_memory();
        db.initialize().await.unwrap();
        let repo = WindowConfigRepository::new(db);
        let tracker = WindowConfigTracker::new(repo.clone());
        let window = FakeWindow::new("main", Size::new(400, 600), Position::new(0, 0));
        let handle = tracker.track(window.clone(), "main").unwrap();

        window.resize(Size::new(420, 620));
        window.move_to(Position::new(15, 25));
        window.request_close().await.unwrap();
        handle.join().await;

        let saved = repo.get("main").await.unwrap().unwrap();
        assert_eq!(saved.size(), Size::new(420, 620));
        assert_eq!(saved.position(), Some(Position::new(15, 25)));
    }
}
