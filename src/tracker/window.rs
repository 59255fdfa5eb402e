//! Window Manager collaborator interface
//!
//! The host windowing runtime is consumed through these traits. Notifications
//! are delivered over a single-consumer channel owned by a `Subscription`;
//! dropping or calling `unsubscribe` on it deregisters the listener.

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::{mpsc, oneshot};

use crate::Result;
use crate::window::{Position, Size};

/// Notification emitted by a window
#[derive(Debug)]
pub enum WindowEvent {
    Moved,
    Resized,
    /// The window waits for the ack before it finishes closing
    CloseRequested(CloseAck),
}

/// Lets a closing window continue once listeners are done with it.
///
/// Dropping the ack without calling `ack` also releases the window.
#[derive(Debug)]
pub struct CloseAck(oneshot::Sender<()>);

impl CloseAck {
    pub fn new() -> (Self, oneshot::Receiver<()>) {
        let (tx, rx) = oneshot::channel();
        (Self(tx), rx)
    }

    pub fn ack(self) {
        let _ = self.0.send(());
    }
}

/// Live registration for a window's notifications
pub struct Subscription {
    events: mpsc::UnboundedReceiver<WindowEvent>,
    unsubscribe: Option<Box<dyn FnOnce() + Send>>,
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription")
            .field("active", &self.unsubscribe.is_some())
            .finish()
    }
}

impl Subscription {
    /// `on_unsubscribe` runs exactly once, on `unsubscribe` or drop
    pub fn new(
        events: mpsc::UnboundedReceiver<WindowEvent>,
        on_unsubscribe: impl FnOnce() + Send + 'static,
    ) -> Self {
        Self {
            events,
            unsubscribe: Some(Box::new(on_unsubscribe)),
        }
    }

    /// Next notification; `None` once the source has gone away
    pub async fn next(&mut self) -> Option<WindowEvent> {
        self.events.recv().await
    }

    pub fn unsubscribe(mut self) {
        self.deregister();
    }

    fn deregister(&mut self) {
        self.events.close();
        if let Some(callback) = self.unsubscribe.take() {
            callback();
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.deregister();
    }
}

/// A window owned by the host runtime
#[async_trait]
pub trait ManagedWindow: Send + Sync {
    /// Unique label the runtime knows this window by
    fn label(&self) -> &str;

    async fn inner_size(&self) -> Result<Size>;
    async fn inner_position(&self) -> Result<Position>;
    async fn set_size(&self, size: Size) -> Result<()>;
    async fn set_position(&self, position: Position) -> Result<()>;
    async fn show(&self) -> Result<()>;
    async fn set_focus(&self) -> Result<()>;

    /// Register for move/resize/close notifications
    fn subscribe(&self) -> Result<Subscription>;
}

/// Creation options for a new window
#[derive(Debug, Clone, PartialEq)]
pub struct WindowOptions {
    pub title: String,
    /// Route loaded into the window, e.g. `/editor?uid=...`
    pub url: String,
    pub size: Size,
    pub position: Option<Position>,
    pub center: bool,
    pub resizable: bool,
    pub decorations: bool,
    pub transparent: bool,
    pub always_on_top: bool,
    pub skip_taskbar: bool,
}

impl WindowOptions {
    pub fn new(title: impl Into<String>, url: impl Into<String>, size: Size) -> Self {
        Self {
            title: title.into(),
            url: url.into(),
            size,
            position: None,
            center: true,
            resizable: true,
            decorations: true,
            transparent: false,
            always_on_top: false,
            skip_taskbar: false,
        }
    }
}

/// The host runtime's window registry
#[async_trait]
pub trait WindowManager: Send + Sync {
    async fn create_window(&self, label: &str, options: WindowOptions) -> Result<Arc<dyn ManagedWindow>>;

    /// Currently open windows
    async fn windows(&self) -> Result<Vec<Arc<dyn ManagedWindow>>>;

    /// Open window with this label, if any
    async fn find_window(&self, label: &str) -> Result<Option<Arc<dyn ManagedWindow>>> {
        Ok(self.windows().await?.into_iter().find(|w| w.label() == label))
    }
}
