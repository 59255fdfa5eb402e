//! In-process window runtime for tests

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tokio::sync::{mpsc, oneshot};

use super::window::{CloseAck, ManagedWindow, Subscription, WindowEvent, WindowManager, WindowOptions};
use crate::window::{Geometry, Position, Size};
use crate::{Error, Result};

pub struct FakeWindow {
    label: String,
    geometry: Mutex<Geometry>,
    sender: Arc<Mutex<Option<mpsc::UnboundedSender<WindowEvent>>>>,
    pub unsubscribed: Arc<AtomicUsize>,
    pub fail_reads: AtomicBool,
    pub shown: AtomicUsize,
    pub focused: AtomicUsize,
    pub options: Option<WindowOptions>,
}

impl FakeWindow {
    pub fn new(label: &str, size: Size, position: Position) -> Arc<Self> {
        Arc::new(Self::build(label, Geometry::new(size, Some(position)), None))
    }

    fn build(label: &str, geometry: Geometry, options: Option<WindowOptions>) -> Self {
        Self {
            label: label.to_string(),
            geometry: Mutex::new(geometry),
            sender: Arc::new(Mutex::new(None)),
            unsubscribed: Arc::new(AtomicUsize::new(0)),
            fail_reads: AtomicBool::new(false),
            shown: AtomicUsize::new(0),
            focused: AtomicUsize::new(0),
            options,
        }
    }

    pub fn geometry(&self) -> Geometry {
        *self.geometry.lock().unwrap()
    }

    /// Emit an event; false when nobody is listening
    fn emit(&self, event: WindowEvent) -> bool {
        match self.sender.lock().unwrap().as_ref() {
            Some(tx) => tx.send(event).is_ok(),
            None => false,
        }
    }

    /// User drags the window edge
    pub fn resize(&self, size: Size) -> bool {
        self.geometry.lock().unwrap().size = size;
        self.emit(WindowEvent::Resized)
    }

    /// User drags the window
    pub fn move_to(&self, position: Position) -> bool {
        self.geometry.lock().unwrap().position = Some(position);
        self.emit(WindowEvent::Moved)
    }

    /// User clicks close; resolves when the window may finish closing
    pub fn request_close(&self) -> oneshot::Receiver<()> {
        let (ack, rx) = CloseAck::new();
        self.emit(WindowEvent::CloseRequested(ack));
        rx
    }

    pub fn is_subscribed(&self) -> bool {
        self.sender.lock().unwrap().is_some()
    }
}

#[async_trait]
impl ManagedWindow for FakeWindow {
    fn label(&self) -> &str {
        &self.label
    }

    async fn inner_size(&self) -> Result<Size> {
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(Error::TrackingIo("window is gone".to_string()));
        }
        Ok(self.geometry().size)
    }

    async fn inner_position(&self) -> Result<Position> {
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(Error::TrackingIo("window is gone".to_string()));
        }
        Ok(self.geometry().position.unwrap_or(Position::new(0, 0)))
    }

    async fn set_size(&self, size: Size) -> Result<()> {
        self.geometry.lock().unwrap().size = size;
        Ok(())
    }

    async fn set_position(&self, position: Position) -> Result<()> {
        self.geometry.lock().unwrap().position = Some(position);
        Ok(())
    }

    async fn show(&self) -> Result<()> {
        self.shown.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn set_focus(&self) -> Result<()> {
        self.focused.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn subscribe(&self) -> Result<Subscription> {
        let (tx, rx) = mpsc::unbounded_channel();
        *self.sender.lock().unwrap() = Some(tx);

        let sender = Arc::clone(&self.sender);
        let unsubscribed = Arc::clone(&self.unsubscribed);
        Ok(Subscription::new(rx, move || {
            sender.lock().unwrap().take();
            unsubscribed.fetch_add(1, Ordering::SeqCst);
        }))
    }
}

#[derive(Default)]
pub struct FakeWindowManager {
    pub windows: Mutex<Vec<Arc<FakeWindow>>>,
}

impl FakeWindowManager {
    pub fn created(&self) -> Vec<Arc<FakeWindow>> {
        self.windows.lock().unwrap().clone()
    }
}

#[async_trait]
impl WindowManager for FakeWindowManager {
    async fn create_window(&self, label: &str, options: WindowOptions) -> Result<Arc<dyn ManagedWindow>> {
        let geometry = Geometry::new(options.size, options.position);
        let window = Arc::new(FakeWindow::build(label, geometry, Some(options)));
        self.windows.lock().unwrap().push(Arc::clone(&window));
        Ok(window)
    }

    async fn windows(&self) -> Result<Vec<Arc<dyn ManagedWindow>>> {
        Ok(self
            .windows
            .lock()
            .unwrap()
            .iter()
            .map(|w| Arc::clone(w) as Arc<dyn ManagedWindow>)
            .collect())
    }
}
