//! Board event broadcasting

use tokio::sync::broadcast;

use crate::events::{BoardEvent, BoardEventType, NoticeLevel};

/// Fans board events out to every subscriber (renderers, the CLI printer)
pub struct EventManager {
    event_tx: broadcast::Sender<BoardEvent>,
}

impl EventManager {
    /// Create a new event manager with a broadcast channel
    pub fn new() -> Self {
        let (event_tx, _) = broadcast::channel(1000);
        Self { event_tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<BoardEvent> {
        self.event_tx.subscribe()
    }

    pub fn emit(&self, event_type: BoardEventType) {
        tracing::debug!("EventManager: Broadcasting {:?}", event_type);
        // No subscribers is not an error
        let _ = self.event_tx.send(BoardEvent::new(event_type));
    }

    /// Show a transient success message
    pub fn notify_success(&self, message: impl Into<String>) {
        let event = BoardEvent::notice(NoticeLevel::Success, message);
        let _ = self.event_tx.send(event);
    }

    /// Show a transient error message
    pub fn notify_error(&self, message: impl Into<String>) {
        let message = message.into();
        tracing::warn!("{}", message);
        let _ = self.event_tx.send(BoardEvent::notice(NoticeLevel::Error, message));
    }
}

impl Default for EventManager {
    fn default() -> Self {
        Self::new()
    }
}
