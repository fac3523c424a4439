use tokio::sync::broadcast;
use tracing::trace;

use crate::dto::sse::ServerEvent;

/// Fan-out point for the public event stream.
///
/// Slow subscribers lag and skip events once `capacity` is exceeded.
pub struct SseHub {
    sender: broadcast::Sender<ServerEvent>,
}

impl SseHub {
    /// Hub buffering at most `capacity` events per subscriber.
    pub fn new(capacity: usize) -> Self {
        let (sender, _receiver) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Receive every event published from now on.
    pub fn subscribe(&self) -> broadcast::Receiver<ServerEvent> {
        self.sender.subscribe()
    }

    /// Publish `event`; nobody listening is not an error.
    pub fn broadcast(&self, event: ServerEvent) {
        let name = event.event.clone().unwrap_or_else(|| "message".into());
        match self.sender.send(event) {
            Ok(delivered) => trace!(event = %name, delivered, "sse event published"),
            Err(_) => trace!(event = %name, "sse event dropped, no subscribers"),
        }
    }

    /// Number of connected subscribers.
    pub fn receiver_count(&self) -> usize {
        self.sender.receiver_count()
    }
}
