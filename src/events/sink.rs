//! Event sinks: where spawn events go once published

use parking_lot::Mutex;
use tokio::sync::mpsc;

use crate::events::types::SpawnEvent;

/// Fire-and-forget destination for spawn events
pub trait EventSink: Send + Sync {
    fn publish(&self, event: SpawnEvent);
}

/// Discards everything
#[derive(Debug, Default, Clone, Copy)]
pub struct NullSink;

impl EventSink for NullSink {
    fn publish(&self, _event: SpawnEvent) {}
}

/// Mirrors events into the tracing log at debug level
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl EventSink for TracingSink {
    fn publish(&self, event: SpawnEvent) {
        tracing::debug!(
            topic = event.topic(),
            operation = %event.operation_id(),
            event = ?event,
            "Spawn event"
        );
    }
}

/// Forwards events over an unbounded tokio channel
pub struct ChannelSink {
    sender: mpsc::UnboundedSender<SpawnEvent>,
}

impl ChannelSink {
    pub fn new(sender: mpsc::UnboundedSender<SpawnEvent>) -> Self {
        Self { sender }
    }

    /// Sink plus the receiving end
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<SpawnEvent>) {
        let (sender, receiver) = mpsc::unbounded_channel();
        (Self::new(sender), receiver)
    }
}

impl EventSink for ChannelSink {
    fn publish(&self, event: SpawnEvent) {
        if self.sender.send(event).is_err() {
            tracing::trace!("Event receiver dropped, discarding spawn event");
        }
    }
}

/// Keeps every event in memory; used to inspect operations after the fact
#[derive(Debug, Default)]
pub struct MemorySink {
    events: Mutex<Vec<SpawnEvent>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<SpawnEvent> {
        self.events.lock().clone()
    }

    /// Events whose topic matches exactly
    pub fn with_topic(&self, topic: &str) -> Vec<SpawnEvent> {
        self.events
            .lock()
            .iter()
            .filter(|event| event.topic() == topic)
            .cloned()
            .collect()
    }

    pub fn topics(&self) -> Vec<&'static str> {
        self.events.lock().iter().map(SpawnEvent::topic).collect()
    }

    pub fn len(&self) -> usize {
        self.events.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.lock().is_empty()
    }

    pub fn clear(&self) {
        self.events.lock().clear();
    }
}

impl EventSink for MemorySink {
    fn publish(&self, event: SpawnEvent) {
        self.events.lock().push(event);
    }
}
