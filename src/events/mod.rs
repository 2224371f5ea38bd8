//! Spawn events and the sinks that receive them

pub mod sink;
pub mod types;

pub use sink::{ChannelSink, EventSink, MemorySink, NullSink, TracingSink};
pub use types::SpawnEvent;
