pub mod config;
pub mod error;
pub mod types;

pub use config::{CapacitySpacing, EngineConfig};
pub use error::{Result, SpawnError};
pub use types::{Dimensions, Entity, Position, Rect, RoomId};
