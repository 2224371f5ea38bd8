pub mod memory;
pub mod room;

pub use memory::InMemorySpatial;
pub use room::{Obstacle, RoomGeometry, RoomLayout, SpatialIndex};
