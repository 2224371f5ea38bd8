//! Arc Spawn - constraint-driven entity placement and room capacity coordination

pub mod capacity;
pub mod core;
pub mod engine;
pub mod events;
pub mod placement;
pub mod request;
pub mod scenario;
pub mod selection;
pub mod spatial;
