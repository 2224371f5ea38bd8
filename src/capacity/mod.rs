//! Room capacity: the collaborator boundary, a reference model and the
//! coordinator that decides on scaling before placement

pub mod coordinator;
pub mod feeling;
pub mod model;

pub use coordinator::{CapacityCoordinator, CapacityOutcome};
pub use feeling::{CapacityEstimate, FeelingCapacityModel};
pub use model::{
    CapacityConstraints, CapacityModel, CapacityQuery, CapacityReport, RoomSplit, SizingQuery,
    SpatialFeeling, SpatialIntentProfile,
};
