//! Position validation and search

pub mod constraints;
pub mod rules;
pub mod solver;

pub use constraints::{
    ConstraintRule, ConstraintViolation, LineOfSightRules, SpatialConstraints, TypePair,
};
pub use rules::{PlacementRules, PlacementStrategy};
pub use solver::{is_taken, lattice_points, ConstraintSolver};
