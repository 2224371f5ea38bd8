//! Declarative spatial constraints and the violations they produce

use std::fmt;

use ahash::AHashMap;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::core::config::DEFAULT_SIGHT_RANGE;

/// Rule a candidate position can fail
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConstraintRule {
    MinDistance,
    WallProximity,
    LineOfSight,
    AreaOfEffect,
    /// Position lies inside an obstacle or outside the room
    Occupancy,
}

impl fmt::Display for ConstraintRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ConstraintRule::MinDistance => "min distance",
            ConstraintRule::WallProximity => "wall proximity",
            ConstraintRule::LineOfSight => "line of sight",
            ConstraintRule::AreaOfEffect => "area of effect",
            ConstraintRule::Occupancy => "occupancy",
        };
        f.write_str(name)
    }
}

/// A rejected candidate: which rule failed and by how much
#[derive(Error, Debug, Clone, PartialEq)]
#[error("{rule} constraint: {message}")]
pub struct ConstraintViolation {
    pub rule: ConstraintRule,
    pub message: String,
    /// Observed value (distance) at the rejected position
    pub measured: f32,
    /// Threshold the observed value had to meet
    pub required: f32,
}

impl ConstraintViolation {
    pub fn new(
        rule: ConstraintRule,
        message: impl Into<String>,
        measured: f32,
        required: f32,
    ) -> Self {
        Self {
            rule,
            message: message.into(),
            measured,
            required,
        }
    }
}

/// Ordered pair of entity type tags, written `"from:to"` in config
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct TypePair {
    pub from: String,
    pub to: String,
}

impl TypePair {
    pub fn new(from: impl Into<String>, to: impl Into<String>) -> Self {
        Self {
            from: from.into(),
            to: to.into(),
        }
    }

    pub fn reversed(&self) -> Self {
        Self {
            from: self.to.clone(),
            to: self.from.clone(),
        }
    }
}

impl TryFrom<String> for TypePair {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        match value.split_once(':') {
            Some((from, to)) if !from.is_empty() && !to.is_empty() => Ok(TypePair::new(from, to)),
            _ => Err(format!("type pair '{}' must look like 'from:to'", value)),
        }
    }
}

impl From<TypePair> for String {
    fn from(pair: TypePair) -> Self {
        format!("{}:{}", pair.from, pair.to)
    }
}

impl fmt::Display for TypePair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.from, self.to)
    }
}

/// Who must (or must not) be able to see whom
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LineOfSightRules {
    /// `from` must see at least one placed `to`
    pub required: Vec<TypePair>,
    /// `from` must see no placed `to`
    pub blocked: Vec<TypePair>,
}

impl LineOfSightRules {
    pub fn is_empty(&self) -> bool {
        self.required.is_empty() && self.blocked.is_empty()
    }
}

/// Constraint set applied to every candidate position in a request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpatialConstraints {
    /// Minimum distance per type pair; applies in both directions
    pub min_distance: AHashMap<TypePair, f32>,
    /// Clearance from every room edge
    pub wall_proximity: f32,
    pub line_of_sight: LineOfSightRules,
    /// Exclusion radius per entity type
    pub area_of_effect: AHashMap<String, f32>,
    /// Maximum visibility distance for line-of-sight rules
    pub sight_range: f32,
}

impl Default for SpatialConstraints {
    fn default() -> Self {
        Self {
            min_distance: AHashMap::new(),
            wall_proximity: 0.0,
            line_of_sight: LineOfSightRules::default(),
            area_of_effect: AHashMap::new(),
            sight_range: DEFAULT_SIGHT_RANGE,
        }
    }
}

impl SpatialConstraints {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_min_distance(mut self, from: &str, to: &str, distance: f32) -> Self {
        self.min_distance.insert(TypePair::new(from, to), distance);
        self
    }

    pub fn with_wall_proximity(mut self, margin: f32) -> Self {
        self.wall_proximity = margin;
        self
    }

    pub fn with_required_sight(mut self, from: &str, to: &str) -> Self {
        self.line_of_sight.required.push(TypePair::new(from, to));
        self
    }

    pub fn with_blocked_sight(mut self, from: &str, to: &str) -> Self {
        self.line_of_sight.blocked.push(TypePair::new(from, to));
        self
    }

    pub fn with_area_of_effect(mut self, entity_type: &str, radius: f32) -> Self {
        self.area_of_effect.insert(entity_type.to_string(), radius);
        self
    }

    pub fn with_sight_range(mut self, range: f32) -> Self {
        self.sight_range = range;
        self
    }

    /// Largest distance required between two types, declared either way round
    pub fn required_distance(&self, a: &str, b: &str) -> Option<f32> {
        let forward = self.min_distance.get(&TypePair::new(a, b)).copied();
        let backward = self.min_distance.get(&TypePair::new(b, a)).copied();
        match (forward, backward) {
            (Some(f), Some(r)) => Some(f.max(r)),
            (f, r) => f.or(r),
        }
    }

    pub fn effect_radius(&self, entity_type: &str) -> Option<f32> {
        self.area_of_effect
            .get(entity_type)
            .copied()
            .filter(|radius| *radius > 0.0)
    }

    /// Problems that make the constraint set unusable
    pub fn problems(&self) -> Vec<String> {
        let mut problems = Vec::new();
        for (pair, distance) in &self.min_distance {
            if *distance < 0.0 {
                problems.push(format!("min distance for {} must not be negative", pair));
            }
        }
        if self.wall_proximity < 0.0 {
            problems.push("wall proximity must not be negative".to_string());
        }
        if self.sight_range <= 0.0 {
            problems.push("sight range must be positive".to_string());
        }
        for (entity_type, radius) in &self.area_of_effect {
            if *radius < 0.0 {
                problems.push(format!("area of effect for {} must not be negative", entity_type));
            }
        }
        problems
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_type_pair_parsing() {
        let pair = TypePair::try_from("player:enemy".to_string()).unwrap();
        assert_eq!(pair, TypePair::new("player", "enemy"));
        assert_eq!(pair.reversed(), TypePair::new("enemy", "player"));
        assert!(TypePair::try_from("player".to_string()).is_err());
        assert!(TypePair::try_from(":enemy".to_string()).is_err());
    }

    #[test]
    fn test_required_distance_either_direction() {
        let constraints = SpatialConstraints::new().with_min_distance("player", "enemy", 2.0);
        assert_eq!(constraints.required_distance("player", "enemy"), Some(2.0));
        assert_eq!(constraints.required_distance("enemy", "player"), Some(2.0));
        assert_eq!(constraints.required_distance("enemy", "enemy"), None);
    }

    #[test]
    fn test_deserialize_from_json() {
        let json = r#"{
            "min_distance": { "player:enemy": 2.5 },
            "wall_proximity": 1.0,
            "line_of_sight": { "blocked": ["guard:treasure"] },
            "area_of_effect": { "trap": 1.5 }
        }"#;
        let constraints: SpatialConstraints = serde_json::from_str(json).unwrap();
        assert_eq!(constraints.required_distance("enemy", "player"), Some(2.5));
        assert_eq!(constraints.line_of_sight.blocked, vec![TypePair::new("guard", "treasure")]);
        assert_eq!(constraints.effect_radius("trap"), Some(1.5));
        assert_eq!(constraints.sight_range, DEFAULT_SIGHT_RANGE);
    }

    #[test]
    fn test_problems() {
        let constraints = SpatialConstraints::new()
            .with_wall_proximity(-1.0)
            .with_sight_range(0.0);
        assert_eq!(constraints.problems().len(), 2);
        assert!(SpatialConstraints::new().problems().is_empty());
    }

    #[test]
    fn test_violation_message() {
        let violation = ConstraintViolation::new(
            ConstraintRule::WallProximity,
            "position (0.50, 5.00) is 0.50 from a wall",
            0.5,
            1.0,
        );
        assert_eq!(
            violation.to_string(),
            "wall proximity constraint: position (0.50, 5.00) is 0.50 from a wall"
        );
    }
}
