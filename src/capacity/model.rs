//! Capacity collaborator boundary: queries, answers and the trait

use std::collections::BTreeMap;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::core::config::CapacitySpacing;
use crate::core::error::Result;
use crate::core::types::{Dimensions, Position, RoomId};

/// Named density/openness target for a room
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SpatialFeeling {
    Tight,
    #[default]
    Normal,
    Vast,
}

impl SpatialFeeling {
    pub fn profile(self) -> SpatialIntentProfile {
        SpatialIntentProfile::for_feeling(self)
    }
}

/// Numeric description of a feeling, all indices in 0.0-1.0
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SpatialIntentProfile {
    pub feeling: SpatialFeeling,
    /// Entities per unit of usable floor
    pub entity_density: f32,
    /// How much room to move around each entity
    pub movement_freedom: f32,
    /// Length of sight lines the room should offer
    pub visual_scope: f32,
    /// Amount of cover and positioning options
    pub tactical_complexity: f32,
}

impl SpatialIntentProfile {
    pub fn for_feeling(feeling: SpatialFeeling) -> Self {
        let (entity_density, movement_freedom, visual_scope, tactical_complexity) = match feeling {
            SpatialFeeling::Tight => (0.8, 0.3, 0.4, 0.7),
            SpatialFeeling::Normal => (0.5, 0.6, 0.6, 0.6),
            SpatialFeeling::Vast => (0.2, 0.8, 0.9, 0.4),
        };
        Self {
            feeling,
            entity_density,
            movement_freedom,
            visual_scope,
            tactical_complexity,
        }
    }
}

/// Spacing and pathway minimums attached to a capacity query
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CapacityConstraints {
    pub target_feeling: SpatialFeeling,
    pub spacing: CapacitySpacing,
}

impl CapacityConstraints {
    pub fn new(target_feeling: SpatialFeeling, spacing: CapacitySpacing) -> Self {
        Self {
            target_feeling,
            spacing,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CapacityQuery {
    /// None when asking about an averaged, hypothetical room
    pub room_id: Option<RoomId>,
    pub dimensions: Dimensions,
    pub entity_count: u32,
    pub constraints: CapacityConstraints,
    pub include_split_options: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CapacityReport {
    pub satisfied: bool,
    pub recommended_capacity: u32,
    pub max_capacity: u32,
    pub splits: Vec<RoomSplit>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SizingQuery {
    pub profile: SpatialIntentProfile,
    pub entity_count: u32,
    /// Result never shrinks below this
    pub min_dimensions: Dimensions,
    /// Multiplier applied on top of the computed size
    pub additional_space: f32,
}

/// Advisory option for dividing a crowded room. Never acted on here.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoomSplit {
    pub suggested_size: Dimensions,
    pub connection_points: Vec<Position>,
    /// Suggested entity count per resulting room
    pub entity_distribution: BTreeMap<String, u32>,
    pub connection_type: String,
    pub reason: String,
    pub capacity_improvement: f32,
}

/// Environment collaborator that judges room capacity
#[async_trait]
pub trait CapacityModel: Send + Sync {
    async fn check_capacity(&self, query: &CapacityQuery) -> Result<CapacityReport>;

    async fn recommend_size(&self, query: &SizingQuery) -> Result<Dimensions>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_profiles_order_by_density() {
        let tight = SpatialFeeling::Tight.profile();
        let normal = SpatialFeeling::Normal.profile();
        let vast = SpatialFeeling::Vast.profile();
        assert!(tight.entity_density > normal.entity_density);
        assert!(normal.entity_density > vast.entity_density);
        assert!(vast.visual_scope > tight.visual_scope);
    }

    #[test]
    fn test_feeling_serde() {
        let feeling: SpatialFeeling = serde_json::from_str("\"vast\"").unwrap();
        assert_eq!(feeling, SpatialFeeling::Vast);
        assert_eq!(SpatialFeeling::default(), SpatialFeeling::Normal);
    }
}
