//! Outcome of a populate operation

use serde::{Deserialize, Serialize};

use crate::capacity::RoomSplit;
use crate::core::types::{Dimensions, Entity, Position, RoomId};
use crate::engine::topology::RoomStructure;
use crate::placement::ConstraintRule;

/// An entity bound to a position in a specific room
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlacedEntity {
    pub entity: Entity,
    pub position: Position,
    pub room_id: RoomId,
    pub group_id: String,
    #[serde(default)]
    pub team_id: Option<String>,
}

impl PlacedEntity {
    pub fn new(
        entity: Entity,
        position: Position,
        room_id: impl Into<RoomId>,
        group_id: impl Into<String>,
    ) -> Self {
        Self {
            entity,
            position,
            room_id: room_id.into(),
            group_id: group_id.into(),
            team_id: None,
        }
    }

    pub fn with_team(mut self, team_id: Option<String>) -> Self {
        self.team_id = team_id;
        self
    }
}

/// Soft failure for one entity; the operation carried on without it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpawnFailure {
    pub entity_id: String,
    pub entity_type: String,
    pub group_id: String,
    pub room_id: Option<RoomId>,
    pub reason: String,
    #[serde(default)]
    pub constraints_failed: Vec<ConstraintRule>,
    #[serde(default)]
    pub attempted_position: Option<Position>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModificationKind {
    Scaled,
}

/// Change the engine decided a room needs. The spatial collaborator applies it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoomModification {
    pub kind: ModificationKind,
    pub room_id: RoomId,
    pub before: Dimensions,
    pub after: Dimensions,
    /// New width over old width
    pub scale_factor: f32,
    pub reason: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SpawnResult {
    /// True iff at least one entity was placed
    pub success: bool,
    pub placed: Vec<PlacedEntity>,
    pub failures: Vec<SpawnFailure>,
    pub room_modifications: Vec<RoomModification>,
    /// Advisory split options passed through from the capacity model
    pub split_recommendations: Vec<RoomSplit>,
    pub room_structure: RoomStructure,
    pub requested_entities: u32,
    pub elapsed_ms: u64,
}

impl SpawnResult {
    pub fn is_complete(&self) -> bool {
        self.success && self.failures.is_empty()
    }

    pub fn placed_in<'a>(
        &'a self,
        room_id: &'a str,
    ) -> impl Iterator<Item = &'a PlacedEntity> + 'a {
        self.placed.iter().filter(move |p| p.room_id == room_id)
    }

    pub fn position_of(&self, entity_id: &str) -> Option<Position> {
        self.placed
            .iter()
            .find(|p| p.entity.id == entity_id)
            .map(|p| p.position)
    }

    pub(crate) fn finalize(&mut self) {
        self.success = !self.placed.is_empty();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_success_tracks_placements() {
        let mut result = SpawnResult::default();
        result.finalize();
        assert!(!result.success);

        result.placed.push(PlacedEntity::new(
            Entity::new("g1", "goblin"),
            Position::new(3.0, 3.0),
            "cave",
            "goblins",
        ));
        result.failures.push(SpawnFailure {
            entity_id: "g2".into(),
            entity_type: "goblin".into(),
            group_id: "goblins".into(),
            room_id: Some("cave".into()),
            reason: "no valid positions".into(),
            constraints_failed: vec![ConstraintRule::MinDistance],
            attempted_position: None,
        });
        result.finalize();

        assert!(result.success);
        assert!(!result.is_complete());
        assert_eq!(result.position_of("g1"), Some(Position::new(3.0, 3.0)));
        assert_eq!(result.placed_in("cave").count(), 1);
        assert_eq!(result.placed_in("hall").count(), 0);
    }
}
