//! Typed spawn events

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::capacity::RoomSplit;
use crate::core::types::{Dimensions, Position, Rect, RoomId};
use crate::engine::result::{SpawnFailure, SpawnResult};
use crate::engine::topology::SpawnTarget;
use crate::placement::ConstraintRule;
use crate::request::SpawnRequest;

/// Everything observable about a populate operation
///
/// Each variant carries enough detail to reconstruct what happened without
/// replaying the operation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SpawnEvent {
    OperationStarted {
        engine_id: String,
        operation_id: Uuid,
        target: SpawnTarget,
        request: SpawnRequest,
    },
    OperationCompleted {
        engine_id: String,
        operation_id: Uuid,
        request: SpawnRequest,
        result: SpawnResult,
        elapsed_ms: u64,
        split_rooms: bool,
    },
    /// Completion of an operation that spanned several connected rooms
    MultiRoomCompleted {
        engine_id: String,
        operation_id: Uuid,
        request: SpawnRequest,
        result: SpawnResult,
        elapsed_ms: u64,
        rooms: Vec<RoomId>,
    },
    EntityPlaced {
        operation_id: Uuid,
        entity_id: String,
        entity_type: String,
        group_id: String,
        room_id: RoomId,
        position: Position,
    },
    EntityFailed {
        operation_id: Uuid,
        failure: SpawnFailure,
    },
    RoomScaled {
        operation_id: Uuid,
        room_id: RoomId,
        before: Dimensions,
        after: Dimensions,
        scale_factor: f32,
        entity_count: u32,
    },
    SplitRecommended {
        operation_id: Uuid,
        room_id: RoomId,
        entity_count: u32,
        options: Vec<RoomSplit>,
    },
    FormationApplied {
        operation_id: Uuid,
        room_id: RoomId,
        formation: String,
        centroid: Position,
        entity_count: usize,
    },
    TeamSpawned {
        operation_id: Uuid,
        room_id: RoomId,
        team_id: String,
        /// None when the team had no dedicated area and was scattered
        area: Option<Rect>,
        entity_count: usize,
    },
    ConstraintViolated {
        operation_id: Uuid,
        room_id: RoomId,
        entity_id: String,
        rule: ConstraintRule,
        message: String,
    },
    PlayerSpawnGranted {
        operation_id: Uuid,
        room_id: RoomId,
        player_id: String,
        zone_id: String,
        position: Position,
        /// True when the engine chose the spot, false when the player did
        auto_assigned: bool,
    },
    PlayerSpawnDenied {
        operation_id: Uuid,
        room_id: RoomId,
        player_id: String,
        zone_id: String,
        reason: String,
        /// Nearest free spots in the requested zone, closest first
        alternatives: Vec<Position>,
    },
}

impl SpawnEvent {
    /// Stable routing key for this event kind
    pub fn topic(&self) -> &'static str {
        match self {
            SpawnEvent::OperationStarted { .. } => "spawn.operation.started",
            SpawnEvent::OperationCompleted { .. } => "spawn.operation.completed",
            SpawnEvent::MultiRoomCompleted { .. } => "spawn.multiroom.completed",
            SpawnEvent::EntityPlaced { .. } => "spawn.entity.placed",
            SpawnEvent::EntityFailed { .. } => "spawn.entity.failed",
            SpawnEvent::RoomScaled { .. } => "spawn.room.scaled",
            SpawnEvent::SplitRecommended { .. } => "spawn.split.recommended",
            SpawnEvent::FormationApplied { .. } => "spawn.formation.applied",
            SpawnEvent::TeamSpawned { .. } => "spawn.team.spawned",
            SpawnEvent::ConstraintViolated { .. } => "spawn.constraint.violated",
            SpawnEvent::PlayerSpawnGranted { .. } => "spawn.player.granted",
            SpawnEvent::PlayerSpawnDenied { .. } => "spawn.player.denied",
        }
    }

    pub fn operation_id(&self) -> Uuid {
        match self {
            SpawnEvent::OperationStarted { operation_id, .. }
            | SpawnEvent::OperationCompleted { operation_id, .. }
            | SpawnEvent::MultiRoomCompleted { operation_id, .. }
            | SpawnEvent::EntityPlaced { operation_id, .. }
            | SpawnEvent::EntityFailed { operation_id, .. }
            | SpawnEvent::RoomScaled { operation_id, .. }
            | SpawnEvent::SplitRecommended { operation_id, .. }
            | SpawnEvent::FormationApplied { operation_id, .. }
            | SpawnEvent::TeamSpawned { operation_id, .. }
            | SpawnEvent::ConstraintViolated { operation_id, .. }
            | SpawnEvent::PlayerSpawnGranted { operation_id, .. }
            | SpawnEvent::PlayerSpawnDenied { operation_id, .. } => *operation_id,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_serializes_with_kind_tag() {
        let event = SpawnEvent::RoomScaled {
            operation_id: Uuid::nil(),
            room_id: "hall".into(),
            before: Dimensions::new(10.0, 10.0),
            after: Dimensions::new(18.0, 14.4),
            scale_factor: 1.8,
            entity_count: 25,
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["kind"], "room_scaled");
        assert_eq!(json["room_id"], "hall");
        assert_eq!(event.topic(), "spawn.room.scaled");

        let back: SpawnEvent = serde_json::from_value(json).unwrap();
        assert_eq!(back, event);
    }

    #[test]
    fn test_topics_are_distinct() {
        let denied = SpawnEvent::PlayerSpawnDenied {
            operation_id: Uuid::nil(),
            room_id: "hall".into(),
            player_id: "p1".into(),
            zone_id: "north".into(),
            reason: "outside zone".into(),
            alternatives: vec![],
        };
        let granted = SpawnEvent::PlayerSpawnGranted {
            operation_id: Uuid::nil(),
            room_id: "hall".into(),
            player_id: "p1".into(),
            zone_id: "north".into(),
            position: Position::new(1.0, 1.0),
            auto_assigned: true,
        };
        assert_ne!(denied.topic(), granted.topic());
        assert_eq!(denied.topic(), "spawn.player.denied");
    }
}
