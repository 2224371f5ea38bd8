//! Pattern strategies: how the entities bound for one room are arranged
//!
//! Every strategy attempts every entity it is given. Specialised layouts
//! fall back to scattered placement for entities that do not fit them.

pub mod clustered;
pub mod formation;
pub mod player_zone;
pub mod scattered;
pub mod team;

use rand_chacha::ChaCha8Rng;
use uuid::Uuid;

use crate::core::error::SpawnError;
use crate::core::types::{Entity, Position, Rect};
use crate::engine::result::{PlacedEntity, SpawnFailure};
use crate::events::{EventSink, SpawnEvent};
use crate::placement::{ConstraintRule, ConstraintSolver, ConstraintViolation};
use crate::request::{SpawnPattern, SpawnRequest, ZoneOccupancy};
use crate::spatial::RoomGeometry;

/// A selected entity waiting for a position
#[derive(Debug, Clone, PartialEq)]
pub struct Assignment {
    pub entity: Entity,
    pub group_id: String,
    pub team_id: Option<String>,
}

impl Assignment {
    pub fn new(entity: Entity, group_id: impl Into<String>) -> Self {
        Self {
            entity,
            group_id: group_id.into(),
            team_id: None,
        }
    }

    pub fn with_team(mut self, team_id: Option<String>) -> Self {
        self.team_id = team_id;
        self
    }
}

/// Everything a strategy needs to place entities into one room
pub struct PlacementContext<'a> {
    /// Planned geometry, already scaled when capacity asked for it
    pub room: &'a RoomGeometry,
    pub request: &'a SpawnRequest,
    pub solver: &'a ConstraintSolver,
    pub events: &'a dyn EventSink,
    pub zones: &'a ZoneOccupancy,
    pub operation_id: Uuid,
    /// Accepted candidates gathered per search
    pub candidate_pool: usize,
}

/// Placements and failures accumulated for one room
#[derive(Debug, Default)]
pub struct RoomPlacement {
    pub placed: Vec<PlacedEntity>,
    pub failures: Vec<SpawnFailure>,
}

impl RoomPlacement {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn place(
        &mut self,
        ctx: &PlacementContext<'_>,
        assignment: &Assignment,
        position: Position,
    ) {
        ctx.events.publish(SpawnEvent::EntityPlaced {
            operation_id: ctx.operation_id,
            entity_id: assignment.entity.id.clone(),
            entity_type: assignment.entity.entity_type.clone(),
            group_id: assignment.group_id.clone(),
            room_id: ctx.room.id.clone(),
            position,
        });
        self.placed.push(
            PlacedEntity::new(
                assignment.entity.clone(),
                position,
                ctx.room.id.clone(),
                assignment.group_id.clone(),
            )
            .with_team(assignment.team_id.clone()),
        );
    }

    pub fn fail(
        &mut self,
        ctx: &PlacementContext<'_>,
        assignment: &Assignment,
        reason: impl Into<String>,
        constraints_failed: Vec<ConstraintRule>,
        attempted_position: Option<Position>,
    ) {
        let failure = SpawnFailure {
            entity_id: assignment.entity.id.clone(),
            entity_type: assignment.entity.entity_type.clone(),
            group_id: assignment.group_id.clone(),
            room_id: Some(ctx.room.id.clone()),
            reason: reason.into(),
            constraints_failed,
            attempted_position,
        };
        tracing::debug!(
            entity = %failure.entity_id,
            room = %ctx.room.id,
            reason = %failure.reason,
            "Entity placement failed"
        );
        ctx.events.publish(SpawnEvent::EntityFailed {
            operation_id: ctx.operation_id,
            failure: failure.clone(),
        });
        self.failures.push(failure);
    }

    /// Accept `position` if the room allows it, nothing stands there and
    /// every constraint passes
    pub fn try_place(
        &mut self,
        ctx: &PlacementContext<'_>,
        assignment: &Assignment,
        position: Position,
    ) -> Result<(), ConstraintViolation> {
        if !ctx.solver.can_occupy(ctx.room, &assignment.entity, position) {
            return Err(ConstraintViolation::new(
                ConstraintRule::Occupancy,
                "position is outside the room or inside an obstacle",
                0.0,
                0.0,
            ));
        }
        if crate::placement::is_taken(position, &self.placed) {
            return Err(ConstraintViolation::new(
                ConstraintRule::Occupancy,
                "position already holds an entity",
                0.0,
                0.0,
            ));
        }
        ctx.solver.validate_position(
            ctx.room,
            position,
            &assignment.entity,
            &ctx.request.constraints,
            &self.placed,
        )?;
        self.place(ctx, assignment, position);
        Ok(())
    }

    /// Search `area` for a position and place the entity there, recording a
    /// failure when the search comes up empty
    pub fn scatter(
        &mut self,
        ctx: &PlacementContext<'_>,
        assignment: &Assignment,
        area: Rect,
        rng: &mut ChaCha8Rng,
    ) {
        let wanted = ctx.request.rules.wanted(ctx.candidate_pool);
        let search = ctx.solver.find_valid_positions_within(
            ctx.room,
            area,
            &assignment.entity,
            &ctx.request.constraints,
            &self.placed,
            wanted,
            rng,
        );

        match search {
            Ok(candidates) => match ctx.request.rules.choose(&candidates, rng) {
                Some(position) => self.place(ctx, assignment, position),
                None => self.fail(ctx, assignment, "no candidate positions", Vec::new(), None),
            },
            Err(error @ SpawnError::NoValidPositions { .. }) => {
                let rules = error.rules_failed().to_vec();
                self.fail(ctx, assignment, error.to_string(), rules, None);
            }
            Err(error) => self.fail(ctx, assignment, error.to_string(), Vec::new(), None),
        }
    }

    /// Try a preferred position first; on rejection report the violation and
    /// scatter inside `fallback`
    pub fn place_or_scatter(
        &mut self,
        ctx: &PlacementContext<'_>,
        assignment: &Assignment,
        preferred: Position,
        fallback: Rect,
        rng: &mut ChaCha8Rng,
    ) {
        if let Err(violation) = self.try_place(ctx, assignment, preferred) {
            tracing::debug!(
                entity = %assignment.entity.id,
                rule = %violation.rule,
                "Preferred position rejected, scattering instead"
            );
            ctx.events.publish(SpawnEvent::ConstraintViolated {
                operation_id: ctx.operation_id,
                room_id: ctx.room.id.clone(),
                entity_id: assignment.entity.id.clone(),
                rule: violation.rule,
                message: violation.message,
            });
            self.scatter(ctx, assignment, fallback, rng);
        }
    }
}

/// Run the strategy for `pattern` over the room's entities
pub fn dispatch(
    pattern: SpawnPattern,
    ctx: &PlacementContext<'_>,
    assignments: &[Assignment],
    rng: &mut ChaCha8Rng,
) -> RoomPlacement {
    let mut out = RoomPlacement::new();
    if assignments.is_empty() {
        return out;
    }

    tracing::debug!(
        room = %ctx.room.id,
        pattern = ?pattern,
        entities = assignments.len(),
        "Dispatching pattern"
    );

    match pattern {
        SpawnPattern::Scattered => scattered::place(ctx, assignments, &mut out, rng),
        SpawnPattern::Formation => formation::place(ctx, assignments, &mut out, rng),
        SpawnPattern::TeamBased => team::place(ctx, assignments, &mut out, rng),
        SpawnPattern::PlayerChoice => player_zone::place(ctx, assignments, &mut out, rng),
        SpawnPattern::Clustered => clustered::place(ctx, assignments, &mut out, rng),
    }
    out
}


#[cfg(test)]
mod tests {
    use super::testing::*;
    use super::*;
    use crate::placement::SpatialConstraints;
    use rand::SeedableRng;

    #[test]
    fn test_try_place_rejects_taken_positions() {
        let fixture = Fixture::new(RoomGeometry::grid("hall", 10.0, 10.0), SpawnRequest::default());
        let ctx = fixture.ctx();
        let mut out = RoomPlacement::new();
        let entities = assignments("goblin", "g", 2);

        out.try_place(&ctx, &entities[0], Position::new(3.0, 3.0)).unwrap();
        let violation = out
            .try_place(&ctx, &entities[1], Position::new(3.2, 3.0))
            .unwrap_err();
        assert_eq!(violation.rule, ConstraintRule::Occupancy);
        assert_eq!(fixture.sink.with_topic("spawn.entity.placed").len(), 1);
    }

    #[test]
    fn test_scatter_records_failed_rules() {
        let request = SpawnRequest::default()
            .with_constraints(SpatialConstraints::new().with_wall_proximity(6.0));
        let fixture = Fixture::new(RoomGeometry::grid("closet", 10.0, 10.0), request);
        let ctx = fixture.ctx();
        let mut out = RoomPlacement::new();
        let mut rng = ChaCha8Rng::seed_from_u64(1);

        out.scatter(&ctx, &assignments("goblin", "g", 1)[0], ctx.room.bounds(), &mut rng);

        assert!(out.placed.is_empty());
        assert_eq!(out.failures.len(), 1);
        assert_eq!(out.failures[0].constraints_failed, vec![ConstraintRule::WallProximity]);
        assert_eq!(out.failures[0].room_id.as_deref(), Some("closet"));
        assert_eq!(fixture.sink.with_topic("spawn.entity.failed").len(), 1);
    }

    #[test]
    fn test_place_or_scatter_reports_violation() {
        let request = SpawnRequest::default()
            .with_constraints(SpatialConstraints::new().with_wall_proximity(1.0));
        let fixture = Fixture::new(RoomGeometry::grid("hall", 10.0, 10.0), request);
        let ctx = fixture.ctx();
        let mut out = RoomPlacement::new();
        let mut rng = ChaCha8Rng::seed_from_u64(1);

        out.place_or_scatter(
            &ctx,
            &assignments("goblin", "g", 1)[0],
            Position::new(0.5, 5.0),
            ctx.room.bounds(),
            &mut rng,
        );

        assert_eq!(out.placed.len(), 1);
        assert_ne!(out.placed[0].position, Position::new(0.5, 5.0));
        assert_eq!(fixture.sink.with_topic("spawn.constraint.violated").len(), 1);
    }
}
