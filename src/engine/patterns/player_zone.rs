//! Player-chosen spawn zones
//!
//! Players are placed first: an explicit choice is honoured when the zone
//! accepts it, otherwise the player is auto-assigned to the first free spot
//! of the first zone that takes them. Everyone else is scattered.

use rand_chacha::ChaCha8Rng;

use super::{scattered, Assignment, PlacementContext, RoomPlacement};
use crate::core::types::Position;
use crate::events::SpawnEvent;
use crate::placement::is_taken;
use crate::request::{PlayerChoice, SpawnZone, ZoneDenial};

/// Alternatives offered with a denial
const DENIAL_ALTERNATIVES: usize = 3;

pub fn place(
    ctx: &PlacementContext<'_>,
    assignments: &[Assignment],
    out: &mut RoomPlacement,
    rng: &mut ChaCha8Rng,
) {
    let (players, others): (Vec<Assignment>, Vec<Assignment>) =
        assignments.iter().cloned().partition(|a| a.entity.is_player());

    for player in &players {
        place_player(ctx, player, out);
    }
    scattered::place(ctx, &others, out, rng);
}

fn place_player(ctx: &PlacementContext<'_>, player: &Assignment, out: &mut RoomPlacement) {
    let choice = ctx
        .request
        .player_choices
        .iter()
        .find(|c| c.player_id == player.entity.id);

    if let Some(choice) = choice {
        match claim_choice(ctx, player, choice, out) {
            Ok(()) => {
                grant(ctx, player, &choice.zone_id, choice.position, false, out);
                return;
            }
            Err(denial) => deny(ctx, player, choice, &denial),
        }
    }

    for zone in &ctx.request.player_zones {
        let placed = &out.placed;
        let claimed = ctx.zones.claim_first_free(zone, &player.entity, |p| {
            ctx.solver.can_occupy(ctx.room, &player.entity, p) && !is_taken(p, placed)
        });
        if let Some(position) = claimed {
            grant(ctx, player, &zone.id, position, true, out);
            return;
        }
    }

    out.fail(
        ctx,
        player,
        "no spawn zone has room for this player",
        Vec::new(),
        choice.map(|c| c.position),
    );
}

/// Zone checks first; a spot the room itself rejects is released again
fn claim_choice(
    ctx: &PlacementContext<'_>,
    player: &Assignment,
    choice: &PlayerChoice,
    out: &RoomPlacement,
) -> Result<(), ZoneDenial> {
    let zone = find_zone(ctx, &choice.zone_id)
        .ok_or_else(|| ZoneDenial::UnknownZone(choice.zone_id.clone()))?;
    ctx.zones.claim_choice(zone, &player.entity, choice.position)?;

    if !ctx.solver.can_occupy(ctx.room, &player.entity, choice.position)
        || is_taken(choice.position, &out.placed)
    {
        ctx.zones.release(&zone.id, choice.position);
        return Err(ZoneDenial::Occupied {
            position: choice.position,
        });
    }
    Ok(())
}

fn grant(
    ctx: &PlacementContext<'_>,
    player: &Assignment,
    zone_id: &str,
    position: Position,
    auto_assigned: bool,
    out: &mut RoomPlacement,
) {
    tracing::debug!(
        player = %player.entity.id,
        zone = %zone_id,
        auto_assigned,
        "Player spawn granted"
    );
    ctx.events.publish(SpawnEvent::PlayerSpawnGranted {
        operation_id: ctx.operation_id,
        room_id: ctx.room.id.clone(),
        player_id: player.entity.id.clone(),
        zone_id: zone_id.to_string(),
        position,
        auto_assigned,
    });
    out.place(ctx, player, position);
}

fn deny(
    ctx: &PlacementContext<'_>,
    player: &Assignment,
    choice: &PlayerChoice,
    denial: &ZoneDenial,
) {
    tracing::info!(
        player = %player.entity.id,
        zone = %choice.zone_id,
        reason = %denial,
        "Player spawn choice denied"
    );
    let alternatives = find_zone(ctx, &choice.zone_id)
        .map(|zone| ctx.zones.nearest_free(zone, choice.position, DENIAL_ALTERNATIVES))
        .unwrap_or_default();

    ctx.events.publish(SpawnEvent::PlayerSpawnDenied {
        operation_id: ctx.operation_id,
        room_id: ctx.room.id.clone(),
        player_id: player.entity.id.clone(),
        zone_id: choice.zone_id.clone(),
        reason: denial.to_string(),
        alternatives,
    });
}

fn find_zone<'a>(ctx: &PlacementContext<'a>, zone_id: &str) -> Option<&'a SpawnZone> {
    ctx.request.player_zones.iter().find(|z| z.id == zone_id)
}

#[cfg(test)]
mod tests {
    use super::super::testing::*;
    use super::*;
    use crate::core::types::{Entity, Rect};
    use crate::request::{SpawnPattern, SpawnRequest};
    use crate::spatial::RoomGeometry;
    use rand::SeedableRng;

    fn party(ids: &[&str]) -> Vec<Assignment> {
        ids.iter()
            .map(|id| Assignment::new(Entity::new(*id, "player"), "party"))
            .collect()
    }

    fn request() -> SpawnRequest {
        SpawnRequest::new(SpawnPattern::PlayerChoice)
            .with_zone(
                SpawnZone::new("west", Rect::new(1.0, 1.0, 3.0, 3.0), 2).with_types(&["player"]),
            )
            .with_zone(SpawnZone::new("east", Rect::new(14.0, 1.0, 4.0, 4.0), 4))
    }

    #[test]
    fn test_valid_choice_is_granted() {
        let request =
            request().with_choice(PlayerChoice::new("p1", "west", Position::new(2.0, 2.0)));
        let fixture = Fixture::new(RoomGeometry::grid("keep", 20.0, 20.0), request);
        let mut out = RoomPlacement::new();
        let mut rng = ChaCha8Rng::seed_from_u64(1);

        place(&fixture.ctx(), &party(&["p1"]), &mut out, &mut rng);

        assert_eq!(out.placed[0].position, Position::new(2.0, 2.0));
        match &fixture.sink.with_topic("spawn.player.granted")[0] {
            SpawnEvent::PlayerSpawnGranted { auto_assigned, zone_id, .. } => {
                assert!(!auto_assigned);
                assert_eq!(zone_id, "west");
            }
            other => panic!("unexpected event {:?}", other),
        }
    }

    #[test]
    fn test_outside_zone_is_denied_then_auto_assigned() {
        let request =
            request().with_choice(PlayerChoice::new("p1", "west", Position::new(10.0, 10.0)));
        let fixture = Fixture::new(RoomGeometry::grid("keep", 20.0, 20.0), request);
        let mut out = RoomPlacement::new();
        let mut rng = ChaCha8Rng::seed_from_u64(1);

        place(&fixture.ctx(), &party(&["p1"]), &mut out, &mut rng);

        let denied = fixture.sink.with_topic("spawn.player.denied");
        assert_eq!(denied.len(), 1);
        match &denied[0] {
            SpawnEvent::PlayerSpawnDenied { reason, alternatives, .. } => {
                assert!(reason.contains("outside zone"));
                assert_eq!(alternatives.len(), 3);
                assert_eq!(alternatives[0], Position::new(3.0, 3.0));
            }
            other => panic!("unexpected event {:?}", other),
        }
        assert_eq!(out.placed.len(), 1);
        assert_eq!(out.placed[0].position, Position::new(1.0, 1.0));
        assert!(out.failures.is_empty());
    }

    #[test]
    fn test_full_zones_fail_only_that_player() {
        let request = SpawnRequest::new(SpawnPattern::PlayerChoice)
            .with_zone(SpawnZone::new("cell", Rect::new(2.0, 2.0, 2.0, 2.0), 1));
        let fixture = Fixture::new(RoomGeometry::grid("keep", 10.0, 10.0), request);
        let mut out = RoomPlacement::new();
        let mut rng = ChaCha8Rng::seed_from_u64(1);

        let mut entities = party(&["p1", "p2"]);
        entities.extend(assignments("goblin", "goblins", 2));
        place(&fixture.ctx(), &entities, &mut out, &mut rng);

        assert_eq!(out.placed.len(), 3);
        assert_eq!(out.failures.len(), 1);
        assert_eq!(out.failures[0].entity_id, "p2");
    }

    #[test]
    fn test_choice_on_obstacle_is_released() {
        use crate::spatial::Obstacle;
        let request =
            request().with_choice(PlayerChoice::new("p1", "west", Position::new(2.0, 2.0)));
        let room = RoomGeometry::grid("keep", 20.0, 20.0)
            .with_obstacle(Obstacle::new(Rect::new(1.5, 1.5, 1.0, 1.0), false));
        let fixture = Fixture::new(room, request);
        let mut out = RoomPlacement::new();
        let mut rng = ChaCha8Rng::seed_from_u64(1);

        place(&fixture.ctx(), &party(&["p1"]), &mut out, &mut rng);

        assert_eq!(fixture.sink.with_topic("spawn.player.denied").len(), 1);
        assert_eq!(out.placed.len(), 1);
        assert_eq!(out.placed[0].position, Position::new(1.0, 1.0));
        assert_eq!(fixture.zones.count("west"), 1);
    }
}
