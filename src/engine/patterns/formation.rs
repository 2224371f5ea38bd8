//! Formation placement: fixed offsets around a centroid

use rand_chacha::ChaCha8Rng;

use super::{scattered, Assignment, PlacementContext, RoomPlacement};
use crate::core::types::Rect;
use crate::events::SpawnEvent;
use crate::request::FormationPattern;

pub fn place(
    ctx: &PlacementContext<'_>,
    assignments: &[Assignment],
    out: &mut RoomPlacement,
    rng: &mut ChaCha8Rng,
) {
    match ctx.request.formation.as_ref() {
        Some(formation) => apply(ctx, formation, ctx.room.bounds(), assignments, out, rng),
        None => {
            tracing::warn!(
                room = %ctx.room.id,
                "Formation pattern without a formation, scattering"
            );
            scattered::place(ctx, assignments, out, rng);
        }
    }
}

/// Lay `assignments` out in `formation` centred on `area`.
///
/// Slots are clamped into the area. Entities past the last slot take the
/// centroid. A rejected slot falls back to scattered placement inside the
/// area.
pub fn apply(
    ctx: &PlacementContext<'_>,
    formation: &FormationPattern,
    area: Rect,
    assignments: &[Assignment],
    out: &mut RoomPlacement,
    rng: &mut ChaCha8Rng,
) {
    let centroid = area.center();
    for (index, assignment) in assignments.iter().enumerate() {
        let slot = area.clamp(formation.slot(index, centroid));
        out.place_or_scatter(ctx, assignment, slot, area, rng);
    }

    ctx.events.publish(SpawnEvent::FormationApplied {
        operation_id: ctx.operation_id,
        room_id: ctx.room.id.clone(),
        formation: formation.name.clone(),
        centroid,
        entity_count: assignments.len(),
    });
}
