//! Tight radial clusters, one per entity group

use std::f32::consts::TAU;

use rand_chacha::ChaCha8Rng;

use super::{Assignment, PlacementContext, RoomPlacement};
use crate::core::config::CLUSTER_RADIUS;
use crate::core::types::{Position, Rect};

pub fn place(
    ctx: &PlacementContext<'_>,
    assignments: &[Assignment],
    out: &mut RoomPlacement,
    rng: &mut ChaCha8Rng,
) {
    let bounds = ctx.room.bounds();
    for members in by_group(assignments) {
        let anchor = anchor_for(ctx, out, &members, rng).unwrap_or_else(|| bounds.center());
        tracing::debug!(
            room = %ctx.room.id,
            group = %members[0].group_id,
            x = anchor.x,
            y = anchor.y,
            "Cluster anchor"
        );
        ring(ctx, anchor, bounds, &members, out, rng);
    }
}

/// Place members evenly around `centroid` at the cluster radius. A lone
/// member stands on the centroid itself. Rejected ring points fall back to
/// scattered placement inside `area`.
pub fn ring(
    ctx: &PlacementContext<'_>,
    centroid: Position,
    area: Rect,
    members: &[Assignment],
    out: &mut RoomPlacement,
    rng: &mut ChaCha8Rng,
) {
    if members.len() == 1 {
        out.place_or_scatter(ctx, &members[0], area.clamp(centroid), area, rng);
        return;
    }

    let step = TAU / members.len() as f32;
    for (index, member) in members.iter().enumerate() {
        let angle = step * index as f32;
        let point = centroid.offset(CLUSTER_RADIUS * angle.cos(), CLUSTER_RADIUS * angle.sin());
        out.place_or_scatter(ctx, member, area.clamp(point), area, rng);
    }
}

/// A valid spot for the group's first member, used as the cluster centre.
/// Searched a cluster radius in from the walls so the ring fits.
fn anchor_for(
    ctx: &PlacementContext<'_>,
    out: &RoomPlacement,
    members: &[Assignment],
    rng: &mut ChaCha8Rng,
) -> Option<Position> {
    let first = members.first()?;
    let candidates = ctx
        .solver
        .find_valid_positions_within(
            ctx.room,
            ctx.room.bounds().inset(CLUSTER_RADIUS),
            &first.entity,
            &ctx.request.constraints,
            &out.placed,
            ctx.request.rules.wanted(ctx.candidate_pool),
            rng,
        )
        .ok()?;
    ctx.request.rules.choose(&candidates, rng)
}

/// Split assignments into groups, keeping first-seen order
fn by_group(assignments: &[Assignment]) -> Vec<Vec<Assignment>> {
    let mut groups: Vec<Vec<Assignment>> = Vec::new();
    for assignment in assignments {
        match groups.iter_mut().find(|g| g[0].group_id == assignment.group_id) {
            Some(group) => group.push(assignment.clone()),
            None => groups.push(vec![assignment.clone()]),
        }
    }
    groups
}
