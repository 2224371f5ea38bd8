//! Team-separated placement
//!
//! Each team gets its own spawn area inside the room's usable interior.
//! Inside an area, cohesion picks between the team's formation, a tight
//! ring, or independent scattering.

use rand::Rng;
use rand_chacha::ChaCha8Rng;

use super::{clustered, formation, Assignment, PlacementContext, RoomPlacement};
use crate::core::types::Rect;
use crate::events::SpawnEvent;
use crate::request::{Team, TeamConfig, TeamPlacement};

/// Attempts at finding a free spot for each random team area
const RANDOM_AREA_ATTEMPTS: usize = 100;

pub fn place(
    ctx: &PlacementContext<'_>,
    assignments: &[Assignment],
    out: &mut RoomPlacement,
    rng: &mut ChaCha8Rng,
) {
    let Some(config) = ctx.request.teams.as_ref() else {
        tracing::warn!(room = %ctx.room.id, "Team pattern without team config, scattering");
        super::scattered::place(ctx, assignments, out, rng);
        return;
    };

    let (teams, unassigned) = by_team(config, assignments);
    let areas = team_areas(
        ctx.room.bounds(),
        ctx.request.constraints.wall_proximity,
        config,
        teams.len(),
        rng,
    );
    let bounds = ctx.room.bounds();

    for (index, (team, members)) in teams.iter().enumerate() {
        let area = areas.get(index).copied();
        match area {
            Some(area) => place_team(ctx, config, team, area, members, out, rng),
            None => {
                tracing::warn!(team = %team.id, "No spawn area left for team, scattering");
                for member in members {
                    out.scatter(ctx, member, bounds, rng);
                }
            }
        }
        ctx.events.publish(SpawnEvent::TeamSpawned {
            operation_id: ctx.operation_id,
            room_id: ctx.room.id.clone(),
            team_id: team.id.clone(),
            area,
            entity_count: members.len(),
        });
    }

    for assignment in &unassigned {
        out.scatter(ctx, assignment, bounds, rng);
    }
}

fn place_team(
    ctx: &PlacementContext<'_>,
    config: &TeamConfig,
    team: &Team,
    area: Rect,
    members: &[Assignment],
    out: &mut RoomPlacement,
    rng: &mut ChaCha8Rng,
) {
    if !config.cohesion.keeps_together(team.allegiance) {
        for member in members {
            out.scatter(ctx, member, area, rng);
        }
        return;
    }
    match team.formation.as_ref() {
        Some(pattern) => formation::apply(ctx, pattern, area, members, out, rng),
        None => clustered::ring(ctx, area.center(), area, members, out, rng),
    }
}

/// Spawn areas for `count` teams, in team order. Fewer areas than teams
/// are returned when the layout runs out.
///
/// Areas sit inside the room inset by the wall margin. Side bands and
/// corner squares are as deep as the minimum team distance, capped so they
/// cannot meet.
pub fn team_areas(
    bounds: Rect,
    wall_margin: f32,
    config: &TeamConfig,
    count: usize,
    rng: &mut impl Rng,
) -> Vec<Rect> {
    let interior = bounds.inset(wall_margin.max(0.0));
    let (width, height) = (interior.size.width, interior.size.height);
    let distance = config.min_team_distance;

    let mut areas = match config.placement {
        TeamPlacement::OppositeSides => {
            let depth_y = distance.min(height / 4.0);
            let depth_x = distance.min(width / 4.0);
            let middle = height - 2.0 * depth_y;
            vec![
                // North
                Rect::new(interior.min_x(), interior.min_y(), width, depth_y),
                // South
                Rect::new(interior.min_x(), interior.max_y() - depth_y, width, depth_y),
                // West and east, between the north and south bands
                Rect::new(interior.min_x(), interior.min_y() + depth_y, depth_x, middle),
                Rect::new(interior.max_x() - depth_x, interior.min_y() + depth_y, depth_x, middle),
            ]
        }
        TeamPlacement::Corners => {
            let side = distance.min(width / 3.0).min(height / 3.0);
            let (left, top) = (interior.min_x(), interior.min_y());
            let (right, bottom) = (interior.max_x() - side, interior.max_y() - side);
            // Diagonal corners first so two teams face each other
            vec![
                Rect::new(left, top, side, side),
                Rect::new(right, bottom, side, side),
                Rect::new(right, top, side, side),
                Rect::new(left, bottom, side, side),
            ]
        }
        TeamPlacement::Random => random_areas(interior, distance, count, rng),
    };

    areas.truncate(count);
    areas
}

/// Squares half the team distance wide, at least the team distance apart
fn random_areas(interior: Rect, distance: f32, count: usize, rng: &mut impl Rng) -> Vec<Rect> {
    let side = (distance / 2.0)
        .max(1.0)
        .min(interior.size.width)
        .min(interior.size.height);
    let span_x = (interior.size.width - side).max(0.0);
    let span_y = (interior.size.height - side).max(0.0);

    let mut areas: Vec<Rect> = Vec::with_capacity(count);
    for _ in 0..count {
        let found = (0..RANDOM_AREA_ATTEMPTS).find_map(|_| {
            let candidate = Rect::new(
                interior.min_x() + span_x * rng.gen::<f32>(),
                interior.min_y() + span_y * rng.gen::<f32>(),
                side,
                side,
            );
            let clear = areas
                .iter()
                .all(|other| !candidate.overlaps_with_margin(other, distance));
            clear.then_some(candidate)
        });
        match found {
            Some(area) => areas.push(area),
            None => break,
        }
    }
    areas
}

/// Team members in team-config order, plus entities with no team
fn by_team<'c>(
    config: &'c TeamConfig,
    assignments: &[Assignment],
) -> (Vec<(&'c Team, Vec<Assignment>)>, Vec<Assignment>) {
    let mut teams: Vec<(&Team, Vec<Assignment>)> =
        config.teams.iter().map(|t| (t, Vec::new())).collect();
    let mut unassigned = Vec::new();

    for assignment in assignments {
        let slot = assignment
            .team_id
            .as_deref()
            .and_then(|id| teams.iter_mut().find(|(team, _)| team.id == id));
        match slot {
            Some((_, members)) => members.push(assignment.clone()),
            None => unassigned.push(assignment.clone()),
        }
    }

    teams.retain(|(_, members)| !members.is_empty());
    (teams, unassigned)
}
