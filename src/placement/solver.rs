//! Constraint solver: accept/reject single positions and bounded search

use std::fmt;
use std::sync::Arc;

use rand::Rng;

use crate::core::config::{GRIDLESS_INSET, OCCUPIED_EPSILON};
use crate::core::error::{Result, SpawnError};
use crate::core::types::{Entity, Position, Rect};
use crate::engine::result::PlacedEntity;
use crate::placement::constraints::{ConstraintRule, ConstraintViolation, SpatialConstraints};
use crate::spatial::{RoomGeometry, RoomLayout, SpatialIndex};

type Check = std::result::Result<(), ConstraintViolation>;

/// Validates candidate positions and searches rooms for acceptable ones
#[derive(Clone)]
pub struct ConstraintSolver {
    max_attempts: u32,
    /// Begin grid scans at a random lattice point instead of the corner
    random_start: bool,
    /// Collaborator asked whether an entity may stand somewhere; the room
    /// geometry answers when unset
    spatial: Option<Arc<dyn SpatialIndex>>,
}

impl fmt::Debug for ConstraintSolver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConstraintSolver")
            .field("max_attempts", &self.max_attempts)
            .field("random_start", &self.random_start)
            .field("spatial", &self.spatial.is_some())
            .finish()
    }
}

impl Default for ConstraintSolver {
    fn default() -> Self {
        Self::new(100)
    }
}

impl ConstraintSolver {
    pub fn new(max_attempts: u32) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            random_start: false,
            spatial: None,
        }
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Same solver with a different attempt budget
    pub fn with_max_attempts(&self, max_attempts: u32) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            ..self.clone()
        }
    }

    /// Rotate the grid scan to start at a random lattice point. The scan
    /// still visits every point once, wrapping around.
    pub fn with_random_start(mut self, random_start: bool) -> Self {
        self.random_start = random_start;
        self
    }

    /// Route occupancy questions through a spatial collaborator
    pub fn with_spatial(mut self, spatial: Arc<dyn SpatialIndex>) -> Self {
        self.spatial = Some(spatial);
        self
    }

    /// Whether `entity` may stand at `position`, ignoring other entities
    pub fn can_occupy(&self, room: &RoomGeometry, entity: &Entity, position: Position) -> bool {
        match &self.spatial {
            Some(spatial) => spatial.can_occupy(room, entity, position),
            None => room.can_occupy(position),
        }
    }

    /// Run minimum distance, wall proximity, line of sight and area of
    /// effect checks in that order, stopping at the first violation.
    pub fn validate_position(
        &self,
        room: &RoomGeometry,
        position: Position,
        entity: &Entity,
        constraints: &SpatialConstraints,
        placed: &[PlacedEntity],
    ) -> Check {
        check_min_distance(position, entity, constraints, placed)?;
        check_wall_proximity(room, position, constraints.wall_proximity)?;
        check_line_of_sight(room, position, entity, constraints, placed)?;
        check_area_of_effect(position, entity, constraints, placed)?;
        Ok(())
    }

    /// Search the whole room for up to `max_wanted` acceptable positions
    pub fn find_valid_positions<R: Rng + ?Sized>(
        &self,
        room: &RoomGeometry,
        entity: &Entity,
        constraints: &SpatialConstraints,
        placed: &[PlacedEntity],
        max_wanted: usize,
        rng: &mut R,
    ) -> Result<Vec<Position>> {
        self.find_valid_positions_within(
            room,
            room.bounds(),
            entity,
            constraints,
            placed,
            max_wanted,
            rng,
        )
    }

    /// Search a sub-area of the room.
    ///
    /// Grid rooms scan a lattice over the area and stop early once enough
    /// positions are accepted. Gridless rooms sample uniformly inside the
    /// area inset by a margin, up to twice the attempt budget.
    #[allow(clippy::too_many_arguments)]
    pub fn find_valid_positions_within<R: Rng + ?Sized>(
        &self,
        room: &RoomGeometry,
        area: Rect,
        entity: &Entity,
        constraints: &SpatialConstraints,
        placed: &[PlacedEntity],
        max_wanted: usize,
        rng: &mut R,
    ) -> Result<Vec<Position>> {
        let mut search = Search::new(max_wanted);
        if max_wanted == 0 {
            return Ok(search.accepted);
        }

        match room.layout {
            RoomLayout::Grid { cell_size } => {
                let mut lattice = lattice_points(area, cell_size);
                if self.random_start && lattice.len() > 1 {
                    let start = rng.gen_range(0..lattice.len());
                    lattice.rotate_left(start);
                }
                for position in lattice {
                    if search.is_full() {
                        break;
                    }
                    let verdict = self.screen(room, position, entity, constraints, placed);
                    search.record(verdict, position);
                }
            }
            RoomLayout::Gridless => {
                let inner = area.inset(GRIDLESS_INSET);
                let budget = self.max_attempts.saturating_mul(2);
                while !search.is_full() && search.attempts < budget {
                    let position = Position::new(
                        inner.min_x() + inner.size.width * rng.gen::<f32>(),
                        inner.min_y() + inner.size.height * rng.gen::<f32>(),
                    );
                    let verdict = self.screen(room, position, entity, constraints, placed);
                    search.record(verdict, position);
                }
            }
        }

        search.finish(entity)
    }

    /// Occupancy filter followed by the full constraint check
    fn screen(
        &self,
        room: &RoomGeometry,
        position: Position,
        entity: &Entity,
        constraints: &SpatialConstraints,
        placed: &[PlacedEntity],
    ) -> std::result::Result<(), ConstraintRule> {
        if !self.can_occupy(room, entity, position) || is_taken(position, placed) {
            return Err(ConstraintRule::Occupancy);
        }
        self.validate_position(room, position, entity, constraints, placed)
            .map_err(|violation| violation.rule)
    }
}

/// True when a placed entity already stands at (or next to) the position
pub fn is_taken(position: Position, placed: &[PlacedEntity]) -> bool {
    placed
        .iter()
        .any(|p| p.position.distance(&position) < OCCUPIED_EPSILON)
}

/// Lattice over an area: starts one step in from the near edge and stops
/// before the far edge. Areas thinner than two steps yield their midline.
pub fn lattice_points(area: Rect, step: f32) -> Vec<Position> {
    let step = if step > 0.0 { step } else { 1.0 };
    let xs = lattice_axis(area.min_x(), area.max_x(), step);
    let ys = lattice_axis(area.min_y(), area.max_y(), step);

    let mut points = Vec::with_capacity(xs.len() * ys.len());
    for &x in &xs {
        for &y in &ys {
            points.push(Position::new(x, y));
        }
    }
    points
}

fn lattice_axis(min: f32, max: f32, step: f32) -> Vec<f32> {
    let mut values = Vec::new();
    let mut i = 1;
    loop {
        let value = min + step * i as f32;
        if value >= max - f32::EPSILON {
            break;
        }
        values.push(value);
        i += 1;
    }
    if values.is_empty() {
        values.push((min + max) / 2.0);
    }
    values
}

struct Search {
    wanted: usize,
    accepted: Vec<Position>,
    attempts: u32,
    rules_failed: Vec<ConstraintRule>,
}

impl Search {
    fn new(wanted: usize) -> Self {
        Self {
            wanted,
            accepted: Vec::new(),
            attempts: 0,
            rules_failed: Vec::new(),
        }
    }

    fn is_full(&self) -> bool {
        self.accepted.len() >= self.wanted
    }

    fn record(&mut self, outcome: std::result::Result<(), ConstraintRule>, position: Position) {
        self.attempts += 1;
        match outcome {
            Ok(()) => self.accepted.push(position),
            Err(rule) => {
                if !self.rules_failed.contains(&rule) {
                    self.rules_failed.push(rule);
                }
            }
        }
    }

    fn finish(self, entity: &Entity) -> Result<Vec<Position>> {
        if self.accepted.is_empty() {
            tracing::debug!(
                entity_type = %entity.entity_type,
                attempts = self.attempts,
                rules = ?self.rules_failed,
                "Position search exhausted"
            );
            return Err(SpawnError::NoValidPositions {
                entity_type: entity.entity_type.clone(),
                attempts: self.attempts,
                rules_failed: self.rules_failed,
            });
        }
        Ok(self.accepted)
    }
}

fn check_min_distance(
    position: Position,
    entity: &Entity,
    constraints: &SpatialConstraints,
    placed: &[PlacedEntity],
) -> Check {
    if constraints.min_distance.is_empty() {
        return Ok(());
    }
    for other in placed {
        let required =
            constraints.required_distance(&entity.entity_type, &other.entity.entity_type);
        let Some(required) = required else {
            continue;
        };
        let distance = position.distance(&other.position);
        if distance < required {
            return Err(ConstraintViolation::new(
                ConstraintRule::MinDistance,
                format!(
                    "{} too close to {} '{}': {:.2} < {:.2}",
                    entity.entity_type,
                    other.entity.entity_type,
                    other.entity.id,
                    distance,
                    required
                ),
                distance,
                required,
            ));
        }
    }
    Ok(())
}

fn check_wall_proximity(room: &RoomGeometry, position: Position, margin: f32) -> Check {
    if margin <= 0.0 {
        return Ok(());
    }
    let bounds = room.bounds();
    let clearance = (position.x - bounds.min_x())
        .min(position.y - bounds.min_y())
        .min(bounds.max_x() - position.x)
        .min(bounds.max_y() - position.y);

    if clearance < margin {
        return Err(ConstraintViolation::new(
            ConstraintRule::WallProximity,
            format!(
                "position ({:.2}, {:.2}) is {:.2} from a wall, {:.2} required",
                position.x, position.y, clearance, margin
            ),
            clearance,
            margin,
        ));
    }
    Ok(())
}

fn check_line_of_sight(
    room: &RoomGeometry,
    position: Position,
    entity: &Entity,
    constraints: &SpatialConstraints,
    placed: &[PlacedEntity],
) -> Check {
    let rules = &constraints.line_of_sight;
    if rules.is_empty() {
        return Ok(());
    }
    let range = constraints.sight_range;

    for pair in &rules.required {
        if pair.from == entity.entity_type {
            let mut targets = of_type(placed, &pair.to).peekable();
            if targets.peek().is_some()
                && !targets.any(|t| room.has_line_of_sight(position, t.position, range))
            {
                return Err(sight_violation(
                    format!("{} cannot see any {}", pair.from, pair.to),
                    nearest(position, of_type(placed, &pair.to)),
                    range,
                ));
            }
        }
        if pair.to == entity.entity_type {
            let mut sources = of_type(placed, &pair.from).peekable();
            if sources.peek().is_some()
                && !sources.any(|s| room.has_line_of_sight(s.position, position, range))
            {
                return Err(sight_violation(
                    format!("no {} can see this {}", pair.from, pair.to),
                    nearest(position, of_type(placed, &pair.from)),
                    range,
                ));
            }
        }
    }

    for pair in &rules.blocked {
        if pair.from == entity.entity_type {
            let seen = of_type(placed, &pair.to)
                .find(|t| room.has_line_of_sight(position, t.position, range));
            if let Some(seen) = seen {
                return Err(sight_violation(
                    format!("{} would see {} '{}'", pair.from, pair.to, seen.entity.id),
                    position.distance(&seen.position),
                    range,
                ));
            }
        }
        if pair.to == entity.entity_type {
            let seer = of_type(placed, &pair.from)
                .find(|s| room.has_line_of_sight(s.position, position, range));
            if let Some(seer) = seer {
                return Err(sight_violation(
                    format!("{} '{}' would see this {}", pair.from, seer.entity.id, pair.to),
                    position.distance(&seer.position),
                    range,
                ));
            }
        }
    }
    Ok(())
}

fn check_area_of_effect(
    position: Position,
    entity: &Entity,
    constraints: &SpatialConstraints,
    placed: &[PlacedEntity],
) -> Check {
    if constraints.area_of_effect.is_empty() {
        return Ok(());
    }

    if let Some(radius) = constraints.effect_radius(&entity.entity_type) {
        for other in placed {
            let distance = position.distance(&other.position);
            if distance < radius {
                return Err(ConstraintViolation::new(
                    ConstraintRule::AreaOfEffect,
                    format!(
                        "{} '{}' inside this {}'s radius: {:.2} < {:.2}",
                        other.entity.entity_type,
                        other.entity.id,
                        entity.entity_type,
                        distance,
                        radius
                    ),
                    distance,
                    radius,
                ));
            }
        }
    }

    for other in placed {
        if let Some(radius) = constraints.effect_radius(&other.entity.entity_type) {
            let distance = position.distance(&other.position);
            if distance < radius {
                return Err(ConstraintViolation::new(
                    ConstraintRule::AreaOfEffect,
                    format!(
                        "inside {} '{}' radius: {:.2} < {:.2}",
                        other.entity.entity_type, other.entity.id, distance, radius
                    ),
                    distance,
                    radius,
                ));
            }
        }
    }
    Ok(())
}

fn of_type<'a>(
    placed: &'a [PlacedEntity],
    entity_type: &'a str,
) -> impl Iterator<Item = &'a PlacedEntity> + 'a {
    placed.iter().filter(move |p| p.entity.entity_type == entity_type)
}

fn sight_violation(message: String, measured: f32, range: f32) -> ConstraintViolation {
    ConstraintViolation::new(ConstraintRule::LineOfSight, message, measured, range)
}

fn nearest<'a>(position: Position, others: impl Iterator<Item = &'a PlacedEntity>) -> f32 {
    others
        .map(|p| position.distance(&p.position))
        .fold(f32::INFINITY, f32::min)
}
