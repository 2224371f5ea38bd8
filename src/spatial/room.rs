//! Room geometry as handed to the placement engine

use async_trait::async_trait;
use geo::{coord, Intersects, Line};
use serde::{Deserialize, Serialize};

use crate::core::error::{Result, SpawnError};
use crate::core::types::{Dimensions, Entity, Position, Rect, RoomId};

/// How positions inside a room are addressed
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RoomLayout {
    /// Discrete cells; placement scans a unit lattice
    Grid {
        #[serde(default = "default_cell_size")]
        cell_size: f32,
    },
    /// Continuous floor; placement samples randomly
    Gridless,
}

fn default_cell_size() -> f32 {
    1.0
}

impl Default for RoomLayout {
    fn default() -> Self {
        RoomLayout::Grid {
            cell_size: default_cell_size(),
        }
    }
}

/// Impassable rectangle inside a room
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Obstacle {
    pub area: Rect,
    #[serde(default)]
    pub blocks_sight: bool,
}

impl Obstacle {
    pub fn new(area: Rect, blocks_sight: bool) -> Self {
        Self { area, blocks_sight }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoomGeometry {
    pub id: RoomId,
    pub dimensions: Dimensions,
    #[serde(default)]
    pub layout: RoomLayout,
    #[serde(default)]
    pub obstacles: Vec<Obstacle>,
}

impl RoomGeometry {
    pub fn new(id: impl Into<RoomId>, dimensions: Dimensions, layout: RoomLayout) -> Self {
        Self {
            id: id.into(),
            dimensions,
            layout,
            obstacles: Vec::new(),
        }
    }

    pub fn grid(id: impl Into<RoomId>, width: f32, height: f32) -> Self {
        Self::new(id, Dimensions::new(width, height), RoomLayout::default())
    }

    pub fn gridless(id: impl Into<RoomId>, width: f32, height: f32) -> Self {
        Self::new(id, Dimensions::new(width, height), RoomLayout::Gridless)
    }

    pub fn with_obstacle(mut self, obstacle: Obstacle) -> Self {
        self.obstacles.push(obstacle);
        self
    }

    /// Same room planned at different dimensions; obstacles are kept
    pub fn with_dimensions(&self, dimensions: Dimensions) -> Self {
        Self {
            dimensions,
            ..self.clone()
        }
    }

    pub fn bounds(&self) -> Rect {
        Rect::from_dimensions(self.dimensions)
    }

    pub fn is_grid(&self) -> bool {
        matches!(self.layout, RoomLayout::Grid { .. })
    }

    /// Inside the room and not inside any obstacle
    pub fn can_occupy(&self, pos: Position) -> bool {
        self.bounds().contains(pos)
            && !self
                .obstacles
                .iter()
                .any(|obstacle| obstacle.area.contains_strict(pos))
    }

    /// Visible when within `range` and no sight-blocking obstacle crosses
    /// the segment between the two points
    pub fn has_line_of_sight(&self, from: Position, to: Position, range: f32) -> bool {
        if from.distance(&to) > range {
            return false;
        }

        let segment = Line::new(
            coord! { x: from.x as f64, y: from.y as f64 },
            coord! { x: to.x as f64, y: to.y as f64 },
        );

        !self
            .obstacles
            .iter()
            .filter(|obstacle| obstacle.blocks_sight)
            .any(|obstacle| segment.intersects(&to_geo_polygon(&obstacle.area)))
    }
}

fn to_geo_polygon(rect: &Rect) -> geo::Polygon<f64> {
    geo::Rect::new(
        coord! { x: rect.min_x() as f64, y: rect.min_y() as f64 },
        coord! { x: rect.max_x() as f64, y: rect.max_y() as f64 },
    )
    .to_polygon()
}

/// Source of room geometry for placement
///
/// The engine only reads geometry. Applying a recorded scale to the real
/// room is left to the implementor.
#[async_trait]
pub trait SpatialIndex: Send + Sync {
    /// Fetch the current geometry of a room
    async fn room(&self, room_id: &str) -> Result<RoomGeometry>;

    /// Whether `entity` may stand at `pos` in `room`, a geometry this index
    /// returned. The default only consults the room's bounds and obstacles;
    /// override it for occupants or walls the geometry does not model.
    fn can_occupy(&self, room: &RoomGeometry, _entity: &Entity, pos: Position) -> bool {
        room.can_occupy(pos)
    }
}

pub(crate) fn unknown_room(room_id: &str) -> SpawnError {
    SpawnError::Spatial(format!("unknown room '{}'", room_id))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn room_with_pillar() -> RoomGeometry {
        RoomGeometry::grid("hall", 10.0, 10.0)
            .with_obstacle(Obstacle::new(Rect::new(4.0, 4.0, 2.0, 2.0), true))
    }

    #[test]
    fn test_can_occupy() {
        let room = room_with_pillar();
        assert!(room.can_occupy(Position::new(1.0, 1.0)));
        assert!(!room.can_occupy(Position::new(5.0, 5.0)));
        assert!(!room.can_occupy(Position::new(11.0, 5.0)));
        // Obstacle edges are walkable
        assert!(room.can_occupy(Position::new(4.0, 5.0)));
    }

    #[test]
    fn test_line_of_sight_range() {
        let room = RoomGeometry::gridless("open", 20.0, 20.0);
        assert!(room.has_line_of_sight(Position::new(1.0, 1.0), Position::new(5.0, 1.0), 8.0));
        assert!(!room.has_line_of_sight(Position::new(1.0, 1.0), Position::new(15.0, 1.0), 8.0));
    }

    #[test]
    fn test_line_of_sight_blocked_by_obstacle() {
        let room = room_with_pillar();
        assert!(!room.has_line_of_sight(Position::new(2.0, 5.0), Position::new(8.0, 5.0), 8.0));
        assert!(room.has_line_of_sight(Position::new(2.0, 1.0), Position::new(8.0, 1.0), 8.0));
    }

    #[test]
    fn test_transparent_obstacle_does_not_block() {
        let room = RoomGeometry::grid("hall", 10.0, 10.0)
            .with_obstacle(Obstacle::new(Rect::new(4.0, 4.0, 2.0, 2.0), false));
        assert!(room.has_line_of_sight(Position::new(2.0, 5.0), Position::new(8.0, 5.0), 8.0));
    }

    #[test]
    fn test_with_dimensions_keeps_obstacles() {
        let scaled = room_with_pillar().with_dimensions(Dimensions::new(18.0, 14.4));
        assert_eq!(scaled.dimensions.width, 18.0);
        assert_eq!(scaled.obstacles.len(), 1);
        assert_eq!(scaled.id, "hall");
    }
}
