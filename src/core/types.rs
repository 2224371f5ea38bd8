//! Core type definitions used throughout the codebase

use serde::{Deserialize, Serialize};

/// Room identifier as understood by the spatial collaborator
pub type RoomId = String;

/// Type tags that mark an entity as player-controlled
pub const PLAYER_TYPES: [&str; 3] = ["player", "character", "pc"];

/// A game entity to be placed. The engine never creates or owns these.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Entity {
    pub id: String,
    pub entity_type: String,
}

impl Entity {
    pub fn new(id: impl Into<String>, entity_type: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            entity_type: entity_type.into(),
        }
    }

    pub fn is_player(&self) -> bool {
        PLAYER_TYPES.contains(&self.entity_type.as_str())
    }
}

/// 2D position in room units
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub x: f32,
    pub y: f32,
}

impl Position {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    pub fn distance(&self, other: &Self) -> f32 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        (dx * dx + dy * dy).sqrt()
    }

    /// Offset by a relative vector
    pub fn offset(&self, dx: f32, dy: f32) -> Self {
        Self {
            x: self.x + dx,
            y: self.y + dy,
        }
    }
}

impl std::ops::Add for Position {
    type Output = Self;
    fn add(self, rhs: Self) -> Self {
        Self { x: self.x + rhs.x, y: self.y + rhs.y }
    }
}

impl std::ops::Mul<f32> for Position {
    type Output = Self;
    fn mul(self, rhs: f32) -> Self {
        Self { x: self.x * rhs, y: self.y * rhs }
    }
}

/// Width and height of a room or area
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Dimensions {
    pub width: f32,
    pub height: f32,
}

impl Dimensions {
    pub fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }

    pub fn area(&self) -> f32 {
        self.width * self.height
    }
}

/// Axis-aligned rectangle anchored at its top-left corner
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    pub origin: Position,
    pub size: Dimensions,
}

impl Rect {
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            origin: Position::new(x, y),
            size: Dimensions::new(width, height),
        }
    }

    pub fn from_dimensions(size: Dimensions) -> Self {
        Self {
            origin: Position::default(),
            size,
        }
    }

    pub fn min_x(&self) -> f32 {
        self.origin.x
    }

    pub fn min_y(&self) -> f32 {
        self.origin.y
    }

    pub fn max_x(&self) -> f32 {
        self.origin.x + self.size.width
    }

    pub fn max_y(&self) -> f32 {
        self.origin.y + self.size.height
    }

    pub fn center(&self) -> Position {
        Position::new(
            self.origin.x + self.size.width / 2.0,
            self.origin.y + self.size.height / 2.0,
        )
    }

    /// Inclusive containment check
    pub fn contains(&self, pos: Position) -> bool {
        pos.x >= self.min_x()
            && pos.x <= self.max_x()
            && pos.y >= self.min_y()
            && pos.y <= self.max_y()
    }

    /// Strict interior containment (edges excluded)
    pub fn contains_strict(&self, pos: Position) -> bool {
        pos.x > self.min_x() && pos.x < self.max_x() && pos.y > self.min_y() && pos.y < self.max_y()
    }

    /// Clamp a position into this rectangle
    pub fn clamp(&self, pos: Position) -> Position {
        Position::new(
            pos.x.max(self.min_x()).min(self.max_x()),
            pos.y.max(self.min_y()).min(self.max_y()),
        )
    }

    /// Shrink every edge by `margin`; collapses to the center when too small
    pub fn inset(&self, margin: f32) -> Rect {
        let width = (self.size.width - 2.0 * margin).max(0.0);
        let height = (self.size.height - 2.0 * margin).max(0.0);
        let center = self.center();
        Rect::new(center.x - width / 2.0, center.y - height / 2.0, width, height)
    }

    /// True when the rectangles come closer than `separation` on both axes
    pub fn overlaps_with_margin(&self, other: &Rect, separation: f32) -> bool {
        self.min_x() < other.max_x() + separation
            && self.max_x() + separation > other.min_x()
            && self.min_y() < other.max_y() + separation
            && self.max_y() + separation > other.min_y()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_position_distance() {
        let a = Position::new(2.0, 2.0);
        let b = Position::new(2.2, 2.2);
        assert!((a.distance(&b) - 0.2828).abs() < 0.001);
        assert_eq!(a.distance(&b), b.distance(&a));
    }

    #[test]
    fn test_rect_contains_and_clamp() {
        let rect = Rect::new(2.0, 2.0, 4.0, 4.0);
        assert!(rect.contains(Position::new(2.0, 6.0)));
        assert!(!rect.contains(Position::new(6.1, 3.0)));
        assert!(!rect.contains_strict(Position::new(2.0, 3.0)));

        let clamped = rect.clamp(Position::new(-5.0, 10.0));
        assert_eq!(clamped, Position::new(2.0, 6.0));
    }

    #[test]
    fn test_rect_inset() {
        let room = Rect::from_dimensions(Dimensions::new(10.0, 10.0));
        let inner = room.inset(1.0);
        assert_eq!(inner, Rect::new(1.0, 1.0, 8.0, 8.0));

        // Too-large margin collapses to the center point
        let collapsed = room.inset(20.0);
        assert_eq!(collapsed.center(), Position::new(5.0, 5.0));
        assert_eq!(collapsed.size.area(), 0.0);
    }

    #[test]
    fn test_rect_overlap_with_margin() {
        let a = Rect::new(0.0, 0.0, 2.0, 2.0);
        let b = Rect::new(4.0, 0.0, 2.0, 2.0);
        assert!(!a.overlaps_with_margin(&b, 1.0));
        assert!(a.overlaps_with_margin(&b, 3.0));
    }

    #[test]
    fn test_player_detection() {
        assert!(Entity::new("p1", "player").is_player());
        assert!(Entity::new("p2", "pc").is_player());
        assert!(!Entity::new("g1", "enemy").is_player());
    }
}
