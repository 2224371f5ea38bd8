//! Player spawn zones, player choices and per-operation zone occupancy

use ahash::AHashMap;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::core::config::ZONE_MIN_SEPARATION;
use crate::core::types::{Entity, Position, Rect};

/// Rectangle players may pick a spawn point in
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpawnZone {
    pub id: String,
    pub area: Rect,
    /// Allowed entity types; empty allows every type
    #[serde(default)]
    pub entity_types: Vec<String>,
    pub max_entities: u32,
}

impl SpawnZone {
    pub fn new(id: impl Into<String>, area: Rect, max_entities: u32) -> Self {
        Self {
            id: id.into(),
            area,
            entity_types: Vec::new(),
            max_entities,
        }
    }

    pub fn with_types(mut self, types: &[&str]) -> Self {
        self.entity_types = types.iter().map(|t| t.to_string()).collect();
        self
    }

    pub fn allows(&self, entity: &Entity) -> bool {
        self.entity_types.is_empty() || self.entity_types.iter().any(|t| *t == entity.entity_type)
    }

    /// Unit lattice from the zone's corner, far edges excluded
    pub fn lattice(&self) -> Vec<Position> {
        let mut points = Vec::new();
        let mut row = 0;
        loop {
            let y = self.area.min_y() + row as f32;
            if y >= self.area.max_y() {
                break;
            }
            let mut col = 0;
            loop {
                let x = self.area.min_x() + col as f32;
                if x >= self.area.max_x() {
                    break;
                }
                points.push(Position::new(x, y));
                col += 1;
            }
            row += 1;
        }
        points
    }
}

/// A player's requested spawn point
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerChoice {
    pub player_id: String,
    pub zone_id: String,
    pub position: Position,
}

impl PlayerChoice {
    pub fn new(
        player_id: impl Into<String>,
        zone_id: impl Into<String>,
        position: Position,
    ) -> Self {
        Self {
            player_id: player_id.into(),
            zone_id: zone_id.into(),
            position,
        }
    }
}

/// Why a player's choice was refused
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ZoneDenial {
    #[error("requested zone {0} not found")]
    UnknownZone(String),

    #[error("entity type {entity_type} not allowed in zone {zone_id}")]
    TypeNotAllowed { entity_type: String, zone_id: String },

    #[error("zone {zone_id} is full ({occupied}/{max})")]
    ZoneFull { zone_id: String, occupied: usize, max: u32 },

    #[error("position ({:.1}, {:.1}) is outside zone {zone_id}", .position.x, .position.y)]
    OutsideZone { position: Position, zone_id: String },

    #[error("position ({:.1}, {:.1}) is already occupied", .position.x, .position.y)]
    Occupied { position: Position },
}

/// Positions claimed per zone during one operation
///
/// Every method takes the lock for its whole check-and-claim, so callers
/// never see a half-updated zone.
#[derive(Debug, Default)]
pub struct ZoneOccupancy {
    claimed: Mutex<AHashMap<String, Vec<Position>>>,
}

impl ZoneOccupancy {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn count(&self, zone_id: &str) -> usize {
        self.claimed.lock().get(zone_id).map_or(0, Vec::len)
    }

    pub fn is_occupied(&self, zone_id: &str, position: Position) -> bool {
        self.claimed
            .lock()
            .get(zone_id)
            .is_some_and(|taken| occupied(taken, position))
    }

    /// Validate an explicit choice and claim it. Checks run in order:
    /// allowed type, zone capacity, zone bounds, collision.
    pub fn claim_choice(
        &self,
        zone: &SpawnZone,
        entity: &Entity,
        position: Position,
    ) -> Result<(), ZoneDenial> {
        if !zone.allows(entity) {
            return Err(ZoneDenial::TypeNotAllowed {
                entity_type: entity.entity_type.clone(),
                zone_id: zone.id.clone(),
            });
        }

        let mut claimed = self.claimed.lock();
        let taken = claimed.entry(zone.id.clone()).or_default();

        if taken.len() >= zone.max_entities as usize {
            return Err(ZoneDenial::ZoneFull {
                zone_id: zone.id.clone(),
                occupied: taken.len(),
                max: zone.max_entities,
            });
        }
        if !zone.area.contains(position) {
            return Err(ZoneDenial::OutsideZone {
                position,
                zone_id: zone.id.clone(),
            });
        }
        if occupied(taken, position) {
            return Err(ZoneDenial::Occupied { position });
        }

        taken.push(position);
        Ok(())
    }

    /// Give back a claimed position
    pub fn release(&self, zone_id: &str, position: Position) -> bool {
        let mut claimed = self.claimed.lock();
        let Some(taken) = claimed.get_mut(zone_id) else {
            return false;
        };
        match taken.iter().position(|p| *p == position) {
            Some(index) => {
                taken.swap_remove(index);
                true
            }
            None => false,
        }
    }

    /// Claim the first free lattice point that passes `accept`, if the zone
    /// allows the entity and has room left
    pub fn claim_first_free(
        &self,
        zone: &SpawnZone,
        entity: &Entity,
        mut accept: impl FnMut(Position) -> bool,
    ) -> Option<Position> {
        if !zone.allows(entity) {
            return None;
        }
        let mut claimed = self.claimed.lock();
        let taken = claimed.entry(zone.id.clone()).or_default();
        if taken.len() >= zone.max_entities as usize {
            return None;
        }

        let position = zone
            .lattice()
            .into_iter()
            .find(|p| !occupied(taken, *p) && accept(*p))?;
        taken.push(position);
        Some(position)
    }

    /// Up to `limit` free lattice points nearest to `near`
    pub fn nearest_free(&self, zone: &SpawnZone, near: Position, limit: usize) -> Vec<Position> {
        let claimed = self.claimed.lock();
        let taken = claimed.get(&zone.id).map(Vec::as_slice).unwrap_or(&[]);

        let mut free: Vec<Position> = zone
            .lattice()
            .into_iter()
            .filter(|p| !occupied(taken, *p))
            .collect();
        free.sort_by_key(|p| ordered_float::OrderedFloat(p.distance(&near)));
        free.truncate(limit);
        free
    }
}

fn occupied(taken: &[Position], position: Position) -> bool {
    taken
        .iter()
        .any(|p| p.distance(&position) < ZONE_MIN_SEPARATION)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn zone() -> SpawnZone {
        SpawnZone::new("north", Rect::new(0.0, 0.0, 3.0, 2.0), 2).with_types(&["player"])
    }

    #[test]
    fn test_zone_lattice() {
        let points = zone().lattice();
        assert_eq!(points.len(), 6);
        assert_eq!(points[0], Position::new(0.0, 0.0));
        assert_eq!(points[1], Position::new(1.0, 0.0));
    }

    #[test]
    fn test_choice_checks_in_order() {
        let occupancy = ZoneOccupancy::new();
        let zone = zone();
        let player = Entity::new("p1", "player");
        let goblin = Entity::new("g1", "goblin");

        assert!(matches!(
            occupancy.claim_choice(&zone, &goblin, Position::new(50.0, 50.0)),
            Err(ZoneDenial::TypeNotAllowed { .. })
        ));

        let outside = occupancy
            .claim_choice(&zone, &player, Position::new(50.0, 50.0))
            .unwrap_err();
        assert!(outside.to_string().contains("outside zone"));

        occupancy.claim_choice(&zone, &player, Position::new(1.0, 1.0)).unwrap();
        assert!(matches!(
            occupancy.claim_choice(&zone, &player, Position::new(1.5, 1.0)),
            Err(ZoneDenial::Occupied { .. })
        ));

        occupancy.claim_choice(&zone, &player, Position::new(2.5, 0.0)).unwrap();
        assert!(matches!(
            occupancy.claim_choice(&zone, &player, Position::new(0.0, 0.0)),
            Err(ZoneDenial::ZoneFull { .. })
        ));
        assert_eq!(occupancy.count("north"), 2);
    }

    #[test]
    fn test_claim_first_free_skips_taken_points() {
        let occupancy = ZoneOccupancy::new();
        let zone = zone();
        let player = Entity::new("p1", "player");

        let first = occupancy.claim_first_free(&zone, &player, |_| true).unwrap();
        assert_eq!(first, Position::new(0.0, 0.0));
        let second = occupancy.claim_first_free(&zone, &player, |_| true).unwrap();
        assert_eq!(second, Position::new(1.0, 0.0));
        // Capacity of two reached
        assert!(occupancy.claim_first_free(&zone, &player, |_| true).is_none());

        assert!(occupancy.release("north", first));
        assert!(!occupancy.release("north", first));
        assert_eq!(occupancy.count("north"), 1);
    }

    #[test]
    fn test_nearest_free_sorted_by_distance() {
        let occupancy = ZoneOccupancy::new();
        let zone = SpawnZone::new("z", Rect::new(0.0, 0.0, 5.0, 1.0), 5);
        let alternatives = occupancy.nearest_free(&zone, Position::new(4.0, 0.0), 3);
        assert_eq!(
            alternatives,
            vec![Position::new(4.0, 0.0), Position::new(3.0, 0.0), Position::new(2.0, 0.0)]
        );
    }
}
