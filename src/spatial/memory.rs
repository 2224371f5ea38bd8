//! In-process room store

use ahash::AHashMap;
use async_trait::async_trait;
use parking_lot::RwLock;

use crate::core::error::Result;
use crate::core::types::{Dimensions, RoomId};
use crate::spatial::room::{unknown_room, RoomGeometry, SpatialIndex};

/// Room geometry held in memory, safe to share between operations
#[derive(Default)]
pub struct InMemorySpatial {
    rooms: RwLock<AHashMap<RoomId, RoomGeometry>>,
}

impl InMemorySpatial {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_room(self, room: RoomGeometry) -> Self {
        self.insert_room(room);
        self
    }

    /// Insert or replace a room
    pub fn insert_room(&self, room: RoomGeometry) {
        self.rooms.write().insert(room.id.clone(), room);
    }

    pub fn remove_room(&self, room_id: &str) -> Option<RoomGeometry> {
        self.rooms.write().remove(room_id)
    }

    /// Resize a stored room, typically after a recorded scale
    pub fn resize_room(&self, room_id: &str, dimensions: Dimensions) -> Result<()> {
        let mut rooms = self.rooms.write();
        let room = rooms.get_mut(room_id).ok_or_else(|| unknown_room(room_id))?;
        room.dimensions = dimensions;
        Ok(())
    }

    pub fn room_ids(&self) -> Vec<RoomId> {
        let mut ids: Vec<RoomId> = self.rooms.read().keys().cloned().collect();
        ids.sort();
        ids
    }

    pub fn len(&self) -> usize {
        self.rooms.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.rooms.read().is_empty()
    }
}

#[async_trait]
impl SpatialIndex for InMemorySpatial {
    async fn room(&self, room_id: &str) -> Result<RoomGeometry> {
        self.rooms
            .read()
            .get(room_id)
            .cloned()
            .ok_or_else(|| unknown_room(room_id))
    }
}
