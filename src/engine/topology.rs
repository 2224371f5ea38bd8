//! Single room versus connected-room targets

use serde::{Deserialize, Serialize};

use crate::core::error::{Result, SpawnError};
use crate::core::types::RoomId;

/// Where a populate operation places entities
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SpawnTarget {
    Room(RoomId),
    /// Ordered connected rooms; the first is the primary room
    Connected(Vec<RoomId>),
}

impl From<&str> for SpawnTarget {
    fn from(room_id: &str) -> Self {
        SpawnTarget::Room(room_id.to_string())
    }
}

impl From<String> for SpawnTarget {
    fn from(room_id: String) -> Self {
        SpawnTarget::Room(room_id)
    }
}

impl From<Vec<RoomId>> for SpawnTarget {
    fn from(rooms: Vec<RoomId>) -> Self {
        SpawnTarget::Connected(rooms)
    }
}

impl From<&[&str]> for SpawnTarget {
    fn from(rooms: &[&str]) -> Self {
        SpawnTarget::Connected(rooms.iter().map(|r| r.to_string()).collect())
    }
}

/// Resolved topology, computed once per operation
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RoomStructure {
    pub is_split: bool,
    pub connected_rooms: Vec<RoomId>,
    pub primary_room: RoomId,
    /// Summed recommended capacity, set when a split target was assessed
    #[serde(default)]
    pub total_capacity: Option<u32>,
}

impl RoomStructure {
    pub fn single(room_id: impl Into<RoomId>) -> Self {
        let room_id = room_id.into();
        Self {
            is_split: false,
            connected_rooms: vec![room_id.clone()],
            primary_room: room_id,
            total_capacity: None,
        }
    }

    pub fn resolve(target: &SpawnTarget) -> Result<Self> {
        match target {
            SpawnTarget::Room(room_id) if room_id.is_empty() => {
                Err(SpawnError::InvalidTarget("room id is empty".into()))
            }
            SpawnTarget::Room(room_id) => Ok(Self::single(room_id.clone())),
            SpawnTarget::Connected(rooms) => {
                let primary = rooms
                    .first()
                    .ok_or_else(|| SpawnError::InvalidTarget("room group is empty".into()))?;
                if rooms.iter().any(|r| r.is_empty()) {
                    return Err(SpawnError::InvalidTarget("room group contains an empty id".into()));
                }
                Ok(Self {
                    is_split: true,
                    connected_rooms: rooms.clone(),
                    primary_room: primary.clone(),
                    total_capacity: None,
                })
            }
        }
    }
}
