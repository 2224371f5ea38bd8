//! Scenario files for the command-line runner
//!
//! A scenario bundles rooms, selection tables, an optional engine config
//! and one spawn request in a single TOML document.

use std::path::Path;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::capacity::FeelingCapacityModel;
use crate::core::config::EngineConfig;
use crate::core::error::{Result, SpawnError};
use crate::core::types::RoomId;
use crate::engine::{SpawnEngine, SpawnTarget};
use crate::events::EventSink;
use crate::request::SpawnRequest;
use crate::selection::{SelectionRegistry, SelectionTable};
use crate::spatial::{InMemorySpatial, RoomGeometry};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Scenario {
    #[serde(default)]
    pub engine: EngineConfig,
    pub rooms: Vec<RoomGeometry>,
    #[serde(default)]
    pub tables: Vec<SelectionTable>,
    /// Room to populate; the first room when absent
    #[serde(default)]
    pub target: Option<RoomId>,
    pub request: SpawnRequest,
}

impl Scenario {
    pub fn from_toml_str(source: &str) -> Result<Self> {
        let scenario: Scenario = toml::from_str(source)?;
        scenario.engine.validate()?;
        if scenario.rooms.is_empty() {
            return Err(SpawnError::InvalidTarget("scenario defines no rooms".into()));
        }
        Ok(scenario)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let source = std::fs::read_to_string(path)?;
        Self::from_toml_str(&source)
    }

    /// Single target room, or every room in file order when `split` is set
    pub fn target(&self, split: bool) -> SpawnTarget {
        if split {
            return SpawnTarget::Connected(self.rooms.iter().map(|r| r.id.clone()).collect());
        }
        let room_id = self
            .target
            .clone()
            .or_else(|| self.rooms.first().map(|r| r.id.clone()))
            .unwrap_or_default();
        SpawnTarget::Room(room_id)
    }

    pub fn spatial(&self) -> InMemorySpatial {
        let spatial = InMemorySpatial::new();
        for room in &self.rooms {
            spatial.insert_room(room.clone());
        }
        spatial
    }

    pub fn registry(&self) -> SelectionRegistry {
        let registry = SelectionRegistry::new();
        for table in &self.tables {
            registry.register_table(table.name.clone(), table.clone());
        }
        registry
    }

    /// Engine over in-memory rooms with the feeling-based capacity model
    pub fn build_engine(&self, events: Arc<dyn EventSink>) -> SpawnEngine {
        SpawnEngine::new(Arc::new(self.spatial()))
            .with_config(self.engine.clone())
            .with_capacity_model(Arc::new(FeelingCapacityModel::new()))
            .with_registry(Arc::new(self.registry()))
            .with_event_sink(events)
    }
}
