//! Entity groups: what to spawn and where it comes from

use serde::{Deserialize, Serialize};

use crate::core::types::Entity;
use crate::request::quantity::QuantitySpec;

/// Exactly one supply of entities for a group
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntitySource {
    /// Caller-supplied entities, taken in order
    Inline(Vec<Entity>),
    /// Name of a registered selection table
    Table(String),
}

/// Whether a group may receive the same table entry twice
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SelectionMode {
    #[default]
    Repeatable,
    /// One-of-a-kind draws, e.g. unique loot
    Unique,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntityGroup {
    pub id: String,
    pub entity_type: String,
    pub source: EntitySource,
    pub quantity: QuantitySpec,
    #[serde(default)]
    pub selection: SelectionMode,
    #[serde(default)]
    pub team_id: Option<String>,
}

impl EntityGroup {
    pub fn inline(
        id: impl Into<String>,
        entity_type: impl Into<String>,
        entities: Vec<Entity>,
        quantity: QuantitySpec,
    ) -> Self {
        Self {
            id: id.into(),
            entity_type: entity_type.into(),
            source: EntitySource::Inline(entities),
            quantity,
            selection: SelectionMode::default(),
            team_id: None,
        }
    }

    /// Inline group whose quantity is simply the number of entities given
    pub fn of_entities(
        id: impl Into<String>,
        entity_type: impl Into<String>,
        entities: Vec<Entity>,
    ) -> Self {
        let count = entities.len() as u32;
        Self::inline(id, entity_type, entities, QuantitySpec::fixed(count))
    }

    pub fn from_table(
        id: impl Into<String>,
        entity_type: impl Into<String>,
        table: impl Into<String>,
        quantity: QuantitySpec,
    ) -> Self {
        Self {
            id: id.into(),
            entity_type: entity_type.into(),
            source: EntitySource::Table(table.into()),
            quantity,
            selection: SelectionMode::default(),
            team_id: None,
        }
    }

    pub fn with_team(mut self, team_id: impl Into<String>) -> Self {
        self.team_id = Some(team_id.into());
        self
    }

    pub fn with_selection(mut self, selection: SelectionMode) -> Self {
        self.selection = selection;
        self
    }

    pub fn unique(self) -> Self {
        self.with_selection(SelectionMode::Unique)
    }
}
