//! Declarative spawn requests

pub mod dice;
pub mod group;
pub mod quantity;
pub mod team;
pub mod validate;
pub mod zone;

use serde::{Deserialize, Serialize};

use crate::capacity::SpatialFeeling;
use crate::core::config::SCALING_BUFFER;
use crate::placement::{PlacementRules, SpatialConstraints};

pub use dice::DiceExpr;
pub use group::{EntityGroup, EntitySource, SelectionMode};
pub use quantity::QuantitySpec;
pub use team::{Allegiance, Cohesion, FormationPattern, Team, TeamConfig, TeamPlacement};
pub use validate::validate_request;
pub use zone::{PlayerChoice, SpawnZone, ZoneDenial, ZoneOccupancy};

/// Arrangement strategy for the selected entities
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SpawnPattern {
    #[default]
    Scattered,
    Formation,
    TeamBased,
    PlayerChoice,
    Clustered,
}

/// Whether and how an overcrowded room is grown before placement
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScalingPolicy {
    pub enabled: bool,
    pub target_feeling: SpatialFeeling,
    /// Extra space multiplier for the sizing query
    pub buffer_factor: f32,
    /// Publish room-scaled events
    pub emit_events: bool,
}

impl Default for ScalingPolicy {
    fn default() -> Self {
        Self {
            enabled: true,
            target_feeling: SpatialFeeling::Normal,
            buffer_factor: SCALING_BUFFER,
            emit_events: true,
        }
    }
}

impl ScalingPolicy {
    pub fn disabled() -> Self {
        Self {
            enabled: false,
            ..Default::default()
        }
    }

    pub fn with_feeling(mut self, feeling: SpatialFeeling) -> Self {
        self.target_feeling = feeling;
        self
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SpawnRequest {
    pub groups: Vec<EntityGroup>,
    #[serde(default)]
    pub pattern: SpawnPattern,
    #[serde(default)]
    pub constraints: SpatialConstraints,
    #[serde(default)]
    pub rules: PlacementRules,
    #[serde(default)]
    pub teams: Option<TeamConfig>,
    #[serde(default)]
    pub scaling: Option<ScalingPolicy>,
    /// Formation used by the formation pattern
    #[serde(default)]
    pub formation: Option<FormationPattern>,
    #[serde(default)]
    pub player_zones: Vec<SpawnZone>,
    #[serde(default)]
    pub player_choices: Vec<PlayerChoice>,
}

impl SpawnRequest {
    pub fn new(pattern: SpawnPattern) -> Self {
        Self {
            pattern,
            ..Default::default()
        }
    }

    pub fn with_group(mut self, group: EntityGroup) -> Self {
        self.groups.push(group);
        self
    }

    pub fn with_constraints(mut self, constraints: SpatialConstraints) -> Self {
        self.constraints = constraints;
        self
    }

    pub fn with_rules(mut self, rules: PlacementRules) -> Self {
        self.rules = rules;
        self
    }

    pub fn with_teams(mut self, teams: TeamConfig) -> Self {
        self.teams = Some(teams);
        self
    }

    pub fn with_scaling(mut self, scaling: ScalingPolicy) -> Self {
        self.scaling = Some(scaling);
        self
    }

    pub fn with_formation(mut self, formation: FormationPattern) -> Self {
        self.formation = Some(formation);
        self
    }

    pub fn with_zone(mut self, zone: SpawnZone) -> Self {
        self.player_zones.push(zone);
        self
    }

    pub fn with_choice(mut self, choice: PlayerChoice) -> Self {
        self.player_choices.push(choice);
        self
    }

    pub fn scaling_enabled(&self) -> bool {
        self.scaling.as_ref().is_some_and(|policy| policy.enabled)
    }

    pub fn target_feeling(&self) -> SpatialFeeling {
        self.scaling
            .as_ref()
            .map(|policy| policy.target_feeling)
            .unwrap_or_default()
    }

    /// Entity count used for capacity planning
    pub fn planned_entities(&self) -> u32 {
        self.groups
            .iter()
            .map(|group| group.quantity.planning_count())
            .fold(0u32, u32::saturating_add)
    }

    pub fn from_json(source: &str) -> crate::core::error::Result<Self> {
        Ok(serde_json::from_str(source)?)
    }

    pub fn from_toml(source: &str) -> crate::core::error::Result<Self> {
        Ok(toml::from_str(source)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_from_toml() {
        let request = SpawnRequest::from_toml(
            r#"
            pattern = "team_based"

            [[groups]]
            id = "orcs"
            entity_type = "orc"
            source = { table = "orcs" }
            quantity = { fixed = 6 }

            [[groups]]
            id = "loot"
            entity_type = "treasure"
            source = { table = "loot" }
            quantity = { dice = "1d3" }
            selection = "unique"

            [constraints]
            wall_proximity = 1.0

            [constraints.min_distance]
            "orc:treasure" = 2.0

            [scaling]
            target_feeling = "tight"
            "#,
        )
        .unwrap();

        assert_eq!(request.pattern, SpawnPattern::TeamBased);
        assert_eq!(request.groups.len(), 2);
        assert_eq!(request.groups[1].selection, SelectionMode::Unique);
        assert_eq!(request.planned_entities(), 7);
        assert!(request.scaling_enabled());
        assert_eq!(request.target_feeling(), SpatialFeeling::Tight);
        assert_eq!(request.constraints.required_distance("treasure", "orc"), Some(2.0));
    }

    #[test]
    fn test_scaling_defaults() {
        let request = SpawnRequest::new(SpawnPattern::Scattered);
        assert!(!request.scaling_enabled());
        assert_eq!(request.target_feeling(), SpatialFeeling::Normal);

        let request = request.with_scaling(ScalingPolicy::disabled());
        assert!(!request.scaling_enabled());
    }

    #[test]
    fn test_planned_entities_saturate() {
        let horde = |id: &str| {
            EntityGroup::from_table(id, "orc", "orcs", QuantitySpec::fixed(3_000_000_000))
        };
        let request = SpawnRequest::new(SpawnPattern::Scattered)
            .with_group(horde("a"))
            .with_group(horde("b"));
        assert_eq!(request.planned_entities(), u32::MAX);
    }
}
