//! Teams and formations

use serde::{Deserialize, Serialize};

use crate::core::config::DEFAULT_TEAM_DISTANCE;
use crate::core::types::Position;

/// Named set of offsets from a centroid
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FormationPattern {
    pub name: String,
    /// Slot offsets in spacing units, relative to the centroid
    pub offsets: Vec<Position>,
    #[serde(default = "default_spacing")]
    pub spacing: f32,
}

fn default_spacing() -> f32 {
    1.0
}

impl FormationPattern {
    pub fn new(name: impl Into<String>, offsets: Vec<Position>) -> Self {
        Self {
            name: name.into(),
            offsets,
            spacing: default_spacing(),
        }
    }

    pub fn with_spacing(mut self, spacing: f32) -> Self {
        self.spacing = spacing;
        self
    }

    /// Single rank centred on the centroid
    pub fn line(slots: usize) -> Self {
        let half = (slots.saturating_sub(1)) as f32 / 2.0;
        let offsets = (0..slots)
            .map(|i| Position::new(i as f32 - half, 0.0))
            .collect();
        Self::new("line", offsets)
    }

    /// Filled square, row by row
    pub fn square(side: usize) -> Self {
        let half = (side.saturating_sub(1)) as f32 / 2.0;
        let mut offsets = Vec::with_capacity(side * side);
        for row in 0..side {
            for col in 0..side {
                offsets.push(Position::new(col as f32 - half, row as f32 - half));
            }
        }
        Self::new("square", offsets)
    }

    /// Absolute slot position for the i-th entity; extra entities stand on
    /// the centroid
    pub fn slot(&self, index: usize, centroid: Position) -> Position {
        match self.offsets.get(index) {
            Some(offset) => centroid + *offset * self.spacing,
            None => centroid,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Allegiance {
    Friendly,
    Hostile,
    #[default]
    Neutral,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Team {
    pub id: String,
    /// Entity types that join this team unless their group names another
    #[serde(default)]
    pub entity_types: Vec<String>,
    #[serde(default)]
    pub allegiance: Allegiance,
    #[serde(default)]
    pub formation: Option<FormationPattern>,
}

impl Team {
    pub fn new(id: impl Into<String>, allegiance: Allegiance) -> Self {
        Self {
            id: id.into(),
            entity_types: Vec::new(),
            allegiance,
            formation: None,
        }
    }

    pub fn with_types(mut self, types: &[&str]) -> Self {
        self.entity_types = types.iter().map(|t| t.to_string()).collect();
        self
    }

    pub fn with_formation(mut self, formation: FormationPattern) -> Self {
        self.formation = Some(formation);
        self
    }
}

/// Where team spawn areas go in the room
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TeamPlacement {
    Corners,
    /// North, South, West, East in that order
    #[default]
    OppositeSides,
    /// Random squares kept apart by the team distance
    Random,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Cohesion {
    pub keep_friendlies_together: bool,
    pub keep_enemies_together: bool,
}

impl Default for Cohesion {
    fn default() -> Self {
        Self {
            keep_friendlies_together: true,
            keep_enemies_together: true,
        }
    }
}

impl Cohesion {
    pub fn keeps_together(&self, allegiance: Allegiance) -> bool {
        match allegiance {
            Allegiance::Friendly => self.keep_friendlies_together,
            Allegiance::Hostile => self.keep_enemies_together,
            Allegiance::Neutral => true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TeamConfig {
    pub teams: Vec<Team>,
    #[serde(default)]
    pub placement: TeamPlacement,
    #[serde(default = "default_team_distance")]
    pub min_team_distance: f32,
    #[serde(default)]
    pub cohesion: Cohesion,
}

fn default_team_distance() -> f32 {
    DEFAULT_TEAM_DISTANCE
}

impl TeamConfig {
    pub fn new(teams: Vec<Team>, placement: TeamPlacement) -> Self {
        Self {
            teams,
            placement,
            min_team_distance: DEFAULT_TEAM_DISTANCE,
            cohesion: Cohesion::default(),
        }
    }

    pub fn with_min_distance(mut self, distance: f32) -> Self {
        self.min_team_distance = distance;
        self
    }

    pub fn with_cohesion(mut self, cohesion: Cohesion) -> Self {
        self.cohesion = cohesion;
        self
    }

    pub fn team(&self, team_id: &str) -> Option<&Team> {
        self.teams.iter().find(|team| team.id == team_id)
    }

    /// Team an entity belongs to: the group's explicit team wins, then the
    /// first team listing the entity's type
    pub fn team_for(&self, group_team: Option<&str>, entity_type: &str) -> Option<&Team> {
        if let Some(team) = group_team.and_then(|id| self.team(id)) {
            return Some(team);
        }
        self.teams
            .iter()
            .find(|team| team.entity_types.iter().any(|t| t == entity_type))
    }
}
