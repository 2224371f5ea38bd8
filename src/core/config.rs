//! Engine configuration with documented constants
//!
//! Tunables that a host may change live on [`EngineConfig`]. Geometry
//! constants that the placement strategies depend on are collected below
//! with their meaning.

use serde::{Deserialize, Serialize};

use crate::core::error::{Result, SpawnError};

// === FIXED GEOMETRY ===

/// Maximum distance at which one entity can see another (room units)
pub const DEFAULT_SIGHT_RANGE: f32 = 8.0;

/// Radius of the ring used by clustered and cohesive team placement
pub const CLUSTER_RADIUS: f32 = 2.0;

/// Minimum separation between two players inside one spawn zone
pub const ZONE_MIN_SEPARATION: f32 = 1.0;

/// Extra space multiplier applied to sizing recommendations
pub const SCALING_BUFFER: f32 = 1.2;

/// Team separation used when a team config leaves it unset
pub const DEFAULT_TEAM_DISTANCE: f32 = 5.0;

/// Candidates closer than this to a placed entity count as the same spot
pub const OCCUPIED_EPSILON: f32 = 0.5;

/// Margin kept from the room edge when sampling gridless rooms
pub const GRIDLESS_INSET: f32 = 1.0;

/// Most templates a single repeatable table draw may produce
pub const MAX_TABLE_DRAW: usize = 100_000;

/// Spacing assumptions handed to the capacity collaborator
///
/// These describe how much room each entity needs, independent of the
/// feeling profile requested. They map one-to-one onto the capacity
/// query's constraint block.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CapacitySpacing {
    /// Centre-to-centre distance below which two entities feel cramped
    pub min_entity_spacing: f32,

    /// Fraction of floor area left free for movement
    pub min_movement_space: f32,

    /// How strongly walls eat into usable floor (0 = none, 1 = heavily)
    pub wall_density_modifier: f32,

    /// Divisor reserving corridors between entities (> 1.0)
    pub pathway_multiplier: f32,
}

impl Default for CapacitySpacing {
    fn default() -> Self {
        Self {
            min_entity_spacing: 2.0,
            min_movement_space: 0.6,
            wall_density_modifier: 0.5,
            pathway_multiplier: 1.2,
        }
    }
}

/// Configuration for a spawn engine instance
///
/// Every field has a default, so an empty TOML document is a valid config.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Identifier stamped on logs and events from this engine
    pub engine_id: String,

    /// When false the engine publishes to a null sink
    pub enable_events: bool,

    // === SEARCH BOUNDS ===
    /// Attempt budget for one position search
    ///
    /// Grid rooms scan their lattice and ignore this. Gridless rooms sample
    /// up to twice this many random candidates before giving up.
    pub max_placement_attempts: u32,

    /// Accepted candidates gathered before a randomized pick
    ///
    /// Larger pools spread entities more evenly at the cost of more
    /// constraint checks per entity.
    pub candidate_pool: usize,

    // === OPERATION ===
    /// Deadline for one populate call, in seconds
    pub operation_timeout_secs: u64,

    /// Seed for the engine RNG. None draws from OS entropy.
    pub seed: Option<u64>,

    /// Spacing block sent with every capacity query
    pub capacity: CapacitySpacing,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            engine_id: format!("spawn_engine_{}", uuid::Uuid::new_v4()),
            enable_events: true,
            max_placement_attempts: 100,
            candidate_pool: 16,
            operation_timeout_secs: 30,
            seed: None,
            capacity: CapacitySpacing::default(),
        }
    }
}

impl EngineConfig {
    /// Create a new config with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a config from TOML, filling gaps with defaults
    pub fn from_toml_str(source: &str) -> Result<Self> {
        let config: EngineConfig = toml::from_str(source)?;
        config.validate()?;
        Ok(config)
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn with_timeout_secs(mut self, secs: u64) -> Self {
        self.operation_timeout_secs = secs;
        self
    }

    pub fn with_events(mut self, enabled: bool) -> Self {
        self.enable_events = enabled;
        self
    }

    pub fn operation_timeout(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.operation_timeout_secs)
    }

    /// Validate configuration for internal consistency
    pub fn validate(&self) -> Result<()> {
        if self.max_placement_attempts == 0 {
            return Err(SpawnError::InvalidRequest(
                "max_placement_attempts must be at least 1".into(),
            ));
        }
        if self.candidate_pool == 0 {
            return Err(SpawnError::InvalidRequest(
                "candidate_pool must be at least 1".into(),
            ));
        }
        if self.operation_timeout_secs == 0 {
            return Err(SpawnError::InvalidRequest(
                "operation_timeout_secs must be positive".into(),
            ));
        }
        if self.capacity.min_entity_spacing <= 0.0 || self.capacity.pathway_multiplier <= 0.0 {
            return Err(SpawnError::InvalidRequest(format!(
                "capacity spacing ({}) and pathway multiplier ({}) must be positive",
                self.capacity.min_entity_spacing, self.capacity.pathway_multiplier
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = EngineConfig::default();
        assert!(config.validate().is_ok());
        assert!(config.engine_id.starts_with("spawn_engine_"));
        assert_eq!(config.max_placement_attempts, 100);
        assert_eq!(config.operation_timeout_secs, 30);
        assert_eq!(config.capacity.min_entity_spacing, 2.0);
    }

    #[test]
    fn test_from_toml_partial() {
        let config = EngineConfig::from_toml_str(
            r#"
            seed = 7
            max_placement_attempts = 250

            [capacity]
            min_entity_spacing = 3.0
            "#,
        )
        .unwrap();

        assert_eq!(config.seed, Some(7));
        assert_eq!(config.max_placement_attempts, 250);
        assert_eq!(config.capacity.min_entity_spacing, 3.0);
        // Untouched fields keep their defaults
        assert_eq!(config.capacity.pathway_multiplier, 1.2);
        assert!(config.enable_events);
    }

    #[test]
    fn test_from_toml_rejects_zero_attempts() {
        let err = EngineConfig::from_toml_str("max_placement_attempts = 0").unwrap_err();
        assert!(matches!(err, SpawnError::InvalidRequest(_)));
    }

    #[test]
    fn test_from_toml_syntax_error() {
        let err = EngineConfig::from_toml_str("seed = [").unwrap_err();
        assert!(matches!(err, SpawnError::ConfigParse(_)));
    }
}
