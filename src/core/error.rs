use std::time::Duration;

use thiserror::Error;

use crate::placement::ConstraintRule;

#[derive(Error, Debug)]
pub enum SpawnError {
    #[error("Invalid spawn request: {0}")]
    InvalidRequest(String),

    #[error("Invalid room target: {0}")]
    InvalidTarget(String),

    #[error("Unknown selection table: {0}")]
    UnknownTable(String),

    #[error("Selection failed for group {group}: {reason}")]
    Selection { group: String, reason: String },

    #[error("No valid positions for {entity_type} after {attempts} attempts")]
    NoValidPositions {
        entity_type: String,
        attempts: u32,
        rules_failed: Vec<ConstraintRule>,
    },

    #[error("Capacity analysis failed: {0}")]
    Capacity(String),

    #[error("Spatial query failed: {0}")]
    Spatial(String),

    #[error("Dice expression error: {0}")]
    Dice(String),

    #[error("Spawn operation timed out after {0:?}")]
    Timeout(Duration),

    #[error("Config parse error: {0}")]
    ConfigParse(#[from] toml::de::Error),

    #[error("Serialization error: {0}")]
    SerdeError(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

impl SpawnError {
    /// True for soft per-entity outcomes that are recorded, not returned
    pub fn is_placement_failure(&self) -> bool {
        matches!(self, SpawnError::NoValidPositions { .. })
    }

    /// Constraint rules that rejected candidates, if any
    pub fn rules_failed(&self) -> &[ConstraintRule] {
        match self {
            SpawnError::NoValidPositions { rules_failed, .. } => rules_failed,
            _ => &[],
        }
    }
}

pub type Result<T> = std::result::Result<T, SpawnError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_placement_failure_is_distinct_from_config_error() {
        let exhausted = SpawnError::NoValidPositions {
            entity_type: "enemy".into(),
            attempts: 200,
            rules_failed: vec![ConstraintRule::MinDistance],
        };
        let config = SpawnError::InvalidRequest("entity group 0 missing ID".into());

        assert!(exhausted.is_placement_failure());
        assert!(!config.is_placement_failure());
        assert_eq!(exhausted.rules_failed(), &[ConstraintRule::MinDistance]);
        assert!(config.rules_failed().is_empty());
    }

    #[test]
    fn test_error_messages() {
        let err = SpawnError::Selection {
            group: "loot".into(),
            reason: "requested 5 unique items but table has 3".into(),
        };
        assert_eq!(
            err.to_string(),
            "Selection failed for group loot: requested 5 unique items but table has 3"
        );
    }
}
