//! How many entities a group asks for

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::core::error::{Result, SpawnError};
use crate::request::dice::DiceExpr;

/// Exactly one way of stating a quantity
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuantitySpec {
    Fixed(u32),
    /// Dice notation, rolled once per operation
    Dice(String),
    /// Uniform draw from an inclusive range
    Range { min: u32, max: u32 },
}

impl QuantitySpec {
    pub fn fixed(count: u32) -> Self {
        QuantitySpec::Fixed(count)
    }

    pub fn dice(expr: impl Into<String>) -> Self {
        QuantitySpec::Dice(expr.into())
    }

    pub fn range(min: u32, max: u32) -> Self {
        QuantitySpec::Range { min, max }
    }

    /// Count used for capacity bookkeeping before anything is rolled.
    /// Only fixed counts are known up front; everything else counts as one.
    pub fn planning_count(&self) -> u32 {
        match self {
            QuantitySpec::Fixed(n) => *n,
            _ => 1,
        }
    }

    /// Resolve to a concrete count
    pub fn resolve<R: Rng + ?Sized>(&self, rng: &mut R) -> Result<u32> {
        match self {
            QuantitySpec::Fixed(n) => Ok(*n),
            QuantitySpec::Dice(expr) => Ok(DiceExpr::parse(expr)?.roll(rng)),
            QuantitySpec::Range { min, max } if min > max => Err(SpawnError::InvalidRequest(
                format!("range min ({}) exceeds max ({})", min, max),
            )),
            QuantitySpec::Range { min, max } => Ok(rng.gen_range(*min..=*max)),
        }
    }

    pub fn problems(&self) -> Vec<String> {
        match self {
            QuantitySpec::Fixed(0) => vec!["fixed quantity must be at least 1".to_string()],
            QuantitySpec::Fixed(_) => Vec::new(),
            QuantitySpec::Dice(expr) => match DiceExpr::parse(expr) {
                Ok(_) => Vec::new(),
                Err(e) => vec![e.to_string()],
            },
            QuantitySpec::Range { min, max } => {
                let mut problems = Vec::new();
                if min > max {
                    problems.push(format!("range min ({}) exceeds max ({})", min, max));
                }
                if *max == 0 {
                    problems.push("range max must be at least 1".to_string());
                }
                problems
            }
        }
    }
}
