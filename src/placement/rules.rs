//! Per-request overrides for how a position is chosen from the candidates

use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::core::types::Position;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlacementStrategy {
    /// Uniform pick among the gathered candidates
    #[default]
    Randomized,
    /// First accepted candidate in search order
    FirstFit,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlacementRules {
    pub strategy: PlacementStrategy,
    /// Overrides the engine's candidate pool size
    pub candidate_pool: Option<usize>,
    /// Overrides the engine's attempt budget
    pub max_attempts: Option<u32>,
}

impl PlacementRules {
    pub fn first_fit() -> Self {
        Self {
            strategy: PlacementStrategy::FirstFit,
            ..Default::default()
        }
    }

    pub fn with_max_attempts(mut self, attempts: u32) -> Self {
        self.max_attempts = Some(attempts);
        self
    }

    pub fn with_candidate_pool(mut self, pool: usize) -> Self {
        self.candidate_pool = Some(pool);
        self
    }

    /// How many accepted positions a search should gather
    pub fn wanted(&self, default_pool: usize) -> usize {
        match self.strategy {
            PlacementStrategy::FirstFit => 1,
            PlacementStrategy::Randomized => self.candidate_pool.unwrap_or(default_pool).max(1),
        }
    }

    /// Choose one of the accepted candidates
    pub fn choose<R: Rng + ?Sized>(
        &self,
        candidates: &[Position],
        rng: &mut R,
    ) -> Option<Position> {
        match self.strategy {
            PlacementStrategy::FirstFit => candidates.first().copied(),
            PlacementStrategy::Randomized => candidates.choose(rng).copied(),
        }
    }

    pub fn problems(&self) -> Vec<String> {
        let mut problems = Vec::new();
        if self.candidate_pool == Some(0) {
            problems.push("placement candidate_pool must be at least 1".to_string());
        }
        if self.max_attempts == Some(0) {
            problems.push("placement max_attempts must be at least 1".to_string());
        }
        problems
    }
}
