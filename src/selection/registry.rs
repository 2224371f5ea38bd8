//! Weighted selection tables and the shared registry that holds them

use std::sync::Arc;

use ahash::AHashMap;
use parking_lot::RwLock;
use rand::distributions::{Distribution, WeightedIndex};
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::core::config::MAX_TABLE_DRAW;
use crate::core::error::{Result, SpawnError};
use crate::core::types::Entity;
use crate::request::SelectionMode;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SelectionEntry {
    pub template: Entity,
    #[serde(default = "default_weight")]
    pub weight: u32,
}

fn default_weight() -> u32 {
    1
}

/// Pool of entity templates drawn by weight
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SelectionTable {
    pub name: String,
    pub entries: Vec<SelectionEntry>,
}

impl SelectionTable {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            entries: Vec::new(),
        }
    }

    /// Add a template; zero weights count as one
    pub fn with_entry(mut self, template: Entity, weight: u32) -> Self {
        self.entries.push(SelectionEntry {
            template,
            weight: weight.max(1),
        });
        self
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn total_weight(&self) -> u64 {
        self.entries.iter().map(|e| e.weight as u64).sum()
    }

    /// Draw `count` templates; the same template may come up repeatedly
    pub fn select_many<R: Rng + ?Sized>(&self, count: usize, rng: &mut R) -> Result<Vec<Entity>> {
        if count == 0 {
            return Ok(Vec::new());
        }
        if count > MAX_TABLE_DRAW {
            return Err(self.shortfall(format!(
                "requested {} entries, a single draw allows at most {}",
                count, MAX_TABLE_DRAW
            )));
        }
        let weights: Vec<u32> = self.entries.iter().map(|e| e.weight.max(1)).collect();
        let index = WeightedIndex::new(&weights)
            .map_err(|e| self.shortfall(format!("cannot draw from table: {}", e)))?;

        Ok((0..count)
            .map(|_| self.entries[index.sample(rng)].template.clone())
            .collect())
    }

    /// Draw `count` distinct templates, weighted, without replacement
    pub fn select_unique<R: Rng + ?Sized>(&self, count: usize, rng: &mut R) -> Result<Vec<Entity>> {
        if count > self.entries.len() {
            return Err(self.shortfall(format!(
                "requested {} unique entries but table has {}",
                count,
                self.entries.len()
            )));
        }

        let mut remaining: Vec<&SelectionEntry> = self.entries.iter().collect();
        let mut picked = Vec::with_capacity(count);
        for _ in 0..count {
            let total: u64 = remaining.iter().map(|e| e.weight.max(1) as u64).sum();
            let mut roll = rng.gen_range(0..total);
            let mut chosen = remaining.len() - 1;
            for (i, entry) in remaining.iter().enumerate() {
                let weight = entry.weight.max(1) as u64;
                if roll < weight {
                    chosen = i;
                    break;
                }
                roll -= weight;
            }
            picked.push(remaining.swap_remove(chosen).template.clone());
        }
        Ok(picked)
    }

    pub fn select<R: Rng + ?Sized>(
        &self,
        count: usize,
        mode: SelectionMode,
        rng: &mut R,
    ) -> Result<Vec<Entity>> {
        match mode {
            SelectionMode::Repeatable => self.select_many(count, rng),
            SelectionMode::Unique => self.select_unique(count, rng),
        }
    }

    fn shortfall(&self, reason: String) -> SpawnError {
        SpawnError::Selection {
            group: self.name.clone(),
            reason,
        }
    }
}

/// Named tables shared between concurrent operations
#[derive(Debug, Default)]
pub struct SelectionRegistry {
    tables: RwLock<AHashMap<String, Arc<SelectionTable>>>,
}

impl SelectionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register or replace a table under `name`
    pub fn register_table(&self, name: impl Into<String>, table: SelectionTable) {
        let name = name.into();
        tracing::debug!(table = %name, entries = table.len(), "Registered selection table");
        self.tables.write().insert(name, Arc::new(table));
    }

    pub fn unregister_table(&self, name: &str) -> bool {
        self.tables.write().remove(name).is_some()
    }

    pub fn table(&self, name: &str) -> Option<Arc<SelectionTable>> {
        self.tables.read().get(name).cloned()
    }

    pub fn table_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.tables.read().keys().cloned().collect();
        names.sort();
        names
    }

    pub fn select<R: Rng + ?Sized>(
        &self,
        name: &str,
        count: usize,
        mode: SelectionMode,
        rng: &mut R,
    ) -> Result<Vec<Entity>> {
        // Clone the Arc out so the draw runs without holding the lock
        let table = self
            .table(name)
            .ok_or_else(|| SpawnError::UnknownTable(name.to_string()))?;
        if table.is_empty() {
            return Err(SpawnError::Selection {
                group: name.to_string(),
                reason: "table is empty".into(),
            });
        }
        table.select(count, mode, rng)
    }
}
