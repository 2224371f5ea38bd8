//! Spawn engine: turns a declarative request into placed entities
//!
//! One `populate` call runs validate, topology, capacity, selection and
//! placement strictly in sequence. Hard errors abort with no result.
//! Per-entity failures are recorded and the operation carries on.

pub mod patterns;
pub mod result;
pub mod topology;

use std::sync::Arc;
use std::time::Instant;

use ahash::AHashMap;
use parking_lot::Mutex;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use uuid::Uuid;

use crate::capacity::{CapacityCoordinator, CapacityModel};
use crate::core::config::EngineConfig;
use crate::core::error::{Result, SpawnError};
use crate::core::types::Entity;
use crate::events::{EventSink, NullSink, SpawnEvent, TracingSink};
use crate::placement::{ConstraintSolver, PlacementStrategy};
use crate::request::{
    validate_request, EntityGroup, EntitySource, SpawnPattern, SpawnRequest, ZoneOccupancy,
};
use crate::selection::SelectionRegistry;
use crate::spatial::{RoomGeometry, SpatialIndex};

pub use patterns::{Assignment, PlacementContext, RoomPlacement};
pub use result::{ModificationKind, PlacedEntity, RoomModification, SpawnFailure, SpawnResult};
pub use topology::{RoomStructure, SpawnTarget};

pub struct SpawnEngine {
    config: EngineConfig,
    spatial: Arc<dyn SpatialIndex>,
    capacity: Option<Arc<dyn CapacityModel>>,
    registry: Arc<SelectionRegistry>,
    events: Arc<dyn EventSink>,
    rng: Mutex<ChaCha8Rng>,
}

impl SpawnEngine {
    /// Engine with default config, no capacity model, an empty registry and
    /// events mirrored to tracing
    pub fn new(spatial: Arc<dyn SpatialIndex>) -> Self {
        let config = EngineConfig::default();
        let rng = Mutex::new(seeded_rng(config.seed));
        Self {
            config,
            spatial,
            capacity: None,
            registry: Arc::new(SelectionRegistry::new()),
            events: Arc::new(TracingSink),
            rng,
        }
    }

    /// Replace the config and reseed the engine RNG from it
    pub fn with_config(mut self, config: EngineConfig) -> Self {
        self.rng = Mutex::new(seeded_rng(config.seed));
        self.config = config;
        self
    }

    pub fn with_capacity_model(mut self, model: Arc<dyn CapacityModel>) -> Self {
        self.capacity = Some(model);
        self
    }

    pub fn with_registry(mut self, registry: Arc<SelectionRegistry>) -> Self {
        self.registry = registry;
        self
    }

    pub fn with_event_sink(mut self, events: Arc<dyn EventSink>) -> Self {
        self.events = events;
        self
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn registry(&self) -> &Arc<SelectionRegistry> {
        &self.registry
    }

    pub fn validate_request(&self, request: &SpawnRequest) -> Result<()> {
        validate_request(request)
    }

    pub fn analyze_room_structure(&self, target: &SpawnTarget) -> Result<RoomStructure> {
        RoomStructure::resolve(target)
    }

    /// Place the request's entities into the target room or rooms.
    ///
    /// Dropping the returned future cancels the operation at its next await.
    pub async fn populate(
        &self,
        target: impl Into<SpawnTarget>,
        request: &SpawnRequest,
    ) -> Result<SpawnResult> {
        let target = target.into();
        let started = Instant::now();
        let operation_id = Uuid::new_v4();
        let events = self.sink();

        tracing::info!(
            engine = %self.config.engine_id,
            operation = %operation_id,
            groups = request.groups.len(),
            pattern = ?request.pattern,
            "Spawn operation started"
        );
        events.publish(SpawnEvent::OperationStarted {
            engine_id: self.config.engine_id.clone(),
            operation_id,
            target: target.clone(),
            request: request.clone(),
        });

        self.validate_request(request)?;
        let structure = self.analyze_room_structure(&target)?;
        tracing::debug!(
            operation = %operation_id,
            split = structure.is_split,
            rooms = ?structure.connected_rooms,
            "Room topology resolved"
        );

        let timeout = self.config.operation_timeout();
        let run = self.run(structure, request, events, operation_id);
        let mut result = tokio::time::timeout(timeout, run)
            .await
            .map_err(|_| SpawnError::Timeout(timeout))??;
        result.elapsed_ms = started.elapsed().as_millis() as u64;

        tracing::info!(
            operation = %operation_id,
            placed = result.placed.len(),
            failed = result.failures.len(),
            elapsed_ms = result.elapsed_ms,
            "Spawn operation completed"
        );

        let completed = if result.room_structure.is_split {
            SpawnEvent::MultiRoomCompleted {
                engine_id: self.config.engine_id.clone(),
                operation_id,
                request: request.clone(),
                result: result.clone(),
                elapsed_ms: result.elapsed_ms,
                rooms: result.room_structure.connected_rooms.clone(),
            }
        } else {
            SpawnEvent::OperationCompleted {
                engine_id: self.config.engine_id.clone(),
                operation_id,
                request: request.clone(),
                result: result.clone(),
                elapsed_ms: result.elapsed_ms,
                split_rooms: false,
            }
        };
        events.publish(completed);

        Ok(result)
    }

    async fn run(
        &self,
        mut structure: RoomStructure,
        request: &SpawnRequest,
        events: &dyn EventSink,
        operation_id: Uuid,
    ) -> Result<SpawnResult> {
        let mut rooms = Vec::with_capacity(structure.connected_rooms.len());
        for room_id in &structure.connected_rooms {
            rooms.push(self.spatial.room(room_id).await?);
        }

        // Scaling has to be decided before any geometry work
        let coordinator =
            CapacityCoordinator::new(self.capacity.clone(), self.config.capacity.clone());
        let capacity = coordinator
            .coordinate(&structure, &rooms, request, events, operation_id)
            .await?;
        structure.total_capacity = capacity.total_capacity;

        let mut rng = self.operation_rng();
        let assignments = self.select_entities(request, &mut rng)?;

        let planned: Vec<RoomGeometry> = rooms
            .iter()
            .map(|room| match capacity.planned_dimensions.get(&room.id) {
                Some(dimensions) => room.with_dimensions(*dimensions),
                None => room.clone(),
            })
            .collect();

        let solver = ConstraintSolver::new(
            request
                .rules
                .max_attempts
                .unwrap_or(self.config.max_placement_attempts),
        )
        .with_random_start(request.rules.strategy == PlacementStrategy::Randomized)
        .with_spatial(self.spatial.clone());
        let zones = ZoneOccupancy::new();

        let mut result = SpawnResult {
            requested_entities: capacity.requested_entities,
            room_modifications: capacity.modifications,
            split_recommendations: capacity.splits,
            ..Default::default()
        };

        let buckets = distribute(&structure, request.pattern, assignments);
        for (room, bucket) in planned.iter().zip(buckets) {
            let ctx = PlacementContext {
                room,
                request,
                solver: &solver,
                events,
                zones: &zones,
                operation_id,
                candidate_pool: self.config.candidate_pool,
            };
            let placement = patterns::dispatch(request.pattern, &ctx, &bucket, &mut rng);
            result.placed.extend(placement.placed);
            result.failures.extend(placement.failures);
        }

        result.room_structure = structure;
        result.finalize();
        Ok(result)
    }

    /// Draw every group's entities and resolve their teams
    fn select_entities(
        &self,
        request: &SpawnRequest,
        rng: &mut ChaCha8Rng,
    ) -> Result<Vec<Assignment>> {
        let mut draws: AHashMap<String, u32> = AHashMap::new();
        let mut assignments = Vec::new();

        for group in &request.groups {
            let count = group.quantity.resolve(rng)? as usize;
            let entities = match &group.source {
                EntitySource::Inline(entities) => {
                    if count > entities.len() {
                        return Err(SpawnError::Selection {
                            group: group.id.clone(),
                            reason: format!(
                                "requested {} entities but only {} given inline",
                                count,
                                entities.len()
                            ),
                        });
                    }
                    entities[..count].to_vec()
                }
                EntitySource::Table(table) => self
                    .registry
                    .select(table, count, group.selection, rng)
                    .map_err(|e| for_group(group, e))?
                    .into_iter()
                    .map(|template| stamp(template, group, &mut draws))
                    .collect(),
            };

            tracing::debug!(group = %group.id, count = entities.len(), "Entities selected");
            for entity in entities {
                let team_id = request
                    .teams
                    .as_ref()
                    .and_then(|teams| teams.team_for(group.team_id.as_deref(), &entity.entity_type))
                    .map(|team| team.id.clone());
                assignments.push(Assignment::new(entity, group.id.clone()).with_team(team_id));
            }
        }
        Ok(assignments)
    }

    /// Fresh RNG for one operation, derived from the engine's seeded source
    fn operation_rng(&self) -> ChaCha8Rng {
        let seed: u64 = self.rng.lock().gen();
        ChaCha8Rng::seed_from_u64(seed)
    }

    fn sink(&self) -> &dyn EventSink {
        if self.config.enable_events {
            self.events.as_ref()
        } else {
            &NullSink
        }
    }
}

fn seeded_rng(seed: Option<u64>) -> ChaCha8Rng {
    match seed {
        Some(seed) => ChaCha8Rng::seed_from_u64(seed),
        None => ChaCha8Rng::from_entropy(),
    }
}

/// Attach the group id to a selection error raised for a table
fn for_group(group: &EntityGroup, error: SpawnError) -> SpawnError {
    match error {
        SpawnError::Selection { reason, .. } => SpawnError::Selection {
            group: group.id.clone(),
            reason,
        },
        other => other,
    }
}

/// Instance of a table template, id `<template-id>#<n>`
fn stamp(template: Entity, group: &EntityGroup, draws: &mut AHashMap<String, u32>) -> Entity {
    let n = draws.entry(template.id.clone()).or_insert(0);
    *n += 1;
    let entity_type = if template.entity_type.is_empty() {
        group.entity_type.clone()
    } else {
        template.entity_type
    };
    Entity::new(format!("{}#{}", template.id, n), entity_type)
}

/// Split assignments across the target rooms.
///
/// Cohorts go round-robin in room order: whole teams for team placement,
/// whole groups for clusters, single entities otherwise. Under player
/// choice, players stay in the primary room where the zones are.
fn distribute(
    structure: &RoomStructure,
    pattern: SpawnPattern,
    assignments: Vec<Assignment>,
) -> Vec<Vec<Assignment>> {
    let rooms = structure.connected_rooms.len().max(1);
    let mut buckets: Vec<Vec<Assignment>> = vec![Vec::new(); rooms];
    if rooms == 1 {
        buckets[0] = assignments;
        return buckets;
    }

    let mut cohorts: AHashMap<String, usize> = AHashMap::new();
    for assignment in assignments {
        if pattern == SpawnPattern::PlayerChoice && assignment.entity.is_player() {
            buckets[0].push(assignment);
            continue;
        }
        let key = match pattern {
            SpawnPattern::TeamBased => match &assignment.team_id {
                Some(team) => format!("team:{}", team),
                None => format!("entity:{}", assignment.entity.id),
            },
            SpawnPattern::Clustered => format!("group:{}", assignment.group_id),
            _ => format!("entity:{}", assignment.entity.id),
        };
        let next = cohorts.len();
        let room = *cohorts.entry(key).or_insert(next % rooms);
        buckets[room].push(assignment);
    }
    buckets
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::MemorySink;
    use crate::request::{QuantitySpec, SelectionMode};
    use crate::selection::SelectionTable;
    use crate::spatial::InMemorySpatial;

    fn engine(spatial: InMemorySpatial) -> SpawnEngine {
        SpawnEngine::new(Arc::new(spatial)).with_config(EngineConfig::new().with_seed(42))
    }

    fn split(rooms: &[&str]) -> RoomStructure {
        RoomStructure::resolve(&SpawnTarget::from(rooms)).unwrap()
    }

    fn tagged(id: &str, entity_type: &str, group: &str, team: Option<&str>) -> Assignment {
        Assignment::new(Entity::new(id, entity_type), group).with_team(team.map(str::to_string))
    }

    #[test]
    fn test_round_robin_by_entity() {
        let assignments = (0..5)
            .map(|i| tagged(&format!("g{}", i), "goblin", "g", None))
            .collect();
        let buckets = distribute(&split(&["a", "b"]), SpawnPattern::Scattered, assignments);
        assert_eq!(buckets[0].len(), 3);
        assert_eq!(buckets[1].len(), 2);
    }

    #[test]
    fn test_teams_stay_whole_across_rooms() {
        let assignments = vec![
            tagged("k1", "knight", "knights", Some("heroes")),
            tagged("o1", "orc", "orcs", Some("horde")),
            tagged("k2", "knight", "knights", Some("heroes")),
            tagged("o2", "orc", "orcs", Some("horde")),
        ];
        let buckets = distribute(&split(&["a", "b"]), SpawnPattern::TeamBased, assignments);
        assert!(buckets[0].iter().all(|a| a.team_id.as_deref() == Some("heroes")));
        assert!(buckets[1].iter().all(|a| a.team_id.as_deref() == Some("horde")));
    }

    #[test]
    fn test_players_pinned_to_primary_room() {
        let assignments = vec![
            tagged("g1", "goblin", "g", None),
            tagged("p1", "player", "party", None),
            tagged("g2", "goblin", "g", None),
            tagged("p2", "player", "party", None),
        ];
        let buckets = distribute(&split(&["a", "b", "c"]), SpawnPattern::PlayerChoice, assignments);
        let ids: Vec<_> = buckets[0].iter().map(|a| a.entity.id.as_str()).collect();
        assert_eq!(ids, vec!["g1", "p1", "p2"]);
        assert_eq!(buckets[1][0].entity.id, "g2");
        assert!(buckets[2].is_empty());
    }

    #[test]
    fn test_table_draws_are_stamped() {
        let engine = engine(InMemorySpatial::new());
        engine.registry().register_table(
            "loot",
            SelectionTable::new("loot")
                .with_entry(Entity::new("sword", "treasure"), 1)
                .with_entry(Entity::new("crown", ""), 1),
        );
        let pair = |id: &str| {
            EntityGroup::from_table(id, "treasure", "loot", QuantitySpec::fixed(2)).unique()
        };
        let request = SpawnRequest::new(SpawnPattern::Scattered)
            .with_group(pair("hoard"))
            .with_group(pair("more"));
        let mut rng = ChaCha8Rng::seed_from_u64(1);

        let selected = engine.select_entities(&request, &mut rng).unwrap();
        let mut ids: Vec<_> = selected.iter().map(|a| a.entity.id.clone()).collect();
        ids.sort();
        assert_eq!(ids, vec!["crown#1", "crown#2", "sword#1", "sword#2"]);
        assert!(selected.iter().all(|a| a.entity.entity_type == "treasure"));
    }

    #[test]
    fn test_selection_errors_name_the_group() {
        let engine = engine(InMemorySpatial::new());
        engine
            .registry()
            .register_table(
                "loot",
                SelectionTable::new("loot").with_entry(Entity::new("sword", "treasure"), 1),
            );
        let request = SpawnRequest::new(SpawnPattern::Scattered).with_group(
            EntityGroup::from_table("hoard", "treasure", "loot", QuantitySpec::fixed(3))
                .with_selection(SelectionMode::Unique),
        );
        let mut rng = ChaCha8Rng::seed_from_u64(1);

        match engine.select_entities(&request, &mut rng) {
            Err(SpawnError::Selection { group, .. }) => assert_eq!(group, "hoard"),
            other => panic!("expected selection error, got {:?}", other),
        }
    }

    #[test]
    fn test_inline_shortfall_is_selection_error() {
        let engine = engine(InMemorySpatial::new());
        let request = SpawnRequest::new(SpawnPattern::Scattered).with_group(EntityGroup::inline(
            "party",
            "player",
            vec![Entity::new("p1", "player")],
            QuantitySpec::fixed(2),
        ));
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        assert!(matches!(
            engine.select_entities(&request, &mut rng),
            Err(SpawnError::Selection { .. })
        ));
    }

    #[tokio::test]
    async fn test_disabled_events_publish_nothing() {
        let sink = Arc::new(MemorySink::new());
        let spatial = InMemorySpatial::new().with_room(RoomGeometry::grid("hall", 10.0, 10.0));
        let engine = SpawnEngine::new(Arc::new(spatial))
            .with_config(EngineConfig::new().with_seed(1).with_events(false))
            .with_event_sink(sink.clone());
        let request = SpawnRequest::new(SpawnPattern::Scattered).with_group(
            EntityGroup::of_entities("rats", "rat", vec![Entity::new("r1", "rat")]),
        );

        let result = engine.populate("hall", &request).await.unwrap();
        assert!(result.success);
        assert!(sink.is_empty());
    }
}
