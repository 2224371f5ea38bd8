//! Decides, before any placement, whether rooms must grow or be split

use std::sync::Arc;

use ahash::AHashMap;
use uuid::Uuid;

use crate::capacity::model::{
    CapacityConstraints, CapacityModel, CapacityQuery, CapacityReport, RoomSplit, SizingQuery,
};
use crate::core::config::CapacitySpacing;
use crate::core::error::{Result, SpawnError};
use crate::core::types::{Dimensions, RoomId};
use crate::engine::result::{ModificationKind, RoomModification};
use crate::engine::topology::RoomStructure;
use crate::events::{EventSink, SpawnEvent};
use crate::request::SpawnRequest;
use crate::spatial::RoomGeometry;

/// What capacity coordination decided for one operation
#[derive(Debug, Clone, Default)]
pub struct CapacityOutcome {
    pub requested_entities: u32,
    pub modifications: Vec<RoomModification>,
    pub splits: Vec<RoomSplit>,
    /// Bounds placement should plan against, for rooms that were scaled
    pub planned_dimensions: AHashMap<RoomId, Dimensions>,
    /// Summed recommended capacity of a split target
    pub total_capacity: Option<u32>,
}

impl CapacityOutcome {
    fn unchanged(requested_entities: u32) -> Self {
        Self {
            requested_entities,
            ..Default::default()
        }
    }

    pub fn was_scaled(&self, room_id: &str) -> bool {
        self.planned_dimensions.contains_key(room_id)
    }
}

pub struct CapacityCoordinator {
    model: Option<Arc<dyn CapacityModel>>,
    spacing: CapacitySpacing,
}

impl CapacityCoordinator {
    pub fn new(model: Option<Arc<dyn CapacityModel>>, spacing: CapacitySpacing) -> Self {
        Self { model, spacing }
    }

    /// Assess the target rooms. `rooms` follows the structure's room order.
    pub async fn coordinate(
        &self,
        structure: &RoomStructure,
        rooms: &[RoomGeometry],
        request: &SpawnRequest,
        events: &dyn EventSink,
        operation_id: Uuid,
    ) -> Result<CapacityOutcome> {
        let requested = request.planned_entities();
        let Some(model) = self.model.as_deref() else {
            tracing::debug!("No capacity model configured, skipping capacity analysis");
            return Ok(CapacityOutcome::unchanged(requested));
        };

        if structure.is_split {
            self.assess_split(model, structure, rooms, request, requested, events, operation_id)
                .await
        } else {
            match rooms.first() {
                Some(room) => {
                    self.assess_single(model, room, request, requested, events, operation_id)
                        .await
                }
                None => Ok(CapacityOutcome::unchanged(requested)),
            }
        }
    }

    async fn assess_single(
        &self,
        model: &dyn CapacityModel,
        room: &RoomGeometry,
        request: &SpawnRequest,
        requested: u32,
        events: &dyn EventSink,
        operation_id: Uuid,
    ) -> Result<CapacityOutcome> {
        let query = CapacityQuery {
            room_id: Some(room.id.clone()),
            dimensions: room.dimensions,
            entity_count: requested,
            constraints: self.constraints(request),
            include_split_options: true,
        };
        let Some(report) = self.query(model, &query, request).await? else {
            return Ok(CapacityOutcome::unchanged(requested));
        };

        tracing::debug!(
            room = %room.id,
            entities = requested,
            satisfied = report.satisfied,
            recommended = report.recommended_capacity,
            "Capacity verdict"
        );

        let mut outcome = CapacityOutcome::unchanged(requested);
        if report.satisfied {
            return Ok(outcome);
        }

        if let Some(policy) = request.scaling.as_ref().filter(|p| p.enabled) {
            let sizing = SizingQuery {
                profile: policy.target_feeling.profile(),
                entity_count: requested,
                min_dimensions: room.dimensions,
                additional_space: policy.buffer_factor,
            };
            let after = model.recommend_size(&sizing).await.map_err(|e| {
                SpawnError::Capacity(format!("sizing query for room {} failed: {}", room.id, e))
            })?;
            let before = room.dimensions;
            let scale_factor = if before.width > 0.0 {
                after.width / before.width
            } else {
                1.0
            };

            tracing::info!(
                room = %room.id,
                before_w = before.width,
                before_h = before.height,
                after_w = after.width,
                after_h = after.height,
                scale_factor,
                "Room scaled to fit entities"
            );

            outcome.modifications.push(RoomModification {
                kind: ModificationKind::Scaled,
                room_id: room.id.clone(),
                before,
                after,
                scale_factor,
                reason: format!("Scaled to accommodate {} entities", requested),
            });
            outcome.planned_dimensions.insert(room.id.clone(), after);

            if policy.emit_events {
                events.publish(SpawnEvent::RoomScaled {
                    operation_id,
                    room_id: room.id.clone(),
                    before,
                    after,
                    scale_factor,
                    entity_count: requested,
                });
            }
        }

        if !report.splits.is_empty() {
            events.publish(SpawnEvent::SplitRecommended {
                operation_id,
                room_id: room.id.clone(),
                entity_count: requested,
                options: report.splits.clone(),
            });
            outcome.splits = report.splits;
        }

        Ok(outcome)
    }

    /// Aggregate assessment over connected rooms. Rooms are never scaled
    /// individually; a shortfall only yields split advice for an average room.
    #[allow(clippy::too_many_arguments)]
    async fn assess_split(
        &self,
        model: &dyn CapacityModel,
        structure: &RoomStructure,
        rooms: &[RoomGeometry],
        request: &SpawnRequest,
        requested: u32,
        events: &dyn EventSink,
        operation_id: Uuid,
    ) -> Result<CapacityOutcome> {
        let mut total = 0u32;
        for room in rooms {
            let query = CapacityQuery {
                room_id: Some(room.id.clone()),
                dimensions: room.dimensions,
                entity_count: requested,
                constraints: self.constraints(request),
                include_split_options: false,
            };
            let Some(report) = self.query(model, &query, request).await? else {
                return Ok(CapacityOutcome::unchanged(requested));
            };
            total = total.saturating_add(report.recommended_capacity);
        }

        tracing::debug!(
            rooms = rooms.len(),
            total_capacity = total,
            entities = requested,
            "Split topology capacity"
        );

        let mut outcome = CapacityOutcome::unchanged(requested);
        outcome.total_capacity = Some(total);
        if total >= requested || rooms.is_empty() {
            return Ok(outcome);
        }

        let count = rooms.len() as f32;
        let average = Dimensions::new(
            rooms.iter().map(|r| r.dimensions.width).sum::<f32>() / count,
            rooms.iter().map(|r| r.dimensions.height).sum::<f32>() / count,
        );
        let query = CapacityQuery {
            room_id: None,
            dimensions: average,
            entity_count: requested,
            constraints: self.constraints(request),
            include_split_options: true,
        };
        if let Some(report) = self.query(model, &query, request).await? {
            if !report.splits.is_empty() {
                events.publish(SpawnEvent::SplitRecommended {
                    operation_id,
                    room_id: structure.primary_room.clone(),
                    entity_count: requested,
                    options: report.splits.clone(),
                });
                outcome.splits = report.splits;
            }
        }
        Ok(outcome)
    }

    /// Run a capacity query. Failures are fatal only when scaling was
    /// requested; otherwise analysis degrades to a no-op (`None`).
    async fn query(
        &self,
        model: &dyn CapacityModel,
        query: &CapacityQuery,
        request: &SpawnRequest,
    ) -> Result<Option<CapacityReport>> {
        match model.check_capacity(query).await {
            Ok(report) => Ok(Some(report)),
            Err(e) if request.scaling_enabled() => Err(SpawnError::Capacity(format!(
                "capacity query failed with scaling enabled: {}",
                e
            ))),
            Err(e) => {
                tracing::warn!(
                    error = %e,
                    "Capacity query failed, continuing without capacity analysis"
                );
                Ok(None)
            }
        }
    }

    fn constraints(&self, request: &SpawnRequest) -> CapacityConstraints {
        CapacityConstraints::new(request.target_feeling(), self.spacing.clone())
    }
}
