//! Feeling-based capacity model
//!
//! Estimates how many entities a room holds from its floor area and the
//! density profile of the requested feeling, and sizes rooms the other way
//! round.

use std::collections::BTreeMap;

use async_trait::async_trait;

use crate::capacity::model::{
    CapacityModel, CapacityQuery, CapacityReport, RoomSplit, SizingQuery, SpatialFeeling,
    SpatialIntentProfile,
};
use crate::core::config::CapacitySpacing;
use crate::core::error::{Result, SpawnError};
use crate::core::types::{Dimensions, Position};

const MIN_ROOM_SIDE: f32 = 5.0;
const MAX_ROOM_SIDE: f32 = 100.0;
/// Preferred width:height ratio for recommended rooms
const ASPECT_RATIO: f32 = 1.2;
/// Smallest side a split room may have
const MIN_SPLIT_SIDE: f32 = 3.0;
/// Both sides must reach this before a hub layout is offered
const HUB_MIN_SIDE: f32 = 15.0;

/// Capacity numbers for one room under one set of constraints
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CapacityEstimate {
    pub usable_area: f32,
    pub recommended: u32,
    pub max: u32,
}

#[derive(Debug, Clone, Default)]
pub struct FeelingCapacityModel;

impl FeelingCapacityModel {
    pub fn new() -> Self {
        Self
    }

    pub fn estimate(
        &self,
        dimensions: Dimensions,
        feeling: SpatialFeeling,
        spacing: &CapacitySpacing,
    ) -> CapacityEstimate {
        let profile = feeling.profile();
        let usable_area = dimensions.area()
            * spacing.min_movement_space
            * (1.0 - spacing.wall_density_modifier * 0.3)
            / spacing.pathway_multiplier;

        let by_density = (usable_area * profile.entity_density).floor().max(0.0) as u32;
        let spacing_sq = spacing.min_entity_spacing * spacing.min_entity_spacing;
        let by_spacing = (usable_area / spacing_sq).floor().max(0.0) as u32;

        let recommended = by_density.min(by_spacing);
        CapacityEstimate {
            usable_area,
            recommended,
            max: (recommended as f32 * 1.5).floor() as u32,
        }
    }

    pub fn optimal_size(&self, profile: &SpatialIntentProfile, entity_count: u32) -> Dimensions {
        if entity_count == 0 {
            return Dimensions::new(MIN_ROOM_SIDE, MIN_ROOM_SIDE);
        }
        let n = entity_count as f32;

        let mut area = n / profile.entity_density
            * (1.0 + profile.movement_freedom * 2.0)
            * (1.0 + profile.visual_scope * 0.5)
            * (1.0 + profile.tactical_complexity * 0.3);

        match profile.feeling {
            SpatialFeeling::Tight => area = (area * 0.8).max(n * 2.0),
            SpatialFeeling::Vast => area *= 2.0,
            SpatialFeeling::Normal => {}
        }

        let width = (area * ASPECT_RATIO).sqrt();
        let height = area / width;
        Dimensions::new(
            width.ceil().clamp(MIN_ROOM_SIDE, MAX_ROOM_SIDE),
            height.ceil().clamp(MIN_ROOM_SIDE, MAX_ROOM_SIDE),
        )
    }

    pub fn split_options(&self, size: Dimensions, entity_count: u32) -> Vec<RoomSplit> {
        let mut options = Vec::with_capacity(3);
        let halves = |n: u32| {
            BTreeMap::from([
                ("room_1".to_string(), n / 2),
                ("room_2".to_string(), n - n / 2),
            ])
        };

        let half_width = size.width / 2.0;
        if half_width >= MIN_SPLIT_SIDE {
            options.push(RoomSplit {
                suggested_size: Dimensions::new(half_width, size.height),
                connection_points: vec![Position::new(half_width, size.height / 2.0)],
                entity_distribution: halves(entity_count),
                connection_type: "door".into(),
                reason: "Side-by-side halves for manageable entity density".into(),
                capacity_improvement: 0.8,
            });
        }

        let half_height = size.height / 2.0;
        if half_height >= MIN_SPLIT_SIDE {
            options.push(RoomSplit {
                suggested_size: Dimensions::new(size.width, half_height),
                connection_points: vec![Position::new(size.width / 2.0, half_height)],
                entity_distribution: halves(entity_count),
                connection_type: "door".into(),
                reason: "Stacked halves for manageable entity density".into(),
                capacity_improvement: 0.8,
            });
        }

        if size.width >= HUB_MIN_SIDE && size.height >= HUB_MIN_SIDE {
            let w = size.width - 8.0;
            let h = size.height - 8.0;
            options.push(RoomSplit {
                suggested_size: Dimensions::new(w, h),
                connection_points: vec![
                    Position::new(w / 2.0, 0.0),
                    Position::new(w, h / 2.0),
                    Position::new(w / 2.0, h),
                    Position::new(0.0, h / 2.0),
                ],
                entity_distribution: BTreeMap::from([
                    ("central_room".to_string(), (entity_count as u64 * 2 / 3) as u32),
                    ("side_room_1".to_string(), entity_count / 6),
                    ("side_room_2".to_string(), entity_count / 6),
                ]),
                connection_type: "passage".into(),
                reason: "Hub and spoke layout for complex encounters".into(),
                capacity_improvement: 0.9,
            });
        }

        options
    }
}

#[async_trait]
impl CapacityModel for FeelingCapacityModel {
    async fn check_capacity(&self, query: &CapacityQuery) -> Result<CapacityReport> {
        if query.dimensions.width <= 0.0 || query.dimensions.height <= 0.0 {
            return Err(SpawnError::Capacity(format!(
                "room dimensions must be positive, got {}x{}",
                query.dimensions.width, query.dimensions.height
            )));
        }

        let estimate = self.estimate(
            query.dimensions,
            query.constraints.target_feeling,
            &query.constraints.spacing,
        );
        let splits = if query.include_split_options {
            self.split_options(query.dimensions, query.entity_count)
        } else {
            Vec::new()
        };

        Ok(CapacityReport {
            satisfied: query.entity_count <= estimate.recommended,
            recommended_capacity: estimate.recommended,
            max_capacity: estimate.max,
            splits,
        })
    }

    async fn recommend_size(&self, query: &SizingQuery) -> Result<Dimensions> {
        let mut dimensions = self.optimal_size(&query.profile, query.entity_count);
        if query.additional_space > 0.0 {
            dimensions.width *= query.additional_space;
            dimensions.height *= query.additional_space;
        }
        dimensions.width = dimensions.width.max(query.min_dimensions.width);
        dimensions.height = dimensions.height.max(query.min_dimensions.height);
        Ok(dimensions)
    }
}
