//! Independent placement anywhere in the room

use rand_chacha::ChaCha8Rng;

use super::{Assignment, PlacementContext, RoomPlacement};

pub fn place(
    ctx: &PlacementContext<'_>,
    assignments: &[Assignment],
    out: &mut RoomPlacement,
    rng: &mut ChaCha8Rng,
) {
    let bounds = ctx.room.bounds();
    for assignment in assignments {
        out.scatter(ctx, assignment, bounds, rng);
    }
}

#[cfg(test)]
mod tests {
    use super::super::testing::*;
    use super::*;
    use crate::placement::{PlacementRules, SpatialConstraints};
    use crate::request::SpawnRequest;
    use crate::spatial::RoomGeometry;
    use rand::SeedableRng;

    #[test]
    fn test_scatter_respects_distance_between_entities() {
        let request = SpawnRequest::default()
            .with_constraints(SpatialConstraints::new().with_min_distance("goblin", "goblin", 3.0));
        let fixture = Fixture::new(RoomGeometry::grid("cave", 12.0, 12.0), request);
        let mut out = RoomPlacement::new();
        let mut rng = ChaCha8Rng::seed_from_u64(9);

        place(&fixture.ctx(), &assignments("goblin", "g", 5), &mut out, &mut rng);

        assert_eq!(out.placed.len(), 5);
        for (i, a) in out.placed.iter().enumerate() {
            for b in &out.placed[i + 1..] {
                assert!(a.position.distance(&b.position) >= 3.0);
            }
        }
    }

    #[test]
    fn test_one_failure_does_not_stop_the_rest() {
        // Only four lattice points fit a 3x3 room with this spacing
        let request = SpawnRequest::default()
            .with_rules(PlacementRules::first_fit())
            .with_constraints(SpatialConstraints::new().with_min_distance("rat", "rat", 1.0));
        let fixture = Fixture::new(RoomGeometry::grid("nook", 3.0, 3.0), request);
        let mut out = RoomPlacement::new();
        let mut rng = ChaCha8Rng::seed_from_u64(2);

        place(&fixture.ctx(), &assignments("rat", "r", 6), &mut out, &mut rng);

        assert_eq!(out.placed.len(), 4);
        assert_eq!(out.failures.len(), 2);
        assert_eq!(out.placed.len() + out.failures.len(), 6);
    }
}
