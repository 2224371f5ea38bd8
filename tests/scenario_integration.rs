//! Scenario file tests
//!
//! Load the bundled gatehouse scenario and run it the way spawn_runner does.

use std::path::PathBuf;
use std::sync::Arc;

use arc_spawn::core::{Position, Rect};
use arc_spawn::engine::SpawnResult;
use arc_spawn::events::{MemorySink, SpawnEvent};
use arc_spawn::scenario::Scenario;

fn gatehouse() -> Scenario {
    let path = PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("scenarios/gatehouse.toml");
    Scenario::load(path).unwrap()
}

#[test]
fn test_gatehouse_parses() {
    let scenario = gatehouse();
    assert_eq!(scenario.engine.seed, Some(42));
    assert_eq!(scenario.rooms.len(), 2);
    assert_eq!(scenario.rooms[0].obstacles.len(), 1);
    assert_eq!(scenario.tables[0].total_weight(), 7);
    assert_eq!(scenario.request.groups.len(), 2);
    assert_eq!(scenario.request.player_choices.len(), 2);
}

#[tokio::test]
async fn test_gatehouse_runs() {
    let scenario = gatehouse();
    let sink = Arc::new(MemorySink::new());
    let engine = scenario.build_engine(sink.clone());

    let result = engine
        .populate(scenario.target(false), &scenario.request)
        .await
        .unwrap();

    assert!(result.success);
    let gate = Rect::new(1.0, 7.0, 3.0, 4.0);
    for player in ["aria", "bram", "cole"] {
        let position = result.position_of(player).unwrap();
        assert!(gate.contains(position), "{} at {:?}", player, position);
    }
    assert_eq!(result.position_of("aria"), Some(Position::new(2.0, 8.0)));

    let orcs: Vec<_> = result
        .placed
        .iter()
        .filter(|p| p.entity.entity_type == "orc")
        .collect();
    assert!((3..=7).contains(&(orcs.len() + result.failures.len())));
    for orc in &orcs {
        assert!(orc.entity.id.starts_with("orc_"));
        for player in ["aria", "bram", "cole"] {
            let p = result.position_of(player).unwrap();
            assert!(orc.position.distance(&p) >= 6.0);
        }
    }

    let denied: Vec<String> = sink
        .with_topic("spawn.player.denied")
        .into_iter()
        .filter_map(|event| match event {
            SpawnEvent::PlayerSpawnDenied { player_id, .. } => Some(player_id),
            _ => None,
        })
        .collect();
    assert_eq!(denied, vec!["bram".to_string()]);
}

#[tokio::test]
async fn test_result_serializes_for_the_runner() {
    let scenario = gatehouse();
    let engine = scenario.build_engine(Arc::new(MemorySink::new()));
    let result = engine
        .populate(scenario.target(true), &scenario.request)
        .await
        .unwrap();

    assert!(result.room_structure.is_split);
    let json = serde_json::to_string(&result).unwrap();
    let back: SpawnResult = serde_json::from_str(&json).unwrap();
    assert_eq!(back.placed.len(), result.placed.len());
    assert_eq!(back.room_structure.connected_rooms, vec!["courtyard", "barracks"]);
}
