//! Request validation; every problem is reported at once

use ahash::AHashSet;

use crate::core::error::{Result, SpawnError};
use crate::request::group::EntitySource;
use crate::request::{SpawnPattern, SpawnRequest};

/// Check a request for configuration errors before any work is done
pub fn validate_request(request: &SpawnRequest) -> Result<()> {
    let problems = collect_problems(request);
    if problems.is_empty() {
        Ok(())
    } else {
        Err(SpawnError::InvalidRequest(problems.join("; ")))
    }
}

pub fn collect_problems(request: &SpawnRequest) -> Vec<String> {
    let mut problems = Vec::new();

    if request.groups.is_empty() {
        problems.push("spawn request has no entity groups".to_string());
    }

    let mut group_ids = AHashSet::new();
    for (index, group) in request.groups.iter().enumerate() {
        if group.id.is_empty() {
            problems.push(format!("entity group {} missing ID", index));
        } else if !group_ids.insert(group.id.as_str()) {
            problems.push(format!("duplicate entity group ID: {}", group.id));
        }
        let label = if group.id.is_empty() {
            format!("#{}", index)
        } else {
            group.id.clone()
        };

        if group.entity_type.is_empty() {
            problems.push(format!("entity group {} missing type", label));
        }
        match &group.source {
            EntitySource::Inline(entities) if entities.is_empty() => {
                problems.push(format!("entity group {} has an empty inline entity list", label));
            }
            EntitySource::Table(name) if name.is_empty() => {
                problems.push(format!("entity group {} has an empty table name", label));
            }
            _ => {}
        }
        for problem in group.quantity.problems() {
            problems.push(format!("entity group {} quantity: {}", label, problem));
        }
        if let (Some(team_id), Some(teams)) = (&group.team_id, &request.teams) {
            if teams.team(team_id).is_none() {
                problems.push(format!(
                    "entity group {} references unknown team {}",
                    label, team_id
                ));
            }
        }
    }

    problems.extend(request.constraints.problems());
    problems.extend(request.rules.problems());

    if let Some(teams) = &request.teams {
        let mut team_ids = AHashSet::new();
        for (index, team) in teams.teams.iter().enumerate() {
            if team.id.is_empty() {
                problems.push(format!("team {} missing ID", index));
            } else if !team_ids.insert(team.id.as_str()) {
                problems.push(format!("duplicate team ID: {}", team.id));
            }
            if let Some(formation) = &team.formation {
                if formation.spacing <= 0.0 {
                    problems.push(format!("team {} formation spacing must be positive", team.id));
                }
            }
        }
        if teams.min_team_distance <= 0.0 {
            problems.push("min team distance must be positive".to_string());
        }
    }

    if let Some(formation) = &request.formation {
        if formation.spacing <= 0.0 {
            problems.push(format!("formation {} spacing must be positive", formation.name));
        }
    }

    if let Some(scaling) = &request.scaling {
        if scaling.buffer_factor <= 0.0 {
            problems.push("scaling buffer factor must be positive".to_string());
        }
    }

    let mut zone_ids = AHashSet::new();
    for (index, zone) in request.player_zones.iter().enumerate() {
        if zone.id.is_empty() {
            problems.push(format!("spawn zone {} missing ID", index));
        } else if !zone_ids.insert(zone.id.as_str()) {
            problems.push(format!("duplicate spawn zone ID: {}", zone.id));
        }
        if zone.max_entities < 1 {
            problems.push(format!("spawn zone {} must allow at least 1 entity", zone.id));
        }
        if zone.area.size.width <= 0.0 || zone.area.size.height <= 0.0 {
            problems.push(format!("spawn zone {} must have positive dimensions", zone.id));
        }
    }

    if request.pattern == SpawnPattern::PlayerChoice && request.player_zones.is_empty() {
        problems.push("player choice spawning requires at least one spawn zone".to_string());
    }

    for (index, choice) in request.player_choices.iter().enumerate() {
        if choice.player_id.is_empty() {
            problems.push(format!("player choice {} missing player ID", index));
        }
        if !zone_ids.contains(choice.zone_id.as_str()) {
            problems.push(format!(
                "player choice {} references unknown zone {}",
                index, choice.zone_id
            ));
        }
    }

    problems
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::{Entity, Position, Rect};
    use crate::request::{EntityGroup, PlayerChoice, QuantitySpec, SpawnZone};

    fn goblins() -> EntityGroup {
        EntityGroup::from_table("goblins", "goblin", "goblins", QuantitySpec::fixed(3))
    }

    fn party() -> EntityGroup {
        EntityGroup::of_entities("party", "player", vec![Entity::new("p1", "player")])
    }

    #[test]
    fn test_valid_request_passes() {
        let request = SpawnRequest::new(SpawnPattern::Scattered).with_group(goblins());
        assert!(validate_request(&request).is_ok());
    }

    #[test]
    fn test_reports_every_problem() {
        let bad = EntityGroup::inline("", "", vec![], QuantitySpec::fixed(0));
        let request = SpawnRequest::new(SpawnPattern::Scattered)
            .with_group(bad)
            .with_group(EntityGroup::from_table("t", "orc", "", QuantitySpec::range(4, 1)));

        let problems = collect_problems(&request);
        assert!(problems.iter().any(|p| p == "entity group 0 missing ID"));
        assert!(problems.iter().any(|p| p.contains("missing type")));
        assert!(problems.iter().any(|p| p.contains("empty inline entity list")));
        assert!(problems.iter().any(|p| p.contains("empty table name")));
        assert!(problems.iter().any(|p| p.contains("range min (4) exceeds max (1)")));

        match validate_request(&request) {
            Err(SpawnError::InvalidRequest(message)) => assert!(message.contains("; ")),
            other => panic!("expected invalid request, got {:?}", other),
        }
    }

    #[test]
    fn test_zone_references_must_exist() {
        let request = SpawnRequest::new(SpawnPattern::PlayerChoice)
            .with_group(party())
            .with_zone(SpawnZone::new("north", Rect::new(0.0, 0.0, 4.0, 2.0), 0))
            .with_choice(PlayerChoice::new("p1", "south", Position::new(1.0, 1.0)));

        let problems = collect_problems(&request);
        assert!(problems.iter().any(|p| p.contains("at least 1 entity")));
        assert!(problems.iter().any(|p| p.contains("unknown zone south")));
    }

    #[test]
    fn test_player_choice_needs_zones() {
        let request = SpawnRequest::new(SpawnPattern::PlayerChoice)
            .with_group(party());
        assert!(validate_request(&request).is_err());
    }

    #[test]
    fn test_duplicate_group_ids() {
        let request = SpawnRequest::new(SpawnPattern::Scattered)
            .with_group(goblins())
            .with_group(goblins());
        let problems = collect_problems(&request);
        assert_eq!(problems, vec!["duplicate entity group ID: goblins".to_string()]);
    }
}
