//! Picks a garrison archetype for every combat room of a floor.

use super::{archetype, archetypes_preferring, RaidConfig};
use crate::generation::{FloorDag, FloorNode};
use log::warn;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use std::collections::BTreeMap;

/// Archetype for one room. Archetypes preferring the room's type win;
/// otherwise critical-path rooms draw from the critical pool and branch
/// rooms from the branch pool, joined by the elite pool on deep floors.
pub fn pick_archetype_for_room(
    node: &FloorNode,
    floor: usize,
    config: &RaidConfig,
    rng: &mut StdRng,
) -> Option<&'static str> {
    let preferred = archetypes_preferring(node.room_type);
    if let Some(choice) = preferred.choose(rng) {
        return Some(choice.name);
    }

    let mut pool = if node.on_critical_path {
        config.critical_path_archetypes()
    } else {
        config.branch_archetypes()
    };
    if !node.on_critical_path && floor >= config.elite_floor_threshold() {
        pool.extend(config.elite_archetypes());
    }

    let name = pool.choose(rng)?;
    match archetype(name) {
        Some(a) => Some(a.name),
        None => {
            warn!("Archetype pool references unknown archetype {}", name);
            None
        }
    }
}

/// Archetype per combat room, keyed by node id. Rest rooms and stairs are
/// left ungarrisoned.
pub fn assign_archetypes_to_floor(
    dag: &FloorDag,
    floor: usize,
    config: &RaidConfig,
    rng: &mut StdRng,
) -> BTreeMap<usize, &'static str> {
    dag.nodes
        .iter()
        .filter(|node| node.room_type.is_combat())
        .filter_map(|node| pick_archetype_for_room(node, floor, config, rng).map(|a| (node.id, a)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generation::{build_garrison_dag, RoomType};
    use rand::SeedableRng;

    #[test]
    fn test_preferred_archetype_wins() {
        let config = RaidConfig::default();
        let mut rng = StdRng::seed_from_u64(2);
        let guard = FloorNode::new(0, RoomType::GuardPost, true);
        for _ in 0..20 {
            assert_eq!(pick_archetype_for_room(&guard, 1, &config, &mut rng), Some("chokepoint_guard"));
        }
        let command = FloorNode::new(1, RoomType::CommandPost, false);
        assert_eq!(pick_archetype_for_room(&command, 1, &config, &mut rng), Some("command_post"));
    }

    #[test]
    fn test_every_combat_room_is_assigned() {
        let config = RaidConfig::default();
        let mut rng = StdRng::seed_from_u64(17);
        for floor in 1..=5 {
            let dag = build_garrison_dag(floor, &mut rng);
            let assignments = assign_archetypes_to_floor(&dag, floor, &config, &mut rng);
            for node in &dag.nodes {
                assert_eq!(
                    assignments.contains_key(&node.id),
                    node.room_type.is_combat(),
                    "floor {} node {} ({})",
                    floor,
                    node.id,
                    node.room_type
                );
            }
            assert!(assignments.values().all(|name| archetype(name).is_some()));
        }
    }
}
