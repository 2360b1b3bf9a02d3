//! Floor alert escalation.
//!
//! Every encounter raises a floor's encounter count. Crossing a configured
//! threshold raises the alert level, strengthens the remaining garrison and
//! may send reserves into rooms the player has not reached yet.

use super::{alert_entity, floor_state_entity, room_entity, rooms_on_floor, AlertData, FloorStateData, GarrisonSquadData, RaidConfig, RoomData};
use crate::game::{EntityId, EntityManager};
use crate::squads::SquadService;
use log::{debug, info};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;

/// Stat bonuses granted to defenders at one alert level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct AlertBonus {
    pub armor: i32,
    pub strength: i32,
    pub weapon: i32,
}

pub fn alert_bonus(config: &RaidConfig, level: u32) -> AlertBonus {
    config
        .alert_level(level)
        .map(|l| AlertBonus {
            armor: l.armor_bonus,
            strength: l.strength_bonus,
            weapon: l.weapon_bonus,
        })
        .unwrap_or_default()
}

/// Highest configured level whose threshold `encounters` meets.
pub fn level_for_encounters(config: &RaidConfig, encounters: u32) -> u32 {
    config
        .alert
        .levels
        .iter()
        .filter(|l| encounters >= l.encounter_threshold)
        .map(|l| l.level)
        .max()
        .unwrap_or(0)
}

/// Records an encounter on `floor` and returns the resulting alert level.
pub fn increment_alert(
    world: &mut EntityManager,
    config: &RaidConfig,
    squads: &dyn SquadService,
    rng: &mut StdRng,
    floor: usize,
) -> u32 {
    let Some(alert) = alert_entity(world, floor).and_then(|id| world.get_mut::<AlertData>(id)) else {
        return 0;
    };
    alert.encounter_count += 1;
    let old_level = alert.current_level;
    let new_level = level_for_encounters(config, alert.encounter_count).max(old_level);
    alert.current_level = new_level;
    debug!(
        "Floor {} alert: {} encounters, level {}",
        floor, alert.encounter_count, new_level
    );

    if new_level == old_level {
        return new_level;
    }

    let name = config.alert_level(new_level).map(|l| l.name.as_str()).unwrap_or("");
    info!("Floor {} alert raised to level {} {}", floor, new_level, name);

    let old = alert_bonus(config, old_level);
    let new = alert_bonus(config, new_level);
    for squad in living_garrison_squads(world, squads, floor) {
        squads.apply_stat_bonus(
            world,
            squad,
            new.armor - old.armor,
            new.strength - old.strength,
            new.weapon - old.weapon,
        );
    }

    if config.alert_level(new_level).map(|l| l.activates_reserves).unwrap_or(false) {
        activate_reserves(world, rng, floor);
    }
    new_level
}

fn living_garrison_squads(world: &EntityManager, squads: &dyn SquadService, floor: usize) -> Vec<EntityId> {
    world
        .iter::<GarrisonSquadData>()
        .filter(|(_, tag)| tag.floor_number == floor && !tag.is_destroyed)
        .map(|(id, _)| id)
        .filter(|id| !squads.is_squad_destroyed(world, *id))
        .collect()
}

/// Sends every idle reserve on `floor` into a random accessible, uncleared
/// combat room. Returns the reserves that moved.
pub fn activate_reserves(world: &mut EntityManager, rng: &mut StdRng, floor: usize) -> Vec<EntityId> {
    let Some(reserves) = floor_state_entity(world, floor)
        .and_then(|id| world.get::<FloorStateData>(id))
        .map(|f| f.reserve_squad_ids.clone())
    else {
        return Vec::new();
    };
    let targets: Vec<usize> = rooms_on_floor(world, floor)
        .into_iter()
        .filter(|r| r.is_accessible && !r.is_cleared && r.room_type.is_combat())
        .map(|r| r.node_id)
        .collect();
    if targets.is_empty() {
        return Vec::new();
    }

    let mut moved = Vec::new();
    for reserve in reserves {
        let idle = world
            .get::<GarrisonSquadData>(reserve)
            .map(|tag| tag.is_reserve && tag.room_node_id.is_none() && !tag.is_destroyed)
            .unwrap_or(false);
        if !idle {
            continue;
        }
        let Some(&node_id) = targets.choose(rng) else {
            break;
        };
        if let Some(tag) = world.get_mut::<GarrisonSquadData>(reserve) {
            tag.room_node_id = Some(node_id);
        }
        if let Some(room) = room_entity(world, node_id, floor).and_then(|id| world.get_mut::<RoomData>(id)) {
            room.garrison_squad_ids.push(reserve);
        }
        info!("Reserve squad {} moved into room {} on floor {}", reserve, node_id, floor);
        moved.push(reserve);
    }
    moved
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::raid::{generate_garrison, room_data, GarrisonContext, RaidParticipants};
    use crate::squads::{Attributes, MonsterCatalog, RosterSquadService};
    use rand::SeedableRng;

    fn config() -> RaidConfig {
        RaidConfig::from_json_str(
            r#"{"alert":{"levels":[
                {"level":0,"name":"Unaware","encounterThreshold":0},
                {"level":1,"name":"Suspicious","encounterThreshold":1,"armorBonus":1},
                {"level":2,"name":"Alarmed","encounterThreshold":2,"armorBonus":2,"strengthBonus":1,"activatesReserves":true}
            ]}}"#,
        )
        .unwrap()
    }

    fn setup(config: &RaidConfig) -> (EntityManager, RosterSquadService, StdRng) {
        let squads = RosterSquadService::new();
        let catalog = MonsterCatalog::default();
        let mut world = EntityManager::new();
        let mut rng = StdRng::seed_from_u64(9);
        let who = RaidParticipants {
            commander: world.create_entity(),
            player_entity: world.create_entity(),
            player_squad_ids: vec![],
        };
        let ctx = GarrisonContext {
            config,
            squads: &squads,
            catalog: &catalog,
        };
        generate_garrison(&mut world, &ctx, &mut rng, 1, &who);
        (world, squads, rng)
    }

    #[test]
    fn test_level_from_thresholds() {
        let config = config();
        assert_eq!(level_for_encounters(&config, 0), 0);
        assert_eq!(level_for_encounters(&config, 1), 1);
        assert_eq!(level_for_encounters(&config, 7), 2);
        assert_eq!(alert_bonus(&config, 2), AlertBonus { armor: 2, strength: 1, weapon: 0 });
        assert_eq!(alert_bonus(&config, 9), AlertBonus::default());
    }

    #[test]
    fn test_bonus_applied_once_per_level() {
        let config = config();
        let (mut world, squads, mut rng) = setup(&config);
        let floor = world.get::<FloorStateData>(floor_state_entity(&world, 1).unwrap()).unwrap().clone();
        let squad = floor.garrison_squad_ids[0];
        let unit = squads.unit_ids_in_squad(&world, squad)[0];
        let base = *world.get::<Attributes>(unit).unwrap();

        assert_eq!(increment_alert(&mut world, &config, &squads, &mut rng, 1), 1);
        assert_eq!(world.get::<Attributes>(unit).unwrap().armor, base.armor + 1);
        assert_eq!(increment_alert(&mut world, &config, &squads, &mut rng, 1), 2);
        assert_eq!(increment_alert(&mut world, &config, &squads, &mut rng, 1), 2);
        let now = world.get::<Attributes>(unit).unwrap();
        assert_eq!(now.armor, base.armor + 2);
        assert_eq!(now.strength, base.strength + 1);

        let alert = world.get::<AlertData>(alert_entity(&world, 1).unwrap()).unwrap();
        assert_eq!(alert.encounter_count, 3);
    }

    #[test]
    fn test_reserves_move_into_open_rooms() {
        let config = config();
        let (mut world, squads, mut rng) = setup(&config);
        increment_alert(&mut world, &config, &squads, &mut rng, 1);
        increment_alert(&mut world, &config, &squads, &mut rng, 1);

        let floor = world.get::<FloorStateData>(floor_state_entity(&world, 1).unwrap()).unwrap().clone();
        for reserve in &floor.reserve_squad_ids {
            let node = world.get::<GarrisonSquadData>(*reserve).unwrap().room_node_id.unwrap();
            let room = room_data(&world, node, 1).unwrap();
            assert!(room.is_accessible && !room.is_cleared);
            assert!(room.garrison_squad_ids.contains(reserve));
        }
    }

    #[test]
    fn test_missing_floor_is_zero() {
        let config = config();
        let (mut world, squads, mut rng) = setup(&config);
        assert_eq!(increment_alert(&mut world, &config, &squads, &mut rng, 8), 0);
    }
}
