//! Raid-specific combat starter and resolvers.

use super::{floor_state_entity, is_floor_complete, mark_room_cleared, room_data, FloorStateData, GarrisonSquadData, RaidConfig, RaidStateData, RaidStatus};
use crate::combat::{CombatResolver, CombatSetup, CombatStarter, GrantTarget, ResolutionPlan, Reward};
use crate::game::{EntityId, EntityManager, Position};
use crate::generation::RoomType;
use crate::squads::SquadData;
use crate::{GarrisonError, GarrisonResult};
use log::{info, warn};

/// Horizontal distance of each side from the combat center.
pub const RAID_SIDE_OFFSET: i32 = 3;

/// Lines player squads up west of the combat position and the garrison
/// east of it, one row apart.
#[derive(Debug, Clone)]
pub struct RaidCombatStarter {
    pub raid_entity: EntityId,
    pub garrison_squad_ids: Vec<EntityId>,
    pub deployed_squad_ids: Vec<EntityId>,
    pub combat_position: Position,
    pub commander: EntityId,
    previous_positions: Vec<(EntityId, Position)>,
}

impl RaidCombatStarter {
    pub fn new(
        raid_entity: EntityId,
        garrison_squad_ids: Vec<EntityId>,
        deployed_squad_ids: Vec<EntityId>,
        combat_position: Position,
        commander: EntityId,
    ) -> Self {
        Self {
            raid_entity,
            garrison_squad_ids,
            deployed_squad_ids,
            combat_position,
            commander,
            previous_positions: Vec::new(),
        }
    }

    fn place_line(&mut self, world: &mut EntityManager, squads: &[EntityId], x: i32) {
        let top = self.combat_position.y - (squads.len() as i32 - 1) / 2;
        for (i, squad) in squads.iter().enumerate() {
            if let Some(data) = world.get_mut::<SquadData>(*squad) {
                self.previous_positions.push((*squad, data.position));
                data.position = Position::new(x, top + i as i32);
            }
        }
    }
}

impl CombatStarter for RaidCombatStarter {
    fn prepare(&mut self, world: &mut EntityManager) -> GarrisonResult<CombatSetup> {
        if self.garrison_squad_ids.is_empty() {
            return Err(GarrisonError::InvalidState("no garrison squads to fight".to_string()));
        }
        if self.deployed_squad_ids.is_empty() {
            return Err(GarrisonError::InvalidState("no player squads deployed".to_string()));
        }
        self.previous_positions.clear();
        let center = self.combat_position;
        let players = self.deployed_squad_ids.clone();
        let enemies = self.garrison_squad_ids.clone();
        self.place_line(world, &players, center.x - RAID_SIDE_OFFSET);
        self.place_line(world, &enemies, center.x + RAID_SIDE_OFFSET);

        Ok(CombatSetup {
            enemy_squad_ids: enemies,
            player_squad_ids: players,
            combat_position: center,
            encounter_id: Some(self.raid_entity),
            commander: Some(self.commander),
        })
    }

    fn rollback(&mut self, world: &mut EntityManager) {
        for (squad, pos) in self.previous_positions.drain(..) {
            if let Some(data) = world.get_mut::<SquadData>(squad) {
                data.position = pos;
            }
        }
    }
}

/// Room reward on `floor`: `round(base * (1 + (floor - 1) * scale / 100))`.
pub fn room_reward(config: &RaidConfig, floor: usize, room_type: RoomType) -> Reward {
    let scale = 1.0 + (floor.saturating_sub(1)) as f64 * config.rewards.floor_scale_percent as f64 / 100.0;
    let base = Reward::new(config.rewards.base_gold, config.rewards.base_experience, 0).scale(scale);
    let mana = if room_type == RoomType::CommandPost {
        config.rewards.command_post_mana_restore
    } else {
        0
    };
    Reward { mana, ..base }
}

/// Victory in a room: the garrison is destroyed, the room cleared and the
/// floor-scaled reward granted.
pub struct RaidRoomResolver<'a> {
    pub config: &'a RaidConfig,
    pub raid_entity: EntityId,
    pub node_id: usize,
    /// Squads that fought and share the experience
    pub deployed_squad_ids: Vec<EntityId>,
}

impl CombatResolver for RaidRoomResolver<'_> {
    fn resolve(&mut self, world: &mut EntityManager) -> Option<ResolutionPlan> {
        let state = world.get::<RaidStateData>(self.raid_entity)?.clone();
        let floor = state.current_floor;
        let room = room_data(world, self.node_id, floor)?.clone();

        for squad in &room.garrison_squad_ids {
            if let Some(tag) = world.get_mut::<GarrisonSquadData>(*squad) {
                tag.is_destroyed = true;
            }
        }
        if let Err(err) = mark_room_cleared(world, self.node_id, floor) {
            warn!("Could not clear room {}: {}", self.node_id, err);
            return None;
        }
        if is_floor_complete(world, floor) {
            if let Some(floor_state) = floor_state_entity(world, floor).and_then(|id| world.get_mut::<FloorStateData>(id)) {
                floor_state.is_complete = true;
            }
            info!("Floor {} complete", floor);
        }

        let squad_ids = if self.deployed_squad_ids.is_empty() {
            state.player_squad_ids.clone()
        } else {
            self.deployed_squad_ids.clone()
        };
        Some(ResolutionPlan {
            rewards: room_reward(self.config, floor, room.room_type),
            target: GrantTarget {
                player_entity: Some(state.player_entity),
                squad_ids,
                commander: Some(state.commander),
            },
            description: format!("Cleared {} (room {}) on floor {}", room.room_type, self.node_id, floor),
        })
    }
}

/// Defeat or flight ends the raid.
pub struct RaidDefeatResolver {
    pub raid_entity: EntityId,
}

impl CombatResolver for RaidDefeatResolver {
    fn resolve(&mut self, world: &mut EntityManager) -> Option<ResolutionPlan> {
        let state = world.get_mut::<RaidStateData>(self.raid_entity)?;
        state.status = RaidStatus::Defeat;
        info!("Raid lost on floor {}", state.current_floor);
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_room_reward_scaling() {
        let config = RaidConfig::from_json_str(r#"{"rewards":{"baseGold":100,"baseExperience":50,"floorScalePercent":20,"commandPostManaRestore":15}}"#).unwrap();
        assert_eq!(room_reward(&config, 1, RoomType::Barracks), Reward::new(100, 50, 0));
        assert_eq!(room_reward(&config, 3, RoomType::Barracks), Reward::new(140, 70, 0));
        assert_eq!(room_reward(&config, 2, RoomType::CommandPost), Reward::new(120, 60, 15));
    }

    #[test]
    fn test_starter_places_sides_and_rolls_back() {
        let mut world = EntityManager::new();
        let squad = |world: &mut EntityManager| {
            world.spawn(SquadData {
                name: "S".to_string(),
                formation: Default::default(),
                position: Position::origin(),
                morale: 100,
                unit_ids: Vec::new(),
                is_deployed: false,
            })
        };
        let players = vec![squad(&mut world), squad(&mut world)];
        let enemies = vec![squad(&mut world)];
        let raid = world.create_entity();
        let commander = world.create_entity();
        let mut starter = RaidCombatStarter::new(raid, enemies.clone(), players.clone(), Position::new(50, 40), commander);

        let setup = starter.prepare(&mut world).unwrap();
        assert_eq!(setup.player_squad_ids, players);
        assert_eq!(world.get::<SquadData>(players[0]).unwrap().position, Position::new(47, 40));
        assert_eq!(world.get::<SquadData>(players[1]).unwrap().position, Position::new(47, 41));
        assert_eq!(world.get::<SquadData>(enemies[0]).unwrap().position, Position::new(53, 40));

        starter.rollback(&mut world);
        assert_eq!(world.get::<SquadData>(players[1]).unwrap().position, Position::origin());
    }

    #[test]
    fn test_starter_requires_both_sides() {
        let mut world = EntityManager::new();
        let raid = world.create_entity();
        let mut starter = RaidCombatStarter::new(raid, Vec::new(), vec![raid], Position::origin(), raid);
        assert!(starter.prepare(&mut world).is_err());
    }
}
