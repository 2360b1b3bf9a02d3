//! # Raid Runner
//!
//! State machine for one raid: no raid, then `Active`, ending in `Victory`
//! or `Defeat`. `Retreated` pauses an active raid; the state is kept and
//! `resume` continues it.
//!
//! Combat runs outside the runner. `trigger_encounter` hands the fight to
//! the encounter service and the host reports the outcome back through
//! `resolve_encounter`.

use super::{
    alert_entity, apply_between_floor_recovery, apply_defeat_morale, apply_post_encounter_recovery,
    apply_rest_room_recovery, apply_victory_morale, auto_deploy, clear_garrison, deployment_for_encounter,
    floor_state_entity, generate_garrison, increment_alert, is_floor_complete, mark_room_cleared, room_data,
    rooms_on_floor, set_deployment, AlertData, DeploymentData, FloorStateData, GarrisonContext, RaidCombatStarter,
    RaidConfig, RaidDefeatResolver, RaidParticipants, RaidRoomResolver, RaidStateData, RaidStatus, RoomData,
};
use crate::combat::{execute_combat_start, execute_resolution, CombatExitReason, CombatResult, CombatSetup, EncounterService};
use crate::game::{EntityId, EntityManager};
use crate::generation::RoomType;
use crate::squads::{MonsterCatalog, SquadService};
use crate::{GarrisonError, GarrisonResult};
use log::{debug, info, warn};
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::collections::HashMap;
use std::sync::Arc;

/// Summary of the last resolved encounter, for the UI.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RaidEncounterResult {
    pub room_name: String,
    pub room_type: String,
    pub units_lost: usize,
    pub alert_level: u32,
    pub reward_text: String,
    pub is_victory: bool,
}

/// What selecting a room did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoomSelection {
    /// Rest room: squads recovered and the room is cleared
    Rested,
    /// Stairs: the floor is complete
    FloorComplete,
    /// Combat room: deploy squads and trigger the encounter next
    AwaitingDeployment,
}

fn no_active_raid() -> GarrisonError {
    GarrisonError::InvalidState("no active raid".to_string())
}

pub struct RaidRunner {
    config: Arc<RaidConfig>,
    catalog: Arc<MonsterCatalog>,
    squads: Box<dyn SquadService>,
    encounters: Box<dyn EncounterService>,
    raid_entity: Option<EntityId>,
    pre_combat_alive: HashMap<EntityId, usize>,
    deployed_in_combat: Vec<EntityId>,
    current_room: Option<usize>,
    last_encounter_result: Option<RaidEncounterResult>,
    rng: StdRng,
}

impl RaidRunner {
    pub fn new(
        config: Arc<RaidConfig>,
        catalog: Arc<MonsterCatalog>,
        squads: Box<dyn SquadService>,
        encounters: Box<dyn EncounterService>,
        seed: u64,
    ) -> Self {
        Self {
            config,
            catalog,
            squads,
            encounters,
            raid_entity: None,
            pre_combat_alive: HashMap::new(),
            deployed_in_combat: Vec::new(),
            current_room: None,
            last_encounter_result: None,
            rng: StdRng::seed_from_u64(seed),
        }
    }

    pub fn config(&self) -> &RaidConfig {
        &self.config
    }

    pub fn squads(&self) -> &dyn SquadService {
        self.squads.as_ref()
    }

    pub fn raid_entity(&self) -> Option<EntityId> {
        self.raid_entity
    }

    /// True while a raid is running and not paused by a retreat.
    pub fn is_active(&self, world: &EntityManager) -> bool {
        self.raid_state(world).map(|s| s.status == RaidStatus::Active).unwrap_or(false)
    }

    pub fn raid_state<'w>(&self, world: &'w EntityManager) -> Option<&'w RaidStateData> {
        world.get::<RaidStateData>(self.raid_entity?)
    }

    pub fn floor_state<'w>(&self, world: &'w EntityManager, floor: usize) -> Option<&'w FloorStateData> {
        self.raid_entity?;
        world.get::<FloorStateData>(floor_state_entity(world, floor)?)
    }

    pub fn rooms_on_floor<'w>(&self, world: &'w EntityManager, floor: usize) -> Vec<&'w RoomData> {
        if self.raid_entity.is_none() {
            return Vec::new();
        }
        rooms_on_floor(world, floor)
    }

    pub fn alert_data<'w>(&self, world: &'w EntityManager, floor: usize) -> Option<&'w AlertData> {
        self.raid_entity?;
        world.get::<AlertData>(alert_entity(world, floor)?)
    }

    pub fn last_encounter_result(&self) -> Option<&RaidEncounterResult> {
        self.last_encounter_result.as_ref()
    }

    fn active_state(&self, world: &EntityManager) -> GarrisonResult<(EntityId, RaidStateData)> {
        let entity = self.raid_entity.ok_or_else(no_active_raid)?;
        let state = world.get::<RaidStateData>(entity).ok_or_else(no_active_raid)?;
        if state.status != RaidStatus::Active {
            return Err(no_active_raid());
        }
        Ok((entity, state.clone()))
    }

    fn state_mut<'w>(&self, world: &'w mut EntityManager) -> Option<&'w mut RaidStateData> {
        world.get_mut::<RaidStateData>(self.raid_entity?)
    }

    /// Generates the garrison and starts on floor 1. A `floor_count` of 0
    /// uses the configured default. A retreated raid is abandoned.
    pub fn start_raid(
        &mut self,
        world: &mut EntityManager,
        participants: RaidParticipants,
        floor_count: usize,
    ) -> GarrisonResult<EntityId> {
        if self.raid_entity.is_some() {
            if self.is_active(world) {
                return Err(GarrisonError::InvalidState("raid already in progress".to_string()));
            }
            warn!("Abandoning retreated raid to start a new one");
            self.raid_entity = None;
        }
        if participants.player_squad_ids.is_empty() {
            return Err(GarrisonError::InvalidAction("no player squads provided".to_string()));
        }
        let max = self.config.max_player_squads();
        if participants.player_squad_ids.len() > max {
            return Err(GarrisonError::InvalidAction(format!(
                "too many squads: {} (max {})",
                participants.player_squad_ids.len(),
                max
            )));
        }

        let removed = clear_garrison(world, self.squads.as_ref());
        if removed > 0 {
            debug!("Removed {} entities left by a previous raid", removed);
        }

        let floors = if floor_count == 0 {
            self.config.default_floor_count()
        } else {
            floor_count
        };
        let ctx = GarrisonContext {
            config: &self.config,
            squads: self.squads.as_ref(),
            catalog: &self.catalog,
        };
        let raid = generate_garrison(world, &ctx, &mut self.rng, floors, &participants);

        self.raid_entity = Some(raid);
        self.pre_combat_alive.clear();
        self.deployed_in_combat.clear();
        self.current_room = None;
        self.last_encounter_result = None;
        info!(
            "Raid started with {} squads across {} floors",
            participants.player_squad_ids.len(),
            floors
        );
        Ok(raid)
    }

    pub fn enter_floor(&mut self, world: &mut EntityManager, floor: usize) -> GarrisonResult<()> {
        let (_, state) = self.active_state(world)?;
        if floor < 1 || floor > state.total_floors {
            return Err(GarrisonError::InvalidAction(format!(
                "invalid floor number: {} (total: {})",
                floor, state.total_floors
            )));
        }
        let rooms = floor_state_entity(world, floor)
            .and_then(|id| world.get::<FloorStateData>(id))
            .map(|f| f.rooms_total)
            .ok_or_else(|| GarrisonError::NotFound(format!("floor state not found for floor {}", floor)))?;
        if let Some(state) = self.state_mut(world) {
            state.current_floor = floor;
        }
        info!("Entering floor {} ({} rooms)", floor, rooms);
        Ok(())
    }

    /// Validates the choice of room. Rest rooms and stairs resolve at once.
    pub fn select_room(&mut self, world: &mut EntityManager, node_id: usize) -> GarrisonResult<RoomSelection> {
        let (_, state) = self.active_state(world)?;
        let floor = state.current_floor;
        let room = room_data(world, node_id, floor)
            .ok_or_else(|| GarrisonError::NotFound(format!("room {} not found on floor {}", node_id, floor)))?;
        if !room.is_accessible {
            return Err(GarrisonError::InvalidAction(format!("room {} is not accessible", node_id)));
        }
        if room.is_cleared {
            return Err(GarrisonError::InvalidAction(format!("room {} is already cleared", node_id)));
        }

        let room_type = room.room_type;
        match room_type {
            RoomType::RestRoom => {
                apply_rest_room_recovery(world, &self.config, self.squads.as_ref(), &state.player_squad_ids);
                mark_room_cleared(world, node_id, floor)?;
                info!("Rest room {} cleared, recovery applied", node_id);
                Ok(RoomSelection::Rested)
            }
            RoomType::Stairs => {
                mark_room_cleared(world, node_id, floor)?;
                if let Some(floor_state) = floor_state_entity(world, floor).and_then(|id| world.get_mut::<FloorStateData>(id)) {
                    floor_state.is_complete = true;
                }
                info!("Stairs cleared on floor {}", floor);
                Ok(RoomSelection::FloorComplete)
            }
            room_type => {
                debug!("Selected room {} ({}) on floor {}", node_id, room_type, floor);
                Ok(RoomSelection::AwaitingDeployment)
            }
        }
    }

    pub fn set_deployment(&mut self, world: &mut EntityManager, deployed: &[EntityId]) -> GarrisonResult<DeploymentData> {
        let (raid, _) = self.active_state(world)?;
        set_deployment(world, &self.config, self.squads.as_ref(), raid, deployed)
    }

    pub fn auto_deploy(&mut self, world: &mut EntityManager) -> GarrisonResult<DeploymentData> {
        let (raid, _) = self.active_state(world)?;
        auto_deploy(world, &self.config, self.squads.as_ref(), raid)
    }

    /// Starts combat against the garrison of `node_id` on the current floor.
    pub fn trigger_encounter(&mut self, world: &mut EntityManager, node_id: usize) -> GarrisonResult<CombatSetup> {
        let (raid, state) = self.active_state(world)?;
        let room = room_data(world, node_id, state.current_floor)
            .ok_or_else(|| GarrisonError::NotFound(format!("room {} not found", node_id)))?;
        if !room.is_accessible {
            return Err(GarrisonError::InvalidAction(format!("room {} is not accessible", node_id)));
        }
        if room.is_cleared {
            return Err(GarrisonError::InvalidAction(format!("room {} is already cleared", node_id)));
        }
        if room.garrison_squad_ids.is_empty() {
            return Err(GarrisonError::InvalidState(format!("room {} has no garrison squads", node_id)));
        }
        let garrison = room.garrison_squad_ids.clone();

        self.pre_combat_alive = state
            .player_squad_ids
            .iter()
            .map(|s| (*s, self.squads.count_living_units(world, *s)))
            .collect();
        let deployed = deployment_for_encounter(world, &self.config, self.squads.as_ref(), raid)?;

        self.current_room = Some(node_id);
        self.deployed_in_combat = deployed.clone();
        self.last_encounter_result = None;

        let mut starter = RaidCombatStarter::new(raid, garrison, deployed, self.config.combat_position(), state.commander);
        execute_combat_start(world, self.encounters.as_mut(), &mut starter)
    }

    /// Applies the outcome of the encounter started by `trigger_encounter`.
    pub fn resolve_encounter(
        &mut self,
        world: &mut EntityManager,
        reason: CombatExitReason,
        result: &CombatResult,
    ) -> GarrisonResult<RaidEncounterResult> {
        let raid = self.raid_entity.ok_or_else(no_active_raid)?;
        let state = world.get::<RaidStateData>(raid).cloned().ok_or_else(no_active_raid)?;
        let node_id = self
            .current_room
            .take()
            .ok_or_else(|| GarrisonError::InvalidState("no encounter in progress".to_string()))?;
        debug!("Resolving encounter in room {} after {} rounds", node_id, result.rounds);

        let losses: Vec<(EntityId, usize)> = state
            .player_squad_ids
            .iter()
            .filter_map(|s| {
                let pre = *self.pre_combat_alive.get(s)?;
                let post = self.squads.count_living_units(world, *s);
                Some((*s, pre.saturating_sub(post)))
            })
            .collect();
        let units_lost = losses.iter().map(|(_, lost)| lost).sum();
        let room_type = room_data(world, node_id, state.current_floor)
            .map(|r| r.room_type.as_str())
            .unwrap_or("unknown")
            .to_string();

        let deployed = std::mem::take(&mut self.deployed_in_combat);
        let mut reward_text = String::new();
        match reason {
            CombatExitReason::Victory => {
                let mut resolver = RaidRoomResolver {
                    config: &self.config,
                    raid_entity: raid,
                    node_id,
                    deployed_squad_ids: deployed.clone(),
                };
                if let Some(resolution) = execute_resolution(world, self.squads.as_ref(), &mut resolver) {
                    reward_text = resolution.reward_text;
                }
                let deployed_losses: Vec<(EntityId, usize)> =
                    losses.iter().copied().filter(|(s, _)| deployed.contains(s)).collect();
                apply_victory_morale(world, &self.config, &deployed_losses);
            }
            CombatExitReason::Defeat | CombatExitReason::Flee => {
                apply_defeat_morale(world, &self.config, &deployed);
                let mut resolver = RaidDefeatResolver { raid_entity: raid };
                execute_resolution(world, self.squads.as_ref(), &mut resolver);
            }
        }

        self.post_encounter_processing(world, &deployed);

        let alert_level = alert_entity(world, state.current_floor)
            .and_then(|id| world.get::<AlertData>(id))
            .map(|a| a.current_level)
            .unwrap_or(0);
        let summary = RaidEncounterResult {
            room_name: format!("Room {}", node_id),
            room_type,
            units_lost,
            alert_level,
            reward_text,
            is_victory: reason == CombatExitReason::Victory,
        };
        self.last_encounter_result = Some(summary.clone());
        Ok(summary)
    }

    fn post_encounter_processing(&mut self, world: &mut EntityManager, deployed: &[EntityId]) {
        let Some(state) = self.raid_state(world).cloned() else {
            self.finish_raid(RaidStatus::Defeat);
            return;
        };
        if state.status != RaidStatus::Active {
            self.finish_raid(state.status);
            return;
        }

        apply_post_encounter_recovery(world, &self.config, self.squads.as_ref(), &state.player_squad_ids, deployed);
        increment_alert(world, &self.config, self.squads.as_ref(), &mut self.rng, state.current_floor);

        let status = self.check_end_conditions(world, &state);
        if status != RaidStatus::Active {
            if let Some(s) = self.state_mut(world) {
                s.status = status;
            }
            self.finish_raid(status);
        }
    }

    fn check_end_conditions(&self, world: &EntityManager, state: &RaidStateData) -> RaidStatus {
        if state
            .player_squad_ids
            .iter()
            .all(|s| self.squads.is_squad_destroyed(world, *s))
        {
            return RaidStatus::Defeat;
        }
        if state.current_floor == state.total_floors && is_floor_complete(world, state.current_floor) {
            return RaidStatus::Victory;
        }
        RaidStatus::Active
    }

    /// Recovers the squads and moves to the next floor. Leaving the last
    /// floor wins the raid.
    pub fn advance_floor(&mut self, world: &mut EntityManager) -> GarrisonResult<RaidStatus> {
        let (_, state) = self.active_state(world)?;
        let next = state.current_floor + 1;
        if next > state.total_floors {
            if let Some(s) = self.state_mut(world) {
                s.status = RaidStatus::Victory;
            }
            self.finish_raid(RaidStatus::Victory);
            return Ok(RaidStatus::Victory);
        }
        apply_between_floor_recovery(world, &self.config, self.squads.as_ref(), &state.player_squad_ids);
        self.enter_floor(world, next)?;
        Ok(RaidStatus::Active)
    }

    /// Pauses the raid. Everything stays in place for `resume`.
    pub fn retreat(&mut self, world: &mut EntityManager) -> GarrisonResult<()> {
        self.active_state(world)?;
        if let Some(state) = self.state_mut(world) {
            state.status = RaidStatus::Retreated;
        }
        self.current_room = None;
        info!("Player retreated from raid (state preserved)");
        Ok(())
    }

    pub fn resume(&mut self, world: &mut EntityManager) -> GarrisonResult<()> {
        let state = self
            .state_mut(world)
            .filter(|s| s.status == RaidStatus::Retreated)
            .ok_or_else(|| GarrisonError::InvalidState("no retreated raid to resume".to_string()))?;
        state.status = RaidStatus::Active;
        info!("Raid resumed on floor {}", state.current_floor);
        Ok(())
    }

    /// Adopts a raid whose entities were loaded from elsewhere.
    pub fn restore(&mut self, world: &EntityManager, raid_entity: EntityId) -> GarrisonResult<()> {
        let state = world
            .get::<RaidStateData>(raid_entity)
            .ok_or_else(|| GarrisonError::NotFound(format!("raid state not found on entity {}", raid_entity)))?;
        if state.status.is_finished() {
            return Err(GarrisonError::InvalidState(format!("raid already ended: {:?}", state.status)));
        }
        self.raid_entity = Some(raid_entity);
        self.pre_combat_alive.clear();
        self.deployed_in_combat.clear();
        self.current_room = None;
        Ok(())
    }

    fn finish_raid(&mut self, status: RaidStatus) {
        info!("Raid finished with status: {:?}", status);
        self.raid_entity = None;
        self.current_room = None;
        self.pre_combat_alive.clear();
    }
}
