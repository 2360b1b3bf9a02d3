//! HP recovery and morale for player squads between fights.

use super::{MoraleThresholdConfig, RaidConfig};
use crate::game::{EntityId, EntityManager};
use crate::squads::{SquadData, SquadService};
use log::debug;

pub const MAX_MORALE: i32 = 100;

/// Changes a squad's morale by `delta`, clamped to `0..=MAX_MORALE`.
pub fn adjust_morale(world: &mut EntityManager, squad: EntityId, delta: i32) {
    if let Some(data) = world.get_mut::<SquadData>(squad) {
        data.morale = (data.morale + delta).clamp(0, MAX_MORALE);
        debug!("{} morale {:+} -> {}", data.name, delta, data.morale);
    }
}

/// After an encounter: deployed squads recover less than the squads that
/// sat it out.
pub fn apply_post_encounter_recovery(
    world: &mut EntityManager,
    config: &RaidConfig,
    squads: &dyn SquadService,
    player_squads: &[EntityId],
    deployed: &[EntityId],
) {
    for &squad in player_squads {
        let percent = if deployed.contains(&squad) {
            config.recovery.deployed_hp_percent
        } else {
            config.recovery.reserve_hp_percent
        };
        if percent > 0 {
            squads.apply_hp_recovery(world, squad, percent);
        }
    }
}

/// Uniform recovery and a morale boost when descending to the next floor.
pub fn apply_between_floor_recovery(
    world: &mut EntityManager,
    config: &RaidConfig,
    squads: &dyn SquadService,
    player_squads: &[EntityId],
) {
    for &squad in player_squads {
        if config.recovery.between_floor_hp_percent > 0 {
            squads.apply_hp_recovery(world, squad, config.recovery.between_floor_hp_percent);
        }
        adjust_morale(world, squad, config.recovery.between_floor_morale_bonus);
    }
}

pub fn apply_rest_room_recovery(
    world: &mut EntityManager,
    config: &RaidConfig,
    squads: &dyn SquadService,
    player_squads: &[EntityId],
) {
    for &squad in player_squads {
        squads.apply_hp_recovery(world, squad, config.recovery.rest_room_hp_percent);
        adjust_morale(world, squad, config.recovery.rest_room_morale_bonus);
    }
}

/// Victory bonus for every deployed squad, minus the death penalty for
/// each unit that squad lost.
pub fn apply_victory_morale(world: &mut EntityManager, config: &RaidConfig, losses: &[(EntityId, usize)]) {
    for &(squad, lost) in losses {
        let penalty = config.recovery.unit_death_morale_penalty * lost as i32;
        adjust_morale(world, squad, config.recovery.victory_morale_bonus - penalty);
    }
}

pub fn apply_defeat_morale(world: &mut EntityManager, config: &RaidConfig, deployed: &[EntityId]) {
    for &squad in deployed {
        adjust_morale(world, squad, -config.recovery.defeat_morale_penalty);
    }
}

/// Dex/str penalty tier for a squad's current morale.
pub fn morale_penalty<'a>(world: &EntityManager, config: &'a RaidConfig, squad: EntityId) -> Option<&'a MoraleThresholdConfig> {
    let morale = world.get::<SquadData>(squad)?.morale;
    config.morale_threshold(morale)
}
