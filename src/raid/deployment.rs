//! Choosing which player squads fight the next encounter.

use super::{DeploymentData, RaidConfig, RaidStateData};
use crate::game::{EntityId, EntityManager};
use crate::squads::{SquadData, SquadService};
use crate::{GarrisonError, GarrisonResult};
use log::info;

/// Validates and stores an explicit deployment on the raid entity. Player
/// squads not chosen become reserves.
pub fn set_deployment(
    world: &mut EntityManager,
    config: &RaidConfig,
    squads: &dyn SquadService,
    raid_entity: EntityId,
    deployed: &[EntityId],
) -> GarrisonResult<DeploymentData> {
    let player_squads = world
        .get::<RaidStateData>(raid_entity)
        .map(|s| s.player_squad_ids.clone())
        .ok_or_else(|| GarrisonError::InvalidState("no active raid".to_string()))?;

    if deployed.is_empty() {
        return Err(GarrisonError::InvalidAction("no squads selected for deployment".to_string()));
    }
    let max = config.max_deployed_per_encounter();
    if deployed.len() > max {
        return Err(GarrisonError::InvalidAction(format!(
            "too many squads deployed: {} (max {})",
            deployed.len(),
            max
        )));
    }
    for (i, squad) in deployed.iter().enumerate() {
        if !player_squads.contains(squad) {
            return Err(GarrisonError::InvalidAction(format!("squad {} is not part of the raid", squad)));
        }
        if deployed[..i].contains(squad) {
            return Err(GarrisonError::InvalidAction(format!("squad {} deployed twice", squad)));
        }
        if squads.is_squad_destroyed(world, *squad) {
            return Err(GarrisonError::InvalidAction(format!("squad {} has no living units", squad)));
        }
    }

    let deployment = DeploymentData {
        deployed_squad_ids: deployed.to_vec(),
        reserve_squad_ids: player_squads.into_iter().filter(|s| !deployed.contains(s)).collect(),
    };
    for squad in &deployment.deployed_squad_ids {
        set_deployed_flag(world, *squad, true);
    }
    for squad in &deployment.reserve_squad_ids {
        set_deployed_flag(world, *squad, false);
    }
    world.add_component(raid_entity, deployment.clone())?;
    Ok(deployment)
}

fn set_deployed_flag(world: &mut EntityManager, squad: EntityId, deployed: bool) {
    if let Some(data) = world.get_mut::<SquadData>(squad) {
        data.is_deployed = deployed;
    }
}

/// Squads `auto_deploy` would choose: the strongest living squads, at most
/// `max`, ties kept in input order.
pub fn select_strongest(
    world: &EntityManager,
    squads: &dyn SquadService,
    candidates: &[EntityId],
    max: usize,
) -> Vec<EntityId> {
    let mut scored: Vec<(EntityId, f64)> = candidates
        .iter()
        .filter(|s| !squads.is_squad_destroyed(world, **s))
        .map(|s| (*s, squads.squad_power(world, *s)))
        .collect();
    // stable sort keeps input order between equal scores
    scored.sort_by(|a, b| b.1.total_cmp(&a.1));
    scored.into_iter().take(max).map(|(s, _)| s).collect()
}

/// Deploys the strongest living player squads.
pub fn auto_deploy(
    world: &mut EntityManager,
    config: &RaidConfig,
    squads: &dyn SquadService,
    raid_entity: EntityId,
) -> GarrisonResult<DeploymentData> {
    let player_squads = world
        .get::<RaidStateData>(raid_entity)
        .map(|s| s.player_squad_ids.clone())
        .ok_or_else(|| GarrisonError::InvalidState("no active raid".to_string()))?;
    let chosen = select_strongest(world, squads, &player_squads, config.max_deployed_per_encounter());
    if chosen.is_empty() {
        return Err(GarrisonError::InvalidAction("no living squads available".to_string()));
    }
    info!("Auto-deployed {} of {} squads", chosen.len(), player_squads.len());
    set_deployment(world, config, squads, raid_entity, &chosen)
}

/// Squads that fight the next encounter: the stored deployment without its
/// destroyed squads, or every living player squad when nothing is stored.
/// A stored deployment left empty is replaced by `auto_deploy`.
pub fn deployment_for_encounter(
    world: &mut EntityManager,
    config: &RaidConfig,
    squads: &dyn SquadService,
    raid_entity: EntityId,
) -> GarrisonResult<Vec<EntityId>> {
    let Some(stored) = world.get::<DeploymentData>(raid_entity).cloned() else {
        let player_squads = world
            .get::<RaidStateData>(raid_entity)
            .map(|s| s.player_squad_ids.clone())
            .ok_or_else(|| GarrisonError::InvalidState("no active raid".to_string()))?;
        return Ok(player_squads
            .into_iter()
            .filter(|s| !squads.is_squad_destroyed(world, *s))
            .collect());
    };

    let living: Vec<EntityId> = stored
        .deployed_squad_ids
        .iter()
        .copied()
        .filter(|s| !squads.is_squad_destroyed(world, *s))
        .collect();
    if living.len() == stored.deployed_squad_ids.len() && !living.is_empty() {
        return Ok(living);
    }
    info!(
        "Dropping {} destroyed squads from the deployment",
        stored.deployed_squad_ids.len() - living.len()
    );
    let deployment = if living.is_empty() {
        auto_deploy(world, config, squads, raid_entity)?
    } else {
        set_deployment(world, config, squads, raid_entity, &living)?
    };
    Ok(deployment.deployed_squad_ids)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::Position;
    use crate::raid::RaidStatus;
    use crate::squads::{Attributes, Formation, MonsterCatalog, RosterSquadService};

    fn make_squad(world: &mut EntityManager, service: &RosterSquadService, units: &[&str]) -> EntityId {
        let catalog = MonsterCatalog::default();
        let templates: Vec<_> = units
            .iter()
            .enumerate()
            .map(|(i, name)| {
                let mut t = catalog.get(name).unwrap().clone();
                t.grid_row = i as i32;
                t
            })
            .collect();
        service
            .create_squad_from_template(world, "P", Formation::Balanced, Position::origin(), &templates)
            .unwrap()
    }

    fn raid(world: &mut EntityManager, player_squad_ids: Vec<EntityId>) -> EntityId {
        let commander = world.create_entity();
        let player_entity = world.create_entity();
        world.spawn(RaidStateData {
            current_floor: 1,
            total_floors: 1,
            status: RaidStatus::Active,
            commander,
            player_entity,
            player_squad_ids,
        })
    }

    #[test]
    fn test_auto_deploy_picks_strongest() {
        let service = RosterSquadService::new();
        let config = RaidConfig::fallback();
        let mut world = EntityManager::new();
        let weak = make_squad(&mut world, &service, &["Scout"]);
        let strong = make_squad(&mut world, &service, &["Knight", "Knight", "Archer"]);
        let mid = make_squad(&mut world, &service, &["Knight"]);
        let mid_twin = make_squad(&mut world, &service, &["Knight"]);
        let raid = raid(&mut world, vec![weak, mid, strong, mid_twin]);

        let deployment = auto_deploy(&mut world, &config, &service, raid).unwrap();
        assert_eq!(deployment.deployed_squad_ids, vec![strong, mid, mid_twin]);
        assert_eq!(deployment.reserve_squad_ids, vec![weak]);
        assert!(world.get::<SquadData>(strong).unwrap().is_deployed);
        assert!(!world.get::<SquadData>(weak).unwrap().is_deployed);
        assert_eq!(world.get::<DeploymentData>(raid), Some(&deployment));
    }

    #[test]
    fn test_auto_deploy_without_living_squads() {
        let service = RosterSquadService::new();
        let config = RaidConfig::fallback();
        let mut world = EntityManager::new();
        let dead = make_squad(&mut world, &service, &["Scout"]);
        let unit = service.unit_ids_in_squad(&world, dead)[0];
        world.get_mut::<Attributes>(unit).unwrap().current_health = 0;
        let raid = raid(&mut world, vec![dead]);

        let err = auto_deploy(&mut world, &config, &service, raid).unwrap_err();
        assert_eq!(err.to_string(), "no living squads available");
    }

    #[test]
    fn test_set_deployment_validation() {
        let service = RosterSquadService::new();
        let config = RaidConfig::fallback();
        let mut world = EntityManager::new();
        let ids: Vec<EntityId> = (0..4).map(|_| make_squad(&mut world, &service, &["Knight"])).collect();
        let outsider = make_squad(&mut world, &service, &["Knight"]);
        let raid = raid(&mut world, ids.clone());

        assert!(set_deployment(&mut world, &config, &service, raid, &ids).is_err());
        assert!(set_deployment(&mut world, &config, &service, raid, &[outsider]).is_err());
        assert!(set_deployment(&mut world, &config, &service, raid, &[ids[0], ids[0]]).is_err());
        assert!(set_deployment(&mut world, &config, &service, raid, &[]).is_err());

        let ok = set_deployment(&mut world, &config, &service, raid, &[ids[1]]).unwrap();
        assert_eq!(ok.reserve_squad_ids, vec![ids[0], ids[2], ids[3]]);
    }

    fn wipe(world: &mut EntityManager, service: &RosterSquadService, squad: EntityId) {
        for unit in service.unit_ids_in_squad(world, squad) {
            world.get_mut::<Attributes>(unit).unwrap().current_health = 0;
        }
    }

    #[test]
    fn test_encounter_deployment_drops_destroyed_squads() {
        let service = RosterSquadService::new();
        let config = RaidConfig::fallback();
        let mut world = EntityManager::new();
        let a = make_squad(&mut world, &service, &["Knight"]);
        let b = make_squad(&mut world, &service, &["Archer"]);
        let c = make_squad(&mut world, &service, &["Scout"]);
        let raid = raid(&mut world, vec![a, b, c]);

        set_deployment(&mut world, &config, &service, raid, &[a, b]).unwrap();
        wipe(&mut world, &service, a);
        let fighting = deployment_for_encounter(&mut world, &config, &service, raid).unwrap();
        assert_eq!(fighting, vec![b]);
        assert_eq!(world.get::<DeploymentData>(raid).unwrap().reserve_squad_ids, vec![a, c]);

        wipe(&mut world, &service, b);
        let fighting = deployment_for_encounter(&mut world, &config, &service, raid).unwrap();
        assert_eq!(fighting, vec![c]);
    }

    #[test]
    fn test_encounter_deployment_defaults_to_living_squads() {
        let service = RosterSquadService::new();
        let config = RaidConfig::fallback();
        let mut world = EntityManager::new();
        let a = make_squad(&mut world, &service, &["Knight"]);
        let b = make_squad(&mut world, &service, &["Archer"]);
        let raid = raid(&mut world, vec![a, b]);
        wipe(&mut world, &service, b);

        assert_eq!(deployment_for_encounter(&mut world, &config, &service, raid).unwrap(), vec![a]);
        assert!(world.get::<DeploymentData>(raid).is_none());
    }
}
