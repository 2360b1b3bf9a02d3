//! Garrison generation: the raid state plus every floor's rooms, alert
//! tracker, garrison squads and reserves.

use super::{
    archetype, assign_archetypes_to_floor, build_floor_graph, room_entity, AlertData, FloorStateData,
    GarrisonSquadData, RaidConfig, RaidStateData, RaidStatus, RoomData, SquadArchetype,
};
use crate::game::{EntityId, EntityManager, Position};
use crate::generation::build_garrison_dag;
use crate::squads::{Formation, MonsterCatalog, SquadService};
use log::{info, warn};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;

/// The player's side of a raid.
#[derive(Debug, Clone, PartialEq)]
pub struct RaidParticipants {
    pub commander: EntityId,
    pub player_entity: EntityId,
    pub player_squad_ids: Vec<EntityId>,
}

/// Shared collaborators for garrison creation.
pub struct GarrisonContext<'a> {
    pub config: &'a RaidConfig,
    pub squads: &'a dyn SquadService,
    pub catalog: &'a MonsterCatalog,
}

/// Creates the raid state entity and generates floors `1..=floor_count`.
/// Returns the raid entity.
pub fn generate_garrison(
    world: &mut EntityManager,
    ctx: &GarrisonContext<'_>,
    rng: &mut StdRng,
    floor_count: usize,
    participants: &RaidParticipants,
) -> EntityId {
    let raid_entity = world.spawn(RaidStateData {
        current_floor: 1,
        total_floors: floor_count,
        status: RaidStatus::Active,
        commander: participants.commander,
        player_entity: participants.player_entity,
        player_squad_ids: participants.player_squad_ids.clone(),
    });

    for floor in 1..=floor_count {
        generate_floor(world, ctx, rng, floor);
    }
    info!("Created {}-floor garrison (raid entity {})", floor_count, raid_entity);
    raid_entity
}

/// Generates one floor and returns its `FloorStateData` entity.
pub fn generate_floor(world: &mut EntityManager, ctx: &GarrisonContext<'_>, rng: &mut StdRng, floor: usize) -> EntityId {
    let dag = build_garrison_dag(floor, rng);
    world.spawn(AlertData {
        floor_number: floor,
        current_level: 0,
        encounter_count: 0,
    });
    build_floor_graph(world, &dag, floor);

    let mut garrison_squad_ids = Vec::new();
    for (node_id, name) in assign_archetypes_to_floor(&dag, floor, ctx.config, rng) {
        let Some(arch) = archetype(name) else {
            continue;
        };
        let Some(squad) = instantiate_garrison_squad(world, ctx, arch, floor, Some(node_id)) else {
            continue;
        };
        garrison_squad_ids.push(squad);
        if let Some(room) = room_entity(world, node_id, floor).and_then(|id| world.get_mut::<RoomData>(id)) {
            room.garrison_squad_ids.push(squad);
        }
    }

    let reserve_pool = ctx.config.reserve_archetypes();
    let mut reserve_squad_ids = Vec::new();
    for _ in 0..ctx.config.reserve_count_for_floor(floor) {
        let Some(arch) = reserve_pool.choose(rng).and_then(|name| archetype(name)) else {
            continue;
        };
        if let Some(squad) = instantiate_garrison_squad(world, ctx, arch, floor, None) {
            reserve_squad_ids.push(squad);
        }
    }

    info!(
        "Floor {}: {} rooms, {} garrison squads, {} reserves",
        floor,
        dag.len(),
        garrison_squad_ids.len(),
        reserve_squad_ids.len()
    );
    world.spawn(FloorStateData {
        floor_number: floor,
        rooms_cleared: 0,
        rooms_total: dag.len(),
        garrison_squad_ids,
        reserve_squad_ids,
        is_complete: false,
    })
}

/// Builds a squad from an archetype. Unknown monsters are skipped; an
/// archetype with no usable units yields `None`. `room_node_id` of `None`
/// makes a reserve.
pub fn instantiate_garrison_squad(
    world: &mut EntityManager,
    ctx: &GarrisonContext<'_>,
    arch: &SquadArchetype,
    floor: usize,
    room_node_id: Option<usize>,
) -> Option<EntityId> {
    let mut templates = Vec::with_capacity(arch.units.len());
    for unit in arch.units {
        let Some(template) = ctx.catalog.get(unit.monster) else {
            warn!("Monster template '{}' not found for archetype '{}'", unit.monster, arch.name);
            continue;
        };
        let mut template = template.clone();
        template.grid_row = unit.grid_row;
        template.grid_col = unit.grid_col;
        if unit.grid_width > 0 {
            template.grid_width = unit.grid_width;
        }
        if unit.grid_height > 0 {
            template.grid_height = unit.grid_height;
        }
        template.is_leader = unit.is_leader;
        templates.push(template);
    }
    if templates.is_empty() {
        warn!("No valid units for archetype '{}'", arch.name);
        return None;
    }

    let name = format!("{} (F{})", arch.display_name, floor);
    let squad = match ctx
        .squads
        .create_squad_from_template(world, &name, Formation::Balanced, Position::origin(), &templates)
    {
        Ok(squad) => squad,
        Err(err) => {
            warn!("Could not create garrison squad {}: {}", name, err);
            return None;
        }
    };
    let marker = GarrisonSquadData {
        archetype: arch.name.to_string(),
        floor_number: floor,
        room_node_id,
        is_reserve: room_node_id.is_none(),
        is_destroyed: false,
    };
    if let Err(err) = world.add_component(squad, marker) {
        warn!("Could not tag garrison squad {}: {}", name, err);
    }
    Some(squad)
}

/// Removes every raid entity left in `world`: raid state, rooms, floor
/// and alert trackers, garrison squads and their units. Returns how many
/// entities were removed.
pub fn clear_garrison(world: &mut EntityManager, squads: &dyn SquadService) -> usize {
    let mut doomed: Vec<EntityId> = Vec::new();
    doomed.extend(world.query::<RaidStateData>());
    doomed.extend(world.query::<RoomData>());
    doomed.extend(world.query::<FloorStateData>());
    doomed.extend(world.query::<AlertData>());
    for squad in world.query::<GarrisonSquadData>() {
        doomed.extend(squads.unit_ids_in_squad(world, squad));
        doomed.push(squad);
    }
    doomed.into_iter().filter(|id| world.remove_entity(*id)).count()
}
