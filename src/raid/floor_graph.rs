//! Room graph for one floor: creation, lookup and clear propagation.

use super::{AlertData, FloorStateData, RaidStateData, RoomData};
use crate::game::{EntityId, EntityManager};
use crate::generation::{FloorDag, RoomType};
use crate::{GarrisonError, GarrisonResult};
use log::{debug, info};

/// Creates a `RoomData` entity for every DAG node. Only the entry room
/// starts accessible.
pub fn build_floor_graph(world: &mut EntityManager, dag: &FloorDag, floor: usize) -> Vec<EntityId> {
    dag.nodes
        .iter()
        .map(|node| {
            world.spawn(RoomData {
                node_id: node.id,
                floor_number: floor,
                room_type: node.room_type,
                on_critical_path: node.on_critical_path,
                child_node_ids: node.children.clone(),
                parent_node_ids: node.parents.clone(),
                is_accessible: node.id == dag.entry_node_id,
                is_cleared: false,
                garrison_squad_ids: Vec::new(),
            })
        })
        .collect()
}

pub fn room_entity(world: &EntityManager, node_id: usize, floor: usize) -> Option<EntityId> {
    world.find::<RoomData>(|r| r.node_id == node_id && r.floor_number == floor)
}

pub fn room_data(world: &EntityManager, node_id: usize, floor: usize) -> Option<&RoomData> {
    room_entity(world, node_id, floor).and_then(|id| world.get::<RoomData>(id))
}

fn room_data_mut(world: &mut EntityManager, node_id: usize, floor: usize) -> Option<&mut RoomData> {
    let id = room_entity(world, node_id, floor)?;
    world.get_mut::<RoomData>(id)
}

/// Rooms on `floor`, ordered by node id.
pub fn rooms_on_floor(world: &EntityManager, floor: usize) -> Vec<&RoomData> {
    let mut rooms: Vec<&RoomData> = world
        .iter::<RoomData>()
        .map(|(_, r)| r)
        .filter(|r| r.floor_number == floor)
        .collect();
    rooms.sort_by_key(|r| r.node_id);
    rooms
}

pub fn floor_state_entity(world: &EntityManager, floor: usize) -> Option<EntityId> {
    world.find::<FloorStateData>(|f| f.floor_number == floor)
}

pub fn alert_entity(world: &EntityManager, floor: usize) -> Option<EntityId> {
    world.find::<AlertData>(|a| a.floor_number == floor)
}

pub fn raid_state_entity(world: &EntityManager) -> Option<EntityId> {
    world.query::<RaidStateData>().into_iter().next()
}

/// Marks a room cleared and unlocks every child whose parents are now all
/// cleared. Clearing an already-cleared room changes nothing.
pub fn mark_room_cleared(world: &mut EntityManager, node_id: usize, floor: usize) -> GarrisonResult<()> {
    let room = room_data_mut(world, node_id, floor)
        .ok_or_else(|| GarrisonError::NotFound(format!("room {} not found on floor {}", node_id, floor)))?;
    if room.is_cleared {
        debug!("Room {} on floor {} was already cleared", node_id, floor);
        return Ok(());
    }
    room.is_cleared = true;
    room.is_accessible = true;
    let children = room.child_node_ids.clone();

    if let Some(state) = floor_state_entity(world, floor).and_then(|id| world.get_mut::<FloorStateData>(id)) {
        state.rooms_cleared += 1;
    }
    info!("Room {} cleared on floor {}", node_id, floor);

    for child in children {
        update_accessibility(world, child, floor);
    }
    Ok(())
}

/// Re-checks `node_id` and walks onward through cleared descendants.
fn update_accessibility(world: &mut EntityManager, node_id: usize, floor: usize) {
    let Some(room) = room_data(world, node_id, floor) else {
        return;
    };
    let all_parents_cleared = room
        .parent_node_ids
        .iter()
        .all(|p| room_data(world, *p, floor).map(|r| r.is_cleared).unwrap_or(false));
    let was_cleared = room.is_cleared;
    let children = room.child_node_ids.clone();

    if all_parents_cleared {
        if let Some(room) = room_data_mut(world, node_id, floor) {
            if !room.is_accessible {
                debug!("Room {} on floor {} is now accessible", node_id, floor);
            }
            room.is_accessible = true;
        }
    }
    if was_cleared {
        for child in children {
            update_accessibility(world, child, floor);
        }
    }
}

/// True once the stairs room of `floor` is cleared.
pub fn is_floor_complete(world: &EntityManager, floor: usize) -> bool {
    world
        .iter::<RoomData>()
        .any(|(_, r)| r.floor_number == floor && r.room_type == RoomType::Stairs && r.is_cleared)
}
