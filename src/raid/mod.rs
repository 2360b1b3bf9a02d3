//! # Raid
//!
//! A raid is a multi-floor assault on a garrison. Each floor is a DAG of
//! rooms; clearing a room unlocks the rooms that depend on it, and clearing
//! the stairs completes the floor. All raid state lives in components on
//! entities so it can be inspected, saved and restored like anything else.
//!
//! - [`generate_garrison`] builds the raid state and every floor up front
//! - [`RaidRunner`] drives the raid from start to a terminal status

pub mod alert;
pub mod archetypes;
pub mod assignment;
pub mod deployment;
pub mod floor_graph;
pub mod garrison;
pub mod recovery;
pub mod resolvers;
pub mod runner;
pub mod settings;

pub use alert::*;
pub use archetypes::*;
pub use assignment::*;
pub use deployment::*;
pub use floor_graph::*;
pub use garrison::*;
pub use recovery::*;
pub use resolvers::*;
pub use runner::*;
pub use settings::*;

use crate::game::EntityId;
use crate::generation::RoomType;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RaidStatus {
    Active,
    Victory,
    Defeat,
    /// Stopped by the player; can be resumed
    Retreated,
}

impl RaidStatus {
    pub fn is_finished(self) -> bool {
        matches!(self, RaidStatus::Victory | RaidStatus::Defeat)
    }
}

/// Singleton describing the raid in progress.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RaidStateData {
    /// 1-based
    pub current_floor: usize,
    pub total_floors: usize,
    pub status: RaidStatus,
    pub commander: EntityId,
    /// Holds the `ResourceStockpile` that receives gold
    pub player_entity: EntityId,
    pub player_squad_ids: Vec<EntityId>,
}

/// One room of a floor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoomData {
    pub node_id: usize,
    pub floor_number: usize,
    pub room_type: RoomType,
    pub on_critical_path: bool,
    pub child_node_ids: Vec<usize>,
    pub parent_node_ids: Vec<usize>,
    pub is_accessible: bool,
    pub is_cleared: bool,
    pub garrison_squad_ids: Vec<EntityId>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FloorStateData {
    pub floor_number: usize,
    pub rooms_cleared: usize,
    pub rooms_total: usize,
    pub garrison_squad_ids: Vec<EntityId>,
    pub reserve_squad_ids: Vec<EntityId>,
    pub is_complete: bool,
}

/// Floor-scoped escalation state. The level never decreases.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AlertData {
    pub floor_number: usize,
    pub current_level: u32,
    pub encounter_count: u32,
}

/// Player squads chosen for the next encounter. Lives on the raid entity.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeploymentData {
    pub deployed_squad_ids: Vec<EntityId>,
    pub reserve_squad_ids: Vec<EntityId>,
}

/// Marks a squad as part of the garrison.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GarrisonSquadData {
    pub archetype: String,
    pub floor_number: usize,
    /// `None` for reserves that have not been sent to a room
    pub room_node_id: Option<usize>,
    pub is_reserve: bool,
    pub is_destroyed: bool,
}
