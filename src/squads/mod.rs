//! # Squads
//!
//! Squads are entities carrying a `SquadData` component; their units are
//! separate entities with `UnitData` and `Attributes`. The raid core only
//! talks to squads through the `SquadService` trait.

pub mod catalog;
pub mod service;

pub use catalog::*;
pub use service::*;

use crate::game::{EntityId, Position};
use serde::{Deserialize, Serialize};

/// Edge length of the square formation grid every squad occupies.
pub const SQUAD_GRID_SIZE: i32 = 3;

/// Morale of a freshly created squad.
pub const DEFAULT_MORALE: i32 = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Formation {
    #[default]
    Balanced,
    Defensive,
    Offensive,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum UnitRole {
    Tank,
    #[default]
    Dps,
    Support,
}

/// Squad-level state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SquadData {
    pub name: String,
    pub formation: Formation,
    /// World position; garrison squads sit at the origin until combat places them
    pub position: Position,
    /// 0..=100
    pub morale: i32,
    pub unit_ids: Vec<EntityId>,
    pub is_deployed: bool,
}

/// Per-unit placement inside its squad's formation grid.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnitData {
    pub unit_type: String,
    pub squad_id: EntityId,
    pub role: UnitRole,
    pub grid_row: i32,
    pub grid_col: i32,
    pub grid_width: i32,
    pub grid_height: i32,
    pub is_leader: bool,
}

/// Combat statistics of a unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Attributes {
    pub max_health: i32,
    #[serde(default)]
    pub current_health: i32,
    pub strength: i32,
    pub dexterity: i32,
    pub armor: i32,
    pub weapon: i32,
    #[serde(default)]
    pub experience: u32,
    #[serde(default = "default_level")]
    pub level: u32,
}

fn default_level() -> u32 {
    1
}

impl Attributes {
    pub fn is_alive(&self) -> bool {
        self.current_health > 0
    }

    /// Health as a fraction of max health.
    pub fn health_fraction(&self) -> f64 {
        if self.max_health <= 0 {
            return 0.0;
        }
        self.current_health.max(0) as f64 / self.max_health as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_attribute_health_fraction() {
        let attr = Attributes {
            max_health: 40,
            current_health: 10,
            ..Attributes::default()
        };
        assert!(attr.is_alive());
        assert!((attr.health_fraction() - 0.25).abs() < f64::EPSILON);

        let dead = Attributes {
            max_health: 0,
            ..Attributes::default()
        };
        assert!(!dead.is_alive());
        assert_eq!(dead.health_fraction(), 0.0);
    }
}
