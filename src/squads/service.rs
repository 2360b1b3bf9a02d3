//! # Squad Service
//!
//! The raid and combat code treat squads as opaque aggregates of units and
//! go through `SquadService` for everything they need from them.
//! `RosterSquadService` implements it on top of the component store.

use super::{Attributes, Formation, SquadData, UnitData, UnitRole, UnitTemplate, DEFAULT_MORALE, SQUAD_GRID_SIZE};
use crate::game::{EntityId, EntityManager, Position};
use crate::{GarrisonError, GarrisonResult};
use log::{debug, warn};
use std::collections::HashSet;

/// Squad operations the raid core depends on.
///
/// Only the first five methods are required; the rest are built on them and
/// the `Attributes` component.
pub trait SquadService {
    fn unit_ids_in_squad(&self, world: &EntityManager, squad: EntityId) -> Vec<EntityId>;

    /// True when the squad is missing, empty, or every unit is dead.
    fn is_squad_destroyed(&self, world: &EntityManager, squad: EntityId) -> bool;

    fn create_squad_from_template(
        &self,
        world: &mut EntityManager,
        name: &str,
        formation: Formation,
        position: Position,
        templates: &[UnitTemplate],
    ) -> GarrisonResult<EntityId>;

    fn award_experience(&self, world: &mut EntityManager, unit: EntityId, amount: u32);

    /// Average health fraction (0.0-1.0) of living units.
    fn squad_health_percent(&self, world: &EntityManager, squad: EntityId) -> f64;

    /// Living units across several squads, in squad order.
    fn living_unit_ids(&self, world: &EntityManager, squads: &[EntityId]) -> Vec<EntityId> {
        squads
            .iter()
            .flat_map(|squad| self.unit_ids_in_squad(world, *squad))
            .filter(|unit| world.get::<Attributes>(*unit).map(|a| a.is_alive()).unwrap_or(false))
            .collect()
    }

    fn count_living_units(&self, world: &EntityManager, squad: EntityId) -> usize {
        self.living_unit_ids(world, &[squad]).len()
    }

    /// Dead units across several squads.
    fn count_dead_units(&self, world: &EntityManager, squads: &[EntityId]) -> usize {
        squads
            .iter()
            .flat_map(|squad| self.unit_ids_in_squad(world, *squad))
            .filter(|unit| world.get::<Attributes>(*unit).map(|a| !a.is_alive()).unwrap_or(false))
            .count()
    }

    /// Heals every living unit by `percent` of its max health. Dead units stay dead.
    fn apply_hp_recovery(&self, world: &mut EntityManager, squad: EntityId, percent: u32) {
        for unit in self.unit_ids_in_squad(world, squad) {
            if let Some(attr) = world.get_mut::<Attributes>(unit) {
                if !attr.is_alive() {
                    continue;
                }
                let heal = (attr.max_health as f64 * percent as f64 / 100.0).round() as i32;
                attr.current_health = (attr.current_health + heal).min(attr.max_health);
            }
        }
    }

    /// Flat stat bonus for every living unit of a squad.
    fn apply_stat_bonus(&self, world: &mut EntityManager, squad: EntityId, armor: i32, strength: i32, weapon: i32) {
        for unit in self.unit_ids_in_squad(world, squad) {
            if let Some(attr) = world.get_mut::<Attributes>(unit) {
                if attr.is_alive() {
                    attr.armor += armor;
                    attr.strength += strength;
                    attr.weapon += weapon;
                }
            }
        }
    }

    /// Combined power rating of the living units.
    fn squad_power(&self, world: &EntityManager, squad: EntityId) -> f64 {
        self.living_unit_ids(world, &[squad])
            .into_iter()
            .map(|unit| unit_power(world, unit))
            .sum()
    }
}

/// Power rating of one unit: weighted offense, defense and role utility.
pub fn unit_power(world: &EntityManager, unit: EntityId) -> f64 {
    let Some(attr) = world.get::<Attributes>(unit) else {
        return 0.0;
    };
    if !attr.is_alive() {
        return 0.0;
    }
    let data = world.get::<UnitData>(unit);

    let hit_rate = (50.0 + attr.dexterity as f64 * 2.0).min(100.0) / 100.0;
    let offensive = (attr.strength + attr.weapon) as f64 * hit_rate;
    let defensive = attr.max_health as f64 * attr.health_fraction() + attr.armor as f64;
    let role_value = match data.map(|d| d.role) {
        Some(UnitRole::Tank) => 12.0,
        Some(UnitRole::Dps) => 15.0,
        Some(UnitRole::Support) => 10.0,
        None => 0.0,
    };
    let leader_value = if data.map(|d| d.is_leader).unwrap_or(false) { 5.0 } else { 0.0 };

    offensive * 0.4 + defensive * 0.4 + (role_value + leader_value) * 0.2
}

/// Component-backed squad service.
#[derive(Debug, Clone)]
pub struct RosterSquadService {
    /// Experience needed per level
    pub xp_per_level: u32,
}

impl Default for RosterSquadService {
    fn default() -> Self {
        Self { xp_per_level: 100 }
    }
}

impl RosterSquadService {
    pub fn new() -> Self {
        Self::default()
    }

    /// Grid cells a template would cover, or `None` if it leaves the grid.
    fn template_cells(template: &UnitTemplate) -> Option<Vec<(i32, i32)>> {
        let width = template.grid_width.max(1);
        let height = template.grid_height.max(1);
        if template.grid_row < 0 || template.grid_col < 0 {
            return None;
        }
        if template.grid_row + height > SQUAD_GRID_SIZE || template.grid_col + width > SQUAD_GRID_SIZE {
            return None;
        }
        let mut cells = Vec::new();
        for r in template.grid_row..template.grid_row + height {
            for c in template.grid_col..template.grid_col + width {
                cells.push((r, c));
            }
        }
        Some(cells)
    }
}

impl SquadService for RosterSquadService {
    fn unit_ids_in_squad(&self, world: &EntityManager, squad: EntityId) -> Vec<EntityId> {
        world
            .get::<SquadData>(squad)
            .map(|data| data.unit_ids.clone())
            .unwrap_or_default()
    }

    fn is_squad_destroyed(&self, world: &EntityManager, squad: EntityId) -> bool {
        self.count_living_units(world, squad) == 0
    }

    fn create_squad_from_template(
        &self,
        world: &mut EntityManager,
        name: &str,
        formation: Formation,
        position: Position,
        templates: &[UnitTemplate],
    ) -> GarrisonResult<EntityId> {
        let mut occupied: HashSet<(i32, i32)> = HashSet::new();
        let mut placed = Vec::new();
        for template in templates {
            let Some(cells) = Self::template_cells(template) else {
                warn!(
                    "{}: unit {} at ({}, {}) size {}x{} leaves the squad grid, skipping",
                    name,
                    template.unit_type,
                    template.grid_row,
                    template.grid_col,
                    template.grid_width,
                    template.grid_height
                );
                continue;
            };
            if cells.iter().any(|cell| occupied.contains(cell)) {
                warn!(
                    "{}: cell for unit {} at ({}, {}) is already occupied, skipping",
                    name, template.unit_type, template.grid_row, template.grid_col
                );
                continue;
            }
            occupied.extend(cells);
            placed.push(template);
        }

        if placed.is_empty() {
            return Err(GarrisonError::InvalidAction(format!("squad {} has no placeable units", name)));
        }

        let squad_id = world.create_entity();
        let mut unit_ids = Vec::with_capacity(placed.len());
        for template in placed {
            let mut attributes = template.attributes;
            if attributes.current_health <= 0 {
                attributes.current_health = attributes.max_health;
            }
            let unit = world.spawn(attributes);
            world.add_component(
                unit,
                UnitData {
                    unit_type: template.unit_type.clone(),
                    squad_id,
                    role: template.role,
                    grid_row: template.grid_row,
                    grid_col: template.grid_col,
                    grid_width: template.grid_width.max(1),
                    grid_height: template.grid_height.max(1),
                    is_leader: template.is_leader,
                },
            )?;
            unit_ids.push(unit);
        }

        debug!("Created squad {} with {} units", name, unit_ids.len());
        world.add_component(
            squad_id,
            SquadData {
                name: name.to_string(),
                formation,
                position,
                morale: DEFAULT_MORALE,
                unit_ids,
                is_deployed: false,
            },
        )?;
        Ok(squad_id)
    }

    fn award_experience(&self, world: &mut EntityManager, unit: EntityId, amount: u32) {
        let per_level = self.xp_per_level.max(1);
        if let Some(attr) = world.get_mut::<Attributes>(unit) {
            attr.experience += amount;
            while attr.experience >= attr.level * per_level {
                attr.level += 1;
                attr.max_health += 5;
                attr.current_health += 5;
                attr.strength += 1;
                debug!("Unit {} reached level {}", unit, attr.level);
            }
        }
    }

    fn squad_health_percent(&self, world: &EntityManager, squad: EntityId) -> f64 {
        let fractions: Vec<f64> = self
            .living_unit_ids(world, &[squad])
            .into_iter()
            .filter_map(|unit| world.get::<Attributes>(unit))
            .filter(|attr| attr.max_health > 0)
            .map(|attr| attr.health_fraction())
            .collect();
        if fractions.is_empty() {
            return 0.0;
        }
        fractions.iter().sum::<f64>() / fractions.len() as f64
    }
}
