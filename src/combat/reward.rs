//! Reward calculation and granting.
//!
//! Every reward in the game goes through `grant`, which applies it and
//! produces the text shown to the player.

use crate::game::{EntityId, EntityManager};
use crate::squads::SquadService;
use log::{debug, info};
use serde::{Deserialize, Serialize};

/// Gold held by the player entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ResourceStockpile {
    pub gold: u32,
}

/// Commander mana pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ManaData {
    pub current_mana: u32,
    pub max_mana: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Reward {
    pub gold: u32,
    pub experience: u32,
    pub mana: u32,
}

impl Reward {
    pub fn new(gold: u32, experience: u32, mana: u32) -> Self {
        Self { gold, experience, mana }
    }

    /// Multiplies every field by `factor`, rounding to the nearest integer.
    pub fn scale(self, factor: f64) -> Self {
        let apply = |v: u32| (v as f64 * factor).round().max(0.0) as u32;
        Self {
            gold: apply(self.gold),
            experience: apply(self.experience),
            mana: apply(self.mana),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.gold == 0 && self.experience == 0 && self.mana == 0
    }
}

/// Who receives each part of a reward. `None` skips that part.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GrantTarget {
    /// Owner of the `ResourceStockpile`
    pub player_entity: Option<EntityId>,
    /// XP is split over the living units of these squads
    pub squad_ids: Vec<EntityId>,
    /// Owner of the `ManaData`
    pub commander: Option<EntityId>,
}

/// Applies `reward` to `target` and returns a description like
/// `"140 gold, 140 XP, 10 mana (30/50)"`. Parts with nobody to receive
/// them are left out.
pub fn grant(world: &mut EntityManager, squads: &dyn SquadService, reward: Reward, target: &GrantTarget) -> String {
    if reward.is_empty() {
        debug!("Nothing to grant");
        return String::new();
    }
    let mut parts = Vec::new();

    if reward.gold > 0 {
        if let Some(desc) = target.player_entity.and_then(|p| grant_gold(world, p, reward.gold)) {
            parts.push(desc);
        }
    }
    if reward.experience > 0 && !target.squad_ids.is_empty() {
        if let Some(desc) = grant_experience(world, squads, &target.squad_ids, reward.experience) {
            parts.push(desc);
        }
    }
    if reward.mana > 0 {
        if let Some(desc) = target.commander.and_then(|c| grant_mana(world, c, reward.mana)) {
            parts.push(desc);
        }
    }

    format_description(&parts)
}

fn grant_gold(world: &mut EntityManager, player: EntityId, amount: u32) -> Option<String> {
    let stockpile = world.get_mut::<ResourceStockpile>(player)?;
    stockpile.gold += amount;
    info!("Granted {} gold to player {}", amount, player);
    Some(format!("{} gold", amount))
}

fn grant_experience(
    world: &mut EntityManager,
    squads: &dyn SquadService,
    squad_ids: &[EntityId],
    total: u32,
) -> Option<String> {
    let living = squads.living_unit_ids(world, squad_ids);
    if living.is_empty() {
        return None;
    }
    let per_unit = (total / living.len() as u32).max(1);
    for unit in &living {
        squads.award_experience(world, *unit, per_unit);
    }
    info!(
        "Granted {} XP each to {} living units (total {} XP)",
        per_unit,
        living.len(),
        total
    );
    Some(format!("{} XP", total))
}

fn grant_mana(world: &mut EntityManager, commander: EntityId, amount: u32) -> Option<String> {
    let mana = world.get_mut::<ManaData>(commander)?;
    mana.current_mana = (mana.current_mana + amount).min(mana.max_mana);
    let desc = format!("{} mana ({}/{})", amount, mana.current_mana, mana.max_mana);
    info!("Granted {} to commander {}", desc, commander);
    Some(desc)
}

pub fn format_description(parts: &[String]) -> String {
    parts.join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::Position;
    use crate::squads::{Attributes, Formation, MonsterCatalog, RosterSquadService};

    #[test]
    fn test_scale_rounds() {
        let reward = Reward::new(100, 55, 10).scale(1.25);
        assert_eq!(reward, Reward::new(125, 69, 13));
        assert_eq!(Reward::new(100, 100, 0).scale(1.4), Reward::new(140, 140, 0));
    }

    #[test]
    fn test_grant_all_parts() {
        let service = RosterSquadService::new();
        let catalog = MonsterCatalog::default();
        let mut world = EntityManager::new();
        let player = world.spawn(ResourceStockpile { gold: 5 });
        let commander = world.spawn(ManaData {
            current_mana: 45,
            max_mana: 50,
        });
        let mut archer = catalog.get("Archer").unwrap().clone();
        let mut knight = catalog.get("Knight").unwrap().clone();
        archer.grid_row = 1;
        knight.grid_row = 0;
        let squad = service
            .create_squad_from_template(&mut world, "A", Formation::Balanced, Position::origin(), &[knight, archer])
            .unwrap();

        let target = GrantTarget {
            player_entity: Some(player),
            squad_ids: vec![squad],
            commander: Some(commander),
        };
        let text = grant(&mut world, &service, Reward::new(140, 140, 10), &target);

        assert_eq!(text, "140 gold, 140 XP, 10 mana (50/50)");
        assert_eq!(world.get::<ResourceStockpile>(player).unwrap().gold, 145);
        for unit in service.unit_ids_in_squad(&world, squad) {
            assert_eq!(world.get::<Attributes>(unit).unwrap().experience, 70);
        }
    }

    #[test]
    fn test_grant_without_receivers_is_empty() {
        let service = RosterSquadService::new();
        let mut world = EntityManager::new();
        let text = grant(&mut world, &service, Reward::new(10, 10, 10), &GrantTarget::default());
        assert!(text.is_empty());
    }

    #[test]
    fn test_empty_reward_grants_nothing() {
        let service = RosterSquadService::new();
        let mut world = EntityManager::new();
        let player = world.spawn(ResourceStockpile { gold: 5 });
        let target = GrantTarget {
            player_entity: Some(player),
            ..GrantTarget::default()
        };
        assert!(Reward::default().is_empty());
        assert_eq!(grant(&mut world, &service, Reward::default(), &target), "");
        assert_eq!(world.get::<ResourceStockpile>(player).unwrap().gold, 5);
    }
}
