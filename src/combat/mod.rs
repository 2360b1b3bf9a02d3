//! # Combat Pipeline
//!
//! Shared entry and exit points for every kind of combat. A `CombatStarter`
//! decides who fights where, an `EncounterService` runs the fight, and a
//! `CombatResolver` turns the outcome into rewards that go through
//! [`grant`].

pub mod reward;

pub use reward::*;

use crate::game::{EntityId, EntityManager, Position};
use crate::squads::SquadService;
use crate::GarrisonResult;
use log::{info, warn};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CombatExitReason {
    Victory,
    Defeat,
    Flee,
}

/// Everything the encounter service needs to begin a fight.
#[derive(Debug, Clone, PartialEq)]
pub struct CombatSetup {
    pub enemy_squad_ids: Vec<EntityId>,
    pub player_squad_ids: Vec<EntityId>,
    pub combat_position: Position,
    pub encounter_id: Option<EntityId>,
    pub commander: Option<EntityId>,
}

/// Outcome reported back by the encounter service.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CombatResult {
    pub rounds: u32,
    pub enemy_casualties: usize,
    pub player_casualties: usize,
}

pub trait CombatStarter {
    /// Places squads and builds the setup. May mutate `world`.
    fn prepare(&mut self, world: &mut EntityManager) -> GarrisonResult<CombatSetup>;

    /// Undo whatever `prepare` did when combat could not begin.
    fn rollback(&mut self, _world: &mut EntityManager) {}
}

/// What a resolver wants granted after combat.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolutionPlan {
    pub rewards: Reward,
    pub target: GrantTarget,
    pub description: String,
}

pub trait CombatResolver {
    /// Applies the outcome to `world`. `None` means nothing to grant.
    fn resolve(&mut self, world: &mut EntityManager) -> Option<ResolutionPlan>;
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResolutionResult {
    pub reward_text: String,
    pub description: String,
}

/// The service that actually runs tactical combat.
pub trait EncounterService {
    fn begin_combat(&mut self, world: &mut EntityManager, setup: &CombatSetup) -> GarrisonResult<()>;
}

/// Prepares combat and hands it to the encounter service, rolling the
/// starter back if the service refuses.
pub fn execute_combat_start(
    world: &mut EntityManager,
    encounters: &mut dyn EncounterService,
    starter: &mut dyn CombatStarter,
) -> GarrisonResult<CombatSetup> {
    let setup = starter.prepare(world)?;
    if let Err(err) = encounters.begin_combat(world, &setup) {
        warn!("Combat failed to start: {}", err);
        starter.rollback(world);
        return Err(err);
    }
    info!(
        "Combat started: {} player squads vs {} enemy squads at {}",
        setup.player_squad_ids.len(),
        setup.enemy_squad_ids.len(),
        setup.combat_position
    );
    Ok(setup)
}

/// Runs a resolver and grants whatever it asks for.
pub fn execute_resolution(
    world: &mut EntityManager,
    squads: &dyn SquadService,
    resolver: &mut dyn CombatResolver,
) -> Option<ResolutionResult> {
    let plan = resolver.resolve(world)?;
    let reward_text = grant(world, squads, plan.rewards, &plan.target);
    if !plan.description.is_empty() {
        info!("{}", plan.description);
    }
    Some(ResolutionResult {
        reward_text,
        description: plan.description,
    })
}

/// Encounter service that accepts every fight and remembers it.
#[derive(Debug, Default, Clone)]
pub struct RecordingEncounterService {
    pub started: Vec<CombatSetup>,
    /// Reject the next `begin_combat` call
    pub fail_next: bool,
}

impl RecordingEncounterService {
    pub fn new() -> Self {
        Self::default()
    }
}

impl EncounterService for RecordingEncounterService {
    fn begin_combat(&mut self, _world: &mut EntityManager, setup: &CombatSetup) -> GarrisonResult<()> {
        if std::mem::take(&mut self.fail_next) {
            return Err(crate::GarrisonError::InvalidState("encounter service unavailable".to_string()));
        }
        self.started.push(setup.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::squads::RosterSquadService;

    struct MarkerStarter {
        marker: Option<EntityId>,
    }

    impl CombatStarter for MarkerStarter {
        fn prepare(&mut self, world: &mut EntityManager) -> GarrisonResult<CombatSetup> {
            let marker = world.create_entity();
            self.marker = Some(marker);
            Ok(CombatSetup {
                enemy_squad_ids: vec![marker],
                player_squad_ids: Vec::new(),
                combat_position: Position::new(1, 1),
                encounter_id: None,
                commander: None,
            })
        }

        fn rollback(&mut self, world: &mut EntityManager) {
            if let Some(marker) = self.marker.take() {
                world.remove_entity(marker);
            }
        }
    }

    #[test]
    fn test_combat_start_records_setup() {
        let mut world = EntityManager::new();
        let mut service = RecordingEncounterService::new();
        let mut starter = MarkerStarter { marker: None };
        let setup = execute_combat_start(&mut world, &mut service, &mut starter).unwrap();
        assert_eq!(service.started, vec![setup]);
        assert_eq!(world.len(), 1);
    }

    #[test]
    fn test_combat_start_rolls_back_on_failure() {
        let mut world = EntityManager::new();
        let mut service = RecordingEncounterService {
            fail_next: true,
            ..Default::default()
        };
        let mut starter = MarkerStarter { marker: None };
        assert!(execute_combat_start(&mut world, &mut service, &mut starter).is_err());
        assert!(world.is_empty());
        assert!(service.started.is_empty());
    }

    struct NothingResolver;

    impl CombatResolver for NothingResolver {
        fn resolve(&mut self, _world: &mut EntityManager) -> Option<ResolutionPlan> {
            None
        }
    }

    struct GoldResolver(EntityId);

    impl CombatResolver for GoldResolver {
        fn resolve(&mut self, _world: &mut EntityManager) -> Option<ResolutionPlan> {
            Some(ResolutionPlan {
                rewards: Reward::new(25, 0, 0),
                target: GrantTarget {
                    player_entity: Some(self.0),
                    ..Default::default()
                },
                description: "Loot found".to_string(),
            })
        }
    }

    #[test]
    fn test_resolution_pipeline() {
        let mut world = EntityManager::new();
        let squads = RosterSquadService::new();
        assert!(execute_resolution(&mut world, &squads, &mut NothingResolver).is_none());

        let player = world.spawn(ResourceStockpile::default());
        let result = execute_resolution(&mut world, &squads, &mut GoldResolver(player)).unwrap();
        assert_eq!(result.reward_text, "25 gold");
        assert_eq!(result.description, "Loot found");
        assert_eq!(world.get::<ResourceStockpile>(player).unwrap().gold, 25);
    }
}
