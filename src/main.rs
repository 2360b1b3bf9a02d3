//! # Garrison Entry Point
//!
//! Opens the map viewer, or with `--raid` runs a headless raid simulation.

use clap::Parser;
use garrison::{
    morale_penalty, Attributes, CombatExitReason, CombatResult, CombatSetup, EntityId, EntityManager, Formation,
    GarrisonError, GarrisonResult, ManaData, MapViewer, MonsterCatalog, Position, RaidConfig, RaidParticipants,
    RaidRunner, RaidStateData, RaidStatus, RecordingEncounterService, ResourceStockpile, RoomSelection, RoomType,
    RosterSquadService, SquadService, ViewerCommand,
};
use log::{error, info, warn};
use macroquad::prelude::{next_frame, Conf};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use std::path::PathBuf;
use std::sync::Arc;

/// Command line arguments for the garrison binary.
#[derive(Parser, Debug, Clone)]
#[command(name = "garrison")]
#[command(about = "Procedural tactical maps and a garrison raid campaign loop")]
#[command(version)]
struct Args {
    /// Random seed for generation
    #[arg(short, long, default_value_t = 12345)]
    seed: u64,

    /// Map generator name
    #[arg(short, long, default_value = "rooms_corridors")]
    generator: String,

    /// Map width in tiles
    #[arg(long, default_value_t = garrison::config::DEFAULT_MAP_WIDTH)]
    width: i32,

    /// Map height in tiles
    #[arg(long, default_value_t = garrison::config::DEFAULT_MAP_HEIGHT)]
    height: i32,

    /// Run a headless raid simulation instead of opening the viewer
    #[arg(long)]
    raid: bool,

    /// Number of raid floors (0 uses the configured default)
    #[arg(long, default_value_t = 0)]
    floors: usize,

    /// Raid configuration file; the embedded defaults are used when absent
    #[arg(long)]
    raid_config: Option<PathBuf>,

    /// Log level (error, warn, info, debug, trace)
    #[arg(long, default_value = "info")]
    log_level: String,
}

fn main() -> GarrisonResult<()> {
    let args = Args::parse();
    initialize_logging(&args.log_level);
    info!("Starting garrison v{}", garrison::VERSION);

    if args.raid {
        return run_raid_simulation(&args);
    }

    let conf = Conf {
        window_title: "Garrison".to_string(),
        window_width: 1024,
        window_height: 768,
        ..Default::default()
    };
    macroquad::Window::from_config(conf, run_viewer(args));
    Ok(())
}

fn initialize_logging(log_level: &str) {
    #[cfg(feature = "dev-tools")]
    {
        let filter = tracing_subscriber::EnvFilter::try_new(log_level)
            .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
        tracing_subscriber::fmt().with_env_filter(filter).with_target(false).init();
    }

    #[cfg(not(feature = "dev-tools"))]
    {
        env_logger::Builder::new()
            .parse_filters(log_level)
            .format_timestamp(None)
            .init();
    }
}

async fn run_viewer(args: Args) {
    let mut viewer = MapViewer::new(&args.generator, args.width, args.height, args.seed);
    loop {
        if viewer.handle_input() == ViewerCommand::Quit {
            info!("Viewer closed");
            break;
        }
        viewer.draw();
        next_frame().await;
    }
}

const PLAYER_ROSTERS: [&[&str]; 3] = [
    &["Knight", "Swordsman", "Archer", "Cleric"],
    &["Paladin", "Spearman", "Crossbowman", "Priest"],
    &["Warrior", "Ranger", "Mage"],
];

/// Runs raid rooms with an automatic player until the raid ends.
fn run_raid_simulation(args: &Args) -> GarrisonResult<()> {
    let config = match &args.raid_config {
        Some(path) => RaidConfig::load(path)?,
        None => RaidConfig::default(),
    };
    let catalog = Arc::new(MonsterCatalog::default());
    let mut world = EntityManager::new();
    let squads = RosterSquadService::new();
    let mut rng = StdRng::seed_from_u64(args.seed);

    let participants = create_player_forces(&mut world, &squads, &catalog)?;
    let mut runner = RaidRunner::new(
        Arc::new(config),
        Arc::clone(&catalog),
        Box::new(RosterSquadService::new()),
        Box::new(RecordingEncounterService::new()),
        args.seed,
    );
    let raid = runner.start_raid(&mut world, participants, args.floors)?;

    let mut stalled: Vec<(usize, usize)> = Vec::new();
    for step in 0..500 {
        if !runner.is_active(&world) {
            break;
        }
        let Some(floor) = runner.raid_state(&world).map(|s| s.current_floor) else {
            break;
        };
        let Some((node, room_type)) = choose_room(&runner, &world, floor, &stalled) else {
            warn!("No reachable rooms left on floor {}", floor);
            break;
        };
        info!("Step {}: floor {}, room {} ({})", step, floor, node, room_type);

        match runner.select_room(&mut world, node)? {
            RoomSelection::Rested => info!("Squads rested"),
            RoomSelection::FloorComplete => {
                let status = runner.advance_floor(&mut world)?;
                info!("Floor {} complete, raid status {:?}", floor, status);
            }
            RoomSelection::AwaitingDeployment => {
                let deployment = runner.auto_deploy(&mut world)?;
                let setup = match runner.trigger_encounter(&mut world, node) {
                    Ok(setup) => setup,
                    Err(err) => {
                        warn!("Skipping room {}: {}", node, err);
                        stalled.push((floor, node));
                        continue;
                    }
                };
                info!("Deployed {} squads", deployment.deployed_squad_ids.len());
                let (reason, result) = simulate_combat(&mut world, runner.config(), runner.squads(), &setup, &mut rng);
                let summary = runner.resolve_encounter(&mut world, reason, &result)?;
                info!(
                    "{} ({}): {:?} after {} rounds, {} units lost, alert {}{}",
                    summary.room_name,
                    summary.room_type,
                    reason,
                    result.rounds,
                    summary.units_lost,
                    summary.alert_level,
                    if summary.reward_text.is_empty() {
                        String::new()
                    } else {
                        format!(", reward: {}", summary.reward_text)
                    }
                );
            }
        }
    }

    let status = world
        .get::<RaidStateData>(raid)
        .map(|s| s.status)
        .ok_or_else(|| GarrisonError::NotFound("raid state vanished".to_string()))?;
    match status {
        RaidStatus::Victory => info!("Raid won"),
        RaidStatus::Defeat => info!("Raid lost"),
        other => error!("Simulation stopped with raid still {:?}", other),
    }
    Ok(())
}

fn create_player_forces(
    world: &mut EntityManager,
    squads: &dyn SquadService,
    catalog: &MonsterCatalog,
) -> GarrisonResult<RaidParticipants> {
    let commander = world.create_entity();
    let player_entity = world.spawn(ResourceStockpile::default());
    world.add_component(
        commander,
        ManaData {
            current_mana: 20,
            max_mana: 50,
        },
    )?;

    let mut player_squad_ids = Vec::new();
    for (i, roster) in PLAYER_ROSTERS.iter().enumerate() {
        let templates: Vec<_> = roster
            .iter()
            .enumerate()
            .filter_map(|(slot, name)| {
                let mut template = catalog.get(name)?.clone();
                template.grid_row = slot as i32 / 2;
                template.grid_col = slot as i32 % 2;
                template.grid_width = 1;
                template.grid_height = 1;
                template.is_leader = slot == 0;
                Some(template)
            })
            .collect();
        let name = format!("Company {}", i + 1);
        let squad = squads.create_squad_from_template(world, &name, Formation::Balanced, Position::origin(), &templates)?;
        player_squad_ids.push(squad);
    }
    Ok(RaidParticipants {
        commander,
        player_entity,
        player_squad_ids,
    })
}

/// Stairs when reachable, else the next critical-path room, else any
/// accessible room.
fn choose_room(
    runner: &RaidRunner,
    world: &EntityManager,
    floor: usize,
    stalled: &[(usize, usize)],
) -> Option<(usize, RoomType)> {
    let open: Vec<_> = runner
        .rooms_on_floor(world, floor)
        .into_iter()
        .filter(|r| r.is_accessible && !r.is_cleared && !stalled.contains(&(floor, r.node_id)))
        .collect();
    open.iter()
        .find(|r| r.room_type == RoomType::Stairs)
        .or_else(|| open.iter().find(|r| r.on_critical_path))
        .or_else(|| open.first())
        .map(|r| (r.node_id, r.room_type))
}

const MAX_ROUNDS: u32 = 10;

/// Trades damage between the two sides, each round scaled by the side's
/// power. Low morale takes its dex/str penalty off the player's hits.
/// Running out of rounds while behind counts as fleeing.
fn simulate_combat(
    world: &mut EntityManager,
    config: &RaidConfig,
    squads: &dyn SquadService,
    setup: &CombatSetup,
    rng: &mut StdRng,
) -> (CombatExitReason, CombatResult) {
    let side_power = |world: &EntityManager, ids: &[EntityId]| -> f64 { ids.iter().map(|s| squads.squad_power(world, *s)).sum() };
    let mut result = CombatResult::default();

    while result.rounds < MAX_ROUNDS {
        result.rounds += 1;
        let player_power = side_power(world, &setup.player_squad_ids);
        let enemy_power = side_power(world, &setup.enemy_squad_ids);
        let drag = morale_drag(world, config, squads, &setup.player_squad_ids);
        let player_hits = ((player_power * rng.gen_range(0.8..1.2)).round() as i32 - drag).max(0);
        let enemy_hits = (enemy_power * rng.gen_range(0.8..1.2)).round() as i32;
        result.enemy_casualties += deal_damage(world, squads, &setup.enemy_squad_ids, player_hits, rng);
        result.player_casualties += deal_damage(world, squads, &setup.player_squad_ids, enemy_hits, rng);

        let players_alive = squads.living_unit_ids(world, &setup.player_squad_ids).len();
        let enemies_alive = squads.living_unit_ids(world, &setup.enemy_squad_ids).len();
        if enemies_alive == 0 {
            return (CombatExitReason::Victory, result);
        }
        if players_alive == 0 {
            return (CombatExitReason::Defeat, result);
        }
    }

    if side_power(world, &setup.player_squad_ids) >= side_power(world, &setup.enemy_squad_ids) {
        for unit in squads.living_unit_ids(world, &setup.enemy_squad_ids) {
            if let Some(attr) = world.get_mut::<Attributes>(unit) {
                attr.current_health = 0;
                result.enemy_casualties += 1;
            }
        }
        (CombatExitReason::Victory, result)
    } else {
        (CombatExitReason::Flee, result)
    }
}

/// Sum of each squad's morale tier penalties, once per living unit.
fn morale_drag(world: &EntityManager, config: &RaidConfig, squads: &dyn SquadService, squad_ids: &[EntityId]) -> i32 {
    squad_ids
        .iter()
        .filter_map(|&squad| {
            let tier = morale_penalty(world, config, squad)?;
            let living = squads.living_unit_ids(world, &[squad]).len() as i32;
            Some((tier.dex_penalty + tier.str_penalty) * living)
        })
        .sum()
}

/// Spreads `amount` damage over random living units. Returns the kills.
fn deal_damage(world: &mut EntityManager, squads: &dyn SquadService, side: &[EntityId], amount: i32, rng: &mut StdRng) -> usize {
    let mut remaining = amount;
    let mut kills = 0;
    while remaining > 0 {
        let living = squads.living_unit_ids(world, side);
        let Some(unit) = living.choose(rng).copied() else {
            break;
        };
        let Some(attr) = world.get_mut::<Attributes>(unit) else {
            break;
        };
        let mitigated = (remaining / 2 - attr.armor).max(1);
        let hit = mitigated.min(attr.current_health);
        attr.current_health -= hit;
        remaining -= hit.max(1) * 2;
        if !attr.is_alive() {
            kills += 1;
        }
    }
    kills
}
