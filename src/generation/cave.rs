//! # Cave Generator
//!
//! Cellular-automata caves for tactical combat: random fill, smoothing,
//! erosion, then pillars, rubble and pool patches on top.

use super::helpers::{TerrainMap, TunnelStyle};
use super::{GenerationResult, MapGenerator, SpawnArea};
use crate::game::Position;
use crate::map::{Biome, TileImageSet};
use log::debug;
use rand::rngs::StdRng;
use rand::Rng;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CaveConfig {
    /// Initial wall fill ratio
    pub initial_wall_density: f64,
    pub ca_iterations: usize,
    /// Become wall at or above this many wall neighbors
    pub birth_limit: u32,
    /// Become floor above this many wall neighbors (below the birth limit)
    pub death_limit: u32,
    pub pillar_density: f64,
    pub pool_chance: f64,
    pub rubble_density: f64,
    pub erosion_passes: usize,
    pub tunnel_width: i32,
    pub organic_tunnels: bool,
    pub spawn_radius: i32,
}

impl Default for CaveConfig {
    fn default() -> Self {
        Self {
            initial_wall_density: 0.48,
            ca_iterations: 6,
            birth_limit: 5,
            death_limit: 4,
            pillar_density: 0.03,
            pool_chance: 0.15,
            rubble_density: 0.02,
            erosion_passes: 1,
            tunnel_width: 2,
            organic_tunnels: true,
            spawn_radius: 5,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct CaveGenerator {
    config: CaveConfig,
}

impl CaveGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: CaveConfig) -> Self {
        Self { config }
    }

    fn initialize(&self, width: i32, height: i32, rng: &mut StdRng) -> TerrainMap {
        let density = self.config.initial_wall_density;
        let mut terrain = TerrainMap::from_fn(width, height, |_, _| rng.gen::<f64>() > density);
        terrain.seal_borders();
        terrain
    }

    /// Walls form with many wall neighbors or in isolation.
    fn smooth(&self, terrain: &TerrainMap) -> TerrainMap {
        let birth = self.config.birth_limit;
        let death = self.config.death_limit;
        terrain.step(|current, walls| {
            if walls >= birth || walls <= 1 {
                false
            } else if walls > death {
                true
            } else {
                current
            }
        })
    }

    /// Removes walls with few wall neighbors; the border stays intact.
    fn erode(&self, terrain: &TerrainMap) -> TerrainMap {
        let (w, h) = (terrain.width(), terrain.height());
        let mut next = terrain.clone();
        for y in 1..h - 1 {
            for x in 1..w - 1 {
                if !terrain.is_walkable(x, y) && terrain.count_wall_neighbors(x, y) <= 2 {
                    next.set(x, y, true);
                }
            }
        }
        next
    }

    /// 2x2 or 3x3 rock pillars dropped into open areas.
    fn add_pillars(&self, terrain: &mut TerrainMap, rng: &mut StdRng) {
        let (w, h) = (terrain.width(), terrain.height());
        if w < 6 || h < 6 {
            return;
        }
        let count = ((w * h) as f64 * self.config.pillar_density) as usize;
        for _ in 0..count {
            let x = rng.gen_range(2..w - 2);
            let y = rng.gen_range(2..h - 2);
            if terrain.openness(x, y, 2) < 20 {
                continue;
            }
            let size = rng.gen_range(2..=3);
            for dy in 0..size {
                for dx in 0..size {
                    if x + dx < w - 1 && y + dy < h - 1 {
                        terrain.set(x + dx, y + dy, false);
                    }
                }
            }
        }
    }

    /// Single-tile obstacles in spots with at least five open neighbors.
    fn add_rubble(&self, terrain: &mut TerrainMap, rng: &mut StdRng) {
        let (w, h) = (terrain.width(), terrain.height());
        if w < 3 || h < 3 {
            return;
        }
        let count = ((w * h) as f64 * self.config.rubble_density) as usize;
        for _ in 0..count {
            let x = rng.gen_range(1..w - 1);
            let y = rng.gen_range(1..h - 1);
            if terrain.is_walkable(x, y) && 8 - terrain.count_wall_neighbors(x, y) >= 5 {
                terrain.set(x, y, false);
            }
        }
    }

    /// Marks enclosed floor cells that get swamp art.
    fn pool_map(&self, terrain: &TerrainMap, rng: &mut StdRng) -> Vec<bool> {
        let (w, h) = (terrain.width(), terrain.height());
        let mut pools = vec![false; (w.max(0) * h.max(0)) as usize];
        if self.config.pool_chance <= 0.0 {
            return pools;
        }
        for y in 2..(h - 2).max(2) {
            for x in 2..(w - 2).max(2) {
                if !terrain.is_walkable(x, y) || rng.gen::<f64>() > self.config.pool_chance {
                    continue;
                }
                if terrain.openness(x, y, 1) >= 7 {
                    pools[(y * w + x) as usize] = true;
                }
            }
        }
        pools
    }
}

impl MapGenerator for CaveGenerator {
    fn name(&self) -> &'static str {
        "cave_tactical"
    }

    fn description(&self) -> &'static str {
        "Underground cave maps with organic chambers and tunnels for tactical combat"
    }

    fn generate(
        &self,
        width: i32,
        height: i32,
        images: &TileImageSet,
        rng: &mut StdRng,
    ) -> GenerationResult {
        let mut terrain = self.initialize(width, height, rng);
        for _ in 0..self.config.ca_iterations {
            terrain = self.smooth(&terrain);
        }
        for _ in 0..self.config.erosion_passes {
            terrain = self.erode(&terrain);
        }

        self.add_pillars(&mut terrain, rng);
        self.add_rubble(&mut terrain, rng);

        let spawn = SpawnArea::circle(Position::new(width / 2, height / 2), self.config.spawn_radius);
        terrain.clear_spawn(&spawn);

        let style = if self.config.organic_tunnels {
            TunnelStyle::Organic {
                width: self.config.tunnel_width,
            }
        } else {
            TunnelStyle::Straight
        };
        terrain.ensure_connectivity(style, rng);

        let pools = self.pool_map(&terrain, rng);
        let result = terrain.into_result(images, rng, spawn, |x, y| {
            if pools[(y * width + x) as usize] {
                Biome::Swamp
            } else {
                Biome::Mountain
            }
        });

        debug!("cave_tactical: {} walkable tiles", result.valid_positions.len());
        result
    }
}
