//! # Overworld Generator
//!
//! Large-scale world map. Elevation and moisture fields decide the biome of
//! every tile; swamp and mountain are impassable. Points of interest (towns)
//! are recorded as 1x1 rooms.

use super::helpers::{TerrainMap, TunnelStyle};
use super::noise::NoiseGenerator;
use super::{GenerationResult, MapGenerator, Room, SpawnArea};
use crate::game::Position;
use crate::map::{Biome, TileImageSet};
use log::debug;
use rand::rngs::StdRng;
use rand::Rng;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OverworldConfig {
    pub elevation_scale: f64,
    pub moisture_scale: f64,
    pub mountain_threshold: f64,
    pub water_threshold: f64,
    pub forest_threshold: f64,
    pub poi_count: usize,
    /// Minimum Euclidean distance between two points of interest
    pub poi_min_distance: f64,
    pub spawn_radius: i32,
}

impl Default for OverworldConfig {
    fn default() -> Self {
        Self {
            elevation_scale: 0.08,
            moisture_scale: 0.08,
            mountain_threshold: 0.6,
            water_threshold: 0.3,
            forest_threshold: 0.55,
            poi_count: 5,
            poi_min_distance: 15.0,
            spawn_radius: 5,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct OverworldGenerator {
    config: OverworldConfig,
}

impl OverworldGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: OverworldConfig) -> Self {
        Self { config }
    }

    /// Biome for one elevation/moisture sample.
    pub fn biome_for(&self, elevation: f64, moisture: f64) -> Biome {
        let c = &self.config;
        if elevation < c.water_threshold {
            Biome::Swamp
        } else if elevation > c.mountain_threshold {
            Biome::Mountain
        } else if moisture > c.forest_threshold {
            Biome::Forest
        } else if elevation > c.mountain_threshold * 0.8 {
            Biome::Desert
        } else {
            Biome::Grassland
        }
    }

    fn place_pois(&self, result: &mut GenerationResult, rng: &mut StdRng) {
        if result.valid_positions.is_empty() || self.config.poi_count == 0 {
            return;
        }

        let max_attempts = self.config.poi_count * 10;
        let mut placed = 0;
        for _ in 0..max_attempts {
            if placed >= self.config.poi_count {
                break;
            }
            let pos = result.valid_positions[rng.gen_range(0..result.valid_positions.len())];
            let too_close = result
                .rooms
                .iter()
                .any(|poi| poi.center().euclidean_distance(pos) < self.config.poi_min_distance);
            if !too_close {
                result.rooms.push(Room::new(pos.x, pos.y, 1, 1));
                placed += 1;
            }
        }
    }
}

impl MapGenerator for OverworldGenerator {
    fn name(&self) -> &'static str {
        "overworld"
    }

    fn description(&self) -> &'static str {
        "Large-scale world map with biomes: grasslands, forests, mountains, water"
    }

    fn generate(
        &self,
        width: i32,
        height: i32,
        images: &TileImageSet,
        rng: &mut StdRng,
    ) -> GenerationResult {
        let (w, h) = (width.max(0) as usize, height.max(0) as usize);
        let mut noise = NoiseGenerator::from_rng(rng);
        let elevation = noise.simple_noise(w, h, self.config.elevation_scale);
        let moisture = noise.simple_noise(w, h, self.config.moisture_scale);

        let biome_at =
            |x: i32, y: i32| self.biome_for(elevation[y as usize][x as usize], moisture[y as usize][x as usize]);

        let mut terrain = TerrainMap::from_fn(width, height, |x, y| {
            !matches!(biome_at(x, y), Biome::Swamp | Biome::Mountain)
        });
        terrain.seal_borders();

        let spawn = SpawnArea::circle(Position::new(width / 2, height / 2), self.config.spawn_radius);
        terrain.clear_spawn(&spawn);
        terrain.ensure_connectivity(TunnelStyle::Straight, rng);

        let mut result = terrain.into_result(images, rng, spawn, biome_at);
        self.place_pois(&mut result, rng);

        debug!(
            "overworld: {} walkable tiles, {} points of interest",
            result.valid_positions.len(),
            result.rooms.len()
        );
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generation::utils;
    use rand::SeedableRng;

    #[test]
    fn test_biome_thresholds() {
        let generator = OverworldGenerator::new();
        assert_eq!(generator.biome_for(0.1, 0.5), Biome::Swamp);
        assert_eq!(generator.biome_for(0.7, 0.5), Biome::Mountain);
        assert_eq!(generator.biome_for(0.4, 0.6), Biome::Forest);
        assert_eq!(generator.biome_for(0.5, 0.3), Biome::Desert);
        assert_eq!(generator.biome_for(0.4, 0.3), Biome::Grassland);
    }

    #[test]
    fn test_pois_respect_spacing() {
        let mut rng = StdRng::seed_from_u64(12);
        let result = OverworldGenerator::new().generate(100, 80, &TileImageSet::default(), &mut rng);
        assert!(!result.rooms.is_empty());
        assert!(result.rooms.len() <= 5);
        for (i, a) in result.rooms.iter().enumerate() {
            assert!(result.is_walkable(a.x1, a.y1));
            for b in result.rooms.iter().skip(i + 1) {
                assert!(a.center().euclidean_distance(b.center()) >= 15.0);
            }
        }
    }

    #[test]
    fn test_overworld_validates() {
        let mut rng = StdRng::seed_from_u64(44);
        let result = OverworldGenerator::new().generate(80, 60, &TileImageSet::default(), &mut rng);
        assert!(utils::validate_result(&result).is_ok());
    }
}
