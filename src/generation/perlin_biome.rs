//! # Perlin Biome Battlefields
//!
//! Picks one biome for the whole map from a few Perlin samples, then lays
//! out that biome's obstacles with fractal Perlin noise at a biome-specific
//! scale.

use super::helpers::{TerrainMap, TunnelStyle};
use super::{GenerationResult, MapGenerator, SpawnArea};
use crate::game::Position;
use crate::map::{Biome, TileImageSet};
use log::debug;
use noise::{Fbm, MultiFractal, NoiseFn, Perlin};
use rand::rngs::StdRng;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Obstacle layout for one biome.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BiomeLayout {
    /// Tiles whose noise reaches this value are walkable
    pub walk_threshold: f64,
    /// Noise frequency; larger values give smaller features
    pub scale: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PerlinBiomeConfig {
    pub layouts: BTreeMap<Biome, BiomeLayout>,
    pub octaves: usize,
    pub spawn_radius: i32,
}

impl Default for PerlinBiomeConfig {
    fn default() -> Self {
        let layouts = [
            (Biome::Grassland, 0.30, 0.10),
            (Biome::Forest, 0.50, 0.15),
            (Biome::Desert, 0.25, 0.20),
            (Biome::Mountain, 0.75, 0.25),
            (Biome::Swamp, 0.55, 0.12),
        ]
        .into_iter()
        .map(|(biome, walk_threshold, scale)| (biome, BiomeLayout { walk_threshold, scale }))
        .collect();

        Self {
            layouts,
            octaves: 3,
            spawn_radius: 5,
        }
    }
}

impl PerlinBiomeConfig {
    pub fn layout(&self, biome: Biome) -> BiomeLayout {
        self.layouts.get(&biome).copied().unwrap_or(BiomeLayout {
            walk_threshold: 0.5,
            scale: 0.15,
        })
    }
}

/// Maps a `[0, 1]` value onto five equal biome bands.
pub fn biome_from_noise(value: f64) -> Biome {
    match value {
        v if v < 0.2 => Biome::Swamp,
        v if v < 0.4 => Biome::Desert,
        v if v < 0.6 => Biome::Grassland,
        v if v < 0.8 => Biome::Forest,
        _ => Biome::Mountain,
    }
}

fn normalize(v: f64) -> f64 {
    ((v + 1.0) / 2.0).clamp(0.0, 1.0)
}

#[derive(Debug, Clone, Default)]
pub struct PerlinBiomeGenerator {
    config: PerlinBiomeConfig,
}

impl PerlinBiomeGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: PerlinBiomeConfig) -> Self {
        Self { config }
    }

    /// Averages three Perlin samples at random coordinates.
    ///
    /// Perlin output clusters around the middle of its range, so the average
    /// is stretched before banding.
    pub fn select_biome(&self, rng: &mut StdRng) -> Biome {
        let perlin = Perlin::new(rng.gen());
        let sum: f64 = (0..3)
            .map(|_| {
                let point = [rng.gen_range(0.0..1000.0), rng.gen_range(0.0..1000.0)];
                normalize(perlin.get(point))
            })
            .sum();
        let avg = sum / 3.0;
        biome_from_noise(((avg - 0.5) * 3.0 + 0.5).clamp(0.0, 1.0))
    }
}

impl MapGenerator for PerlinBiomeGenerator {
    fn name(&self) -> &'static str {
        "perlin_biome"
    }

    fn description(&self) -> &'static str {
        "Perlin noise biome selection with battlefield generation: Grassland, Forest, Desert, Mountain, Swamp"
    }

    fn generate(
        &self,
        width: i32,
        height: i32,
        images: &TileImageSet,
        rng: &mut StdRng,
    ) -> GenerationResult {
        let biome = self.select_biome(rng);
        let layout = self.config.layout(biome);
        let fbm = Fbm::<Perlin>::new(rng.gen()).set_octaves(self.config.octaves.max(1));

        let mut terrain = TerrainMap::from_fn(width, height, |x, y| {
            let v = normalize(fbm.get([x as f64 * layout.scale, y as f64 * layout.scale]));
            v >= layout.walk_threshold
        });
        terrain.seal_borders();

        let spawn = SpawnArea::square(Position::new(width / 2, height / 2), self.config.spawn_radius);
        terrain.clear_spawn(&spawn);
        terrain.ensure_connectivity(TunnelStyle::Straight, rng);

        let result = terrain.into_result(images, rng, spawn, |_, _| biome);
        debug!(
            "perlin_biome: {} battlefield, {} walkable tiles",
            biome.name(),
            result.valid_positions.len()
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
    fn test_biome_bands() {
        assert_eq!(biome_from_noise(0.0), Biome::Swamp);
        assert_eq!(biome_from_noise(0.3), Biome::Desert);
        assert_eq!(biome_from_noise(0.5), Biome::Grassland);
        assert_eq!(biome_from_noise(0.7), Biome::Forest);
        assert_eq!(biome_from_noise(1.0), Biome::Mountain);
    }

    #[test]
    fn test_single_biome_per_map() {
        let mut rng = StdRng::seed_from_u64(9);
        let result = PerlinBiomeGenerator::new().generate(50, 40, &TileImageSet::default(), &mut rng);
        let biomes = result.biome_map.as_ref().unwrap();
        assert!(biomes.iter().all(|b| *b == biomes[0]));
        assert!(utils::validate_result(&result).is_ok());
    }

    #[test]
    fn test_layout_fallback() {
        let config = PerlinBiomeConfig {
            layouts: BTreeMap::new(),
            ..PerlinBiomeConfig::default()
        };
        assert!((config.layout(Biome::Forest).walk_threshold - 0.5).abs() < f64::EPSILON);
    }
}
