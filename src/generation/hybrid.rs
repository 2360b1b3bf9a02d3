//! # Hybrid Tactical Generator
//!
//! Multi-layer noise with domain warping and Voronoi density zones. Biomes
//! come from separate elevation and moisture fields; each biome sets a base
//! obstacle density that Voronoi distance and detail noise modulate.

use super::helpers::{BiomeThresholds, TerrainMap, TunnelStyle};
use super::noise::{blend_noise_maps, NoiseGenerator};
use super::{GenerationResult, MapGenerator, SpawnArea};
use crate::game::Position;
use crate::map::{Biome, TileImageSet};
use log::debug;
use rand::rngs::StdRng;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HybridConfig {
    pub base_scale: f64,
    pub detail_scale: f64,
    pub octaves: usize,
    pub persistence: f64,
    pub warp_amount: f64,
    pub warp_scale: f64,
    pub voronoi_regions: usize,
    pub voronoi_relaxation: usize,
    /// How strongly Voronoi distance thins out obstacles
    pub voronoi_density_blend: f64,
    pub moisture_scale: f64,
    pub elevation_scale: f64,
    pub base_obstacle_density: f64,
    pub cellular_iterations: usize,
    pub spawn_radius: i32,
}

impl Default for HybridConfig {
    fn default() -> Self {
        Self {
            base_scale: 0.08,
            detail_scale: 0.20,
            octaves: 4,
            persistence: 0.5,
            warp_amount: 3.5,
            warp_scale: 0.10,
            voronoi_regions: 12,
            voronoi_relaxation: 3,
            voronoi_density_blend: 0.4,
            moisture_scale: 0.06,
            elevation_scale: 0.07,
            base_obstacle_density: 0.30,
            cellular_iterations: 4,
            spawn_radius: 5,
        }
    }
}

const HYBRID_BIOMES: BiomeThresholds = BiomeThresholds {
    water: 0.25,
    highland: 0.65,
    mountain: 0.80,
    dry: 0.35,
    wet: 0.60,
};

#[derive(Debug, Clone, Default)]
pub struct HybridGenerator {
    config: HybridConfig,
}

impl HybridGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: HybridConfig) -> Self {
        Self { config }
    }

    /// Base obstacle density per biome.
    pub fn biome_density(biome: Biome) -> f64 {
        match biome {
            Biome::Grassland => 0.20,
            Biome::Forest => 0.38,
            Biome::Desert => 0.15,
            Biome::Mountain => 0.50,
            Biome::Swamp => 0.35,
        }
    }
}

impl MapGenerator for HybridGenerator {
    fn name(&self) -> &'static str {
        "hybrid_tactical"
    }

    fn description(&self) -> &'static str {
        "Hybrid tactical maps using Multi-layer Perlin + Domain Warping + Voronoi for natural biome variety"
    }

    fn generate(
        &self,
        width: i32,
        height: i32,
        images: &TileImageSet,
        rng: &mut StdRng,
    ) -> GenerationResult {
        let c = &self.config;
        let (w, h) = (width.max(0) as usize, height.max(0) as usize);
        let mut noise = NoiseGenerator::from_rng(rng);

        let base = noise.generate_perlin_noise(w, h, c.base_scale, c.octaves, c.persistence);
        let detail = noise.generate_perlin_noise(w, h, c.detail_scale, 2, 0.6);
        let moisture = noise.generate_perlin_noise(w, h, c.moisture_scale, 3, 0.5);
        let elevation = noise.generate_perlin_noise(w, h, c.elevation_scale, 3, 0.5);

        let warped = noise.apply_domain_warping(&base, c.warp_amount, c.warp_scale);
        let (voronoi, _) = noise.generate_voronoi_with_jitter(w, h, c.voronoi_regions, c.voronoi_relaxation);
        let combined = blend_noise_maps(&warped, &detail, 0.6, 0.4);

        let biome_at = |x: i32, y: i32| {
            HYBRID_BIOMES.classify(elevation[y as usize][x as usize], moisture[y as usize][x as usize])
        };

        let mut terrain = TerrainMap::from_fn(width, height, |x, y| {
            let (ux, uy) = (x as usize, y as usize);
            // Far from a Voronoi seed means a clearing; near it, a cluster
            let voronoi_mod = 1.0 - voronoi[uy][ux] * c.voronoi_density_blend;
            let detail_mod = 0.7 + detail[uy][ux] * 0.6;
            let density = (Self::biome_density(biome_at(x, y)) * voronoi_mod * detail_mod).clamp(0.05, 0.80);
            combined[uy][ux] > density
        });

        for _ in 0..c.cellular_iterations {
            terrain = terrain.step(|_, walls| walls < 5);
        }
        terrain.seal_borders();

        let spawn = SpawnArea::square(Position::new(width / 2, height / 2), c.spawn_radius);
        terrain.clear_spawn(&spawn);
        terrain.ensure_connectivity(TunnelStyle::Straight, rng);

        let result = terrain.into_result(images, rng, spawn, biome_at);
        debug!("hybrid_tactical: {} walkable tiles", result.valid_positions.len());
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generation::utils;
    use rand::SeedableRng;

    #[test]
    fn test_default_config_values() {
        let config = HybridConfig::default();
        assert_eq!(config.octaves, 4);
        assert_eq!(config.voronoi_regions, 12);
        assert!((config.warp_amount - 3.5).abs() < f64::EPSILON);
    }

    #[test]
    fn test_hybrid_map_validates() {
        let mut rng = StdRng::seed_from_u64(17);
        let result = HybridGenerator::new().generate(70, 50, &TileImageSet::default(), &mut rng);
        assert!(utils::validate_result(&result).is_ok());
        assert_eq!(result.biome_map.as_ref().map(|b| b.len()), Some(70 * 50));
    }

    #[test]
    fn test_same_seed_same_map() {
        let images = TileImageSet::default();
        let a = HybridGenerator::new().generate(40, 30, &images, &mut StdRng::seed_from_u64(3));
        let b = HybridGenerator::new().generate(40, 30, &images, &mut StdRng::seed_from_u64(3));
        assert_eq!(a.valid_positions, b.valid_positions);
    }

    #[test]
    fn test_density_table() {
        assert!(HybridGenerator::biome_density(Biome::Mountain) > HybridGenerator::biome_density(Biome::Desert));
    }
}
