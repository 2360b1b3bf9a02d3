//! # Wavelet Generator
//!
//! Band-limited wavelet noise blended with ridged and turbulent variants,
//! then contrast-shaped before thresholding against per-biome densities.

use super::helpers::{BiomeThresholds, TerrainMap, TunnelStyle};
use super::noise::{NoiseGenerator, NoiseMap};
use super::{GenerationResult, MapGenerator, SpawnArea};
use crate::game::Position;
use crate::map::{Biome, TileImageSet};
use log::debug;
use rand::rngs::StdRng;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WaveletConfig {
    pub num_bands: usize,
    pub base_amplitude: f64,
    pub amplitude_decay: f64,
    pub ridge_weight: f64,
    pub turbulence_blend: f64,
    pub moisture_bands: usize,
    pub elevation_bands: usize,
    /// Scales distance from 0.5 before contrast shaping
    pub detail_boost: f64,
    pub contrast_power: f64,
    pub smoothing_passes: usize,
    pub base_obstacle_density: f64,
    pub spawn_radius: i32,
}

impl Default for WaveletConfig {
    fn default() -> Self {
        Self {
            num_bands: 5,
            base_amplitude: 1.0,
            amplitude_decay: 0.55,
            ridge_weight: 0.25,
            turbulence_blend: 0.15,
            moisture_bands: 4,
            elevation_bands: 4,
            detail_boost: 1.3,
            contrast_power: 1.1,
            smoothing_passes: 4,
            base_obstacle_density: 0.30,
            spawn_radius: 5,
        }
    }
}

const WAVELET_BIOMES: BiomeThresholds = BiomeThresholds {
    water: 0.30,
    highland: 0.55,
    mountain: 0.75,
    dry: 0.35,
    wet: 0.60,
};

/// `base^exp` on `[0, 1]`, with the fractional part of `exp` applied as a
/// linear blend.
fn pow01(base: f64, exp: f64) -> f64 {
    if base <= 0.0 {
        return 0.0;
    }
    if base >= 1.0 {
        return 1.0;
    }
    let whole = exp.trunc() as i32;
    let frac = exp - exp.trunc();
    let mut result = base.powi(whole);
    if frac > 0.0 {
        result *= (1.0 - frac) + frac * base;
    }
    result
}

#[derive(Debug, Clone, Default)]
pub struct WaveletGenerator {
    config: WaveletConfig,
}

impl WaveletGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: WaveletConfig) -> Self {
        Self { config }
    }

    pub fn biome_density(biome: Biome) -> f64 {
        match biome {
            Biome::Grassland => 0.22,
            Biome::Forest => 0.40,
            Biome::Desert => 0.18,
            Biome::Mountain => 0.52,
            Biome::Swamp => 0.35,
        }
    }

    fn blend(&self, base: &NoiseMap, ridged: &NoiseMap, turbulent: &NoiseMap) -> NoiseMap {
        let c = &self.config;
        let base_weight = (1.0 - c.ridge_weight - c.turbulence_blend).max(0.3);
        base.iter()
            .zip(ridged)
            .zip(turbulent)
            .map(|((b, r), t)| {
                b.iter()
                    .zip(r)
                    .zip(t)
                    .map(|((b, r), t)| b * base_weight + r * c.ridge_weight + t * c.turbulence_blend)
                    .collect()
            })
            .collect()
    }

    /// Pushes values away from 0.5, then applies the contrast curve
    /// symmetrically on each half.
    fn enhance(&self, terrain: &NoiseMap) -> NoiseMap {
        let c = &self.config;
        terrain
            .iter()
            .map(|row| {
                row.iter()
                    .map(|v| {
                        let v = 0.5 + (v - 0.5) * c.detail_boost;
                        let v = if v < 0.5 {
                            0.5 * pow01(v * 2.0, c.contrast_power)
                        } else {
                            0.5 + 0.5 * pow01((v - 0.5) * 2.0, c.contrast_power)
                        };
                        v.clamp(0.0, 1.0)
                    })
                    .collect()
            })
            .collect()
    }
}

impl MapGenerator for WaveletGenerator {
    fn name(&self) -> &'static str {
        "wavelet_procedural"
    }

    fn description(&self) -> &'static str {
        "Wavelet Noise Procedural maps with precise multi-scale terrain control"
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

        let base = noise.generate_wavelet_noise(w, h, c.num_bands, c.base_amplitude, c.amplitude_decay);
        let ridged = noise.generate_ridged_wavelet(w, h, c.num_bands, 0.0, 2.0);
        let turbulent = noise.generate_turbulent_wavelet(w, h, c.num_bands.saturating_sub(1).max(1));
        let shaped = self.enhance(&self.blend(&base, &ridged, &turbulent));

        let elevation = noise.generate_wavelet_noise(w, h, c.elevation_bands, 1.0, 0.6);
        let moisture = noise.generate_wavelet_noise(w, h, c.moisture_bands, 1.0, 0.5);

        let biome_at = |x: i32, y: i32| {
            WAVELET_BIOMES.classify(elevation[y as usize][x as usize], moisture[y as usize][x as usize])
        };

        let mut terrain = TerrainMap::from_fn(width, height, |x, y| {
            let v = shaped[y as usize][x as usize];
            let density = (Self::biome_density(biome_at(x, y)) * (0.7 + v * 0.6)).clamp(0.05, 0.75);
            v > density
        });

        for _ in 0..c.smoothing_passes {
            terrain = terrain.step(|_, walls| walls < 5);
        }
        terrain.seal_borders();

        let spawn = SpawnArea::square(Position::new(width / 2, height / 2), c.spawn_radius);
        terrain.clear_spawn(&spawn);
        terrain.ensure_connectivity(TunnelStyle::Straight, rng);

        let result = terrain.into_result(images, rng, spawn, biome_at);
        debug!("wavelet_procedural: {} walkable tiles", result.valid_positions.len());
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generation::utils;
    use rand::SeedableRng;

    #[test]
    fn test_pow01_edges() {
        assert_eq!(pow01(0.0, 1.1), 0.0);
        assert_eq!(pow01(1.0, 1.1), 1.0);
        assert!((pow01(0.5, 2.0) - 0.25).abs() < 1e-12);
        // Fractional exponent blends toward one extra multiplication
        assert!((pow01(0.5, 1.5) - 0.375).abs() < 1e-12);
    }

    #[test]
    fn test_enhance_keeps_unit_range() {
        let generator = WaveletGenerator::new();
        let field = vec![vec![0.0, 0.1, 0.5, 0.9, 1.0]];
        let out = generator.enhance(&field);
        assert!(out[0].iter().all(|v| (0.0..=1.0).contains(v)));
        assert!((out[0][2] - 0.5).abs() < 1e-12);
        assert!(out[0][0] < out[0][4]);
    }

    #[test]
    fn test_wavelet_map_validates() {
        let mut rng = StdRng::seed_from_u64(31);
        let result = WaveletGenerator::new().generate(64, 48, &TileImageSet::default(), &mut rng);
        assert!(utils::validate_result(&result).is_ok());
    }
}
