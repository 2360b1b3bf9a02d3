//! # Noise Fields
//!
//! Seeded Perlin, wavelet and Voronoi noise used by the terrain generators.
//!
//! Every field is a row-major `NoiseMap` (`map[y][x]`) with values clamped to
//! `[0, 1]`. A `NoiseGenerator` owns its own `StdRng`, so two generators built
//! from the same seed produce identical fields when called in the same order.

use noise::{NoiseFn, Perlin};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Row-major 2D field of samples in `[0, 1]`.
pub type NoiseMap = Vec<Vec<f64>>;

/// Deterministic noise source.
///
/// # Examples
///
/// ```
/// use garrison::NoiseGenerator;
///
/// let mut a = NoiseGenerator::new(7);
/// let mut b = NoiseGenerator::new(7);
/// assert_eq!(
///     a.generate_perlin_noise(16, 8, 0.1, 3, 0.5),
///     b.generate_perlin_noise(16, 8, 0.1, 3, 0.5),
/// );
/// ```
#[derive(Debug, Clone)]
pub struct NoiseGenerator {
    seed: u64,
    rng: StdRng,
}

impl NoiseGenerator {
    /// Creates a noise generator seeded with `seed`.
    pub fn new(seed: u64) -> Self {
        Self {
            seed,
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// Creates a noise generator whose seed is drawn from another RNG.
    pub fn from_rng(rng: &mut StdRng) -> Self {
        Self::new(rng.gen())
    }

    /// Seed this generator was created with.
    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Fractal Brownian motion over seeded Perlin octaves.
    ///
    /// `scale` is the base frequency (0.05-0.2 gives map-scale features),
    /// each octave doubles the frequency and multiplies the amplitude by
    /// `persistence`. The sum is normalized by the total amplitude.
    pub fn generate_perlin_noise(
        &mut self,
        width: usize,
        height: usize,
        scale: f64,
        octaves: usize,
        persistence: f64,
    ) -> NoiseMap {
        let layers: Vec<Perlin> = (0..octaves).map(|_| Perlin::new(self.rng.gen())).collect();

        let mut max_amplitude = 0.0;
        let mut amplitude = 1.0;
        for _ in 0..octaves {
            max_amplitude += amplitude;
            amplitude *= persistence;
        }

        let mut map = vec![vec![0.0; width]; height];
        if max_amplitude <= 0.0 {
            return map;
        }

        for (y, row) in map.iter_mut().enumerate() {
            for (x, cell) in row.iter_mut().enumerate() {
                let mut value = 0.0;
                let mut amplitude = 1.0;
                let mut frequency = scale;
                for layer in &layers {
                    value += layer.get([x as f64 * frequency, y as f64 * frequency]) * amplitude;
                    amplitude *= persistence;
                    frequency *= 2.0;
                }
                *cell = clamp01((value / max_amplitude + 1.0) / 2.0);
            }
        }

        map
    }

    /// Single octave gradient noise.
    pub fn simple_noise(&mut self, width: usize, height: usize, scale: f64) -> NoiseMap {
        self.generate_perlin_noise(width, height, scale, 1, 1.0)
    }

    /// Displaces every lookup by a pair of low-frequency noise fields.
    ///
    /// Displacement is `(warp - 0.5) * 2 * warp_amount` per axis, and the
    /// source field is resampled bilinearly at the clamped warped coordinate.
    pub fn apply_domain_warping(
        &mut self,
        noise_map: &NoiseMap,
        warp_amount: f64,
        warp_scale: f64,
    ) -> NoiseMap {
        let height = noise_map.len();
        if height == 0 {
            return noise_map.clone();
        }
        let width = noise_map[0].len();

        let warp_x = self.simple_noise(width, height, warp_scale);
        let warp_y = self.simple_noise(width, height, warp_scale * 1.3);

        let mut result = vec![vec![0.0; width]; height];
        for y in 0..height {
            for x in 0..width {
                let dx = (warp_x[y][x] - 0.5) * 2.0 * warp_amount;
                let dy = (warp_y[y][x] - 0.5) * 2.0 * warp_amount;
                result[y][x] = sample_bilinear(noise_map, x as f64 + dx, y as f64 + dy);
            }
        }

        result
    }

    /// Voronoi distance field and region IDs for `num_points` random seeds.
    ///
    /// Distances are Euclidean and normalized by the largest distance found.
    pub fn generate_voronoi(
        &mut self,
        width: usize,
        height: usize,
        num_points: usize,
    ) -> (NoiseMap, Vec<Vec<usize>>) {
        let points: Vec<(f64, f64)> = (0..num_points)
            .map(|_| self.random_cell(width, height))
            .collect();
        voronoi_fields(width, height, &points)
    }

    /// Voronoi with Lloyd relaxation.
    ///
    /// Each iteration moves every seed to the centroid of the cells nearest to
    /// it, which evens out region sizes.
    pub fn generate_voronoi_with_jitter(
        &mut self,
        width: usize,
        height: usize,
        num_points: usize,
        relax_iterations: usize,
    ) -> (NoiseMap, Vec<Vec<usize>>) {
        let mut points: Vec<(f64, f64)> = (0..num_points)
            .map(|_| self.random_cell(width, height))
            .collect();

        for _ in 0..relax_iterations {
            let mut counts = vec![0usize; points.len()];
            let mut sums = vec![(0.0, 0.0); points.len()];

            for y in 0..height {
                for x in 0..width {
                    if let Some(nearest) = nearest_point(&points, x as f64, y as f64) {
                        counts[nearest] += 1;
                        sums[nearest].0 += x as f64;
                        sums[nearest].1 += y as f64;
                    }
                }
            }

            for (i, point) in points.iter_mut().enumerate() {
                if counts[i] > 0 {
                    point.0 = sums[i].0 / counts[i] as f64;
                    point.1 = sums[i].1 / counts[i] as f64;
                }
            }
        }

        voronoi_fields(width, height, &points)
    }

    /// Multi-band wavelet noise.
    ///
    /// Band `b` is built on a grid `2^(num_bands-1-b)` cells coarse (coarsest
    /// first) and interpolated with a quintic basis. Band amplitudes start at
    /// `base_amplitude` and are multiplied by `amplitude_decay` per band.
    pub fn generate_wavelet_noise(
        &mut self,
        width: usize,
        height: usize,
        num_bands: usize,
        base_amplitude: f64,
        amplitude_decay: f64,
    ) -> NoiseMap {
        let mut bands = Vec::with_capacity(num_bands);
        let mut amplitude = base_amplitude;
        for b in 0..num_bands {
            let scale = band_scale(num_bands, b);
            bands.push((self.generate_wavelet_band(width, height, scale), amplitude));
            amplitude *= amplitude_decay;
        }

        let total_amplitude: f64 = bands.iter().map(|(_, a)| a).sum();
        let mut result = vec![vec![0.5; width]; height];
        if total_amplitude <= 0.0 {
            return result;
        }

        for y in 0..height {
            for x in 0..width {
                let value: f64 = bands.iter().map(|(data, a)| data[y][x] * a).sum();
                result[y][x] = clamp01((value / total_amplitude + 1.0) / 2.0);
            }
        }

        result
    }

    /// Ridged wavelet noise: `(1 - |2v - 1|)^sharpness + offset`.
    pub fn generate_ridged_wavelet(
        &mut self,
        width: usize,
        height: usize,
        num_bands: usize,
        ridge_offset: f64,
        ridge_sharpness: f64,
    ) -> NoiseMap {
        let base = self.generate_wavelet_noise(width, height, num_bands, 1.0, 0.5);

        base.into_iter()
            .map(|row| {
                row.into_iter()
                    .map(|v| {
                        let ridge = (1.0 - (v * 2.0 - 1.0).abs()).powf(ridge_sharpness);
                        clamp01(ridge + ridge_offset)
                    })
                    .collect()
            })
            .collect()
    }

    /// Turbulent wavelet noise: amplitude-weighted sum of absolute band values.
    pub fn generate_turbulent_wavelet(
        &mut self,
        width: usize,
        height: usize,
        num_bands: usize,
    ) -> NoiseMap {
        let mut result = vec![vec![0.0; width]; height];
        let mut total_amplitude = 0.0;
        let mut amplitude = 1.0;

        for b in 0..num_bands {
            let band = self.generate_wavelet_band(width, height, band_scale(num_bands, b));
            for y in 0..height {
                for x in 0..width {
                    result[y][x] += band[y][x].abs() * amplitude;
                }
            }
            total_amplitude += amplitude;
            amplitude *= 0.5;
        }

        if total_amplitude > 0.0 {
            for row in result.iter_mut() {
                for cell in row.iter_mut() {
                    *cell = clamp01(*cell / total_amplitude);
                }
            }
        }

        result
    }

    /// Blend of regular and ridged wavelet noise weighted by `ridge_weight`.
    pub fn generate_hybrid_wavelet(
        &mut self,
        width: usize,
        height: usize,
        num_bands: usize,
        ridge_weight: f64,
    ) -> NoiseMap {
        let regular = self.generate_wavelet_noise(width, height, num_bands, 1.0, 0.5);
        let ridged = self.generate_ridged_wavelet(width, height, num_bands, 0.0, 2.0);
        blend_noise_maps(&regular, &ridged, 1.0 - ridge_weight, ridge_weight)
    }

    fn generate_wavelet_band(&mut self, width: usize, height: usize, scale: usize) -> NoiseMap {
        let grid_w = (width + scale - 1) / scale;
        let grid_h = (height + scale - 1) / scale;

        let coeffs: Vec<Vec<f64>> = (0..=grid_h)
            .map(|_| (0..=grid_w).map(|_| self.rng.gen::<f64>() * 2.0 - 1.0).collect())
            .collect();

        let mut band = vec![vec![0.0; width]; height];
        for (y, row) in band.iter_mut().enumerate() {
            let gy = y as f64 / scale as f64;
            let gy0 = gy as usize;
            let gy1 = (gy0 + 1).min(grid_h);
            let wy = wavelet_basis(gy - gy0 as f64);

            for (x, cell) in row.iter_mut().enumerate() {
                let gx = x as f64 / scale as f64;
                let gx0 = gx as usize;
                let gx1 = (gx0 + 1).min(grid_w);
                let wx = wavelet_basis(gx - gx0 as f64);

                let top = coeffs[gy0][gx0] * (1.0 - wx) + coeffs[gy0][gx1] * wx;
                let bottom = coeffs[gy1][gx0] * (1.0 - wx) + coeffs[gy1][gx1] * wx;
                *cell = top * (1.0 - wy) + bottom * wy;
            }
        }

        band
    }

    fn random_cell(&mut self, width: usize, height: usize) -> (f64, f64) {
        (
            self.rng.gen_range(0..width.max(1)) as f64,
            self.rng.gen_range(0..height.max(1)) as f64,
        )
    }
}

/// Weighted average of two equally sized noise maps.
pub fn blend_noise_maps(a: &NoiseMap, b: &NoiseMap, weight_a: f64, weight_b: f64) -> NoiseMap {
    let total = weight_a + weight_b;
    if total == 0.0 {
        return a.clone();
    }

    a.iter()
        .zip(b.iter())
        .map(|(row_a, row_b)| {
            row_a
                .iter()
                .zip(row_b.iter())
                .map(|(va, vb)| (va * weight_a + vb * weight_b) / total)
                .collect()
        })
        .collect()
}

fn band_scale(num_bands: usize, band: usize) -> usize {
    1 << (num_bands - 1 - band)
}

/// Quintic `6t^5 - 15t^4 + 10t^3`.
fn wavelet_basis(t: f64) -> f64 {
    let t2 = t * t;
    let t3 = t2 * t;
    6.0 * t2 * t3 - 15.0 * t2 * t2 + 10.0 * t3
}

fn sample_bilinear(map: &NoiseMap, x: f64, y: f64) -> f64 {
    let height = map.len();
    let width = map[0].len();
    let x = x.clamp(0.0, (width - 1) as f64);
    let y = y.clamp(0.0, (height - 1) as f64);

    let x0 = x as usize;
    let y0 = y as usize;
    let x1 = (x0 + 1).min(width - 1);
    let y1 = (y0 + 1).min(height - 1);
    let fx = x - x0 as f64;
    let fy = y - y0 as f64;

    let top = map[y0][x0] * (1.0 - fx) + map[y0][x1] * fx;
    let bottom = map[y1][x0] * (1.0 - fx) + map[y1][x1] * fx;
    top * (1.0 - fy) + bottom * fy
}

fn nearest_point(points: &[(f64, f64)], x: f64, y: f64) -> Option<usize> {
    let mut nearest = None;
    let mut min_dist = f64::MAX;
    for (i, (px, py)) in points.iter().enumerate() {
        let dist = (x - px).powi(2) + (y - py).powi(2);
        if dist < min_dist {
            min_dist = dist;
            nearest = Some(i);
        }
    }
    nearest
}

fn voronoi_fields(
    width: usize,
    height: usize,
    points: &[(f64, f64)],
) -> (NoiseMap, Vec<Vec<usize>>) {
    let mut distances = vec![vec![0.0; width]; height];
    let mut regions = vec![vec![0usize; width]; height];
    if points.is_empty() {
        return (distances, regions);
    }

    let mut max_dist: f64 = 0.0;
    for y in 0..height {
        for x in 0..width {
            if let Some(nearest) = nearest_point(points, x as f64, y as f64) {
                let (px, py) = points[nearest];
                let dist = ((x as f64 - px).powi(2) + (y as f64 - py).powi(2)).sqrt();
                distances[y][x] = dist;
                regions[y][x] = nearest;
                max_dist = max_dist.max(dist);
            }
        }
    }

    if max_dist > 0.0 {
        for row in distances.iter_mut() {
            for d in row.iter_mut() {
                *d /= max_dist;
            }
        }
    }

    (distances, regions)
}

fn clamp01(value: f64) -> f64 {
    value.clamp(0.0, 1.0)
}
